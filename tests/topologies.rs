use gregchild::dsp::utils::db_to_lin;
use gregchild::dsp::{
    AudioFrame, CompressorError, CompressorMode, CompressorParams, Processor, RawParameters,
    StereoTopology,
};

const SR: f32 = 48000.0;

fn raw_defaults() -> RawParameters {
    RawParameters {
        compressor_mode: 3,
        stereo_topology: 0,
        mid_side_linked: true,
        vari_mu_program: 0,
        threshold_db: -18.0,
        ratio: 4.0,
        attack_ms: 10.0,
        release_ms: 150.0,
        max_gr_db: 30.0,
        all_buttons: false,
        soft_knee: true,
        knee_width_db: 6.0,
        input_gain_db: 0.0,
        output_gain_db: 0.0,
        pre_saturation_curve: 0,
        pre_saturation_amount: 1.0,
        post_saturation_curve: 0,
        post_saturation_amount: 1.0,
        mix: 1.0,
        bypass: false,
    }
}

fn processor(mode: CompressorMode, topology: StereoTopology) -> Processor {
    let mut p = Processor::new(SR).unwrap();
    p.set_parameters(CompressorParams {
        mode,
        topology,
        vari_mu_program: 2,
        threshold_db: -20.0,
        ratio: 4.0,
        attack_ms: 1.0,
        release_ms: 100.0,
        ..CompressorParams::default()
    })
    .unwrap();
    p
}

fn run(p: &mut Processor, left: f32, right: f32, frames: usize) -> (f32, f32) {
    let mut out = (0.0, 0.0);
    for _ in 0..frames {
        out = p.process_frame(AudioFrame::new(left, right));
    }
    out
}

#[test]
fn test_raw_parameters_match_defaults() {
    let params = CompressorParams::try_from(raw_defaults()).unwrap();
    assert_eq!(params, CompressorParams::default());
}

#[test]
fn test_raw_parameters_reject_unknown_indices() {
    let raw = RawParameters {
        compressor_mode: 7,
        ..raw_defaults()
    };
    assert_eq!(
        CompressorParams::try_from(raw),
        Err(CompressorError::UnknownMode(7))
    );

    let raw = RawParameters {
        stereo_topology: 3,
        ..raw_defaults()
    };
    assert_eq!(
        CompressorParams::try_from(raw),
        Err(CompressorError::UnknownTopology(3))
    );

    let raw = RawParameters {
        vari_mu_program: 6,
        ..raw_defaults()
    };
    assert_eq!(
        CompressorParams::try_from(raw),
        Err(CompressorError::UnknownProgram(6))
    );

    let raw = RawParameters {
        post_saturation_curve: 9,
        ..raw_defaults()
    };
    assert_eq!(
        CompressorParams::try_from(raw),
        Err(CompressorError::UnknownSaturation(9))
    );
}

#[test]
fn test_raw_parameters_reject_bad_values() {
    let raw = RawParameters {
        ratio: 0.0,
        ..raw_defaults()
    };
    assert!(matches!(
        CompressorParams::try_from(raw),
        Err(CompressorError::InvalidRatio(_))
    ));

    let raw = RawParameters {
        attack_ms: f32::NAN,
        ..raw_defaults()
    };
    assert!(CompressorParams::try_from(raw).is_err());
}

#[test]
fn test_block_length_mismatch_leaves_audio_untouched() {
    let mut p = processor(CompressorMode::Vca, StereoTopology::StereoLink);
    let mut left = vec![0.9; 64];
    let mut right = vec![0.9; 32];
    let err = p.process_block(&mut left, &mut right, None).unwrap_err();
    assert_eq!(
        err,
        CompressorError::BlockLengthMismatch {
            left: 64,
            right: 32,
            sidechain: 64,
        }
    );
    assert!(left.iter().all(|&x| x == 0.9));
    assert!(right.iter().all(|&x| x == 0.9));

    let mut right = vec![0.9; 64];
    let sc = vec![0.0; 16];
    assert!(p
        .process_block(&mut left, &mut right, Some((&sc, &sc)))
        .is_err());
    assert!(left.iter().all(|&x| x == 0.9));
}

#[test]
fn test_jfet_settles_through_processor() {
    let mut p = Processor::new(SR).unwrap();
    p.set_parameters(CompressorParams {
        mode: CompressorMode::Jfet,
        threshold_db: -10.0,
        ratio: 4.0,
        attack_ms: 1.0,
        release_ms: 100.0,
        all_buttons: false,
        ..CompressorParams::default()
    })
    .unwrap();

    let level = db_to_lin(-4.0);
    let (out_l, out_r) = run(&mut p, level, level, SR as usize / 50);
    let [gr_l, gr_r] = p.last_gain_reduction_db();
    assert!((gr_l + 1.5).abs() < 1e-3, "gr = {gr_l}");
    assert_eq!(gr_l, gr_r);
    let expected = level * db_to_lin(-1.5);
    assert!((out_l - expected).abs() < 1e-3);
    assert!((out_r - expected).abs() < 1e-3);
}

#[test]
fn test_stereo_link_applies_one_gain_to_both_channels() {
    for mode in [
        CompressorMode::VariMu,
        CompressorMode::Opto,
        CompressorMode::Jfet,
        CompressorMode::Vca,
    ] {
        let mut p = processor(mode, StereoTopology::StereoLink);
        run(&mut p, 0.9, 0.0, 4800);
        let [gr_l, gr_r] = p.last_gain_reduction_db();
        assert!(gr_l < 0.0, "{mode:?} did not compress");
        assert_eq!(gr_l, gr_r, "{mode:?}");
    }
}

#[test]
fn test_dual_mono_channels_are_independent() {
    for mode in [
        CompressorMode::VariMu,
        CompressorMode::Opto,
        CompressorMode::Jfet,
        CompressorMode::Vca,
    ] {
        let mut p = processor(mode, StereoTopology::DualMono);
        run(&mut p, 0.9, 0.0, 4800);
        let [gr_l, gr_r] = p.last_gain_reduction_db();
        assert!(gr_l < 0.0, "{mode:?} did not compress");
        assert_eq!(gr_r, 0.0, "{mode:?} leaked into the quiet channel");
    }
}

#[test]
fn test_dual_mono_has_no_cross_talk() {
    // The left output must not depend on what happens on the right.
    let mut quiet = processor(CompressorMode::Opto, StereoTopology::DualMono);
    let mut loud = processor(CompressorMode::Opto, StereoTopology::DualMono);
    for i in 0..4800 {
        let x = if i % 100 < 50 { 0.8 } else { 0.05 };
        let (a, _) = quiet.process_frame(AudioFrame::new(x, 0.0));
        let (b, _) = loud.process_frame(AudioFrame::new(x, 0.95));
        assert_eq!(a, b, "frame {i}");
    }
}

#[test]
fn test_mid_side_unlinked_compresses_mid_only() {
    let mut p = processor(
        CompressorMode::Vca,
        StereoTopology::MidSide { linked: false },
    );
    // L == R is pure mid, the side detector sees silence.
    let (out_l, out_r) = run(&mut p, 0.9, 0.9, 4800);
    let [gr_mid, gr_side] = p.last_gain_reduction_db();
    assert!(gr_mid < 0.0);
    assert_eq!(gr_side, 0.0);
    assert!((out_l - out_r).abs() < 1e-6);
    assert!(out_l < 0.9);
}

#[test]
fn test_mid_side_linked_shares_gain() {
    let mut p = processor(
        CompressorMode::Jfet,
        StereoTopology::MidSide { linked: true },
    );
    run(&mut p, 0.9, -0.2, 4800);
    let [gr_mid, gr_side] = p.last_gain_reduction_db();
    assert!(gr_mid < 0.0);
    assert_eq!(gr_mid, gr_side);
}

#[test]
fn test_unlinking_mid_stream_keeps_gain_continuous() {
    let mut p = processor(CompressorMode::Vca, StereoTopology::StereoLink);
    run(&mut p, 0.9, 0.9, 4800);
    let [before, _] = p.last_gain_reduction_db();

    let mut params = *p.params();
    params.topology = StereoTopology::DualMono;
    p.set_parameters(params).unwrap();
    p.process_frame(AudioFrame::new(0.9, 0.9));
    let [gr_l, gr_r] = p.last_gain_reduction_db();
    assert!((gr_l - before).abs() < 0.1);
    assert!((gr_r - before).abs() < 0.1);
}

#[test]
fn test_external_sidechain_drives_detector() {
    let mut p = processor(CompressorMode::Jfet, StereoTopology::StereoLink);
    let mut left = vec![0.1; 4800];
    let mut right = vec![0.1; 4800];
    let sc = vec![0.9; 4800];
    let readings = p
        .process_block(&mut left, &mut right, Some((&sc, &sc)))
        .unwrap();
    assert!(readings.gain_reduction_db < -1.0);
    assert!(left[4799] < 0.1);
}
