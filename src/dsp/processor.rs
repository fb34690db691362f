//! Per-Sample Compressor Pipeline
//!
//! # Signal Flow (one frame)
//! 1. Input gain, then the pre saturation stage.
//! 2. Sidechain = external frame if present, otherwise the conditioned input.
//! 3. Mid/Side encode (M/S topologies only).
//! 4. Detector resolves one linked or two independent readings.
//! 5. Engine(s) produce gain reduction; bypass forces 0 dB instead.
//! 6. Gain applied, Mid/Side decoded.
//! 7. Post saturation, output gain, dry/wet mix.
//! 8. Meters.
//!
//! # Lifecycle
//! - `new` / `reset` bind the sample rate and rebuild every engine.
//! - `set_parameters` ingests one block's snapshot. A compressor-mode switch
//!   re-activates the engines from scratch; anything else is applied in place.
//!
//! ## Audio Thread Safety
//! - `process_frame` / `process_block` never allocate, log or panic.
//! - `set_parameters` is allocation-free and may run on the audio thread.

use super::detector::{decode_mid_side, encode_mid_side, Detector, DetectorLevels, PeakTrackers};
use super::engine::Engine;
use super::error::{CompressorError, Result};
use super::params::CompressorParams;
use super::smoothing::SmoothedParam;
use super::utils::{db_to_lin, lin_to_db, SILENCE_DB};

/// Per-sample step of every displayed meter.
pub const METER_DECAY_COEFF: f32 = 0.1;
/// Ramp time for input/output gain and mix changes.
const PARAM_RAMP_MS: f32 = 20.0;

/// One stereo frame plus the optional external sidechain frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
    pub sidechain: Option<(f32, f32)>,
}

impl AudioFrame {
    pub fn new(left: f32, right: f32) -> Self {
        Self {
            left,
            right,
            sidechain: None,
        }
    }

    pub fn with_sidechain(mut self, left: f32, right: f32) -> Self {
        self.sidechain = Some((left, right));
        self
    }
}

/// Smoothed display values. Gain reduction in dB (<= 0), levels in dBFS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReadings {
    pub gain_reduction_db: f32,
    pub input_l_db: f32,
    pub input_r_db: f32,
    pub output_l_db: f32,
    pub output_r_db: f32,
}

impl Default for MeterReadings {
    fn default() -> Self {
        Self {
            gain_reduction_db: 0.0,
            input_l_db: SILENCE_DB,
            input_r_db: SILENCE_DB,
            output_l_db: SILENCE_DB,
            output_r_db: SILENCE_DB,
        }
    }
}

#[inline]
fn smooth_meter(meter: &mut f32, value: f32) {
    *meter += (value - *meter) * METER_DECAY_COEFF;
}

fn check_sample_rate(sample_rate: f32) -> Result<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(CompressorError::InvalidSampleRate(sample_rate))
    }
}

pub struct Processor {
    sample_rate: f32,
    params: CompressorParams,

    detector: Detector,
    // Slot 0 serves linked topologies; slot 1 only runs unlinked.
    engines: [Engine; 2],

    input_gain: SmoothedParam,
    output_gain: SmoothedParam,
    mix: SmoothedParam,

    input_peaks: PeakTrackers,
    output_peaks: PeakTrackers,
    meters: MeterReadings,
    last_gr_db: [f32; 2],
}

impl Processor {
    pub fn new(sample_rate: f32) -> Result<Self> {
        check_sample_rate(sample_rate)?;
        let params = CompressorParams::default();
        let engine = Engine::new(&params, sample_rate)?;

        let mut processor = Self {
            sample_rate,
            params,
            detector: Detector::new(),
            engines: [engine; 2],
            input_gain: SmoothedParam::new(1.0, PARAM_RAMP_MS, sample_rate),
            output_gain: SmoothedParam::new(1.0, PARAM_RAMP_MS, sample_rate),
            mix: SmoothedParam::new(1.0, PARAM_RAMP_MS, sample_rate),
            input_peaks: PeakTrackers::new(),
            output_peaks: PeakTrackers::new(),
            meters: MeterReadings::default(),
            last_gr_db: [0.0; 2],
        };
        processor.apply_smoother_targets();
        processor.snap_smoothers();
        log::info!(
            "compressor ready at {} Hz ({} engine)",
            sample_rate,
            params.mode.name()
        );
        Ok(processor)
    }

    /// Re-bind the sample rate and return every state to its defaults.
    /// The current parameter snapshot is kept.
    pub fn reset(&mut self, sample_rate: f32) -> Result<()> {
        check_sample_rate(sample_rate)?;
        let engine = Engine::new(&self.params, sample_rate)?;

        self.sample_rate = sample_rate;
        self.engines = [engine; 2];
        self.detector.reset();
        for smoother in [&mut self.input_gain, &mut self.output_gain, &mut self.mix] {
            smoother.set_ramp(PARAM_RAMP_MS, sample_rate);
        }
        self.apply_smoother_targets();
        self.snap_smoothers();
        self.input_peaks.reset();
        self.output_peaks.reset();
        self.meters = MeterReadings::default();
        self.last_gr_db = [0.0; 2];
        Ok(())
    }

    /// Ingest one block's parameter snapshot. On error the previous snapshot
    /// stays in force and no state is touched.
    pub fn set_parameters(&mut self, params: CompressorParams) -> Result<()> {
        params.validate()?;

        if params.mode != self.engines[0].mode() {
            // Fresh engines and followers: nothing carries over between topologies.
            let engine = Engine::new(&params, self.sample_rate)?;
            self.engines = [engine; 2];
            self.detector.reset();
        } else {
            for engine in self.engines.iter_mut() {
                engine.configure(&params, self.sample_rate)?;
            }
            // Going unlinked: the second channel starts where the shared one was.
            if self.params.topology.is_linked() && !params.topology.is_linked() {
                self.engines[1] = self.engines[0];
                self.detector.split_linked();
            }
        }

        self.params = params;
        self.apply_smoother_targets();
        Ok(())
    }

    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn meters(&self) -> MeterReadings {
        self.meters
    }

    /// Gain reduction applied to each channel (L/R or M/S) on the last frame.
    pub fn last_gain_reduction_db(&self) -> [f32; 2] {
        self.last_gr_db
    }

    fn apply_smoother_targets(&mut self) {
        self.input_gain
            .set_target(db_to_lin(self.params.input_gain_db));
        self.output_gain
            .set_target(db_to_lin(self.params.output_gain_db));
        self.mix.set_target(self.params.mix.clamp(0.0, 1.0));
    }

    fn snap_smoothers(&mut self) {
        self.input_gain.snap();
        self.output_gain.snap();
        self.mix.snap();
    }

    /// Process one frame and return the output pair.
    #[inline]
    pub fn process_frame(&mut self, frame: AudioFrame) -> (f32, f32) {
        let params = &self.params;
        let input_gain = self.input_gain.next();
        let output_gain = self.output_gain.next();
        let mix = self.mix.next();

        let dry_l = frame.left;
        let dry_r = frame.right;

        let l = params.pre_saturation.process(dry_l * input_gain);
        let r = params.pre_saturation.process(dry_r * input_gain);
        let (sc_l, sc_r) = frame.sidechain.unwrap_or((l, r));

        let mid_side = params.topology.is_mid_side();
        let (a, b) = if mid_side {
            encode_mid_side(l, r)
        } else {
            (l, r)
        };

        let levels = self
            .detector
            .resolve(params.mode, params.topology, sc_l, sc_r);

        let gr = if params.bypass {
            [0.0; 2]
        } else {
            match levels {
                DetectorLevels::Linked(level) => {
                    let gr = self.engines[0].process(level);
                    [gr, gr]
                }
                DetectorLevels::Independent([level_a, level_b]) => [
                    self.engines[0].process(level_a),
                    self.engines[1].process(level_b),
                ],
            }
        };

        let a = a * db_to_lin(gr[0]);
        let b = b * db_to_lin(gr[1]);
        let (l, r) = if mid_side {
            decode_mid_side(a, b)
        } else {
            (a, b)
        };

        let wet_l = params.post_saturation.process(l) * output_gain;
        let wet_r = params.post_saturation.process(r) * output_gain;
        let out_l = dry_l + (wet_l - dry_l) * mix;
        let out_r = dry_r + (wet_r - dry_r) * mix;

        self.last_gr_db = gr;
        self.update_meters(gr[0].min(gr[1]), dry_l, dry_r, out_l, out_r);

        (out_l, out_r)
    }

    #[inline]
    fn update_meters(&mut self, gr_db: f32, in_l: f32, in_r: f32, out_l: f32, out_r: f32) {
        let in_l = lin_to_db(self.input_peaks.track(0, in_l));
        let in_r = lin_to_db(self.input_peaks.track(1, in_r));
        let out_l = lin_to_db(self.output_peaks.track(0, out_l));
        let out_r = lin_to_db(self.output_peaks.track(1, out_r));

        let m = &mut self.meters;
        smooth_meter(&mut m.gain_reduction_db, gr_db);
        smooth_meter(&mut m.input_l_db, in_l);
        smooth_meter(&mut m.input_r_db, in_r);
        smooth_meter(&mut m.output_l_db, out_l);
        smooth_meter(&mut m.output_r_db, out_r);
    }

    /// Process a block in place. All buffers must share one length; a
    /// mismatch is reported before any sample is touched.
    pub fn process_block(
        &mut self,
        left: &mut [f32],
        right: &mut [f32],
        sidechain: Option<(&[f32], &[f32])>,
    ) -> Result<MeterReadings> {
        let n = left.len();
        // Shortest sidechain channel; equal to n when no sidechain is supplied.
        let sidechain_len = sidechain.map_or(n, |(sc_l, sc_r)| sc_l.len().min(sc_r.len()));
        let sidechain_ok = sidechain.map_or(true, |(sc_l, sc_r)| sc_l.len() == n && sc_r.len() == n);
        if right.len() != n || !sidechain_ok {
            return Err(CompressorError::BlockLengthMismatch {
                left: n,
                right: right.len(),
                sidechain: sidechain_len,
            });
        }

        match sidechain {
            Some((sc_l, sc_r)) => {
                for i in 0..n {
                    let frame = AudioFrame::new(left[i], right[i]).with_sidechain(sc_l[i], sc_r[i]);
                    let (out_l, out_r) = self.process_frame(frame);
                    left[i] = out_l;
                    right[i] = out_r;
                }
            }
            None => {
                for (l, r) in left.iter_mut().zip(right.iter_mut()) {
                    let (out_l, out_r) = self.process_frame(AudioFrame::new(*l, *r));
                    *l = out_l;
                    *r = out_r;
                }
            }
        }

        Ok(self.meters)
    }
}
