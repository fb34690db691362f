pub mod dsp;
pub mod meters;
pub mod presets;

use crate::dsp::{
    CompressorMode, CompressorParams, Processor, SaturationCurve, SaturationStage, StereoMode,
    StereoTopology, VARI_MU_PROGRAMS,
};
use crate::meters::Meters;
use nih_plug::prelude::*;
use std::sync::Arc;

const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

// -----------------------------------------------------------------------------
// PARAMETERS
// -----------------------------------------------------------------------------
#[derive(Params)]
pub struct GregchildParams {
    #[id = "mode"]
    pub mode: EnumParam<CompressorMode>,

    #[id = "stereo_mode"]
    pub stereo_mode: EnumParam<StereoMode>,

    #[id = "ms_linked"]
    pub mid_side_linked: BoolParam,

    /// Vari-Mu program, 1-based as printed on the panel.
    #[id = "vm_program"]
    pub vari_mu_program: IntParam,

    #[id = "threshold"]
    pub threshold: FloatParam,

    #[id = "ratio"]
    pub ratio: FloatParam,

    #[id = "attack"]
    pub attack: FloatParam,

    #[id = "release"]
    pub release: FloatParam,

    #[id = "max_gr"]
    pub max_gain_reduction: FloatParam,

    #[id = "all_buttons"]
    pub all_buttons: BoolParam,

    #[id = "soft_knee"]
    pub soft_knee: BoolParam,

    #[id = "knee_width"]
    pub knee_width: FloatParam,

    #[id = "input_gain"]
    pub input_gain: FloatParam,

    #[id = "output_gain"]
    pub output_gain: FloatParam,

    #[id = "pre_sat"]
    pub pre_saturation: EnumParam<SaturationCurve>,

    #[id = "pre_drive"]
    pub pre_drive: FloatParam,

    #[id = "post_sat"]
    pub post_saturation: EnumParam<SaturationCurve>,

    #[id = "post_drive"]
    pub post_drive: FloatParam,

    #[id = "mix"]
    pub mix: FloatParam,

    #[id = "bypass"]
    pub bypass: BoolParam,
}

// Helper to format values as "50%" for the DAW display
fn format_percent(v: f32) -> String {
    format!("{:.0}%", v * 100.0)
}

// Helper to format gain in dB
fn format_db(v: f32) -> String {
    format!("{:.1} dB", v)
}

fn format_ms(v: f32) -> String {
    if v < 10.0 {
        format!("{:.2} ms", v)
    } else {
        format!("{:.0} ms", v)
    }
}

fn format_ratio(v: f32) -> String {
    format!("{:.1}:1", v)
}

impl Default for GregchildParams {
    fn default() -> Self {
        let defaults = CompressorParams::default();
        Self {
            mode: EnumParam::new("Mode", defaults.mode),
            stereo_mode: EnumParam::new("Stereo", defaults.topology.mode()),
            mid_side_linked: BoolParam::new("M/S Link", true),
            vari_mu_program: IntParam::new(
                "Vari-Mu Program",
                defaults.vari_mu_program as i32 + 1,
                IntRange::Linear {
                    min: 1,
                    max: VARI_MU_PROGRAMS.len() as i32,
                },
            ),

            threshold: FloatParam::new(
                "Threshold",
                defaults.threshold_db,
                FloatRange::Linear {
                    min: -60.0,
                    max: 0.0,
                },
            )
            .with_value_to_string(Arc::new(format_db)),

            ratio: FloatParam::new(
                "Ratio",
                defaults.ratio,
                FloatRange::Skewed {
                    min: 1.0,
                    max: 20.0,
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_value_to_string(Arc::new(format_ratio)),

            attack: FloatParam::new(
                "Attack",
                defaults.attack_ms,
                FloatRange::Skewed {
                    min: 0.0,
                    max: 200.0,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_value_to_string(Arc::new(format_ms)),

            release: FloatParam::new(
                "Release",
                defaults.release_ms,
                FloatRange::Skewed {
                    min: 5.0,
                    max: 3000.0,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_value_to_string(Arc::new(format_ms)),

            max_gain_reduction: FloatParam::new(
                "Max Reduction",
                defaults.max_gr_db,
                FloatRange::Linear {
                    min: 1.0,
                    max: 40.0,
                },
            )
            .with_value_to_string(Arc::new(format_db)),

            all_buttons: BoolParam::new("All Buttons", defaults.all_buttons),
            soft_knee: BoolParam::new("Soft Knee", defaults.soft_knee),

            knee_width: FloatParam::new(
                "Knee Width",
                defaults.knee_width_db,
                FloatRange::Linear {
                    min: 0.0,
                    max: 24.0,
                },
            )
            .with_value_to_string(Arc::new(format_db)),

            input_gain: FloatParam::new(
                "Input Gain",
                defaults.input_gain_db,
                FloatRange::Linear {
                    min: -24.0,
                    max: 24.0,
                },
            )
            .with_value_to_string(Arc::new(format_db)),

            output_gain: FloatParam::new(
                "Output Gain",
                defaults.output_gain_db,
                FloatRange::Linear {
                    min: -24.0,
                    max: 24.0,
                },
            )
            .with_value_to_string(Arc::new(format_db)),

            pre_saturation: EnumParam::new("Drive Curve", defaults.pre_saturation.curve),
            pre_drive: FloatParam::new(
                "Drive",
                defaults.pre_saturation.amount,
                FloatRange::Linear {
                    min: 0.1,
                    max: 10.0,
                },
            ),

            post_saturation: EnumParam::new("Clip Curve", defaults.post_saturation.curve),
            post_drive: FloatParam::new(
                "Clip Drive",
                defaults.post_saturation.amount,
                FloatRange::Linear {
                    min: 0.1,
                    max: 10.0,
                },
            ),

            mix: FloatParam::new("Mix", defaults.mix, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_value_to_string(Arc::new(format_percent)),

            bypass: BoolParam::new("Bypass", defaults.bypass).make_bypass(),
        }
    }
}

impl GregchildParams {
    /// Capture every control once for the coming block.
    pub fn snapshot(&self) -> CompressorParams {
        CompressorParams {
            mode: self.mode.value(),
            topology: StereoTopology::new(self.stereo_mode.value(), self.mid_side_linked.value()),
            vari_mu_program: (self.vari_mu_program.value() - 1).max(0) as usize,
            threshold_db: self.threshold.value(),
            ratio: self.ratio.value(),
            attack_ms: self.attack.value(),
            release_ms: self.release.value(),
            max_gr_db: self.max_gain_reduction.value(),
            all_buttons: self.all_buttons.value(),
            soft_knee: self.soft_knee.value(),
            knee_width_db: self.knee_width.value(),
            input_gain_db: self.input_gain.value(),
            output_gain_db: self.output_gain.value(),
            pre_saturation: SaturationStage::new(
                self.pre_saturation.value(),
                self.pre_drive.value(),
            ),
            post_saturation: SaturationStage::new(
                self.post_saturation.value(),
                self.post_drive.value(),
            ),
            mix: self.mix.value(),
            bypass: self.bypass.value(),
        }
    }
}

// -----------------------------------------------------------------------------
// PLUGIN STRUCT
// -----------------------------------------------------------------------------
struct GregchildPlugin {
    params: Arc<GregchildParams>,
    sample_rate: f32,
    // Built in `initialize` once the host sample rate is known.
    processor: Option<Processor>,
    meters: Arc<Meters>,
}

impl Default for GregchildPlugin {
    fn default() -> Self {
        Self {
            params: Arc::new(GregchildParams::default()),
            sample_rate: DEFAULT_SAMPLE_RATE,
            processor: None,
            meters: Arc::new(Meters::new()),
        }
    }
}

impl Plugin for GregchildPlugin {
    const NAME: &'static str = "Gregchild";
    const VENDOR: &'static str = "Gregchild Developers";
    const URL: &'static str = "";
    const EMAIL: &'static str = "";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[new_nonzero_u32(2)],
            names: PortNames {
                aux_inputs: &["Sidechain"],
                ..PortNames::const_default()
            },
            ..AudioIOLayout::const_default()
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            ..AudioIOLayout::const_default()
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    fn initialize(
        &mut self,
        _audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        self.sample_rate = buffer_config.sample_rate;
        let mut processor = match Processor::new(self.sample_rate) {
            Ok(processor) => processor,
            Err(err) => {
                log::error!("cannot initialize compressor: {}", err);
                return false;
            }
        };
        if let Err(err) = processor.set_parameters(self.params.snapshot()) {
            log::warn!("initial parameters rejected, using defaults: {}", err);
        }
        self.processor = Some(processor);
        self.meters.reset();
        true
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.process_internal(buffer, aux)
        }))
        .unwrap_or(ProcessStatus::Normal)
    }

    fn reset(&mut self) {
        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            if let Some(processor) = self.processor.as_mut() {
                if processor.reset(self.sample_rate).is_err() {
                    nih_debug_assert_failure!("compressor reset with an invalid sample rate");
                }
            }
            self.meters.reset();
        }))
        .ok();
    }
}

impl GregchildPlugin {
    fn process_internal(
        &mut self,
        buffer: &mut Buffer,
        aux: &mut AuxiliaryBuffers,
    ) -> ProcessStatus {
        let Some(processor) = self.processor.as_mut() else {
            return ProcessStatus::Normal;
        };

        // Host params are range-limited, so a rejection here means a bug in
        // `snapshot`. The previous snapshot stays in force.
        if processor.set_parameters(self.params.snapshot()).is_err() {
            nih_debug_assert_failure!("parameter snapshot rejected");
        }

        let sidechain = match aux.inputs.first().map(|sc| sc.as_slice_immutable()) {
            Some([sc_l, sc_r, ..]) => Some((&**sc_l, &**sc_r)),
            Some([sc_mono]) => Some((&**sc_mono, &**sc_mono)),
            _ => None,
        };

        let channels = buffer.as_slice();
        let [left, right, ..] = channels else {
            return ProcessStatus::Normal;
        };

        match processor.process_block(left, right, sidechain) {
            Ok(readings) => self.meters.publish(&readings),
            Err(_) => nih_debug_assert_failure!("sidechain length differs from main buffer"),
        }

        ProcessStatus::Normal
    }
}

impl ClapPlugin for GregchildPlugin {
    const CLAP_ID: &'static str = "com.gregchild.compressor";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("Vari-Mu, Opto, JFET and VCA compressor with stereo/mid-side linking");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Compressor,
        ClapFeature::Stereo,
    ];
}

impl Vst3Plugin for GregchildPlugin {
    const VST3_CLASS_ID: [u8; 16] = *b"GregchildComp001";
    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Dynamics];
}

nih_export_clap!(GregchildPlugin);
nih_export_vst3!(GregchildPlugin);
