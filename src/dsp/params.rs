//! Per-block parameter snapshot.
//!
//! The control side produces one [`CompressorParams`] per block; the audio
//! path never reads individual host values mid-block. Snapshots are validated
//! once, in `Processor::set_parameters`, so nothing invalid reaches the
//! per-sample code.

use serde::{Deserialize, Serialize};

use super::detector::StereoTopology;
use super::engine::CompressorMode;
use super::error::{CompressorError, Result};
use super::saturation::{SaturationCurve, SaturationStage};
use super::vari_mu::VariMu;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorParams {
    pub mode: CompressorMode,
    pub topology: StereoTopology,
    /// Index into the Vari-Mu program table (0..=5).
    pub vari_mu_program: usize,

    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    /// Reduction ceiling for the Opto, JFET and VCA engines.
    /// Vari-Mu takes its ceiling from the selected program.
    pub max_gr_db: f32,
    /// JFET "all buttons in".
    pub all_buttons: bool,

    pub soft_knee: bool,
    pub knee_width_db: f32,

    pub input_gain_db: f32,
    pub output_gain_db: f32,
    pub pre_saturation: SaturationStage,
    pub post_saturation: SaturationStage,
    /// Dry/wet, 0 = dry, 1 = fully compressed.
    pub mix: f32,
    pub bypass: bool,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            mode: CompressorMode::Vca,
            topology: StereoTopology::StereoLink,
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
            pre_saturation: SaturationStage::default(),
            post_saturation: SaturationStage::default(),
            mix: 1.0,
            bypass: false,
        }
    }
}

fn finite(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CompressorError::NonFiniteParameter(name))
    }
}

impl CompressorParams {
    pub fn validate(&self) -> Result<()> {
        finite("threshold_db", self.threshold_db)?;
        finite("ratio", self.ratio)?;
        finite("attack_ms", self.attack_ms)?;
        finite("release_ms", self.release_ms)?;
        finite("max_gr_db", self.max_gr_db)?;
        finite("knee_width_db", self.knee_width_db)?;
        finite("input_gain_db", self.input_gain_db)?;
        finite("output_gain_db", self.output_gain_db)?;
        finite("pre_saturation", self.pre_saturation.amount)?;
        finite("post_saturation", self.post_saturation.amount)?;
        finite("mix", self.mix)?;

        if self.ratio <= 0.0 {
            return Err(CompressorError::InvalidRatio(self.ratio));
        }
        if self.attack_ms < 0.0 {
            return Err(CompressorError::InvalidTime {
                name: "attack",
                value: self.attack_ms,
            });
        }
        if self.release_ms < 0.0 {
            return Err(CompressorError::InvalidTime {
                name: "release",
                value: self.release_ms,
            });
        }
        if self.knee_width_db < 0.0 {
            return Err(CompressorError::InvalidKneeWidth(self.knee_width_db));
        }
        if self.max_gr_db <= 0.0 {
            return Err(CompressorError::InvalidMaxGainReduction(self.max_gr_db));
        }
        VariMu::lookup(self.vari_mu_program)?;
        Ok(())
    }
}

/// Host-style control values: enum selections arrive as plain indices and are
/// only turned into typed values (or rejected) by `TryFrom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawParameters {
    pub compressor_mode: usize,
    pub stereo_topology: usize,
    pub mid_side_linked: bool,
    pub vari_mu_program: usize,
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub max_gr_db: f32,
    pub all_buttons: bool,
    pub soft_knee: bool,
    pub knee_width_db: f32,
    pub input_gain_db: f32,
    pub output_gain_db: f32,
    pub pre_saturation_curve: usize,
    pub pre_saturation_amount: f32,
    pub post_saturation_curve: usize,
    pub post_saturation_amount: f32,
    pub mix: f32,
    pub bypass: bool,
}

impl TryFrom<RawParameters> for CompressorParams {
    type Error = CompressorError;

    fn try_from(raw: RawParameters) -> Result<Self> {
        let params = CompressorParams {
            mode: CompressorMode::try_from(raw.compressor_mode)?,
            topology: StereoTopology::from_index(raw.stereo_topology, raw.mid_side_linked)?,
            vari_mu_program: raw.vari_mu_program,
            threshold_db: raw.threshold_db,
            ratio: raw.ratio,
            attack_ms: raw.attack_ms,
            release_ms: raw.release_ms,
            max_gr_db: raw.max_gr_db,
            all_buttons: raw.all_buttons,
            soft_knee: raw.soft_knee,
            knee_width_db: raw.knee_width_db,
            input_gain_db: raw.input_gain_db,
            output_gain_db: raw.output_gain_db,
            pre_saturation: SaturationStage::new(
                SaturationCurve::try_from(raw.pre_saturation_curve)?,
                raw.pre_saturation_amount,
            ),
            post_saturation: SaturationStage::new(
                SaturationCurve::try_from(raw.post_saturation_curve)?,
                raw.post_saturation_amount,
            ),
            mix: raw.mix,
            bypass: raw.bypass,
        };
        params.validate()?;
        Ok(params)
    }
}
