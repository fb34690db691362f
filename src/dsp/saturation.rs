//! Tube / Softclip Saturation
//!
//! Stateless waveshapers used around the gain stage:
//! - **Pre** stage: "tube drive" ahead of the detector and gain element.
//! - **Post** stage: output softclip after gain reduction.
//!
//! All curves pass through the origin, are odd-symmetric and safe for the
//! audio thread.

use nih_plug::prelude::Enum;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_2_PI;

use super::error::CompressorError;

/// Input bound for the cubic curve. Beyond this `x - s*x^3/3` folds back.
const CUBIC_CLAMP: f32 = 1.5;

#[inline]
pub fn tanh_saturate(x: f32, drive: f32) -> f32 {
    (x * drive).tanh()
}

/// Cubic soft clipper. The input is clamped to +/-1.5 before shaping.
#[inline]
pub fn cubic_saturate(x: f32, strength: f32) -> f32 {
    let x = x.clamp(-CUBIC_CLAMP, CUBIC_CLAMP);
    x - (strength * x * x * x) / 3.0
}

/// Arctangent clipper, bounded in (-1, 1).
#[inline]
pub fn arctan_saturate(x: f32, drive: f32) -> f32 {
    FRAC_2_PI * (x * drive).atan()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[repr(usize)]
pub enum SaturationCurve {
    #[serde(rename = "Off")]
    #[name = "Off"]
    Off,
    #[serde(rename = "Tanh")]
    #[name = "Tube (Tanh)"]
    Tanh,
    #[serde(rename = "Cubic")]
    #[name = "Soft (Cubic)"]
    Cubic,
    #[serde(rename = "Arctan")]
    #[name = "Hard (Arctan)"]
    Arctan,
}

impl Default for SaturationCurve {
    fn default() -> Self {
        SaturationCurve::Off
    }
}

impl TryFrom<usize> for SaturationCurve {
    type Error = CompressorError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(SaturationCurve::Off),
            1 => Ok(SaturationCurve::Tanh),
            2 => Ok(SaturationCurve::Cubic),
            3 => Ok(SaturationCurve::Arctan),
            _ => Err(CompressorError::UnknownSaturation(index)),
        }
    }
}

/// One saturation stage: a curve plus its drive / strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaturationStage {
    pub curve: SaturationCurve,
    /// Drive for tanh/arctan, strength for cubic.
    pub amount: f32,
}

impl Default for SaturationStage {
    fn default() -> Self {
        Self {
            curve: SaturationCurve::Off,
            amount: 1.0,
        }
    }
}

impl SaturationStage {
    pub const fn new(curve: SaturationCurve, amount: f32) -> Self {
        Self { curve, amount }
    }

    #[inline]
    pub fn process(&self, x: f32) -> f32 {
        match self.curve {
            SaturationCurve::Off => x,
            SaturationCurve::Tanh => tanh_saturate(x, self.amount),
            SaturationCurve::Cubic => cubic_saturate(x, self.amount),
            SaturationCurve::Arctan => arctan_saturate(x, self.amount),
        }
    }
}
