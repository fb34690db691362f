//! Gain-reduction engine dispatch.
//!
//! One tagged enum holds exactly one engine state. The pipeline keeps two of
//! them (one per independently detected channel) and dispatches with a
//! `match`; no boxing, no virtual calls.

use nih_plug::prelude::Enum;
use serde::{Deserialize, Serialize};

use super::error::{CompressorError, Result};
use super::jfet::JfetStage;
use super::opto::OptoCell;
use super::params::CompressorParams;
use super::utils::db_to_lin;
use super::vari_mu::VariMu;
use super::vca::VcaStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[repr(usize)]
pub enum CompressorMode {
    #[serde(rename = "VariMu")]
    #[name = "Vari-Mu"]
    VariMu,
    #[serde(rename = "Opto")]
    #[name = "Opto"]
    Opto,
    #[serde(rename = "Jfet")]
    #[name = "JFET"]
    Jfet,
    #[serde(rename = "Vca")]
    #[name = "VCA"]
    Vca,
}

impl CompressorMode {
    pub fn name(&self) -> &'static str {
        match self {
            CompressorMode::VariMu => "Vari-Mu",
            CompressorMode::Opto => "Opto",
            CompressorMode::Jfet => "JFET",
            CompressorMode::Vca => "VCA",
        }
    }
}

impl Default for CompressorMode {
    fn default() -> Self {
        CompressorMode::Vca
    }
}

impl TryFrom<usize> for CompressorMode {
    type Error = CompressorError;

    fn try_from(index: usize) -> Result<Self> {
        match index {
            0 => Ok(CompressorMode::VariMu),
            1 => Ok(CompressorMode::Opto),
            2 => Ok(CompressorMode::Jfet),
            3 => Ok(CompressorMode::Vca),
            _ => Err(CompressorError::UnknownMode(index)),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Engine {
    VariMu(VariMu),
    Opto(OptoCell),
    Jfet(JfetStage),
    Vca(VcaStage),
}

impl Engine {
    /// Build a freshly reset engine for `params.mode`.
    pub fn new(params: &CompressorParams, sample_rate: f32) -> Result<Self> {
        let mut engine = match params.mode {
            CompressorMode::VariMu => Engine::VariMu(VariMu::new(params.vari_mu_program)?),
            CompressorMode::Opto => Engine::Opto(OptoCell::new(sample_rate)),
            CompressorMode::Jfet => Engine::Jfet(JfetStage::new(sample_rate)),
            CompressorMode::Vca => Engine::Vca(VcaStage::new(sample_rate)),
        };
        engine.configure(params, sample_rate)?;
        Ok(engine)
    }

    pub fn mode(&self) -> CompressorMode {
        match self {
            Engine::VariMu(_) => CompressorMode::VariMu,
            Engine::Opto(_) => CompressorMode::Opto,
            Engine::Jfet(_) => CompressorMode::Jfet,
            Engine::Vca(_) => CompressorMode::Vca,
        }
    }

    /// Push new settings into the engine without disturbing its state.
    pub fn configure(&mut self, params: &CompressorParams, sample_rate: f32) -> Result<()> {
        match self {
            Engine::VariMu(stage) => stage.set_program(VariMu::lookup(params.vari_mu_program)?),
            Engine::Opto(cell) => {
                cell.set_times(params.attack_ms, params.release_ms, sample_rate);
                cell.set_threshold(db_to_lin(params.threshold_db), params.max_gr_db);
            }
            Engine::Jfet(stage) => stage.configure(
                params.threshold_db,
                params.ratio,
                params.attack_ms,
                params.release_ms,
                params.all_buttons,
                params.max_gr_db,
            ),
            Engine::Vca(stage) => stage.configure(
                params.threshold_db,
                params.ratio,
                params.attack_ms,
                params.release_ms,
                params.soft_knee,
                params.knee_width_db,
                params.max_gr_db,
            ),
        }
        Ok(())
    }

    /// Gain reduction in dB for a detector reading in this engine's unit
    /// (linear for Vari-Mu/Opto, dB for JFET/VCA).
    #[inline]
    pub fn process(&mut self, level: f32) -> f32 {
        match self {
            Engine::VariMu(stage) => stage.process(level),
            Engine::Opto(cell) => cell.process(level),
            Engine::Jfet(stage) => stage.process(level),
            Engine::Vca(stage) => stage.process(level),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_matches_mode() {
        for mode in [
            CompressorMode::VariMu,
            CompressorMode::Opto,
            CompressorMode::Jfet,
            CompressorMode::Vca,
        ] {
            let params = CompressorParams {
                mode,
                ..CompressorParams::default()
            };
            let engine = Engine::new(&params, 48000.0).expect("valid params");
            assert_eq!(engine.mode(), mode);
        }
    }

    #[test]
    fn test_mode_from_index() {
        assert_eq!(CompressorMode::try_from(2).ok(), Some(CompressorMode::Jfet));
        assert_eq!(
            CompressorMode::try_from(4).err(),
            Some(CompressorError::UnknownMode(4))
        );
    }

    #[test]
    fn test_every_engine_respects_bounds() {
        let levels = [0.0f32, 0.01, 0.5, 1.0, 8.0, -120.0, -20.0, 0.0, 12.0];
        for mode in [
            CompressorMode::VariMu,
            CompressorMode::Opto,
            CompressorMode::Jfet,
            CompressorMode::Vca,
        ] {
            let params = CompressorParams {
                mode,
                threshold_db: -30.0,
                ratio: 10.0,
                attack_ms: 0.0,
                max_gr_db: 18.0,
                ..CompressorParams::default()
            };
            let mut engine = Engine::new(&params, 48000.0).expect("valid params");
            let bound = match engine {
                Engine::VariMu(stage) => stage.max_gr_db(),
                _ => params.max_gr_db,
            };
            for _ in 0..2000 {
                for &level in &levels {
                    let gr = engine.process(level);
                    assert!(gr <= 0.0 && gr >= -bound, "{mode:?}: {gr}");
                }
            }
        }
    }
}
