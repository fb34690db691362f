//! Vari-Mu (Variable-Mu Tube) Engine
//!
//! # Character
//! - Gain reduction grows with the logarithm of the over-threshold ratio, so the
//!   effective compression ratio keeps rising the harder the stage is driven.
//! - Reacts to the instantaneous detector level. There is no attack/release
//!   state: the tube stage's speed comes from the program table, not from a
//!   follower.
//!
//! # Programs
//! Six fixed programs, gentle (1) to heavy (6). Each fixes the detector
//! threshold and the deepest reduction the stage can reach. Input gain is the
//! intended way to drive the stage into a program's curve.

use super::error::{CompressorError, Result};

const MIN_THRESHOLD_LIN: f32 = 1e-6;

/// Immutable Vari-Mu program: detector threshold (linear) and reduction ceiling (dB).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariMuProgram {
    pub detector_threshold_lin: f32,
    pub max_gr_db: f32,
}

pub const VARI_MU_PROGRAMS: [VariMuProgram; 6] = [
    VariMuProgram {
        detector_threshold_lin: 0.50,
        max_gr_db: 8.0,
    },
    VariMuProgram {
        detector_threshold_lin: 0.35,
        max_gr_db: 12.0,
    },
    VariMuProgram {
        detector_threshold_lin: 0.25,
        max_gr_db: 15.0,
    },
    VariMuProgram {
        detector_threshold_lin: 0.18,
        max_gr_db: 18.0,
    },
    VariMuProgram {
        detector_threshold_lin: 0.12,
        max_gr_db: 20.0,
    },
    VariMuProgram {
        detector_threshold_lin: 0.08,
        max_gr_db: 24.0,
    },
];

/// Gain reduction (dB, <= 0) for a linear detector level.
#[inline]
pub fn vari_mu_gr_db(level_lin: f32, threshold_lin: f32, max_gr_db: f32) -> f32 {
    let level_lin = level_lin.max(0.0);
    let threshold_lin = threshold_lin.max(MIN_THRESHOLD_LIN);

    if level_lin < threshold_lin {
        return 0.0;
    }

    let ratio = level_lin / threshold_lin;
    let factor = (1.0 + (ratio - 1.0)).log10();
    (-max_gr_db * factor).clamp(-max_gr_db, 0.0)
}

/// Vari-Mu stage bound to one program.
#[derive(Debug, Clone, Copy)]
pub struct VariMu {
    program: VariMuProgram,
}

impl VariMu {
    pub fn new(program_index: usize) -> Result<Self> {
        Ok(Self {
            program: Self::lookup(program_index)?,
        })
    }

    pub fn lookup(program_index: usize) -> Result<VariMuProgram> {
        VARI_MU_PROGRAMS
            .get(program_index)
            .copied()
            .ok_or(CompressorError::UnknownProgram(program_index))
    }

    /// Switch program. Indices are validated with the parameter snapshot.
    pub fn set_program(&mut self, program: VariMuProgram) {
        self.program = program;
    }

    #[inline]
    pub fn process(&mut self, level_lin: f32) -> f32 {
        vari_mu_gr_db(
            level_lin,
            self.program.detector_threshold_lin,
            self.program.max_gr_db,
        )
    }

    pub fn max_gr_db(&self) -> f32 {
        self.program.max_gr_db
    }
}
