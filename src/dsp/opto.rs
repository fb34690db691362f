//! Opto-Electrical Engine
//!
//! # Character
//! - The detector drives a "light" level in [0, 1]; the photocell resistance
//!   follows the light with a lag, and gain reduction follows a soft power law
//!   of that light level.
//! - The attack step runs every sample. When the light is above the target a
//!   release step follows: fast while the cell is brightly lit, a long tail
//!   once it has dimmed below the transition level.
//! - The reduction itself is de-clicked by a fixed one-pole on the output.
//!
//! # Lifecycle
//! - `set_times`/`set_threshold` update the cell without touching the light
//!   state. A fresh cell starts dark (no reduction).

use super::utils::{time_constant_coeff, update_env};

/// Light-to-reduction exponent.
pub const OPTO_LIGHT_EXPONENT: f32 = 0.8;
/// Fixed per-sample smoothing applied to the reduction output.
pub const OPTO_DECLICK_COEFF: f32 = 0.01;
/// Light level separating the fast and slow release stages.
pub const OPTO_RELEASE_TRANSITION: f32 = 0.5;
/// Slow release tail (ms). A property of the cell, not of the release control.
pub const OPTO_SLOW_RELEASE_MS: f32 = 1500.0;

pub const OPTO_DEFAULT_ATTACK_MS: f32 = 10.0;
pub const OPTO_DEFAULT_RELEASE_MS: f32 = 60.0;

const MIN_THRESHOLD_LIN: f32 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct OptoCell {
    current_light_level: f32,
    gr_smooth_current: f32,

    attack_coeff: f32,
    release_coeff_fast: f32,
    release_coeff_slow: f32,
    release_transition_level: f32,

    threshold_lin: f32,
    max_gr_db: f32,
}

impl OptoCell {
    pub fn new(sample_rate: f32) -> Self {
        let mut cell = Self {
            current_light_level: 0.0,
            gr_smooth_current: 0.0,
            attack_coeff: 1.0,
            release_coeff_fast: 1.0,
            release_coeff_slow: 1.0,
            release_transition_level: OPTO_RELEASE_TRANSITION,
            threshold_lin: 0.25,
            max_gr_db: 20.0,
        };
        cell.set_times(OPTO_DEFAULT_ATTACK_MS, OPTO_DEFAULT_RELEASE_MS, sample_rate);
        cell
    }

    /// Update cell timing. `release_ms` sets the fast stage only.
    pub fn set_times(&mut self, attack_ms: f32, release_ms: f32, sample_rate: f32) {
        self.attack_coeff = time_constant_coeff(attack_ms, sample_rate);
        self.release_coeff_fast = time_constant_coeff(release_ms, sample_rate);
        self.release_coeff_slow = time_constant_coeff(OPTO_SLOW_RELEASE_MS, sample_rate);
    }

    pub fn set_threshold(&mut self, threshold_lin: f32, max_gr_db: f32) {
        self.threshold_lin = threshold_lin.max(MIN_THRESHOLD_LIN);
        self.max_gr_db = max_gr_db.max(0.0);
        self.gr_smooth_current = self.gr_smooth_current.clamp(-self.max_gr_db, 0.0);
    }

    /// Advance the cell by one sample and return the reduction in dB.
    #[inline]
    pub fn process(&mut self, level_lin: f32) -> f32 {
        let target = (level_lin.max(0.0) / self.threshold_lin).clamp(0.0, 1.0);

        self.current_light_level += (target - self.current_light_level) * self.attack_coeff;

        let release_coeff = if self.current_light_level > self.release_transition_level {
            self.release_coeff_fast
        } else {
            self.release_coeff_slow
        };
        // Rising coefficient 0: the release step only ever dims the cell.
        self.current_light_level =
            update_env(self.current_light_level, target, 0.0, release_coeff).clamp(0.0, 1.0);

        let factor = self.current_light_level.powf(OPTO_LIGHT_EXPONENT);
        let raw_gr_db = -self.max_gr_db * factor;

        self.gr_smooth_current += (raw_gr_db - self.gr_smooth_current) * OPTO_DECLICK_COEFF;
        self.gr_smooth_current = self.gr_smooth_current.clamp(-self.max_gr_db, 0.0);
        self.gr_smooth_current
    }

    pub fn light_level(&self) -> f32 {
        self.current_light_level
    }
}
