//! JFET Feedback Engine ("1176-style")
//!
//! # Character
//! - Fast peak-driven gain computer with switchable ratios.
//! - "All buttons in" forces a fixed 20:1 slope above threshold.
//! - Attack applies while reduction deepens, release while it recovers.

use super::utils::{time_constant_coeff, update_env};

/// Slope used when every ratio button is engaged.
pub const ALL_BUTTON_RATIO: f32 = 20.0;

#[derive(Debug, Clone, Copy)]
pub struct JfetStage {
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    sample_rate: f32,
    all_button_mode: bool,
    max_gr_db: f32,

    attack_coeff: f32,
    release_coeff: f32,

    current_gr_db: f32,
}

impl JfetStage {
    pub fn new(sample_rate: f32) -> Self {
        let mut stage = Self {
            threshold_db: -10.0,
            ratio: 4.0,
            attack_ms: 0.8,
            release_ms: 100.0,
            sample_rate,
            all_button_mode: false,
            max_gr_db: 40.0,
            attack_coeff: 1.0,
            release_coeff: 1.0,
            current_gr_db: 0.0,
        };
        stage.update_coeffs();
        stage
    }

    #[allow(clippy::too_many_arguments)]
    pub fn configure(
        &mut self,
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
        all_button_mode: bool,
        max_gr_db: f32,
    ) {
        self.threshold_db = threshold_db;
        self.ratio = ratio;
        self.attack_ms = attack_ms;
        self.release_ms = release_ms;
        self.all_button_mode = all_button_mode;
        self.max_gr_db = max_gr_db;
        self.update_coeffs();
    }

    fn update_coeffs(&mut self) {
        self.attack_coeff = time_constant_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_constant_coeff(self.release_ms, self.sample_rate);
    }

    /// Static gain computer: target reduction for a detector level in dB.
    #[inline]
    pub fn target_gr_db(&self, level_db: f32) -> f32 {
        if level_db <= self.threshold_db {
            return 0.0;
        }
        let ratio = if self.all_button_mode {
            ALL_BUTTON_RATIO
        } else {
            self.ratio
        };
        (self.threshold_db - level_db) / ratio
    }

    #[inline]
    pub fn process(&mut self, level_db: f32) -> f32 {
        let target = self.target_gr_db(level_db);
        // Deeper reduction is the attack direction.
        self.current_gr_db = update_env(
            self.current_gr_db,
            target,
            self.release_coeff,
            self.attack_coeff,
        )
        .min(0.0)
        .max(-self.max_gr_db);
        self.current_gr_db
    }

    pub fn current_gr_db(&self) -> f32 {
        self.current_gr_db
    }
}
