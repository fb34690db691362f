//! VCA Feed-Forward Engine
//!
//! # Character
//! - Clean feed-forward gain computer driven by an RMS-style detector.
//! - Optional quadratic soft knee centred on the threshold.
//! - Same attack/release discipline as the JFET stage, with its own times.

use super::utils::{time_constant_coeff, update_env};

#[derive(Debug, Clone, Copy)]
pub struct VcaStage {
    threshold_db: f32,
    ratio: f32,
    attack_ms: f32,
    release_ms: f32,
    soft_knee: bool,
    knee_width_db: f32,
    sample_rate: f32,
    max_gr_db: f32,

    attack_coeff: f32,
    release_coeff: f32,

    current_gr_db: f32,
}

impl VcaStage {
    pub fn new(sample_rate: f32) -> Self {
        let mut stage = Self {
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 150.0,
            soft_knee: true,
            knee_width_db: 6.0,
            sample_rate,
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
        soft_knee: bool,
        knee_width_db: f32,
        max_gr_db: f32,
    ) {
        self.threshold_db = threshold_db;
        self.ratio = ratio;
        self.attack_ms = attack_ms;
        self.release_ms = release_ms;
        self.soft_knee = soft_knee;
        self.knee_width_db = knee_width_db.max(0.0);
        self.max_gr_db = max_gr_db;
        self.update_coeffs();
    }

    fn update_coeffs(&mut self) {
        self.attack_coeff = time_constant_coeff(self.attack_ms, self.sample_rate);
        self.release_coeff = time_constant_coeff(self.release_ms, self.sample_rate);
    }

    /// Static curve with optional soft knee. Returns reduction in dB (<= 0).
    #[inline]
    pub fn target_gr_db(&self, level_db: f32) -> f32 {
        let over = level_db - self.threshold_db;
        let slope = 1.0 - 1.0 / self.ratio;
        let half = 0.5 * self.knee_width_db;

        if self.soft_knee && over.abs() < half {
            let x = over + half;
            -((x * x) / (2.0 * self.knee_width_db)) * slope
        } else if over > 0.0 {
            -over * slope
        } else {
            0.0
        }
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
}
