//! One-pole parameter smoothing.
//!
//! Gains and mix arrive once per block; ramping them per sample keeps block
//! boundaries free of zipper noise.

use super::utils::time_constant_coeff;

#[derive(Debug, Clone, Copy)]
pub struct SmoothedParam {
    current: f32,
    target: f32,
    coeff: f32,
}

impl SmoothedParam {
    /// `ramp_ms` is one time constant (~63% of the way to the target).
    pub fn new(initial: f32, ramp_ms: f32, sample_rate: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            coeff: time_constant_coeff(ramp_ms, sample_rate),
        }
    }

    pub fn set_target(&mut self, target: f32) {
        self.target = target;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        self.current += self.coeff * (self.target - self.current);
        self.current
    }

    /// Snap to the target (reset / first block).
    pub fn snap(&mut self) {
        self.current = self.target;
    }

    pub fn set_ramp(&mut self, ramp_ms: f32, sample_rate: f32) {
        self.coeff = time_constant_coeff(ramp_ms, sample_rate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snap() {
        let mut p = SmoothedParam::new(0.0, 10.0, 44100.0);
        p.set_target(1.0);
        p.snap();
        assert_eq!(p.next(), 1.0);
    }

    #[test]
    fn test_ramps_toward_target() {
        let mut p = SmoothedParam::new(0.0, 10.0, 44100.0);
        p.set_target(1.0);
        let first = p.next();
        assert!(first > 0.0 && first < 0.1);
        for _ in 0..44100 {
            p.next();
        }
        assert!((p.next() - 1.0).abs() < 1e-6);
    }
}
