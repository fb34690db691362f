//! Detector & Stereo-Topology Resolver
//!
//! Turns one frame of sidechain audio into the detector reading(s) the active
//! engine expects, and decides how many independent readings exist.
//!
//! # Detector units
//! | Engine        | Algorithm                                  | Unit   |
//! |---------------|--------------------------------------------|--------|
//! | JFET          | instant-attack peak, 0.99/sample decay     | dB     |
//! | VCA           | squared-power one-pole, 0.01 / 0.001       | dB     |
//! | Vari-Mu, Opto | instantaneous mean absolute level          | linear |
//!
//! # Topologies
//! - **StereoLink**: one reading from both channels; both channels share it.
//! - **DualMono**: one reading per channel, each with its own follower state.
//! - **MidSide**: the sidechain is encoded to M/S first; linked M/S combines
//!   exactly like StereoLink, unlinked M/S behaves like DualMono on M and S.
//!
//! ## Audio Thread Safety
//! - Fixed-size state, no allocations.

use nih_plug::prelude::Enum;
use serde::{Deserialize, Serialize};

use super::engine::CompressorMode;
use super::error::{CompressorError, Result};
use super::utils::{lin_to_db, update_env};

/// Per-sample decay of the peak trackers.
pub const PEAK_DECAY: f32 = 0.99;
/// Power-envelope step while the power is rising.
pub const RMS_ATTACK_COEFF: f32 = 0.01;
/// Power-envelope step while the power is falling.
pub const RMS_RELEASE_COEFF: f32 = 0.001;

#[inline]
pub fn encode_mid_side(left: f32, right: f32) -> (f32, f32) {
    ((left + right) * 0.5, (left - right) * 0.5)
}

#[inline]
pub fn decode_mid_side(mid: f32, side: f32) -> (f32, f32) {
    (mid + side, mid - side)
}

/// Host-facing stereo selector. Combined with the M/S link switch it yields a
/// [`StereoTopology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Enum)]
#[repr(usize)]
pub enum StereoMode {
    #[serde(rename = "StereoLink")]
    #[name = "Stereo Link"]
    StereoLink,
    #[serde(rename = "DualMono")]
    #[name = "Dual Mono"]
    DualMono,
    #[serde(rename = "MidSide")]
    #[name = "Mid/Side"]
    MidSide,
}

impl TryFrom<usize> for StereoMode {
    type Error = CompressorError;

    fn try_from(index: usize) -> Result<Self> {
        match index {
            0 => Ok(StereoMode::StereoLink),
            1 => Ok(StereoMode::DualMono),
            2 => Ok(StereoMode::MidSide),
            _ => Err(CompressorError::UnknownTopology(index)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StereoTopology {
    StereoLink,
    DualMono,
    MidSide { linked: bool },
}

impl Default for StereoTopology {
    fn default() -> Self {
        StereoTopology::StereoLink
    }
}

impl StereoTopology {
    pub fn new(mode: StereoMode, mid_side_linked: bool) -> Self {
        match mode {
            StereoMode::StereoLink => StereoTopology::StereoLink,
            StereoMode::DualMono => StereoTopology::DualMono,
            StereoMode::MidSide => StereoTopology::MidSide {
                linked: mid_side_linked,
            },
        }
    }

    pub fn from_index(index: usize, mid_side_linked: bool) -> Result<Self> {
        Ok(Self::new(StereoMode::try_from(index)?, mid_side_linked))
    }

    pub fn mode(&self) -> StereoMode {
        match self {
            StereoTopology::StereoLink => StereoMode::StereoLink,
            StereoTopology::DualMono => StereoMode::DualMono,
            StereoTopology::MidSide { .. } => StereoMode::MidSide,
        }
    }

    /// One shared detector (and engine) for both channels.
    #[inline]
    pub fn is_linked(&self) -> bool {
        matches!(
            self,
            StereoTopology::StereoLink | StereoTopology::MidSide { linked: true }
        )
    }

    #[inline]
    pub fn is_mid_side(&self) -> bool {
        matches!(self, StereoTopology::MidSide { .. })
    }
}

/// Detector output for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectorLevels {
    /// One reading feeding both channels.
    Linked(f32),
    /// One reading per channel (L/R or M/S).
    Independent([f32; 2]),
}

/// Last-peak-per-channel trackers with a shared per-sample decay.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeakTrackers {
    peaks: [f32; 2],
}

impl PeakTrackers {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn track(&mut self, channel: usize, sample: f32) -> f32 {
        let peak = &mut self.peaks[channel];
        *peak = (*peak * PEAK_DECAY).max(sample.abs());
        *peak
    }

    pub fn peak(&self, channel: usize) -> f32 {
        self.peaks[channel]
    }

    pub fn reset(&mut self) {
        self.peaks = [0.0; 2];
    }
}

/// Sidechain detector shared by all engines.
/// Slot 0 doubles as the linked follower; slot 1 is only used unlinked.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detector {
    peaks: PeakTrackers,
    power_env: [f32; 2],
}

impl Detector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.peaks.reset();
        self.power_env = [0.0; 2];
    }

    /// Seed the second follower from the linked one when a topology stops
    /// sharing a detector.
    pub fn split_linked(&mut self) {
        self.power_env[1] = self.power_env[0];
    }

    /// Resolve the detector reading(s) for one sidechain frame.
    #[inline]
    pub fn resolve(
        &mut self,
        mode: CompressorMode,
        topology: StereoTopology,
        sidechain_l: f32,
        sidechain_r: f32,
    ) -> DetectorLevels {
        let (a, b) = if topology.is_mid_side() {
            encode_mid_side(sidechain_l, sidechain_r)
        } else {
            (sidechain_l, sidechain_r)
        };

        if topology.is_linked() {
            DetectorLevels::Linked(self.linked(mode, a, b))
        } else {
            DetectorLevels::Independent([self.single(mode, 0, a), self.single(mode, 1, b)])
        }
    }

    #[inline]
    fn linked(&mut self, mode: CompressorMode, a: f32, b: f32) -> f32 {
        match mode {
            CompressorMode::Jfet => {
                let peak_a = self.peaks.track(0, a);
                let peak_b = self.peaks.track(1, b);
                lin_to_db(peak_a.max(peak_b))
            }
            CompressorMode::Vca => {
                let power = (a * a + b * b) * 0.5;
                lin_to_db(self.follow_power(0, power).sqrt())
            }
            CompressorMode::VariMu | CompressorMode::Opto => (a.abs() + b.abs()) * 0.5,
        }
    }

    #[inline]
    fn single(&mut self, mode: CompressorMode, channel: usize, x: f32) -> f32 {
        match mode {
            CompressorMode::Jfet => lin_to_db(self.peaks.track(channel, x)),
            CompressorMode::Vca => lin_to_db(self.follow_power(channel, x * x).sqrt()),
            CompressorMode::VariMu | CompressorMode::Opto => x.abs(),
        }
    }

    #[inline]
    fn follow_power(&mut self, channel: usize, power: f32) -> f32 {
        let env = &mut self.power_env[channel];
        *env = update_env(*env, power, RMS_ATTACK_COEFF, RMS_RELEASE_COEFF).max(0.0);
        *env
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::utils::SILENCE_DB;

    #[test]
    fn test_peak_tracker_instant_attack_and_decay() {
        let mut p = PeakTrackers::new();
        assert_eq!(p.track(0, -0.8), 0.8);
        assert!((p.track(0, 0.0) - 0.8 * PEAK_DECAY).abs() < 1e-7);
        assert_eq!(p.peak(1), 0.0);
    }

    #[test]
    fn test_linked_vari_mu_is_mean_abs() {
        let mut d = Detector::new();
        let levels = d.resolve(CompressorMode::VariMu, StereoTopology::StereoLink, 0.4, -0.2);
        match levels {
            DetectorLevels::Linked(level) => assert!((level - 0.3).abs() < 1e-6),
            other => panic!("expected linked reading, got {other:?}"),
        }
    }

    #[test]
    fn test_linked_jfet_takes_louder_peak() {
        let mut d = Detector::new();
        let levels = d.resolve(CompressorMode::Jfet, StereoTopology::StereoLink, 0.1, -1.0);
        match levels {
            DetectorLevels::Linked(db) => assert!(db.abs() < 1e-5),
            other => panic!("expected linked reading, got {other:?}"),
        }
    }

    #[test]
    fn test_vca_power_envelope_converges() {
        let mut d = Detector::new();
        let mut last = SILENCE_DB;
        for _ in 0..5000 {
            if let DetectorLevels::Linked(db) =
                d.resolve(CompressorMode::Vca, StereoTopology::StereoLink, 0.5, 0.5)
            {
                last = db;
            }
        }
        // sqrt(0.25) = 0.5 -> ~-6.02 dB
        assert!((last + 6.02).abs() < 0.05, "last = {last}");
    }

    #[test]
    fn test_vca_release_is_slower_than_attack() {
        let mut d = Detector::new();
        for _ in 0..100 {
            d.resolve(CompressorMode::Vca, StereoTopology::DualMono, 1.0, 0.0);
        }
        let rise = d.power_env[0];
        for _ in 0..100 {
            d.resolve(CompressorMode::Vca, StereoTopology::DualMono, 0.0, 0.0);
        }
        let fall = rise - d.power_env[0];
        assert!(fall < rise * 0.5);
    }

    #[test]
    fn test_dual_mono_channels_are_independent() {
        let mut d = Detector::new();
        let levels = d.resolve(CompressorMode::Jfet, StereoTopology::DualMono, 1.0, 0.0);
        match levels {
            DetectorLevels::Independent([l, r]) => {
                assert!(l.abs() < 1e-5);
                assert_eq!(r, SILENCE_DB);
            }
            other => panic!("expected independent readings, got {other:?}"),
        }
    }

    #[test]
    fn test_mid_side_unlinked_reads_mid_and_side() {
        let mut d = Detector::new();
        // Mono content: all mid, no side.
        let levels = d.resolve(
            CompressorMode::Opto,
            StereoTopology::MidSide { linked: false },
            0.6,
            0.6,
        );
        assert_eq!(levels, DetectorLevels::Independent([0.6, 0.0]));
    }

    #[test]
    fn test_mid_side_round_trip() {
        let (m, s) = encode_mid_side(0.7, -0.3);
        let (l, r) = decode_mid_side(m, s);
        assert!((l - 0.7).abs() < 1e-6);
        assert!((r + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_topology_from_index() {
        assert_eq!(
            StereoTopology::from_index(2, true).ok(),
            Some(StereoTopology::MidSide { linked: true })
        );
        assert!(StereoTopology::MidSide { linked: true }.is_linked());
        assert!(!StereoTopology::MidSide { linked: false }.is_linked());
        assert_eq!(
            StereoTopology::from_index(3, false).err(),
            Some(CompressorError::UnknownTopology(3))
        );
    }
}
