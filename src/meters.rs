//! Thread-safe metering for real-time audio processing.
//!
//! Atomic f32 cells shared between the audio thread (writer) and an editor or
//! host display (reader) without locks. Fields are independent; a reader may
//! see values from two different blocks, which is fine for display.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::dsp::processor::MeterReadings;
use crate::dsp::utils::SILENCE_DB;

/// Thread-safe metering for gain reduction and input/output levels.
pub struct Meters {
    gain_reduction: AtomicU32,
    input_peak_l: AtomicU32,
    input_peak_r: AtomicU32,
    output_peak_l: AtomicU32,
    output_peak_r: AtomicU32,
}

impl Default for Meters {
    fn default() -> Self {
        let meters = Self {
            gain_reduction: AtomicU32::new(0),
            input_peak_l: AtomicU32::new(0),
            input_peak_r: AtomicU32::new(0),
            output_peak_l: AtomicU32::new(0),
            output_peak_r: AtomicU32::new(0),
        };
        meters.reset();
        meters
    }
}

#[inline]
fn store(cell: &AtomicU32, val: f32) {
    cell.store(val.to_bits(), Ordering::Relaxed);
}

#[inline]
fn load(cell: &AtomicU32) -> f32 {
    f32::from_bits(cell.load(Ordering::Relaxed))
}

impl Meters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one block's readings.
    pub fn publish(&self, readings: &MeterReadings) {
        store(&self.gain_reduction, readings.gain_reduction_db);
        store(&self.input_peak_l, readings.input_l_db);
        store(&self.input_peak_r, readings.input_r_db);
        store(&self.output_peak_l, readings.output_l_db);
        store(&self.output_peak_r, readings.output_r_db);
    }

    pub fn reset(&self) {
        self.publish(&MeterReadings::default());
    }

    pub fn snapshot(&self) -> MeterReadings {
        MeterReadings {
            gain_reduction_db: self.get_gain_reduction(),
            input_l_db: self.get_input_peak_l(),
            input_r_db: self.get_input_peak_r(),
            output_l_db: self.get_output_peak_l(),
            output_r_db: self.get_output_peak_r(),
        }
    }

    pub fn get_gain_reduction(&self) -> f32 {
        load(&self.gain_reduction)
    }

    pub fn get_input_peak_l(&self) -> f32 {
        load(&self.input_peak_l)
    }

    pub fn get_input_peak_r(&self) -> f32 {
        load(&self.input_peak_r)
    }

    pub fn get_output_peak_l(&self) -> f32 {
        load(&self.output_peak_l)
    }

    pub fn get_output_peak_r(&self) -> f32 {
        load(&self.output_peak_r)
    }

    /// True when nothing has been published since the last reset.
    pub fn is_silent(&self) -> bool {
        self.get_input_peak_l() <= SILENCE_DB && self.get_input_peak_r() <= SILENCE_DB
    }
}
