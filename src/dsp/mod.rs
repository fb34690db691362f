pub mod detector;
pub mod engine;
pub mod error;
pub mod jfet;
pub mod opto;
pub mod params;
pub mod processor;
pub mod saturation;
pub mod smoothing;
pub mod utils;
pub mod vari_mu;
pub mod vca;

pub use detector::{Detector, DetectorLevels, PeakTrackers, StereoMode, StereoTopology};
pub use engine::{CompressorMode, Engine};
pub use error::{CompressorError, Result};
pub use jfet::JfetStage;
pub use opto::OptoCell;
pub use params::{CompressorParams, RawParameters};
pub use processor::{AudioFrame, MeterReadings, Processor};
pub use saturation::{SaturationCurve, SaturationStage};
pub use vari_mu::{VariMu, VariMuProgram, VARI_MU_PROGRAMS};
pub use vca::VcaStage;
