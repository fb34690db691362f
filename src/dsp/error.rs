use thiserror::Error;

/// Configuration errors surfaced by `Processor::new`, `reset`,
/// `set_parameters` and the block-length check of `process_block`.
///
/// Every variant is `Copy` so rejecting a snapshot on the audio thread
/// never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CompressorError {
    #[error("sample rate must be positive and finite, got {0}")]
    InvalidSampleRate(f32),
    #[error("unknown compressor mode index {0}")]
    UnknownMode(usize),
    #[error("unknown stereo topology index {0}")]
    UnknownTopology(usize),
    #[error("unknown vari-mu program index {0}")]
    UnknownProgram(usize),
    #[error("unknown saturation curve index {0}")]
    UnknownSaturation(usize),
    #[error("ratio must be positive, got {0}")]
    InvalidRatio(f32),
    #[error("{name} must be >= 0 ms, got {value}")]
    InvalidTime { name: &'static str, value: f32 },
    #[error("knee width must be >= 0 dB, got {0}")]
    InvalidKneeWidth(f32),
    #[error("max gain reduction must be positive, got {0}")]
    InvalidMaxGainReduction(f32),
    #[error("parameter {0} is not a finite number")]
    NonFiniteParameter(&'static str),
    #[error("buffer lengths differ: left {left}, right {right}, sidechain {sidechain}")]
    BlockLengthMismatch {
        left: usize,
        right: usize,
        sidechain: usize,
    },
}

pub type Result<T> = std::result::Result<T, CompressorError>;
