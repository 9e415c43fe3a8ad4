//! Error types for the pitchlab core.

use thiserror::Error;

/// Result type for pitch estimation.
pub type PitchResult<T> = Result<T, PitchError>;

/// Malformed input handed to the estimator.
///
/// Silence and unvoiced frames are not errors; they come back as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PitchError {
    /// The sample buffer has no samples.
    #[error("sample buffer is empty")]
    EmptyBuffer,

    /// The sample rate is zero.
    #[error("invalid sample rate: {rate} Hz")]
    InvalidSampleRate {
        /// The rejected sample rate.
        rate: u32,
    },

    /// The noise gate is NaN.
    #[error("noise gate must be a number, got {gate_db}")]
    InvalidNoiseGate {
        /// The rejected gate value.
        gate_db: f32,
    },
}

/// Errors raised while loading, saving or validating a [`crate::config::TunerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds a value the tuner cannot run with.
    #[error("invalid config field '{field}': {message}")]
    InvalidField {
        /// Field name as it appears in the config file.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Reading or writing the config file failed.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for this schema.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
