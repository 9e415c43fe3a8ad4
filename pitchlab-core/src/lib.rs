// pitchlab-core/src/lib.rs

//! The core logic for the pitchlab tuner.
//! This crate estimates the pitch of captured audio frames and maps
//! frequencies to note names. Audio device I/O lives in [`audio`];
//! everything else is headless and contains no UI code.

pub mod audio;
pub mod config;
pub mod error;
pub mod fft;
pub mod pitch;
pub mod readout;
pub mod session;
pub mod tone;
pub mod tuning;

pub use config::TunerConfig;
pub use error::{ConfigError, PitchError, PitchResult};
pub use pitch::{Autocorrelation, estimate, estimate_with};
pub use session::{AnalysisSession, Readout, TuningMode};
pub use tuning::{NoteInfo, get_note_info};
