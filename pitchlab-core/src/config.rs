//! # Configuration Module
//!
//! Tuner settings, loaded from and saved to JSON. Every field has a default,
//! so a config file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::audio::BUFFER_SIZE;
use crate::error::ConfigError;
use crate::pitch::Autocorrelation;
use crate::readout::{MAX_DISPLAY_HZ, MIN_DISPLAY_HZ};

/// Default noise gate in dB.
pub const DEFAULT_NOISE_GATE_DB: f32 = 50.0;

/// Settings shared by the capture stage, the analysis loop and the readout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TunerConfig {
    /// Frames quieter than this are treated as silence.
    pub noise_gate_db: f32,
    /// Samples per analysis frame.
    pub buffer_size: usize,
    /// Preferred capture sample rate in Hz. The device may pick another.
    pub sample_rate: u32,
    /// Analysis ticks per second.
    pub tick_hz: u32,
    /// Lower bound of the readout's plausible range.
    pub min_display_hz: f32,
    /// Upper bound of the readout's plausible range.
    pub max_display_hz: f32,
    /// Correlation strategy: the direct sum, or the FFT for long frames.
    pub autocorrelation: Autocorrelation,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            noise_gate_db: DEFAULT_NOISE_GATE_DB,
            buffer_size: BUFFER_SIZE,
            sample_rate: 44100,
            tick_hz: 60,
            min_display_hz: MIN_DISPLAY_HZ,
            max_display_hz: MAX_DISPLAY_HZ,
            autocorrelation: Autocorrelation::Direct,
        }
    }
}

impl TunerConfig {
    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validates and writes the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Rejects settings the tuner cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.noise_gate_db.is_nan() {
            return Err(invalid("noise_gate_db", "must be a number"));
        }
        if self.buffer_size == 0 {
            return Err(invalid("buffer_size", "must be greater than zero"));
        }
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate", "must be greater than zero"));
        }
        if self.tick_hz == 0 {
            return Err(invalid("tick_hz", "must be greater than zero"));
        }
        if !(self.min_display_hz.is_finite() && self.max_display_hz.is_finite()) {
            return Err(invalid("min_display_hz", "display range must be finite"));
        }
        if self.min_display_hz > self.max_display_hz {
            return Err(ConfigError::InvalidField {
                field: "min_display_hz",
                message: format!(
                    "{} Hz is above max_display_hz {} Hz",
                    self.min_display_hz, self.max_display_hz
                ),
            });
        }
        Ok(())
    }

    /// Time between analysis ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_hz.max(1) as f64)
    }
}

fn invalid(field: &'static str, message: &str) -> ConfigError {
    ConfigError::InvalidField {
        field,
        message: message.to_string(),
    }
}
