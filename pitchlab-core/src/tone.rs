//! # Tone Generator Module
//!
//! A sine oscillator for playback mode. The frequency is chosen by the user,
//! not by the pitch estimator; the note mapper only labels it.

use log::warn;
use std::f32::consts::TAU;

use crate::tuning::{self, NoteInfo};

/// Default output level, well below full scale.
pub const DEFAULT_AMPLITUDE: f32 = 0.3;

/// Phase-accumulating sine oscillator.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneGenerator {
    sample_rate: f32,
    frequency: f32,
    amplitude: f32,
    phase: f32,
}

impl ToneGenerator {
    /// Creates a silent generator for the given output rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1) as f32,
            frequency: 0.0,
            amplitude: DEFAULT_AMPLITUDE,
            phase: 0.0,
        }
    }

    /// Sets the target frequency. Non-finite or negative values mute the generator.
    pub fn set_frequency(&mut self, frequency: f32) {
        if frequency.is_finite() && frequency >= 0.0 {
            self.frequency = frequency;
        } else {
            warn!("[TONE] Ignoring invalid frequency {frequency}, muting");
            self.frequency = 0.0;
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitude = amplitude.clamp(0.0, 1.0);
    }

    /// Label of the current frequency.
    pub fn note(&self) -> NoteInfo {
        tuning::get_note_info(self.frequency)
    }

    /// Produces the next sample.
    pub fn next_sample(&mut self) -> f32 {
        let sample = self.amplitude * (TAU * self.phase).sin();
        self.phase = (self.phase + self.frequency / self.sample_rate).fract();
        sample
    }

    /// Fills `out` with consecutive samples.
    pub fn render(&mut self, out: &mut [f32]) {
        for sample in out.iter_mut() {
            *sample = self.next_sample();
        }
    }
}
