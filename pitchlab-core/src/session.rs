//! # Analysis Session Module
//!
//! Per-tick driver for the estimator and the note mapper. The host calls
//! [`AnalysisSession::tick`] at most once per tick with the newest frame it
//! has, or with `None` when no new frame arrived. Nothing is queued between
//! ticks.

use crossbeam_channel::Receiver;
use log::debug;
use serde::Serialize;

use crate::config::TunerConfig;
use crate::error::PitchResult;
use crate::pitch;
use crate::readout::ReadoutFilter;
use crate::tuning::{self, NoteInfo};

/// What the cents readout is measured against.
#[derive(Debug, Clone, PartialEq)]
pub enum TuningMode {
    /// Deviation from whichever semitone is nearest.
    Auto,
    /// Deviation from one fixed note.
    Target {
        midi: i32,
        note_name: String,
        target_freq: f32,
    },
}

impl TuningMode {
    /// Target mode for a MIDI note number.
    pub fn target(midi: i32) -> Self {
        TuningMode::Target {
            midi,
            note_name: tuning::note_info_for_midi(midi).note,
            target_freq: tuning::frequency_for_midi(midi),
        }
    }
}

/// Result of one tick, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    /// This tick's raw estimate, before the plausibility filter.
    pub estimate: Option<f32>,
    /// Frequency on display (held across dropouts).
    pub frequency: Option<f32>,
    /// Note nearest to the displayed frequency.
    pub note: NoteInfo,
    /// Deviation from the target note, in target mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_cents: Option<f32>,
}

/// Estimator, readout filter and tuning mode for one capture session.
#[derive(Debug, Clone)]
pub struct AnalysisSession {
    config: TunerConfig,
    sample_rate: u32,
    filter: ReadoutFilter,
    mode: TuningMode,
}

impl AnalysisSession {
    /// Starts a session for frames captured at `sample_rate`.
    pub fn new(config: TunerConfig, sample_rate: u32) -> Self {
        let filter = ReadoutFilter::new(config.min_display_hz, config.max_display_hz);
        Self {
            config,
            sample_rate,
            filter,
            mode: TuningMode::Auto,
        }
    }

    pub fn config(&self) -> &TunerConfig {
        &self.config
    }

    pub fn mode(&self) -> &TuningMode {
        &self.mode
    }

    pub fn set_mode(&mut self, mode: TuningMode) {
        debug!("[SESSION] Tuning mode -> {mode:?}");
        self.mode = mode;
    }

    /// Changes the noise gate; takes effect on the next tick.
    pub fn set_noise_gate(&mut self, gate_db: f32) {
        self.config.noise_gate_db = gate_db;
    }

    /// Runs one analysis tick.
    ///
    /// # Arguments
    /// * `frame` - Newest captured frame, or `None` if nothing new arrived
    ///
    /// # Returns
    /// * `Ok(readout)` - Display values for this tick
    /// * `Err(e)` - The frame or the session settings are malformed
    pub fn tick(&mut self, frame: Option<&[u8]>) -> PitchResult<Readout> {
        let estimate = match frame {
            Some(buffer) => pitch::estimate_with(
                buffer,
                self.sample_rate,
                self.config.noise_gate_db,
                self.config.autocorrelation,
            )?,
            None => None,
        };
        let frequency = self.filter.update(estimate);
        Ok(self.readout(estimate, frequency))
    }

    fn readout(&self, estimate: Option<f32>, frequency: Option<f32>) -> Readout {
        let note = frequency.map_or_else(NoteInfo::none, tuning::get_note_info);
        let target_cents = match (&self.mode, frequency) {
            (TuningMode::Target { target_freq, .. }, Some(f)) => {
                Some(tuning::cents_between(f, *target_freq))
            }
            _ => None,
        };
        Readout {
            estimate,
            frequency,
            note,
            target_cents,
        }
    }
}

/// Takes the newest pending frame and discards any older ones.
pub fn latest_frame<T>(frames: &Receiver<T>) -> Option<T> {
    frames.try_iter().last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::to_byte_sample;
    use std::f32::consts::TAU;

    fn sine_frame(frequency: f32, sample_rate: u32) -> Vec<u8> {
        (0..2048)
            .map(|i| {
                let phase = TAU * frequency * i as f32 / sample_rate as f32;
                to_byte_sample(0.6 * phase.sin())
            })
            .collect()
    }

    #[test]
    fn tick_labels_a_sine() {
        let mut session = AnalysisSession::new(TunerConfig::default(), 44100);
        let frame = sine_frame(440.0, 44100);
        let readout = session.tick(Some(frame.as_slice())).unwrap();
        assert!(readout.estimate.is_some());
        assert_eq!(readout.note.note, "A4");
        assert_eq!(readout.target_cents, None);
    }

    #[test]
    fn silence_keeps_previous_value() {
        let mut session = AnalysisSession::new(TunerConfig::default(), 44100);
        let frame = sine_frame(220.0, 44100);
        let first = session.tick(Some(frame.as_slice())).unwrap();
        let silent = session.tick(Some(&[128u8; 2048][..])).unwrap();
        assert_eq!(silent.estimate, None);
        assert_eq!(silent.frequency, first.frequency);
        assert_eq!(silent.note.note, "A3");

        let idle = session.tick(None).unwrap();
        assert_eq!(idle.frequency, first.frequency);
    }

    #[test]
    fn no_value_before_first_pitch() {
        let mut session = AnalysisSession::new(TunerConfig::default(), 44100);
        let readout = session.tick(Some(&[128u8; 2048][..])).unwrap();
        assert_eq!(readout.frequency, None);
        assert!(readout.note.is_none());
    }

    #[test]
    fn target_mode_measures_against_fixed_note() {
        let mut session = AnalysisSession::new(TunerConfig::default(), 44100);
        session.set_mode(TuningMode::target(69));
        let frame = sine_frame(440.0, 44100);
        let readout = session.tick(Some(frame.as_slice())).unwrap();
        let cents = readout.target_cents.unwrap();
        // Lag quantization at 44.1 kHz puts the estimate within ~2% of 440 Hz.
        assert!(cents.abs() < 35.0, "cents {cents}");

        session.set_mode(TuningMode::target(57));
        let readout = session.tick(None).unwrap();
        assert!((readout.target_cents.unwrap() - 1200.0).abs() < 35.0);
    }

    #[test]
    fn gate_change_applies_next_tick() {
        let mut session = AnalysisSession::new(TunerConfig::default(), 44100);
        session.set_noise_gate(200.0);
        let frame = sine_frame(440.0, 44100);
        let readout = session.tick(Some(frame.as_slice())).unwrap();
        assert_eq!(readout.estimate, None);
    }

    #[test]
    fn only_the_newest_frame_is_analysed() {
        let (tx, rx) = crossbeam_channel::unbounded();
        for i in 0..4u8 {
            tx.send(vec![i]).unwrap();
        }
        assert_eq!(latest_frame(&rx), Some(vec![3]));
        assert_eq!(latest_frame(&rx), None);
    }

    #[test]
    fn empty_frame_is_an_error() {
        let mut session = AnalysisSession::new(TunerConfig::default(), 44100);
        assert!(session.tick(Some(&[0u8; 0][..])).is_err());
    }
}
