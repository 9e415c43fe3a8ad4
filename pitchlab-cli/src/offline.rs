//! # Offline Analysis Module
//!
//! Runs the tuner over a WAV file frame by frame, the same way the live
//! loop runs it over captured audio.

use anyhow::{Context, Result};
use pitchlab_core::audio::FrameAssembler;
use pitchlab_core::{AnalysisSession, Readout, TunerConfig};
use serde::Serialize;
use std::path::Path;

/// Readout for one frame of a file.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    /// Start of the frame in seconds.
    pub time: f32,
    #[serde(flatten)]
    pub readout: Readout,
}

/// Reads a WAV file into interleaved floats in [-1, 1].
///
/// # Returns
/// * `Ok((samples, sample_rate, channels))`
pub fn read_wav(path: &Path) -> Result<(Vec<f32>, u32, usize)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    let samples = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    Ok((samples, spec.sample_rate, spec.channels as usize))
}

/// Splits interleaved audio into frames and analyses each one in order.
///
/// A trailing partial frame is ignored.
pub fn analyze_samples(
    samples: &[f32],
    sample_rate: u32,
    channels: usize,
    config: &TunerConfig,
) -> Result<Vec<FrameReport>> {
    let mut frames = Vec::new();
    let mut assembler = FrameAssembler::new(config.buffer_size, channels);
    assembler.push(samples, |frame| frames.push(frame));

    let mut session = AnalysisSession::new(config.clone(), sample_rate);
    frames
        .iter()
        .enumerate()
        .map(|(index, frame)| -> Result<FrameReport> {
            let readout = session.tick(Some(frame.as_slice()))?;
            Ok(FrameReport {
                time: (index * config.buffer_size) as f32 / sample_rate as f32,
                readout,
            })
        })
        .collect()
}

/// Analyses a WAV file.
pub fn analyze_file(path: &Path, config: &TunerConfig) -> Result<Vec<FrameReport>> {
    let (samples, sample_rate, channels) = read_wav(path)?;
    log::info!(
        "[ANALYZE] {}: {} samples at {} Hz, {} channel(s)",
        path.display(),
        samples.len(),
        sample_rate,
        channels
    );
    analyze_samples(&samples, sample_rate, channels, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn write_tone(path: &Path, frequency: f32, seconds: f32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        let len = (seconds * 44100.0) as usize;
        for i in 0..len {
            let s = 0.5 * (TAU * frequency * i as f32 / 44100.0).sin();
            for _ in 0..channels {
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn analyses_a_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("g3.wav");
        write_tone(&path, 196.0, 0.5, 2);

        let reports = analyze_file(&path, &TunerConfig::default()).unwrap();
        // 22050 samples -> 10 full frames of 2048.
        assert_eq!(reports.len(), 10);
        for report in &reports {
            assert_eq!(report.readout.note.note, "G3");
        }
        assert!((reports[1].time - 2048.0 / 44100.0).abs() < 1e-6);
    }

    #[test]
    fn silence_reports_no_note() {
        let config = TunerConfig::default();
        let reports = analyze_samples(&vec![0.0; 4096], 44100, 1, &config).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(|r| r.readout.frequency.is_none()));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = analyze_file(&dir.path().join("nope.wav"), &TunerConfig::default());
        assert!(result.is_err());
    }
}
