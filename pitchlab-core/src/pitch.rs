//! # Pitch Detection Module
//!
//! This module estimates the fundamental frequency of a block of 8-bit
//! time-domain samples using plain autocorrelation.
//!
//! ## Features
//! - Loudness gate in a calibrated decibel scale (silence is rejected before any correlation work)
//! - Edge trimming to drop loud transients at the block boundaries
//! - Direct O(n²) or FFT-based autocorrelation
//! - Descent-then-peak lag search

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PitchError, PitchResult};
use crate::fft;

/// Offset added to `20·log10(rms)` so that ordinary input lands in 0–100 dB.
pub const GATE_OFFSET_DB: f64 = 100.0;

/// Centered amplitude under which a boundary sample counts as quiet.
pub const TRIM_THRESHOLD: f64 = 0.2;

/// Byte value of a silent sample.
const SILENCE: f64 = 128.0;

/// How the autocorrelation sequence is computed.
///
/// Both strategies produce the same sequence up to floating point rounding,
/// and the lag search on top of them is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Autocorrelation {
    /// Sum of products for every lag. O(n²).
    #[default]
    Direct,
    /// Zero-padded FFT power spectrum, transformed back. O(n log n).
    Fft,
}

/// Converts a raw byte sample into a signed fraction in [-1, 1).
#[inline]
pub fn centered(sample: u8) -> f64 {
    (sample as f64 - SILENCE) / SILENCE
}

/// Estimates the fundamental frequency of `buffer` with direct autocorrelation.
///
/// # Arguments
/// * `buffer` - Time-domain samples, 8-bit, centered at 128
/// * `sample_rate` - Sample rate in Hz
/// * `gate_db` - Noise gate; blocks quieter than this are rejected
///
/// # Returns
/// * `Ok(Some(frequency))` - Estimated frequency in Hz
/// * `Ok(None)` - No pitch (below the gate, or no periodicity found)
/// * `Err(e)` - The buffer, rate or gate is malformed
pub fn estimate(buffer: &[u8], sample_rate: u32, gate_db: f32) -> PitchResult<Option<f32>> {
    estimate_with(buffer, sample_rate, gate_db, Autocorrelation::Direct)
}

/// Same as [`estimate`], with an explicit autocorrelation strategy.
pub fn estimate_with(
    buffer: &[u8],
    sample_rate: u32,
    gate_db: f32,
    method: Autocorrelation,
) -> PitchResult<Option<f32>> {
    if buffer.is_empty() {
        return Err(PitchError::EmptyBuffer);
    }
    if sample_rate == 0 {
        return Err(PitchError::InvalidSampleRate { rate: sample_rate });
    }
    if gate_db.is_nan() {
        return Err(PitchError::InvalidNoiseGate { gate_db });
    }

    // --- Step 1: Loudness gate ---
    let level = loudness_db(buffer);
    if level < gate_db as f64 {
        debug!("level {level:.1} dB below gate {gate_db:.1} dB");
        return Ok(None);
    }

    // --- Step 2: Edge trimming ---
    let samples: Vec<f64> = buffer.iter().copied().map(centered).collect();
    let trimmed = trim_edges(&samples);
    if trimmed.is_empty() {
        return Ok(None);
    }

    // --- Step 3: Autocorrelation ---
    let correlation = match method {
        Autocorrelation::Direct => autocorrelate(trimmed),
        Autocorrelation::Fft => fft::autocorrelate(trimmed),
    };

    // --- Step 4: Descent-then-peak search ---
    let Some(lag) = find_period(&correlation) else {
        debug!("no periodicity in {} trimmed samples", trimmed.len());
        return Ok(None);
    };

    Ok(Some((sample_rate as f64 / lag as f64) as f32))
}

/// Loudness of a byte buffer in the gate's decibel scale: `20·log10(rms) + 100`.
///
/// A silent (or empty) buffer is negative infinity.
pub fn loudness_db(buffer: &[u8]) -> f64 {
    if buffer.is_empty() {
        return f64::NEG_INFINITY;
    }
    let power = buffer
        .iter()
        .map(|&s| {
            let x = centered(s);
            x * x
        })
        .sum::<f64>()
        / buffer.len() as f64;
    20.0 * power.sqrt().log10() + GATE_OFFSET_DB
}

/// Trims loud samples off both ends of the block.
///
/// The new start is the first index in the first half whose magnitude is
/// below [`TRIM_THRESHOLD`], the new end the first such index scanning back
/// from the end through the last half. Missing crossings keep the original
/// boundary. For an odd length both scans include the middle sample. The
/// returned range is half-open.
pub fn trim_edges(samples: &[f64]) -> &[f64] {
    let len = samples.len();
    let half = len.div_ceil(2);

    let start = (0..half)
        .find(|&i| samples[i].abs() < TRIM_THRESHOLD)
        .unwrap_or(0);
    let end = (1..half)
        .map(|i| len - i)
        .find(|&i| samples[i].abs() < TRIM_THRESHOLD)
        .unwrap_or(len);

    samples.get(start..end).unwrap_or(&[])
}

/// Unnormalized autocorrelation `c[lag] = Σ x[j]·x[j+lag]` for every lag in `[0, n)`.
pub fn autocorrelate(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    (0..n)
        .map(|lag| {
            samples[..n - lag]
                .iter()
                .zip(&samples[lag..])
                .map(|(a, b)| a * b)
                .sum()
        })
        .collect()
}

/// Picks the period lag from an autocorrelation sequence.
///
/// Walks forward while the sequence is strictly decreasing to get past the
/// zero-lag peak, then returns the earliest lag holding the maximum of the
/// remainder.
///
/// # Returns
/// * `Some(lag)` - Period in samples (always > 0)
/// * `None` - The sequence falls all the way to its end, or the peak is at lag 0
pub fn find_period(correlation: &[f64]) -> Option<usize> {
    let n = correlation.len();

    let mut descent = 0;
    while descent + 1 < n && correlation[descent] > correlation[descent + 1] {
        descent += 1;
    }
    if descent + 1 >= n {
        return None;
    }

    let mut peak: Option<(usize, f64)> = None;
    for (lag, &value) in correlation.iter().enumerate().skip(descent) {
        if peak.is_none_or(|(_, max)| value > max) {
            peak = Some((lag, value));
        }
    }

    peak.map(|(lag, _)| lag).filter(|&lag| lag > 0)
}
