//! # Fast Fourier Transform (FFT) Module
//!
//! FFT-based autocorrelation for the pitch estimator. For a block of `n`
//! samples the signal is zero-padded to at least `2n` so the circular
//! correlation computed in the frequency domain equals the linear one.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - Same output layout as [`crate::pitch::autocorrelate`] (lags `0..n`)

use rustfft::{FftPlanner, num_complex::Complex};

/// Computes `c[lag] = Σ x[j]·x[j+lag]` for every lag in `[0, n)` through the power spectrum.
///
/// # Arguments
/// * `samples` - Centered signal
///
/// # Returns
/// * `Vec<f64>` - Autocorrelation, equal to the direct sum up to rounding
pub fn autocorrelate(samples: &[f64]) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }
    let padded_len = (2 * n).next_power_of_two();

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(padded_len);
    let inverse = planner.plan_fft_inverse(padded_len);

    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&sample| Complex { re: sample, im: 0.0 })
        .chain(std::iter::repeat(Complex { re: 0.0, im: 0.0 }))
        .take(padded_len)
        .collect();

    forward.process(&mut buffer);
    power_spectrum(&mut buffer);
    inverse.process(&mut buffer);

    // RustFFT does not normalize the inverse transform.
    let scale = padded_len as f64;
    buffer.iter().take(n).map(|c| c.re / scale).collect()
}

/// Replaces every bin with its squared magnitude.
fn power_spectrum(spectrum: &mut [Complex<f64>]) {
    for bin in spectrum.iter_mut() {
        *bin = Complex {
            re: bin.norm_sqr(),
            im: 0.0,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch;

    #[test]
    fn empty_signal_has_empty_correlation() {
        assert!(autocorrelate(&[]).is_empty());
    }

    #[test]
    fn matches_direct_sum() {
        let samples: Vec<f64> = (0..300)
            .map(|i| ((i as f64) * 0.37).sin() * 0.7 + ((i as f64) * 0.05).cos() * 0.2)
            .collect();
        let direct = pitch::autocorrelate(&samples);
        let fast = autocorrelate(&samples);
        assert_eq!(direct.len(), fast.len());
        for (lag, (a, b)) in direct.iter().zip(&fast).enumerate() {
            assert!((a - b).abs() < 1e-9, "lag {lag}: {a} vs {b}");
        }
    }

    #[test]
    fn single_sample() {
        let c = autocorrelate(&[0.5]);
        assert_eq!(c.len(), 1);
        assert!((c[0] - 0.25).abs() < 1e-12);
    }
}
