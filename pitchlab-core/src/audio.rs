//! # Audio I/O Module
//!
//! Real-time capture and tone playback using CPAL (Cross-Platform Audio Library).
//! Captured audio is converted into the 8-bit frames the pitch estimator reads
//! and streamed to the analysis thread.
//!
//! ## Features
//! - Automatic input device selection, any channel count (mixed down to mono)
//! - Float to byte conversion matching a browser analyser's time-domain bytes
//! - Fixed-size frame assembly
//! - Sine tone output with live frequency updates

use anyhow::{Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender};
use log::{error, info};

use crate::tone::ToneGenerator;

/// Audio buffer size for processing frames.
///
/// Larger buffers resolve lower pitches but cost more per tick
/// (the direct autocorrelation is quadratic in this size).
pub const BUFFER_SIZE: usize = 2048;

/// Converts a float sample in [-1, 1] into a byte centered at 128.
#[inline]
pub fn to_byte_sample(sample: f32) -> u8 {
    (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8
}

/// Accumulates interleaved float audio into fixed-size mono byte frames.
#[derive(Debug, Clone)]
pub struct FrameAssembler {
    frame_size: usize,
    channels: usize,
    pending: Vec<u8>,
}

impl FrameAssembler {
    pub fn new(frame_size: usize, channels: usize) -> Self {
        Self {
            frame_size: frame_size.max(1),
            channels: channels.max(1),
            pending: Vec::with_capacity(frame_size * 2),
        }
    }

    /// Appends interleaved samples and hands every completed frame to `emit`.
    pub fn push(&mut self, data: &[f32], mut emit: impl FnMut(Vec<u8>)) {
        let channels = self.channels;
        self.pending.extend(
            data.chunks(channels)
                .map(|frame| to_byte_sample(frame.iter().sum::<f32>() / frame.len() as f32)),
        );

        // While we have enough data for a full frame, hand it off.
        while self.pending.len() >= self.frame_size {
            let frame: Vec<u8> = self.pending.drain(..self.frame_size).collect();
            emit(frame);
        }
    }

    /// Samples waiting for the next frame.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Starts audio capture from the default input device.
///
/// # Arguments
/// * `sender` - Channel for completed byte frames
/// * `preferred_rate` - Sample rate to ask the device for, in Hz
/// * `frame_size` - Samples per frame
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Stream handle and the rate actually in use
/// * `Err(e)` - No usable device or format
pub fn start_audio_capture(
    sender: Sender<Vec<u8>>,
    preferred_rate: u32,
    frame_size: usize,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    info!("[AUDIO] Using audio input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = find_supported_config(configs, preferred_rate)
        .ok_or_else(|| anyhow!("No suitable f32 input format found"))?;

    let rate = preferred_rate.clamp(
        supported_config.min_sample_rate().0,
        supported_config.max_sample_rate().0,
    );
    let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
    let sample_rate = config.sample_rate().0;
    let channels = config.channels() as usize;
    let config: cpal::StreamConfig = config.into();

    info!("[AUDIO] Selected sample rate: {sample_rate} Hz, {channels} channel(s)");

    let mut assembler = FrameAssembler::new(frame_size, channels);
    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            // Drop frames if the analysis side is behind; only the newest matters.
            assembler.push(data, |frame| {
                let _ = sender.try_send(frame);
            });
        },
        |err| error!("[AUDIO] An error occurred on the input stream: {err}"),
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Starts a sine tone on the default output device.
///
/// # Arguments
/// * `initial_hz` - Starting frequency
/// * `frequency_rx` - Frequency updates; the newest one wins each callback
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Stream handle and output rate
pub fn start_tone_output(
    initial_hz: f32,
    frequency_rx: Receiver<f32>,
) -> Result<(cpal::Stream, u32)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow!("No output device available"))?;

    info!("[AUDIO] Using audio output device: {}", device.name()?);

    let supported = device.default_output_config()?;
    if supported.sample_format() != cpal::SampleFormat::F32 {
        return Err(anyhow!(
            "Output format {:?} is not supported, f32 required",
            supported.sample_format()
        ));
    }
    let sample_rate = supported.sample_rate().0;
    let channels = supported.channels() as usize;
    let config: cpal::StreamConfig = supported.into();

    let mut generator = ToneGenerator::new(sample_rate);
    generator.set_frequency(initial_hz);

    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            if let Some(frequency) = frequency_rx.try_iter().last() {
                generator.set_frequency(frequency);
            }
            for frame in data.chunks_mut(channels) {
                let sample = generator.next_sample();
                frame.fill(sample);
            }
        },
        |err| error!("[AUDIO] An error occurred on the output stream: {err}"),
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Finds the best supported input configuration for the target sample rate.
///
/// Only 32-bit float formats qualify. Fewer channels win, then the range
/// closest to the target rate.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min = c.min_sample_rate().0;
            let max = c.max_sample_rate().0;
            let distance = if target_rate < min {
                min - target_rate
            } else {
                target_rate.saturating_sub(max)
            };
            (c.channels(), distance)
        })
}
