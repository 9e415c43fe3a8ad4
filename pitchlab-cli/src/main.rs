//! # Pitchlab - Terminal Tuner
//!
//! Command-line front-end for the pitchlab core: a live microphone tuner,
//! offline WAV analysis, a note lookup and a tone generator.
//!
//! ## Architecture
//! - **Audio callback**: CPAL input stream assembling byte frames
//! - **Main thread**: analysis loop woken by a crossbeam ticker (60 Hz by default)
//! - **Communication**: crossbeam channels; only the newest frame is analysed per tick

mod display;
mod offline;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use cpal::traits::StreamTrait;
use crossbeam_channel::{after, bounded, never, select, tick};
use log::{LevelFilter, info, warn};
use simple_logger::SimpleLogger;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use pitchlab_core::session::latest_frame;
use pitchlab_core::{
    AnalysisSession, Autocorrelation, TunerConfig, TuningMode, audio, get_note_info, tuning,
};

/// Frames the capture callback may queue before it starts dropping them.
const FRAME_QUEUE: usize = 4;

#[derive(Debug, Parser)]
#[command(
    name = "pitchlab",
    version,
    about = "Real-time pitch detection and note mapping"
)]
struct Cli {
    /// JSON config file; flags override its values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Noise gate in dB (0-80 is the usual range)
    #[arg(long, global = true, allow_negative_numbers = true)]
    gate: Option<f32>,

    /// Use FFT autocorrelation instead of the direct sum
    #[arg(long, global = true)]
    fft: bool,

    /// Log debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Live tuner on the default input device
    Listen {
        /// Measure cents against this note (e.g. A4) instead of the nearest one
        #[arg(long)]
        target: Option<String>,
        /// Stop after this many seconds
        #[arg(long, value_parser = parse_seconds)]
        seconds: Option<Duration>,
        /// Print one JSON readout per tick
        #[arg(long)]
        json: bool,
    },
    /// Analyse a WAV file frame by frame
    Analyze {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Show the nearest note for a frequency in Hz
    Note {
        #[arg(allow_negative_numbers = true)]
        frequency: f32,
        #[arg(long)]
        json: bool,
    },
    /// Play a sine tone for each pitch in turn (Hz or note names)
    Tone {
        #[arg(required = true)]
        pitches: Vec<String>,
        /// Seconds per pitch
        #[arg(long, value_parser = parse_seconds, default_value = "2")]
        seconds: Duration,
    },
    /// Write the effective configuration to a file
    InitConfig { path: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    let config = load_config(&cli)?;

    match cli.command {
        Command::Listen {
            target,
            seconds,
            json,
        } => run_listen(config, target.as_deref(), seconds, json),
        Command::Analyze { file, json } => run_analyze(&file, &config, json),
        Command::Note { frequency, json } => run_note(frequency, json),
        Command::Tone { pitches, seconds } => run_tone(&pitches, seconds),
        Command::InitConfig { path } => {
            config
                .save(&path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("[MAIN] Wrote config to {}", path.display());
            Ok(())
        }
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<TunerConfig> {
    let mut config = match &cli.config {
        Some(path) => TunerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => TunerConfig::default(),
    };
    if let Some(gate) = cli.gate {
        config.noise_gate_db = gate;
    }
    if cli.fft {
        config.autocorrelation = Autocorrelation::Fft;
    }
    config.validate()?;
    Ok(config)
}

fn run_listen(
    config: TunerConfig,
    target: Option<&str>,
    seconds: Option<Duration>,
    json: bool,
) -> Result<()> {
    let mode = match target {
        Some(name) => TuningMode::target(
            tuning::midi_from_name(name)
                .ok_or_else(|| anyhow!("unknown note name '{name}'"))?,
        ),
        None => TuningMode::Auto,
    };

    let (frame_tx, frame_rx) = bounded::<Vec<u8>>(FRAME_QUEUE);
    let (stream, sample_rate) =
        audio::start_audio_capture(frame_tx, config.sample_rate, config.buffer_size)
            .context("starting audio capture")?;

    let ticker = tick(config.tick_interval());
    let deadline = match seconds {
        Some(duration) => after(duration),
        None => never(),
    };

    let mut session = AnalysisSession::new(config, sample_rate);
    session.set_mode(mode);
    info!(
        "[MAIN] Listening at {sample_rate} Hz, gate {} dB",
        session.config().noise_gate_db
    );

    let mut stdout = std::io::stdout();
    loop {
        select! {
            recv(ticker) -> _ => {
                let frame = latest_frame(&frame_rx);
                let readout = session.tick(frame.as_deref())?;
                if json {
                    writeln!(stdout, "{}", serde_json::to_string(&readout)?)?;
                } else {
                    write!(stdout, "\r{}", display::format_readout(&readout))?;
                    stdout.flush()?;
                }
            },
            recv(deadline) -> _ => break,
        }
    }
    if !json {
        writeln!(stdout)?;
    }

    if let Err(e) = stream.pause() {
        warn!("[MAIN] Error pausing stream: {e}");
    }
    Ok(())
}

fn run_analyze(file: &Path, config: &TunerConfig, json: bool) -> Result<()> {
    let reports = offline::analyze_file(file, config)?;
    for report in &reports {
        if json {
            println!("{}", serde_json::to_string(report)?);
        } else {
            println!(
                "{:>8.3}s  {}",
                report.time,
                display::format_readout(&report.readout)
            );
        }
    }
    Ok(())
}

fn run_note(frequency: f32, json: bool) -> Result<()> {
    let info = get_note_info(frequency);
    if json {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{frequency} Hz  {}", display::format_note(&info));
    }
    Ok(())
}

fn run_tone(pitches: &[String], seconds: Duration) -> Result<()> {
    let frequencies = pitches
        .iter()
        .map(|p| parse_pitch(p))
        .collect::<Result<Vec<_>>>()?;

    let (frequency_tx, frequency_rx) = crossbeam_channel::unbounded();
    let (stream, sample_rate) = audio::start_tone_output(frequencies[0], frequency_rx)
        .context("starting tone output")?;
    info!("[MAIN] Playing at {sample_rate} Hz");

    for &frequency in &frequencies {
        frequency_tx.send(frequency)?;
        let note = get_note_info(frequency);
        println!("{frequency:.2} Hz  {}", display::format_note(&note));
        thread::sleep(seconds);
    }

    if let Err(e) = stream.pause() {
        warn!("[MAIN] Error pausing stream: {e}");
    }
    Ok(())
}

/// Parses a non-negative, finite number of seconds.
fn parse_seconds(text: &str) -> Result<Duration, String> {
    let seconds = text.parse::<f64>().map_err(|e| e.to_string())?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|_| format!("'{text}' is not a usable number of seconds"))
}

/// Accepts either a frequency in Hz ("440", "261.6") or a note name ("A4", "C#3").
fn parse_pitch(text: &str) -> Result<f32> {
    if let Ok(frequency) = text.parse::<f32>() {
        if frequency.is_finite() && frequency > 0.0 {
            return Ok(frequency);
        }
        bail!("frequency must be positive, got {text}");
    }
    tuning::midi_from_name(text)
        .map(tuning::frequency_for_midi)
        .ok_or_else(|| anyhow!("'{text}' is neither a frequency nor a note name"))
}
