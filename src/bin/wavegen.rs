//! Write a test WAV file for the visualizer.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use spectrovis::audio::wavegen::{write_wav_file, WaveSpec, Waveform};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "wavegen")]
#[command(about = "Generate a test WAV file", long_about = None)]
struct Args {
    /// Output file
    #[arg(default_value = "sound.wav")]
    output: PathBuf,

    /// Pure tone at this frequency (Hz) instead of the default chirp
    #[arg(long, value_name = "HZ")]
    freq: Option<f64>,

    /// Length (seconds)
    #[arg(long, value_name = "SECONDS", default_value = "3")]
    duration: f64,

    /// Samples per second
    #[arg(long, value_name = "HZ", default_value = "44100")]
    rate: u32,

    #[arg(long, default_value = "2")]
    channels: u16,

    /// Sample width: 8 or 16
    #[arg(long, value_name = "BITS", default_value = "16")]
    bits: u16,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let spec = WaveSpec {
        waveform: args.freq.map(Waveform::Sine).unwrap_or(Waveform::Synth),
        duration_s: args.duration,
        sample_rate: args.rate,
        channels: args.channels,
        bits_per_sample: args.bits,
    };
    write_wav_file(&args.output, &spec)
        .with_context(|| format!("Failed to write {:?}", args.output))
}
