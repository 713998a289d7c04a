//! Test-signal WAV writer.

use std::io::{Seek, Write};
use std::path::Path;

use log::info;

use crate::error::{Result, VisError};

/// Signal written into the file
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Waveform {
    /// `sin(n/64 + sqrt(n))`: a chirp sweeping up through the spectrum
    Synth,
    /// Pure tone (Hz)
    Sine(f64),
}

impl Waveform {
    /// Amplitude in [-1, 1] of sample `n`
    pub fn sample(&self, n: usize, sample_rate: u32) -> f64 {
        let n = n as f64;
        match self {
            Waveform::Synth => (n / 64.0 + n.sqrt()).sin(),
            Waveform::Sine(freq) => {
                (2.0 * std::f64::consts::PI * freq * n / sample_rate as f64).sin()
            }
        }
    }
}

/// Layout of the generated file
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSpec {
    pub waveform: Waveform,

    /// Length (seconds)
    pub duration_s: f64,

    /// Samples per second
    pub sample_rate: u32,

    /// Every channel carries the same signal
    pub channels: u16,

    /// 8 or 16
    pub bits_per_sample: u16,
}

impl Default for WaveSpec {
    fn default() -> Self {
        Self {
            waveform: Waveform::Synth,
            duration_s: 3.0,
            sample_rate: 44100,
            channels: 2,
            bits_per_sample: 16,
        }
    }
}

impl WaveSpec {
    pub fn frames(&self) -> usize {
        (self.duration_s * self.sample_rate as f64).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        if !self.duration_s.is_finite() || self.duration_s <= 0.0 {
            return Err(VisError::config("duration must be positive"));
        }
        if self.sample_rate == 0 {
            return Err(VisError::config("sample rate must be > 0"));
        }
        if self.channels == 0 {
            return Err(VisError::config("channel count must be > 0"));
        }
        if !matches!(self.bits_per_sample, 8 | 16) {
            return Err(VisError::config(format!(
                "sample width must be 8 or 16 bits, got {}",
                self.bits_per_sample
            )));
        }
        if let Waveform::Sine(freq) = self.waveform {
            if !freq.is_finite() || freq <= 0.0 {
                return Err(VisError::config("tone frequency must be positive"));
            }
        }
        Ok(())
    }

    fn hound_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

/// Write the signal to any seekable writer
pub fn write_wav<W: Write + Seek>(writer: W, spec: &WaveSpec) -> Result<()> {
    spec.validate()?;
    let mut wav = hound::WavWriter::new(writer, spec.hound_spec()).map_err(wav_error)?;

    for n in 0..spec.frames() {
        let amplitude = spec.waveform.sample(n, spec.sample_rate).clamp(-1.0, 1.0);
        for _ in 0..spec.channels {
            let written = if spec.bits_per_sample == 8 {
                wav.write_sample((amplitude * 127.5).floor().clamp(-128.0, 127.0) as i8)
            } else {
                wav.write_sample((amplitude * 32767.5).floor().clamp(-32768.0, 32767.0) as i16)
            };
            written.map_err(wav_error)?;
        }
    }

    wav.finalize().map_err(wav_error)
}

/// Write the signal to `path`, replacing any existing file
pub fn write_wav_file(path: impl AsRef<Path>, spec: &WaveSpec) -> Result<()> {
    let path = path.as_ref();
    let file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write_wav(file, spec)?;
    info!(
        "Wrote {:?}: {:?}, {}s @ {}Hz, {} channels, {}-bit",
        path, spec.waveform, spec.duration_s, spec.sample_rate, spec.channels, spec.bits_per_sample
    );
    Ok(())
}

fn wav_error(e: hound::Error) -> VisError {
    match e {
        hound::Error::IoError(io) => VisError::Io(io),
        other => VisError::config(format!("WAV encoding failed: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{BufferedAudio, FiniteSource, SampleSource};
    use std::io::Cursor;

    fn encode(spec: &WaveSpec) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        write_wav(&mut cursor, spec).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn synth_starts_silent() {
        assert_eq!(Waveform::Synth.sample(0, 44100), 0.0);
        assert!((Waveform::Synth.sample(64, 44100) - (1.0f64 + 8.0).sin()).abs() < 1e-12);
    }

    #[test]
    fn written_file_reads_back() {
        let spec = WaveSpec {
            waveform: Waveform::Sine(440.0),
            duration_s: 0.5,
            sample_rate: 8000,
            channels: 2,
            bits_per_sample: 16,
        };
        let audio = BufferedAudio::from_wav_reader(Cursor::new(encode(&spec))).unwrap();
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.len(), 4000);
        let peak = audio.samples().iter().fold(0.0f32, |a, s| a.max(s.abs()));
        assert!(peak > 0.99 && peak <= 1.0, "peak {}", peak);
    }

    #[test]
    fn eight_bit_round_trips_sign() {
        let spec = WaveSpec {
            waveform: Waveform::Sine(1000.0),
            duration_s: 0.01,
            sample_rate: 8000,
            channels: 1,
            bits_per_sample: 8,
        };
        let audio = BufferedAudio::from_wav_reader(Cursor::new(encode(&spec))).unwrap();
        // Quarter period in: sin = 1
        assert!(audio.samples()[2] > 0.9);
        assert!(audio.samples()[6] < -0.9);
    }

    #[test]
    fn rejects_unsupported_width() {
        let spec = WaveSpec {
            bits_per_sample: 24,
            ..WaveSpec::default()
        };
        assert!(matches!(
            write_wav(Cursor::new(Vec::new()), &spec),
            Err(VisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn writes_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav_file(&path, &WaveSpec::default()).unwrap();
        let audio = BufferedAudio::read_wav(&path).unwrap();
        assert_eq!(audio.len(), 132300);
    }
}
