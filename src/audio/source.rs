//! Sample sources: the audio the pipeline analyzes.
//!
//! A source is either finite and randomly accessible (a decoded file held in
//! memory) or live and pull-based (a capture device). Both deliver mono
//! `f32` samples normalized to [-1, 1].

use std::io::Read;
use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::error::{Result, VisError};

/// Anything that produces samples at a fixed rate
pub trait SampleSource {
    /// Samples per second
    fn sample_rate(&self) -> u32;
}

/// Fully buffered source with random access
pub trait FiniteSource: SampleSource {
    /// Total number of samples
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Samples in `range`, clipped to the end of the source
    fn slice(&self, range: Range<usize>) -> Result<&[f32]>;
}

/// Unbounded source that yields samples as they become available
pub trait LiveSource: SampleSource + Send {
    /// Wait at most `max_wait` for new samples.
    ///
    /// `Ok(None)` means nothing arrived in time; errors are terminal.
    fn pull(&mut self, max_wait: Duration) -> Result<Option<Vec<f32>>>;
}

/// Mono audio held in memory; cheap to clone
#[derive(Debug, Clone)]
pub struct BufferedAudio {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl BufferedAudio {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(VisError::config("sample rate must be > 0"));
        }
        Ok(Self {
            samples: samples.into(),
            sample_rate,
        })
    }

    /// Pure tone of `freq_hz` lasting `seconds`
    pub fn sine(freq_hz: f64, seconds: f64, sample_rate: u32) -> Result<Self> {
        let len = (seconds * sample_rate as f64).round() as usize;
        let step = 2.0 * std::f64::consts::PI * freq_hz / sample_rate as f64;
        let samples = (0..len).map(|n| (step * n as f64).sin() as f32).collect();
        Self::new(samples, sample_rate)
    }

    /// Decode a WAV file, averaging all channels to mono
    pub fn read_wav(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path)
            .map_err(|e| VisError::source_read(format!("cannot open {:?}: {}", path, e)))?;
        let audio = Self::decode(reader)?;
        info!(
            "Audio file loaded: {:?}, {:.2}s @ {}Hz",
            path,
            audio.duration_s(),
            audio.sample_rate
        );
        Ok(audio)
    }

    /// Decode WAV data from any reader
    pub fn from_wav_reader<R: Read>(reader: R) -> Result<Self> {
        let reader = hound::WavReader::new(reader)
            .map_err(|e| VisError::source_read(format!("invalid WAV data: {}", e)))?;
        Self::decode(reader)
    }

    fn decode<R: Read>(mut reader: hound::WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            return Err(VisError::source_read("WAV file declares zero channels"));
        }

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| VisError::source_read(format!("WAV read failed: {}", e)))?,
            hound::SampleFormat::Int => {
                let scale = (1i64 << (spec.bits_per_sample.max(1) - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / scale))
                    .collect::<std::result::Result<_, _>>()
                    .map_err(|e| VisError::source_read(format!("WAV read failed: {}", e)))?
            }
        };

        if interleaved.len() % channels != 0 {
            warn!(
                "WAV data ends with an incomplete frame ({} samples, {} channels); padding with silence",
                interleaved.len(),
                channels
            );
        }

        Self::new(downmix(&interleaved, channels), spec.sample_rate)
    }

    pub fn duration_s(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Shared handle to the sample data
    pub fn shared_samples(&self) -> Arc<[f32]> {
        Arc::clone(&self.samples)
    }
}

impl SampleSource for BufferedAudio {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl FiniteSource for BufferedAudio {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn slice(&self, range: Range<usize>) -> Result<&[f32]> {
        let end = range.end.min(self.samples.len());
        let start = range.start.min(end);
        Ok(&self.samples[start..end])
    }
}

/// Average interleaved frames to mono.
///
/// A trailing partial frame is treated as if the missing channels were
/// silent.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    downmix_map(interleaved, channels, |s| s)
}

pub(crate) fn downmix_map<T: Copy>(
    interleaved: &[T],
    channels: usize,
    convert: impl Fn(T) -> f32,
) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.iter().map(|&s| convert(s)).collect();
    }
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().map(|&s| convert(s)).sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(spec: hound::WavSpec, write: impl FnOnce(&mut hound::WavWriter<&mut Cursor<Vec<u8>>>)) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            write(&mut writer);
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn downmix_averages_channels() {
        assert_eq!(downmix(&[1.0, 0.0, 0.5, 0.5], 2), vec![0.5, 0.5]);
        assert_eq!(downmix(&[0.25, -0.25], 1), vec![0.25, -0.25]);
    }

    #[test]
    fn downmix_pads_partial_frame() {
        assert_eq!(downmix(&[1.0, 1.0, 0.5], 2), vec![1.0, 0.25]);
    }

    #[test]
    fn slice_is_clipped_to_length() {
        let audio = BufferedAudio::new(vec![0.1, 0.2, 0.3], 8000).unwrap();
        assert_eq!(audio.slice(1..10).unwrap(), &[0.2, 0.3]);
        assert!(audio.slice(5..9).unwrap().is_empty());
    }

    #[test]
    fn sine_has_expected_length() {
        let audio = BufferedAudio::sine(440.0, 2.0, 44100).unwrap();
        assert_eq!(audio.len(), 88200);
        assert!((audio.duration_s() - 2.0).abs() < 1e-9);
        assert!(audio.samples().iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn zero_sample_rate_is_invalid() {
        assert!(matches!(
            BufferedAudio::new(vec![0.0], 0),
            Err(VisError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn decodes_stereo_16_bit() {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let bytes = wav_bytes(spec, |w| {
            for (l, r) in [(16384i16, 16384i16), (-32768, 0), (0, 0)] {
                w.write_sample(l).unwrap();
                w.write_sample(r).unwrap();
            }
        });

        let audio = BufferedAudio::from_wav_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(audio.sample_rate(), 22050);
        assert_eq!(audio.samples(), &[0.5, -0.5, 0.0]);
    }

    #[test]
    fn decodes_float_mono() {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let bytes = wav_bytes(spec, |w| {
            for s in [0.25f32, -0.75] {
                w.write_sample(s).unwrap();
            }
        });

        let audio = BufferedAudio::from_wav_reader(Cursor::new(bytes)).unwrap();
        assert_eq!(audio.samples(), &[0.25, -0.75]);
    }

    #[test]
    fn garbage_is_a_read_error() {
        let result = BufferedAudio::from_wav_reader(Cursor::new(b"not a wav file".to_vec()));
        assert!(matches!(result, Err(VisError::SourceRead(_))));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = BufferedAudio::read_wav(dir.path().join("missing.wav"));
        assert!(matches!(result, Err(VisError::SourceRead(_))));
    }
}
