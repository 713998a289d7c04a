//! Spectrum producer: chunk schedule + FFT analysis as one lazy sequence.

use std::time::Duration;

use super::chunk::{Chunk, FileChunks, LiveChunks};
use super::fft::SpectrumAnalyzer;
use super::source::{FiniteSource, LiveSource};
use crate::error::Result;
use crate::frame::SpectrumFrame;
use crate::params::{AnalysisConfig, PipelineConfig};
use crate::pipeline::{PlaybackClock, StopFlag};

/// Lazily turns scheduled chunks into timestamped spectra.
///
/// The first error from the schedule or the analyzer is yielded once and
/// ends the sequence.
#[derive(Debug)]
pub struct SpectrumProducer<C> {
    chunks: C,
    analyzer: SpectrumAnalyzer,
    failed: bool,
}

impl<C> SpectrumProducer<C>
where
    C: Iterator<Item = Result<Chunk>>,
{
    pub fn new(chunks: C, analyzer: SpectrumAnalyzer) -> Self {
        Self {
            chunks,
            analyzer,
            failed: false,
        }
    }

    pub fn analyzer(&self) -> &SpectrumAnalyzer {
        &self.analyzer
    }
}

impl<S: FiniteSource> SpectrumProducer<FileChunks<S>> {
    /// Frames covering a whole buffered source, timestamps from 0
    pub fn from_finite(source: S, config: &AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let chunks = FileChunks::new(source, config.chunk_duration_s)?;
        let analyzer = SpectrumAnalyzer::new(
            chunks.plan().block_size,
            config.normalization,
            config.window,
        )?;
        Ok(Self::new(chunks, analyzer))
    }
}

impl<S: LiveSource> SpectrumProducer<LiveChunks<S>> {
    /// Endless frames from a live source, stamped against `clock`
    pub fn from_live(
        source: S,
        analysis: &AnalysisConfig,
        pipeline: &PipelineConfig,
        pull_wait: Duration,
        clock: PlaybackClock,
        stop: StopFlag,
    ) -> Result<Self> {
        analysis.validate()?;
        pipeline.validate()?;
        let chunks = LiveChunks::new(
            source,
            analysis.chunk_duration_s,
            clock,
            pipeline.live_lookahead_chunks,
            pull_wait,
            stop,
        )?;
        let analyzer = SpectrumAnalyzer::new(
            chunks.plan().block_size,
            analysis.normalization,
            analysis.window,
        )?;
        Ok(Self::new(chunks, analyzer))
    }
}

impl<C> Iterator for SpectrumProducer<C>
where
    C: Iterator<Item = Result<Chunk>>,
{
    type Item = Result<SpectrumFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self.chunks.next()?.and_then(|chunk| {
            let spectrum = self.analyzer.analyze(&chunk.block)?;
            Ok(SpectrumFrame::new(chunk.timestamp, spectrum))
        });
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
