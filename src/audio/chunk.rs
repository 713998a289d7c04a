//! Chunk scheduling: slicing a sample source into FFT windows.
//!
//! Each visual frame advances the audio by `chunk_size` samples, while the
//! FFT looks at a `block_size` window (next power of two) starting at the
//! same position. Consecutive windows therefore overlap whenever
//! `block_size > chunk_size`, trading nothing in cadence for extra
//! frequency resolution.

use std::time::{Duration, Instant};

use log::debug;

use super::fft::{MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use super::source::{FiniteSource, LiveSource};
use crate::error::{Result, VisError};
use crate::pipeline::{PlaybackClock, StopFlag};

/// Samples advanced per chunk: `ceil(duration * rate)`, at least 1
pub fn chunk_size_for(chunk_duration_s: f64, sample_rate: u32) -> usize {
    ((chunk_duration_s * sample_rate as f64).ceil() as usize).max(1)
}

/// FFT window for a chunk: the smallest power of two >= `chunk_size`
pub fn block_size_for(chunk_size: usize) -> usize {
    chunk_size.max(1).next_power_of_two()
}

/// Chunk and block sizes for one source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkPlan {
    pub chunk_duration_s: f64,
    pub sample_rate: u32,
    pub chunk_size: usize,
    pub block_size: usize,
}

impl ChunkPlan {
    pub fn new(chunk_duration_s: f64, sample_rate: u32) -> Result<Self> {
        if !chunk_duration_s.is_finite() || chunk_duration_s <= 0.0 {
            return Err(VisError::config(format!(
                "chunk duration must be positive, got {}",
                chunk_duration_s
            )));
        }
        if sample_rate == 0 {
            return Err(VisError::config("sample rate must be > 0"));
        }

        // Checked before the cast so huge durations cannot saturate or overflow
        let samples = (chunk_duration_s * sample_rate as f64).ceil();
        if samples > MAX_BLOCK_SIZE as f64 {
            return Err(VisError::config(format!(
                "chunk of {}s at {}Hz needs more than {} samples per FFT block",
                chunk_duration_s, sample_rate, MAX_BLOCK_SIZE
            )));
        }

        let chunk_size = chunk_size_for(chunk_duration_s, sample_rate);
        let block_size = block_size_for(chunk_size);
        if block_size < MIN_BLOCK_SIZE {
            return Err(VisError::config(format!(
                "chunk of {}s at {}Hz gives a degenerate {}-sample FFT block",
                chunk_duration_s, sample_rate, block_size
            )));
        }

        Ok(Self {
            chunk_duration_s,
            sample_rate,
            chunk_size,
            block_size,
        })
    }

    /// Number of chunks covering `len` samples
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }
}

/// One analysis window and its presentation time
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Sequence number within the run
    pub index: usize,

    /// Seconds from playback start
    pub timestamp: f64,

    /// `block_size` samples
    pub block: Vec<f32>,
}

/// Chunks of a fully buffered source
#[derive(Debug)]
pub struct FileChunks<S> {
    source: S,
    plan: ChunkPlan,
    pos: usize,
    index: usize,
    done: bool,
}

impl<S: FiniteSource> FileChunks<S> {
    pub fn new(source: S, chunk_duration_s: f64) -> Result<Self> {
        let plan = ChunkPlan::new(chunk_duration_s, source.sample_rate())?;
        debug!(
            "Finite schedule: {} samples, chunk {} block {} ({} chunks)",
            source.len(),
            plan.chunk_size,
            plan.block_size,
            plan.chunk_count(source.len())
        );
        Ok(Self {
            source,
            plan,
            pos: 0,
            index: 0,
            done: false,
        })
    }

    pub fn plan(&self) -> ChunkPlan {
        self.plan
    }
}

impl<S: FiniteSource> Iterator for FileChunks<S> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.source.len() {
            self.done = true;
            return None;
        }

        let window = match self.source.slice(self.pos..self.pos + self.plan.block_size) {
            Ok(window) => window,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        // Zero-pad the tail so every block has the full FFT length
        let mut block = Vec::with_capacity(self.plan.block_size);
        block.extend_from_slice(window);
        block.resize(self.plan.block_size, 0.0);

        let chunk = Chunk {
            index: self.index,
            timestamp: self.index as f64 * self.plan.chunk_duration_s,
            block,
        };
        self.pos += self.plan.chunk_size;
        self.index += 1;
        Some(Ok(chunk))
    }
}

/// Chunks of a live, pull-based source
pub struct LiveChunks<S> {
    source: S,
    plan: ChunkPlan,
    clock: PlaybackClock,
    lookahead_s: f64,
    pull_wait: Duration,
    stop: StopFlag,
    buffer: Vec<f32>,
    index: usize,
    done: bool,
}

impl<S: LiveSource> LiveChunks<S> {
    /// `lookahead_chunks` chunk durations are added to every timestamp to
    /// compensate for capture and pipeline latency.
    pub fn new(
        source: S,
        chunk_duration_s: f64,
        clock: PlaybackClock,
        lookahead_chunks: f64,
        pull_wait: Duration,
        stop: StopFlag,
    ) -> Result<Self> {
        let plan = ChunkPlan::new(chunk_duration_s, source.sample_rate())?;
        debug!(
            "Live schedule: chunk {} block {} @ {}Hz",
            plan.chunk_size,
            plan.block_size,
            plan.sample_rate
        );
        Ok(Self {
            source,
            plan,
            clock,
            lookahead_s: lookahead_chunks * chunk_duration_s,
            pull_wait,
            stop,
            buffer: Vec::with_capacity(plan.block_size * 2),
            index: 0,
            done: false,
        })
    }

    pub fn plan(&self) -> ChunkPlan {
        self.plan
    }

    fn take_window(&mut self) -> Chunk {
        let block = self.buffer[..self.plan.block_size].to_vec();
        // Samples before the next chunk start are never looked at again
        self.buffer.drain(..self.plan.chunk_size);

        let chunk = Chunk {
            index: self.index,
            timestamp: self.clock.elapsed_s(Instant::now()) + self.lookahead_s,
            block,
        };
        self.index += 1;
        chunk
    }
}

impl<S: LiveSource> Iterator for LiveChunks<S> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done || self.stop.is_requested() {
                self.done = true;
                return None;
            }
            if self.buffer.len() >= self.plan.block_size {
                return Some(Ok(self.take_window()));
            }
            match self.source.pull(self.pull_wait) {
                Ok(Some(samples)) => self.buffer.extend_from_slice(&samples),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
