//! Encoder counters and throughput measurement.
//!
//! [`EncoderStats`] is a cheap snapshot of lifetime counters shared between
//! the caller path and the reconstruction thread. [`ThroughputMeter`]
//! reports frame and byte rates over the latest frames for progress output.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde::Serialize;

// ── EncoderStats ─────────────────────────────────────────────────

/// Lifetime counters for one encoder instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EncoderStats {
    /// Frames returned to callers, keyframes included.
    pub frames_encoded: u64,
    /// Frames passed through unchanged to bootstrap the stream.
    pub keyframes: u64,
    /// Compressed input bytes accepted.
    pub input_bytes: u64,
    /// Compressed output bytes produced.
    pub output_bytes: u64,
    /// Reconstruction cycles that left the reference frame stale.
    pub reconstruction_failures: u64,
}

impl EncoderStats {
    /// Output size relative to input size (1.0 = no savings).
    pub fn compression_ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 1.0;
        }
        self.output_bytes as f64 / self.input_bytes as f64
    }
}

#[derive(Debug, Default)]
pub(crate) struct EncoderCounters {
    frames_encoded: AtomicU64,
    keyframes: AtomicU64,
    input_bytes: AtomicU64,
    output_bytes: AtomicU64,
    reconstruction_failures: AtomicU64,
}

impl EncoderCounters {
    pub(crate) fn record_frame(&self, input: usize, output: usize, keyframe: bool) {
        self.frames_encoded.fetch_add(1, Ordering::Relaxed);
        if keyframe {
            self.keyframes.fetch_add(1, Ordering::Relaxed);
        }
        self.input_bytes.fetch_add(input as u64, Ordering::Relaxed);
        self.output_bytes.fetch_add(output as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_reconstruction_failure(&self) {
        self.reconstruction_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> EncoderStats {
        EncoderStats {
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            keyframes: self.keyframes.load(Ordering::Relaxed),
            input_bytes: self.input_bytes.load(Ordering::Relaxed),
            output_bytes: self.output_bytes.load(Ordering::Relaxed),
            reconstruction_failures: self.reconstruction_failures.load(Ordering::Relaxed),
        }
    }
}

// ── ThroughputMeter ──────────────────────────────────────────────

/// Frames kept by [`ThroughputMeter::new`].
pub const DEFAULT_FRAME_WINDOW: usize = 30;

/// Output rate measured over the meter's frame window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Throughput {
    pub frames_per_sec: f64,
    pub bytes_per_sec: f64,
}

/// Output rate over the most recent encoded frames.
///
/// The window is counted in frames, not time. `n` timestamps span `n - 1`
/// intervals; the oldest frame only opens the window and its bytes are
/// not counted.
#[derive(Debug)]
pub struct ThroughputMeter {
    frames: VecDeque<(Instant, u64)>,
    capacity: usize,
}

impl ThroughputMeter {
    pub fn new() -> Self {
        Self::with_frame_window(DEFAULT_FRAME_WINDOW)
    }

    /// Meter over the last `frames` frames (at least two).
    pub fn with_frame_window(frames: usize) -> Self {
        let capacity = frames.max(2);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a frame of `bytes` finished now.
    pub fn record(&mut self, bytes: u64) {
        self.record_at(Instant::now(), bytes);
    }

    pub fn record_at(&mut self, at: Instant, bytes: u64) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back((at, bytes));
    }

    /// `None` until two frames with distinct timestamps were recorded.
    pub fn throughput(&self) -> Option<Throughput> {
        let (opened, _) = *self.frames.front()?;
        let (closed, _) = *self.frames.back()?;
        let span = closed.checked_duration_since(opened)?.as_secs_f64();
        if span <= 0.0 {
            return None;
        }

        let intervals = self.frames.len() - 1;
        let bytes: u64 = self.frames.iter().skip(1).map(|&(_, b)| b).sum();
        Some(Throughput {
            frames_per_sec: intervals as f64 / span,
            bytes_per_sec: bytes as f64 / span,
        })
    }
}

impl Default for ThroughputMeter {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
