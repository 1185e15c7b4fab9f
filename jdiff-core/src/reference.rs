//! Reference frame tracking on a dedicated reconstruction thread.
//!
//! The reference frame is the encoder's record of what the viewer is
//! displaying. It only ever changes by running the viewer's own decoder over
//! bytes the encoder has already handed out, so it carries exactly the
//! compression error the viewer sees.
//!
//! ## Handoff
//!
//! ```text
//! caller (encode_frame)                     jdiff-reconstruct thread
//! ─────────────────────                     ────────────────────────
//! submit(payload, version) ──[job: payload + reference]──►  decode_frame
//!                                                            copy into reference
//! wait_ready()  ◄───────────────[reference]──────────────── send back
//! ```
//!
//! The [`ReferenceFrame`] is moved through the two channels, so at any
//! moment exactly one side owns it. Reconstruction of frame N therefore
//! completes before the diff for frame N+1 can even see the buffer.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use tracing::{debug, warn};

use crate::decoder::DiffReverser;
use crate::error::{JdiffError, Result};
use crate::stats::EncoderCounters;
use crate::types::Dimensions;
use crate::version::Version;

// ── ReferenceFrame ───────────────────────────────────────────────

/// Packed RGB8 pixels the viewer is believed to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFrame {
    dims: Dimensions,
    pixels: Vec<u8>,
}

impl ReferenceFrame {
    pub(crate) fn new(dims: Dimensions, pixels: Vec<u8>) -> Self {
        Self { dims, pixels }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

struct ReconstructJob {
    payload: Bytes,
    version: Version,
    reference: ReferenceFrame,
}

// ── ReferenceTracker ─────────────────────────────────────────────

/// Owns the reconstruction thread and the caller's end of the handoff.
pub(crate) struct ReferenceTracker {
    /// Dropped on shutdown, which wakes a worker parked in `recv`.
    job_tx: Option<SyncSender<ReconstructJob>>,
    done_rx: Receiver<ReferenceFrame>,
    /// The reference while the caller owns it.
    home: Option<ReferenceFrame>,
    in_flight: bool,
    worker: Option<JoinHandle<()>>,
}

impl ReferenceTracker {
    /// Start the reconstruction thread around `reverser`.
    pub(crate) fn spawn<R>(reverser: R, thread_name: &str, counters: Arc<EncoderCounters>) -> Result<Self>
    where
        R: DiffReverser + 'static,
    {
        let (job_tx, job_rx) = mpsc::sync_channel(1);
        let (done_tx, done_rx) = mpsc::sync_channel(1);

        let worker = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || reconstruct_loop(reverser, job_rx, done_tx, counters))
            .map_err(JdiffError::Spawn)?;

        Ok(Self {
            job_tx: Some(job_tx),
            done_rx,
            home: None,
            in_flight: false,
            worker: Some(worker),
        })
    }

    /// Install the first frame and prime the reverser with the same bytes.
    pub(crate) fn seed(&mut self, reference: ReferenceFrame, payload: Bytes, version: Version) -> Result<()> {
        self.wait_ready()?;
        self.home = Some(reference);
        self.submit(payload, version)
    }

    /// Block until the previous reconstruction has returned the reference.
    ///
    /// Returns `None` before the first frame has been seeded.
    pub(crate) fn wait_ready(&mut self) -> Result<Option<&ReferenceFrame>> {
        if self.in_flight {
            let reference = self
                .done_rx
                .recv()
                .map_err(|_| JdiffError::ReconstructionStalled)?;
            self.home = Some(reference);
            self.in_flight = false;
        }
        Ok(self.home.as_ref())
    }

    /// Hand the reference to the worker to be rebuilt from `payload`.
    ///
    /// A no-op when there is no reference to rebuild.
    pub(crate) fn submit(&mut self, payload: Bytes, version: Version) -> Result<()> {
        let Some(reference) = self.home.take() else {
            return Ok(());
        };
        let Some(job_tx) = self.job_tx.as_ref() else {
            self.home = Some(reference);
            return Err(JdiffError::ReconstructionStalled);
        };

        let job = ReconstructJob {
            payload,
            version,
            reference,
        };
        // The worker has always drained the previous job before we get here,
        // so the single slot is free.
        match job_tx.try_send(job) {
            Ok(()) => {
                self.in_flight = true;
                Ok(())
            }
            Err(TrySendError::Full(job)) | Err(TrySendError::Disconnected(job)) => {
                self.home = Some(job.reference);
                Err(JdiffError::ReconstructionStalled)
            }
        }
    }

    /// Stop the worker and wait for it to exit.
    pub(crate) fn shutdown(&mut self) {
        self.job_tx = None;

        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                warn!("reconstruction thread panicked");
            }
        }

        if self.in_flight {
            if let Ok(reference) = self.done_rx.try_recv() {
                self.home = Some(reference);
            }
            self.in_flight = false;
        }
    }
}

impl Drop for ReferenceTracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── Worker ───────────────────────────────────────────────────────

fn reconstruct_loop<R: DiffReverser>(
    mut reverser: R,
    jobs: Receiver<ReconstructJob>,
    done: SyncSender<ReferenceFrame>,
    counters: Arc<EncoderCounters>,
) {
    debug!("reconstruction thread started");

    while let Ok(job) = jobs.recv() {
        let ReconstructJob {
            payload,
            version,
            mut reference,
        } = job;

        match reverser.decode_frame(&payload, version) {
            Ok(pixels) if pixels.len() == reference.pixels.len() => {
                reference.pixels.copy_from_slice(pixels);
            }
            Ok(pixels) => {
                counters.record_reconstruction_failure();
                warn!(
                    expected = reference.pixels.len(),
                    actual = pixels.len(),
                    "reconstructed frame has the wrong size; reference left stale"
                );
            }
            Err(e) => {
                counters.record_reconstruction_failure();
                warn!(error = %e, %version, "reconstruction failed; reference left stale");
            }
        }

        if done.send(reference).is_err() {
            break;
        }
    }

    debug!("reconstruction thread exiting");
}

// ── Tests ────────────────────────────────────────────────────────
