// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Worker pool executing decode + derive over frame spans.
//!
//! The pool is sized `min(requested, available CPUs)`, minimum 1;
//! oversized requests clamp silently. Two completion policies:
//!
//! - **Ordered**: parallel map with an order-preserving collect; slot i
//!   of the output corresponds to span i of the input, with per-frame
//!   failures kept in place as `Err` markers.
//! - **Unordered streaming**: spans are fed through a bounded channel
//!   to long-running worker tasks and each finished frame is sent over
//!   a bounded result channel, so completion order may differ from
//!   submission order, a slow consumer backpressures the workers, and
//!   the workers backpressure the feeder.
//!
//! Every task holds a strong arena handle, so the mapping outlives all
//! in-flight work even if the owning session closes concurrently.

use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver};
use rayon::prelude::*;
use tracing::warn;

use crate::core::{ComponentRequest, ParseError, Result};
use crate::decode::FrameDecoder;
use crate::io::arena::MmapArena;
use crate::io::index::FrameSpan;
use crate::numeric::derive::{derive_frame, FrameNdarray};

/// Result-queue slots per worker for the streaming policy.
const STREAM_QUEUE_FACTOR: usize = 2;

/// Shared per-call state handed to every task.
#[derive(Clone)]
pub struct TaskContext {
    /// Mapping the spans point into
    pub arena: Arc<MmapArena>,
    /// Decoder applied to each frame span
    pub decoder: Arc<dyn FrameDecoder>,
    /// Components to materialize
    pub request: ComponentRequest,
    /// Resample onto the canonical subcarrier grid
    pub interp: bool,
}

/// Decode and derive a single frame.
///
/// `index` is the frame's position in the submitted sequence; it tags
/// the error marker so callers can correlate failures by index.
fn process_frame(index: usize, span: FrameSpan, ctx: &TaskContext) -> Result<FrameNdarray> {
    let bytes = ctx.arena.slice_span(span)?;
    let record = ctx.decoder.decode(bytes).map_err(|e| {
        warn!(
            frame_index = index,
            offset = span.offset,
            error = %e,
            "skipping undecodable frame"
        );
        ParseError::frame_decode(index, e.to_string())
    })?;
    derive_frame(&record, ctx.request, ctx.interp)
        .map_err(|e| ParseError::frame_decode(index, e.to_string()))
}

/// Bounded pool of decode workers.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    workers: usize,
}

impl WorkerPool {
    /// Build a pool with `min(requested, available CPUs)` workers.
    ///
    /// Requests above the hardware parallelism clamp silently; a
    /// request of zero becomes one worker.
    pub fn new(requested: usize) -> Result<Self> {
        let workers = requested.max(1).min(num_cpus::get().max(1));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("csi-worker-{index}"))
            .build()
            .map_err(|e| ParseError::pool(format!("failed to build thread pool: {e}")))?;
        Ok(Self { pool, workers })
    }

    /// Effective worker count after clamping.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Process every span, returning results in span order.
    ///
    /// Slot i corresponds to span i; a failed frame occupies its slot
    /// as an `Err` marker so subsequent frames are never shifted.
    pub fn run_ordered(&self, spans: &[FrameSpan], ctx: &TaskContext) -> Vec<Result<FrameNdarray>> {
        self.pool.install(|| {
            spans
                .par_iter()
                .enumerate()
                .map(|(index, &span)| process_frame(index, span, ctx))
                .collect()
        })
    }

    /// Process every span, streaming results in completion order.
    ///
    /// The returned iterator yields one item per span; ordering beyond
    /// "each span exactly once" is not guaranteed. Both channels are
    /// bounded: the feeder blocks when all workers are busy and the
    /// span queue is full, workers block when the consumer falls
    /// behind, so queued work and buffered results stay bounded no
    /// matter the file size.
    pub fn stream_unordered(&self, spans: Vec<FrameSpan>, ctx: TaskContext) -> UnorderedFrames {
        let cap = self.workers * STREAM_QUEUE_FACTOR;
        let (span_sender, span_receiver) = bounded::<(usize, FrameSpan)>(cap);
        let (result_sender, receiver) = bounded(cap);

        for _ in 0..self.workers {
            let span_receiver = span_receiver.clone();
            let result_sender = result_sender.clone();
            let ctx = ctx.clone();
            self.pool.spawn(move || {
                for (index, span) in span_receiver {
                    // A dropped receiver just means the consumer
                    // stopped iterating early.
                    if result_sender.send(process_frame(index, span, &ctx)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_sender);

        // Feed spans from a plain thread so submission backpressure
        // never ties up a pool worker. Send fails once every worker
        // has exited, which ends an abandoned stream.
        std::thread::spawn(move || {
            for item in spans.into_iter().enumerate() {
                if span_sender.send(item).is_err() {
                    break;
                }
            }
        });

        UnorderedFrames { receiver }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers)
            .finish()
    }
}

/// Streaming iterator over per-frame results in completion order.
///
/// Failed frames appear as `Err` markers; callers that only want
/// successes can `filter_map(Result::ok)`.
pub struct UnorderedFrames {
    receiver: Receiver<Result<FrameNdarray>>,
}

impl Iterator for UnorderedFrames {
    type Item = Result<FrameNdarray>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}
