// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Top-level parser session over one capture file.
//!
//! A session owns the memory mapping, the decoder, and the worker
//! pool. It is the only holder of a strong arena handle apart from
//! in-flight tasks: `close()` drops that handle, outstanding iterators
//! and views (which hold weak handles) start failing with
//! `ClosedSession`, and the mapping is released as soon as the last
//! in-flight task finishes. Dropping the session releases everything
//! the same way.
//!
//! # Example
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use picoparse::{ComponentRequest, ParserSession};
//!
//! let session = ParserSession::open("capture.csi", 8)?;
//! let batch = session.get_ndarray(ComponentRequest::all(), false)?;
//! println!("frames: {}", batch.num_frames());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::core::{ComponentRequest, ParseError, Result};
use crate::decode::{FrameDecoder, PicoFrameDecoder};
use crate::io::arena::{FrameView, MmapArena};
use crate::io::index::{index_frames, FrameIndexIter, FrameSpan};
use crate::numeric::batch::{stack_frames, NdarrayBatch};
use crate::numeric::derive::FrameNdarray;
use crate::pool::worker::{TaskContext, UnorderedFrames, WorkerPool};

/// Parser session over one PicoScenes `.csi` capture file.
pub struct ParserSession {
    path: String,
    arena: Option<Arc<MmapArena>>,
    decoder: Arc<dyn FrameDecoder>,
    pool: WorkerPool,
}

impl ParserSession {
    /// Open a capture file with the default [`PicoFrameDecoder`].
    ///
    /// `n_worker` above the available hardware parallelism clamps
    /// silently; zero becomes one worker.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be opened or
    /// memory-mapped; no partial session is created.
    pub fn open<P: AsRef<Path>>(path: P, n_worker: usize) -> Result<Self> {
        Self::open_with_decoder(path, n_worker, Arc::new(PicoFrameDecoder))
    }

    /// Open a capture file with a caller-supplied decoder.
    ///
    /// Lets alternative decoders for other hardware or firmware
    /// generations drive the same pipeline.
    pub fn open_with_decoder<P: AsRef<Path>>(
        path: P,
        n_worker: usize,
        decoder: Arc<dyn FrameDecoder>,
    ) -> Result<Self> {
        let pool = WorkerPool::new(n_worker)?;
        let arena = Arc::new(MmapArena::open(path)?);
        debug!(
            path = arena.path(),
            file_size = arena.len(),
            workers = pool.workers(),
            "opened parser session"
        );
        Ok(Self {
            path: arena.path().to_string(),
            arena: Some(arena),
            decoder,
            pool,
        })
    }

    /// Path of the capture file.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Effective worker count after clamping.
    pub fn workers(&self) -> usize {
        self.pool.workers()
    }

    /// Whether `close()` has been called.
    pub fn is_closed(&self) -> bool {
        self.arena.is_none()
    }

    /// Size of the mapped file in bytes.
    pub fn file_size(&self) -> Result<usize> {
        Ok(self.arena("file_size")?.len())
    }

    /// Release the memory mapping. Idempotent.
    ///
    /// Outstanding iterators and frame views fail with
    /// `ClosedSession` from now on; tasks already in flight finish
    /// against their own strong handle, and the mapping is unmapped
    /// when the last of them completes.
    pub fn close(&mut self) {
        if self.arena.take().is_some() {
            debug!(path = %self.path, "closed parser session");
        }
    }

    fn arena(&self, operation: &str) -> Result<&Arc<MmapArena>> {
        self.arena
            .as_ref()
            .ok_or_else(|| ParseError::closed(operation))
    }

    fn task_context(&self, operation: &str, request: ComponentRequest, interp: bool) -> Result<TaskContext> {
        Ok(TaskContext {
            arena: Arc::clone(self.arena(operation)?),
            decoder: Arc::clone(&self.decoder),
            request,
            interp,
        })
    }

    /// Lazy, restartable scan of frame spans.
    ///
    /// Each call starts a fresh scan from offset 0 and always yields
    /// the same span sequence for a given file.
    pub fn iter_frame_index(&self) -> Result<FrameIndexIter> {
        Ok(FrameIndexIter::new(Arc::downgrade(
            self.arena("iter_frame_index")?,
        )))
    }

    /// Lazy sequence of zero-copy frame views.
    ///
    /// Views are valid only while the session remains open; closing
    /// mid-iteration turns the next access into `ClosedSession`.
    pub fn iter_frame(&self) -> Result<FrameIter> {
        let arena = self.arena("iter_frame")?;
        Ok(FrameIter {
            inner: FrameIndexIter::new(Arc::downgrade(arena)),
            arena: Arc::downgrade(arena),
        })
    }

    /// Stream decoded and derived frames in completion order.
    ///
    /// All components are materialized per frame. Completion order MAY
    /// differ from frame order; use [`ParserSession::get_ndarray`] or
    /// [`ParserSession::get_frame_ndarray_by_indices`] when order
    /// matters. Undecodable frames appear as `Err` markers.
    pub fn iter_frame_ndarray(&self, interp: bool) -> Result<UnorderedFrames> {
        let arena = self.arena("iter_frame_ndarray")?;
        let spans = index_frames(arena.data());
        let ctx = self.task_context("iter_frame_ndarray", ComponentRequest::all(), interp)?;
        Ok(self.pool.stream_unordered(spans, ctx))
    }

    /// Parse the whole file into one stacked array per requested
    /// component, frame order preserved.
    ///
    /// Undecodable frames keep their slot (NaN tensor rows, zero
    /// timestamp) and are listed in [`NdarrayBatch::missing`].
    ///
    /// # Errors
    ///
    /// `ParseError::BatchShape` if per-frame shapes are non-uniform;
    /// enable `interp` or iterate per frame instead.
    pub fn get_ndarray(&self, request: ComponentRequest, interp: bool) -> Result<NdarrayBatch> {
        let arena = self.arena("get_ndarray")?;
        let spans = index_frames(arena.data());
        let ctx = self.task_context("get_ndarray", request, interp)?;
        let results = self.pool.run_ordered(&spans, &ctx);
        stack_frames(&results, request)
    }

    /// Decode and derive the given spans, output order matching the
    /// input order.
    ///
    /// Slot i of the result corresponds to `spans[i]`; a failed frame
    /// occupies its slot as an `Err` marker.
    ///
    /// # Errors
    ///
    /// `ParseError::OutOfRange` if any span exceeds the file; the
    /// whole call fails before any decoding starts.
    pub fn get_frame_ndarray_by_indices(
        &self,
        spans: &[FrameSpan],
        interp: bool,
    ) -> Result<Vec<Result<FrameNdarray>>> {
        let arena = self.arena("get_frame_ndarray_by_indices")?;
        for span in spans {
            arena.slice_span(*span)?;
        }
        let ctx = self.task_context("get_frame_ndarray_by_indices", ComponentRequest::all(), interp)?;
        Ok(self.pool.run_ordered(spans, &ctx))
    }
}

impl std::fmt::Debug for ParserSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserSession")
            .field("path", &self.path)
            .field("closed", &self.is_closed())
            .field("workers", &self.pool.workers())
            .finish()
    }
}

/// Lazy iterator over zero-copy frame views.
pub struct FrameIter {
    inner: FrameIndexIter,
    arena: std::sync::Weak<MmapArena>,
}

impl Iterator for FrameIter {
    type Item = Result<FrameView>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.inner.next()? {
            Ok(span) => Some(Ok(FrameView::new(self.arena.clone(), span))),
            Err(e) => Some(Err(e)),
        }
    }
}
