// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Memory-mapped file arena for safe lifetime management.
//!
//! The `MmapArena` owns the memory-mapped capture file and hands out
//! bounds-checked byte ranges without copying. Frame views do not hold
//! the arena alive: they carry a `Weak` handle plus a span and validate
//! on every access, so a view used after the owning session has closed
//! fails with `ClosedSession` instead of touching unmapped memory.
//!
//! # Ownership Model
//!
//! ```text
//! ParserSession (Arc<MmapArena>, dropped on close)
//!   ↓
//! in-flight decode task (Arc, keeps mapping alive until done)
//!   ↓
//! FrameView / index iterator (Weak, checked on each access)
//! ```

use std::fs::File;
use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, Weak};

use crate::core::{ParseError, Result};
use crate::io::index::FrameSpan;

/// A memory-mapped capture file that owns all file data.
///
/// The mapping is read-only and shared freely across worker threads;
/// the file is never mutated, so no locking is needed.
pub struct MmapArena {
    /// The memory-mapped file (owned)
    mmap: memmap2::Mmap,
    /// File path for diagnostics
    path: String,
}

impl MmapArena {
    /// Open a file and create a memory-mapped arena.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Io` if the file cannot be opened or
    /// memory-mapped (missing, unreadable, zero-length on platforms
    /// that reject empty mappings).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let path_str = path_ref.to_string_lossy().to_string();

        let file = File::open(path_ref)
            .map_err(|e| ParseError::io(&path_str, format!("failed to open file: {e}")))?;

        // The wrapper keeps the mmap alive for as long as any strong
        // handle exists, so borrowed slices never outlive the mapping.
        let mmap = unsafe { memmap2::Mmap::map(&file) }
            .map_err(|e| ParseError::io(&path_str, format!("failed to mmap file: {e}")))?;

        Ok(Self {
            mmap,
            path: path_str,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get a reference to the memory-mapped data.
    pub fn data(&self) -> &[u8] {
        &self.mmap
    }

    /// Get the length of the data.
    pub fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Check if the arena is empty.
    pub fn is_empty(&self) -> bool {
        self.mmap.is_empty()
    }

    /// Create a reference to a slice of the data with bounds checking.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::OutOfRange` if the range exceeds the file.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| ParseError::out_of_range(offset, len, self.mmap.len()))?;

        if end > self.mmap.len() {
            return Err(ParseError::out_of_range(offset, len, self.mmap.len()));
        }

        Ok(&self.mmap[offset..end])
    }

    /// Slice the arena at a frame span.
    pub fn slice_span(&self, span: FrameSpan) -> Result<&[u8]> {
        self.slice(span.offset, span.len)
    }
}

impl Deref for MmapArena {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.mmap
    }
}

impl std::fmt::Debug for MmapArena {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmapArena")
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish()
    }
}

/// A zero-copy view over one frame's bytes.
///
/// The view does not keep the mapping alive. Every access upgrades the
/// weak arena handle; once the owning session has closed, access fails
/// with `ClosedSession`.
#[derive(Debug, Clone)]
pub struct FrameView {
    arena: Weak<MmapArena>,
    span: FrameSpan,
}

impl FrameView {
    /// Create a view over `span` within `arena`.
    pub fn new(arena: Weak<MmapArena>, span: FrameSpan) -> Self {
        Self { arena, span }
    }

    /// The span this view covers.
    pub fn span(&self) -> FrameSpan {
        self.span
    }

    /// Borrow the frame bytes.
    ///
    /// The returned guard holds a strong arena handle, so the mapping
    /// stays valid while the guard is alive even if the session closes
    /// concurrently.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::ClosedSession` if the session has closed,
    /// `ParseError::OutOfRange` if the span exceeds the file.
    pub fn bytes(&self) -> Result<FrameBytes> {
        let arena = self
            .arena
            .upgrade()
            .ok_or_else(|| ParseError::closed("read frame view"))?;
        // Validate eagerly so the guard can deref infallibly.
        arena.slice_span(self.span)?;
        Ok(FrameBytes {
            arena,
            span: self.span,
        })
    }
}

/// Guard over one frame's bytes, keeping the mapping alive.
pub struct FrameBytes {
    arena: Arc<MmapArena>,
    span: FrameSpan,
}

impl FrameBytes {
    /// The span these bytes cover.
    pub fn span(&self) -> FrameSpan {
        self.span
    }
}

impl Deref for FrameBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        // Span was validated when the guard was created.
        &self.arena.data()[self.span.offset..self.span.end()]
    }
}

impl AsRef<[u8]> for FrameBytes {
    fn as_ref(&self) -> &[u8] {
        self
    }
}
