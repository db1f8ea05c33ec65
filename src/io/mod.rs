// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! I/O layer: memory-mapped arena, frame indexing, parser session.

pub mod arena;
pub mod index;
pub mod session;

pub use arena::{FrameBytes, FrameView, MmapArena};
pub use index::{index_frames, FrameIndexIter, FrameSpan, LENGTH_PREFIX_LEN};
pub use session::{FrameIter, ParserSession};
