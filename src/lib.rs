// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # picoparse
//!
//! Parser for PicoScenes `.csi` capture files: binary logs of Channel
//! State Information frames produced by wireless sensing hardware.
//! Built for large captures (hundreds of MB to GB): the file is
//! memory-mapped and indexed without a full copy, frames are decoded
//! and derived on a bounded worker pool, and results come back either
//! as a lazy per-frame stream or as stacked ndarray batches.
//!
//! ## Architecture
//!
//! - `io/` - memory-mapped arena, frame span indexing, the
//!   [`ParserSession`] lifecycle
//! - `decode/` - the [`FrameDecoder`] boundary and the default
//!   [`PicoFrameDecoder`]
//! - `numeric/` - magnitude/phase derivation, subcarrier
//!   interpolation, batch stacking
//! - `pool/` - ordered and unordered worker-pool execution
//!
//! ## Example: whole-file batch
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use picoparse::{ComponentRequest, ParserSession};
//!
//! let session = ParserSession::open("capture.csi", 8)?;
//! let request = ComponentRequest::none()
//!     .with_timestamp(true)
//!     .with_magnitude(true);
//! let batch = session.get_ndarray(request, true)?;
//! println!(
//!     "frames: {}, failed: {}",
//!     batch.num_frames(),
//!     batch.missing.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Example: per-frame streaming
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use picoparse::ParserSession;
//!
//! let session = ParserSession::open("capture.csi", 4)?;
//! // Completion order may differ from frame order.
//! for frame in session.iter_frame_ndarray(false)? {
//!     let frame = frame?;
//!     println!("ts = {:?}", frame.timestamp());
//! }
//! # Ok(())
//! # }
//! ```

// Core types
pub mod core;

pub use core::{ComponentRequest, ParseError, Result};

// Frame decoding boundary
pub mod decode;

pub use decode::{CsiRecord, DecodeError, DeviceInfo, FrameDecoder, PicoFrameDecoder};

// Numeric derivation and batch assembly
pub mod numeric;

pub use numeric::{DeriveError, FrameNdarray, NdarrayBatch};

// I/O: arena, indexing, session
pub mod io;

pub use io::{
    FrameBytes, FrameIndexIter, FrameIter, FrameSpan, FrameView, MmapArena, ParserSession,
};

// Worker pool
pub mod pool;

pub use pool::{UnorderedFrames, WorkerPool};
