// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frame decoding boundary.
//!
//! The pipeline treats decoding as a pluggable capability: anything
//! that turns one frame's byte span into a [`CsiRecord`] can drive the
//! parser, so alternative decoders for different hardware or firmware
//! generations substitute without touching the indexing or worker
//! plumbing. [`PicoFrameDecoder`] is the default implementation.

pub mod pico;
pub mod record;

pub use pico::PicoFrameDecoder;
pub use record::{CsiRecord, DeviceInfo};

/// Failure to decode a single frame's bytes.
///
/// Contained per-frame by the pipeline: a bad frame becomes an error
/// marker in the result stream, it never aborts the batch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    /// Frame shorter than the fixed header
    #[error("frame too short: {actual} bytes, need at least {needed}")]
    TooShort {
        /// Minimum byte count for a decodable frame
        needed: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Length prefix disagrees with the span handed to the decoder
    #[error("length prefix declares {declared} payload bytes but {actual} are present")]
    LengthMismatch {
        /// Payload length from the prefix
        declared: usize,
        /// Payload bytes in the span
        actual: usize,
    },

    /// Payload does not start with the frame magic
    #[error("bad frame magic {0:#010x}")]
    BadMagic(u32),

    /// Header declares an empty tensor
    #[error("frame declares empty dimensions: tones={tones}, tx={tx}, streams={streams}")]
    EmptyDimensions {
        /// Declared subcarrier count
        tones: usize,
        /// Declared transmit antenna count
        tx: usize,
        /// Declared stream count
        streams: usize,
    },

    /// Payload size disagrees with the declared dimensions
    #[error("payload holds {actual} bytes after the header but dimensions require {needed}")]
    SampleCountMismatch {
        /// Bytes required by the declared dimensions
        needed: usize,
        /// Bytes present after the fixed header
        actual: usize,
    },
}

/// Decoder from a raw frame span to a structured CSI record.
///
/// Implementations must be pure functions of the byte span (no hidden
/// state across calls) and safe to invoke concurrently from multiple
/// workers on different frames.
pub trait FrameDecoder: Send + Sync {
    /// Decode one full frame, including its length prefix.
    fn decode(&self, frame: &[u8]) -> std::result::Result<CsiRecord, DecodeError>;
}
