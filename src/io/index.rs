// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Frame boundary discovery over the mapped capture file.
//!
//! A `.csi` capture is a plain sequence of frame records with no global
//! header. Each record starts with a `u32` little-endian payload length;
//! the full frame is the prefix plus the payload, and the next frame
//! starts immediately after. Indexing is a single forward pass that
//! reads only the 4-byte prefix of each frame, O(number of frames).
//!
//! Trailing bytes that cannot hold another full frame are ignored: a
//! partial trailing frame is treated as end-of-stream, not an error.
//! The truncation point is recorded on the iterator and logged at debug
//! level so surrounding applications can surface it.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::core::{ParseError, Result};
use crate::io::arena::MmapArena;

/// Width of the length prefix that starts every frame record.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// A byte range identifying one frame record within the capture file.
///
/// Spans are produced in monotonically increasing offset order and are
/// non-overlapping and contiguous, except for ignored trailing bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSpan {
    /// Offset of the frame's length prefix within the file
    pub offset: usize,
    /// Total frame length, including the length prefix
    pub len: usize,
}

impl FrameSpan {
    /// Create a span.
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Offset one past the last byte of the frame.
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Lazy, finite, restartable iterator over frame spans.
///
/// Each call to [`crate::ParserSession::iter_frame_index`] starts a
/// fresh scan from offset 0. The iterator holds a weak arena handle:
/// if the session closes mid-iteration, the next call yields a single
/// `ClosedSession` error and then fuses.
pub struct FrameIndexIter {
    arena: Weak<MmapArena>,
    cursor: usize,
    done: bool,
    truncation: Option<ParseError>,
}

impl FrameIndexIter {
    /// Create an index iterator scanning from offset 0.
    pub fn new(arena: Weak<MmapArena>) -> Self {
        Self {
            arena,
            cursor: 0,
            done: false,
            truncation: None,
        }
    }

    /// Why indexing stopped early, if it did.
    ///
    /// `Some` when the scan hit a zero-length or overrunning frame
    /// declaration; `None` for a clean end-of-stream.
    pub fn truncation(&self) -> Option<&ParseError> {
        self.truncation.as_ref()
    }

    fn scan(&mut self, arena: &Arc<MmapArena>) -> Option<FrameSpan> {
        match scan_at(arena.data(), self.cursor) {
            Some(Ok(span)) => {
                self.cursor = span.end();
                Some(span)
            }
            Some(Err(err)) => {
                self.truncation = Some(err);
                self.done = true;
                None
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Read the frame starting at `cursor`.
///
/// `None` is clean end-of-stream (fewer bytes than a length prefix
/// remain); `Some(Err)` is a truncated or zero-length declaration. The
/// single scan step shared by the iterator and [`index_frames`], so
/// the truncation policy cannot drift between them.
fn scan_at(data: &[u8], cursor: usize) -> Option<std::result::Result<FrameSpan, ParseError>> {
    if cursor + LENGTH_PREFIX_LEN > data.len() {
        return None;
    }

    let payload_len = LittleEndian::read_u32(&data[cursor..cursor + LENGTH_PREFIX_LEN]) as usize;
    let frame_len = LENGTH_PREFIX_LEN + payload_len;

    if payload_len == 0 || cursor + frame_len > data.len() {
        debug!(
            offset = cursor,
            declared = frame_len,
            remaining = data.len() - cursor,
            "frame indexing stopped at truncated frame"
        );
        return Some(Err(ParseError::truncated(
            cursor,
            frame_len,
            data.len() - cursor,
        )));
    }

    Some(Ok(FrameSpan::new(cursor, frame_len)))
}

impl Iterator for FrameIndexIter {
    type Item = Result<FrameSpan>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let arena = match self.arena.upgrade() {
            Some(arena) => arena,
            None => {
                self.done = true;
                return Some(Err(ParseError::closed("iterate frame index")));
            }
        };

        self.scan(&arena).map(Ok)
    }
}

/// Index every frame in `data` in one pass.
///
/// Convenience used by batch operations; equivalent to draining a
/// [`FrameIndexIter`] over the same bytes.
pub fn index_frames(data: &[u8]) -> Vec<FrameSpan> {
    let mut spans = Vec::new();
    let mut cursor = 0usize;

    while let Some(Ok(span)) = scan_at(data, cursor) {
        cursor = span.end();
        spans.push(span);
    }

    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn test_index_contiguous_frames() {
        let mut data = Vec::new();
        data.extend_from_slice(&frame(b"aaaa"));
        data.extend_from_slice(&frame(b"bb"));
        data.extend_from_slice(&frame(b"cccccc"));

        let spans = index_frames(&data);
        assert_eq!(
            spans,
            vec![
                FrameSpan::new(0, 8),
                FrameSpan::new(8, 6),
                FrameSpan::new(14, 10),
            ]
        );
        // Coverage: contiguous, no gaps, no overlaps.
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end(), pair[1].offset);
        }
        assert_eq!(spans.last().unwrap().end(), data.len());
    }

    #[test]
    fn test_index_ignores_trailing_garbage() {
        let mut data = Vec::new();
        data.extend_from_slice(&frame(b"aaaa"));
        data.extend_from_slice(&frame(b"bbbb"));
        data.extend_from_slice(&frame(b"cccc"));
        data.extend_from_slice(&[0xde, 0xad, 0xbe]); // < prefix width

        let spans = index_frames(&data);
        assert_eq!(spans.len(), 3);
    }

    #[test]
    fn test_index_stops_at_overrunning_length() {
        let mut data = Vec::new();
        data.extend_from_slice(&frame(b"aaaa"));
        // Declares 1000 payload bytes but provides 2.
        data.extend_from_slice(&1000u32.to_le_bytes());
        data.extend_from_slice(&[1, 2]);

        let spans = index_frames(&data);
        assert_eq!(spans, vec![FrameSpan::new(0, 8)]);
    }

    #[test]
    fn test_index_stops_at_zero_length() {
        let mut data = Vec::new();
        data.extend_from_slice(&frame(b"aaaa"));
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&frame(b"bbbb"));

        // A zero length field cannot advance the cursor; everything
        // after it is unreachable.
        let spans = index_frames(&data);
        assert_eq!(spans, vec![FrameSpan::new(0, 8)]);
    }

    #[test]
    fn test_index_empty_input() {
        assert!(index_frames(&[]).is_empty());
        assert!(index_frames(&[1, 2, 3]).is_empty());
    }

    #[test]
    fn test_iter_matches_index_frames_and_records_truncation() {
        use std::fs::File;
        use std::io::Write;
        use std::sync::Arc;

        let mut data = Vec::new();
        data.extend_from_slice(&frame(b"aaaa"));
        data.extend_from_slice(&frame(b"bb"));
        data.extend_from_slice(&500u32.to_le_bytes());
        data.push(0xff);

        let mut path = std::env::temp_dir();
        path.push(format!("picoparse_test_index_{}.tmp", std::process::id()));
        File::create(&path).unwrap().write_all(&data).unwrap();

        let arena = Arc::new(MmapArena::open(&path).unwrap());
        let mut iter = FrameIndexIter::new(Arc::downgrade(&arena));

        let spans: Vec<FrameSpan> = iter.by_ref().map(|r| r.unwrap()).collect();
        assert_eq!(spans, index_frames(&data));
        assert!(matches!(
            iter.truncation(),
            Some(ParseError::Truncated { offset: 14, .. })
        ));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_iter_closed_session() {
        use std::fs::File;
        use std::io::Write;
        use std::sync::Arc;

        let data = frame(b"aaaa");
        let mut path = std::env::temp_dir();
        path.push(format!("picoparse_test_index_closed_{}.tmp", std::process::id()));
        File::create(&path).unwrap().write_all(&data).unwrap();

        let arena = Arc::new(MmapArena::open(&path).unwrap());
        let mut iter = FrameIndexIter::new(Arc::downgrade(&arena));
        drop(arena);

        assert!(matches!(
            iter.next(),
            Some(Err(ParseError::ClosedSession { .. }))
        ));
        assert!(iter.next().is_none());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_indexing_is_deterministic() {
        let mut data = Vec::new();
        for payload in [&b"aaaa"[..], b"bbbbbbbb", b"cc"] {
            data.extend_from_slice(&frame(payload));
        }
        let first = index_frames(&data);
        let second = index_frames(&data);
        assert_eq!(first, second);
    }
}
