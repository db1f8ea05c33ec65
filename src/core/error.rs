// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core error types for picoparse.
//!
//! Provides error types for capture-file operations:
//! - File opening and memory mapping
//! - Session lifecycle (use after close)
//! - Frame indexing and byte-range access
//! - Per-frame decode and derivation failures
//! - Batch array assembly

use std::fmt;

/// Errors that can occur while parsing a capture file.
///
/// File- and session-level errors (`Io`, `ClosedSession`) always
/// propagate to the caller. Per-frame errors (`FrameDecode`) are
/// contained: batch and streaming APIs report them as per-slot markers
/// so one corrupt record never aborts a whole-file parse.
#[derive(Debug, Clone)]
pub enum ParseError {
    /// File missing, unreadable, or memory mapping failed
    Io {
        /// Path of the file being opened
        path: String,
        /// Error message from the OS
        message: String,
    },

    /// Operation invoked on a closed session
    ClosedSession {
        /// Operation that was attempted
        operation: String,
    },

    /// Requested byte range exceeds the mapped file
    OutOfRange {
        /// Requested offset
        offset: usize,
        /// Requested length
        len: usize,
        /// Size of the mapped file
        file_size: usize,
    },

    /// Declared frame length exceeds the remaining bytes.
    ///
    /// Indexing stops at the truncation point and the spans found so
    /// far remain valid; this variant is recorded and logged, never
    /// raised from the index iterator itself.
    Truncated {
        /// Offset of the truncated frame
        offset: usize,
        /// Frame length declared by the length prefix
        declared: usize,
        /// Bytes actually remaining in the file
        remaining: usize,
    },

    /// A single frame failed to decode or derive
    FrameDecode {
        /// Index of the frame within the submitted sequence
        frame_index: usize,
        /// Underlying decoder or derivation error
        cause: String,
    },

    /// Per-frame array shapes are not uniform, so they cannot be
    /// stacked into a batch array
    BatchShape {
        /// Frame whose shape diverges
        frame_index: usize,
        /// Shape of the first successfully decoded frame
        expected: Vec<usize>,
        /// Shape of the diverging frame
        actual: Vec<usize>,
    },

    /// Worker pool construction or hand-off failure
    Pool {
        /// Error message
        message: String,
    },
}

impl ParseError {
    /// Create an I/O error.
    pub fn io(path: impl Into<String>, message: impl Into<String>) -> Self {
        ParseError::Io {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a closed-session error.
    pub fn closed(operation: impl Into<String>) -> Self {
        ParseError::ClosedSession {
            operation: operation.into(),
        }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(offset: usize, len: usize, file_size: usize) -> Self {
        ParseError::OutOfRange {
            offset,
            len,
            file_size,
        }
    }

    /// Create a truncated-frame error.
    pub fn truncated(offset: usize, declared: usize, remaining: usize) -> Self {
        ParseError::Truncated {
            offset,
            declared,
            remaining,
        }
    }

    /// Create a per-frame decode error.
    pub fn frame_decode(frame_index: usize, cause: impl Into<String>) -> Self {
        ParseError::FrameDecode {
            frame_index,
            cause: cause.into(),
        }
    }

    /// Create a batch shape error.
    pub fn batch_shape(frame_index: usize, expected: Vec<usize>, actual: Vec<usize>) -> Self {
        ParseError::BatchShape {
            frame_index,
            expected,
            actual,
        }
    }

    /// Create a worker pool error.
    pub fn pool(message: impl Into<String>) -> Self {
        ParseError::Pool {
            message: message.into(),
        }
    }

    /// Get structured fields for logging.
    pub fn log_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            ParseError::Io { path, message } => {
                vec![("path", path.clone()), ("message", message.clone())]
            }
            ParseError::ClosedSession { operation } => vec![("operation", operation.clone())],
            ParseError::OutOfRange {
                offset,
                len,
                file_size,
            } => vec![
                ("offset", offset.to_string()),
                ("len", len.to_string()),
                ("file_size", file_size.to_string()),
            ],
            ParseError::Truncated {
                offset,
                declared,
                remaining,
            } => vec![
                ("offset", offset.to_string()),
                ("declared", declared.to_string()),
                ("remaining", remaining.to_string()),
            ],
            ParseError::FrameDecode { frame_index, cause } => vec![
                ("frame_index", frame_index.to_string()),
                ("cause", cause.clone()),
            ],
            ParseError::BatchShape {
                frame_index,
                expected,
                actual,
            } => vec![
                ("frame_index", frame_index.to_string()),
                ("expected", format!("{expected:?}")),
                ("actual", format!("{actual:?}")),
            ],
            ParseError::Pool { message } => vec![("message", message.clone())],
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Io { path, message } => {
                write!(f, "I/O error on '{path}': {message}")
            }
            ParseError::ClosedSession { operation } => {
                write!(f, "Session is closed: cannot {operation}")
            }
            ParseError::OutOfRange {
                offset,
                len,
                file_size,
            } => write!(
                f,
                "Range out of bounds: requested {len} bytes at offset {offset}, but file is {file_size} bytes"
            ),
            ParseError::Truncated {
                offset,
                declared,
                remaining,
            } => write!(
                f,
                "Truncated frame at offset {offset}: declared {declared} bytes, {remaining} remaining"
            ),
            ParseError::FrameDecode { frame_index, cause } => {
                write!(f, "Failed to decode frame {frame_index}: {cause}")
            }
            ParseError::BatchShape {
                frame_index,
                expected,
                actual,
            } => write!(
                f,
                "Cannot stack frame {frame_index}: shape {actual:?} does not match {expected:?} (enable interpolation or iterate per frame)"
            ),
            ParseError::Pool { message } => write!(f, "Worker pool error: {message}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Result type for picoparse operations.
pub type Result<T> = std::result::Result<T, ParseError>;
