// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Structured CSI record produced by a frame decoder.

use chrono::{DateTime, Utc};
use ndarray::Array3;
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// Device metadata carried by each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Frame format version reported by the capture firmware
    pub format_version: u16,
    /// Numeric device type identifier
    pub device_type: u16,
}

/// One decoded CSI measurement event.
///
/// The complex tensor is indexed `(subcarrier, tx antenna, stream)`
/// where the stream dimension covers receive chains plus extension
/// spatial streams. The effective subcarrier count may vary frame to
/// frame with bandwidth and mode; `subcarrier_indices` gives the
/// native frequency-domain position of each tone.
///
/// Immutable once produced; independent of the source mapping.
#[derive(Debug, Clone)]
pub struct CsiRecord {
    /// Device metadata
    pub device: DeviceInfo,
    /// Capture timestamp, nanoseconds since the Unix epoch.
    ///
    /// The file's native nanosecond resolution is preserved; use
    /// [`CsiRecord::timestamp`] for a calendar value.
    pub timestamp_ns: u64,
    /// Channel bandwidth in MHz
    pub cbw_mhz: u16,
    /// Native subcarrier index of each tone, strictly increasing
    pub subcarrier_indices: Vec<i16>,
    /// Complex channel response, `(subcarrier, tx, stream)`
    pub csi: Array3<Complex32>,
}

impl CsiRecord {
    /// Effective subcarrier count of this frame.
    pub fn num_tones(&self) -> usize {
        self.csi.dim().0
    }

    /// Number of transmit antennas.
    pub fn num_tx(&self) -> usize {
        self.csi.dim().1
    }

    /// Number of streams (receive chains plus extension streams).
    pub fn num_streams(&self) -> usize {
        self.csi.dim().2
    }

    /// Tensor shape as `(tones, tx, streams)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.csi.dim()
    }

    /// Capture timestamp as a UTC calendar value.
    pub fn timestamp(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.timestamp_ns as i64)
    }
}
