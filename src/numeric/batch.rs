// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Whole-file batch array assembly.
//!
//! Per-frame results are stacked into one array per requested
//! component, leading dimension = frame index in frame order. Stacking
//! requires uniform per-frame shapes; with non-uniform subcarrier
//! counts the caller must either enable interpolation or iterate per
//! frame instead.
//!
//! Decode-failed frames keep their slot so callers correlating by
//! index are never silently shifted: tensor rows are NaN-filled,
//! timestamp rows are zero, and the failed indices are listed in
//! [`NdarrayBatch::missing`].

use ndarray::{Array1, Array4, Axis};
use num_complex::Complex32;

use crate::core::{ComponentRequest, ParseError, Result};
use crate::numeric::derive::FrameNdarray;

/// The whole-file result: one stacked array per requested component.
///
/// Disabled components are `None`, never zero-filled placeholders.
#[derive(Debug, Clone, Default)]
pub struct NdarrayBatch {
    /// Timestamps in ns since the Unix epoch, `(frame,)`
    pub timestamps: Option<Array1<u64>>,
    /// Complex CSI, `(frame, subcarrier, tx, stream)`
    pub csi: Option<Array4<Complex32>>,
    /// Magnitude, `(frame, subcarrier, tx, stream)`
    pub magnitude: Option<Array4<f32>>,
    /// Phase, `(frame, subcarrier, tx, stream)`
    pub phase: Option<Array4<f32>>,
    /// Frame indices whose decode failed; their rows are placeholders
    pub missing: Vec<usize>,
}

impl NdarrayBatch {
    /// Number of frame slots in the batch.
    pub fn num_frames(&self) -> usize {
        if let Some(ts) = &self.timestamps {
            return ts.len();
        }
        self.csi
            .as_ref()
            .map(|a| a.dim().0)
            .or_else(|| self.magnitude.as_ref().map(|a| a.dim().0))
            .or_else(|| self.phase.as_ref().map(|a| a.dim().0))
            .unwrap_or(0)
    }
}

/// Reference tensor shape: the first successfully decoded frame wins.
fn reference_shape(frames: &[Result<FrameNdarray>]) -> Option<(usize, (usize, usize, usize))> {
    frames.iter().enumerate().find_map(|(i, r)| {
        r.as_ref()
            .ok()
            .and_then(|f| f.tensor_shape())
            .map(|s| (i, s))
    })
}

/// Stack ordered per-frame results into a batch.
///
/// # Errors
///
/// Returns `ParseError::BatchShape` if any successfully decoded
/// frame's tensor shape differs from the first one's.
pub fn stack_frames(
    frames: &[Result<FrameNdarray>],
    request: ComponentRequest,
) -> Result<NdarrayBatch> {
    let n = frames.len();
    let missing: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.is_err().then_some(i))
        .collect();

    let shape = if request.wants_tensor() {
        match reference_shape(frames) {
            Some((first, expected)) => {
                for (i, result) in frames.iter().enumerate().skip(first + 1) {
                    if let Ok(frame) = result {
                        if let Some(actual) = frame.tensor_shape() {
                            if actual != expected {
                                return Err(ParseError::batch_shape(
                                    i,
                                    vec![expected.0, expected.1, expected.2],
                                    vec![actual.0, actual.1, actual.2],
                                ));
                            }
                        }
                    }
                }
                expected
            }
            // Nothing decodable: zero-sized tensor rows.
            None => (0, 0, 0),
        }
    } else {
        (0, 0, 0)
    };
    let (d0, d1, d2) = shape;

    let mut timestamps = request.timestamp.then(|| Array1::<u64>::zeros(n));
    let mut csi = request
        .csi
        .then(|| Array4::from_elem((n, d0, d1, d2), Complex32::new(f32::NAN, f32::NAN)));
    let mut mag = request
        .magnitude
        .then(|| Array4::from_elem((n, d0, d1, d2), f32::NAN));
    let mut phase = request
        .phase
        .then(|| Array4::from_elem((n, d0, d1, d2), f32::NAN));

    for (i, result) in frames.iter().enumerate() {
        let frame = match result {
            Ok(frame) => frame,
            Err(_) => continue,
        };
        if let (Some(out), Some(ts)) = (timestamps.as_mut(), frame.timestamp_ns) {
            out[i] = ts;
        }
        if let (Some(out), Some(row)) = (csi.as_mut(), frame.csi.as_ref()) {
            out.index_axis_mut(Axis(0), i).assign(row);
        }
        if let (Some(out), Some(row)) = (mag.as_mut(), frame.magnitude.as_ref()) {
            out.index_axis_mut(Axis(0), i).assign(row);
        }
        if let (Some(out), Some(row)) = (phase.as_mut(), frame.phase.as_ref()) {
            out.index_axis_mut(Axis(0), i).assign(row);
        }
    }

    Ok(NdarrayBatch {
        timestamps,
        csi,
        magnitude: mag,
        phase,
        missing,
    })
}
