// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Numeric derivation: magnitude, phase, subcarrier interpolation.
//!
//! Magnitude is the elementwise complex modulus, phase the elementwise
//! argument in (-π, π] (the `atan2` convention; no unwrapping across
//! subcarriers or frames happens here — unwrapping is a downstream
//! concern). Interpolation resamples the subcarrier axis onto the
//! canonical grid for the frame's bandwidth, linearly over real and
//! imaginary parts independently; interpolating magnitude/phase instead
//! would wrap at the ±π discontinuity.
//!
//! Derivation is deterministic: the same record and flags produce the
//! same arrays, modulo floating-point reassociation across compilers.

use chrono::{DateTime, Utc};
use ndarray::{Array3, Zip};
use num_complex::Complex32;

use crate::core::ComponentRequest;
use crate::decode::CsiRecord;

/// Derivation failure for a single frame.
#[derive(Debug, Clone, thiserror::Error)]
pub enum DeriveError {
    /// No canonical grid is defined for the frame's bandwidth
    #[error("no canonical subcarrier grid for {0} MHz bandwidth")]
    UnknownBandwidth(u16),

    /// Subcarrier indices are not strictly increasing
    #[error("subcarrier indices must be strictly increasing for interpolation")]
    UnsortedIndices,
}

/// The per-frame public result.
///
/// Each component is present only if requested. Derived arrays are
/// independent of the source mapping and may outlive the session.
#[derive(Debug, Clone, Default)]
pub struct FrameNdarray {
    /// Capture timestamp, ns since the Unix epoch
    pub timestamp_ns: Option<u64>,
    /// Complex CSI tensor, `(subcarrier, tx, stream)`
    pub csi: Option<Array3<Complex32>>,
    /// Elementwise modulus of the CSI tensor
    pub magnitude: Option<Array3<f32>>,
    /// Elementwise argument of the CSI tensor, (-π, π]
    pub phase: Option<Array3<f32>>,
}

impl FrameNdarray {
    /// Capture timestamp as a UTC calendar value, if requested.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp_ns
            .map(|ns| DateTime::from_timestamp_nanos(ns as i64))
    }

    /// Shape of whichever tensor component is present, if any.
    pub fn tensor_shape(&self) -> Option<(usize, usize, usize)> {
        self.csi
            .as_ref()
            .map(|a| a.dim())
            .or_else(|| self.magnitude.as_ref().map(|a| a.dim()))
            .or_else(|| self.phase.as_ref().map(|a| a.dim()))
    }
}

/// Elementwise complex modulus.
pub fn magnitude(csi: &Array3<Complex32>) -> Array3<f32> {
    csi.mapv(|z| z.norm())
}

/// Elementwise complex argument, (-π, π].
pub fn phase(csi: &Array3<Complex32>) -> Array3<f32> {
    csi.mapv(|z| {
        let p = z.arg();
        // atan2 maps a negative-zero imaginary part onto exactly -π.
        if p == -std::f32::consts::PI {
            std::f32::consts::PI
        } else {
            p
        }
    })
}

/// Canonical subcarrier grid for a bandwidth: contiguous integer
/// indices `-h..=h`, so every frame of the same bandwidth resamples to
/// the same tone count.
pub fn canonical_grid(cbw_mhz: u16) -> Result<Vec<i16>, DeriveError> {
    let half: i16 = match cbw_mhz {
        20 => 28,
        40 => 58,
        80 => 122,
        160 => 250,
        other => return Err(DeriveError::UnknownBandwidth(other)),
    };
    Ok((-half..=half).collect())
}

/// Resample the subcarrier axis of `record` onto the canonical grid
/// for its bandwidth.
///
/// Linear over real and imaginary parts; grid points at an exact
/// native index take the native sample unchanged, points outside the
/// native range hold the nearest edge value.
pub fn interpolate(record: &CsiRecord) -> Result<Array3<Complex32>, DeriveError> {
    let grid = canonical_grid(record.cbw_mhz)?;
    let indices = &record.subcarrier_indices;
    if indices.windows(2).any(|w| w[0] >= w[1]) {
        return Err(DeriveError::UnsortedIndices);
    }

    let (_, tx, streams) = record.csi.dim();
    let mut out = Array3::from_elem((grid.len(), tx, streams), Complex32::new(0.0, 0.0));

    for (g, &target) in grid.iter().enumerate() {
        match indices.binary_search(&target) {
            Ok(native) => {
                // Exact native tone: copy through bit-identically.
                out.index_axis_mut(ndarray::Axis(0), g)
                    .assign(&record.csi.index_axis(ndarray::Axis(0), native));
            }
            Err(insert) => {
                if insert == 0 {
                    out.index_axis_mut(ndarray::Axis(0), g)
                        .assign(&record.csi.index_axis(ndarray::Axis(0), 0));
                } else if insert == indices.len() {
                    out.index_axis_mut(ndarray::Axis(0), g)
                        .assign(&record.csi.index_axis(ndarray::Axis(0), indices.len() - 1));
                } else {
                    let lo = insert - 1;
                    let hi = insert;
                    let t = (target - indices[lo]) as f32 / (indices[hi] - indices[lo]) as f32;
                    let below = record.csi.index_axis(ndarray::Axis(0), lo);
                    let above = record.csi.index_axis(ndarray::Axis(0), hi);
                    let mut row = out.index_axis_mut(ndarray::Axis(0), g);
                    Zip::from(&mut row).and(&below).and(&above).for_each(
                        |dst, &a, &b| {
                            *dst = Complex32::new(
                                a.re + (b.re - a.re) * t,
                                a.im + (b.im - a.im) * t,
                            );
                        },
                    );
                }
            }
        }
    }

    Ok(out)
}

/// Derive the requested components for one decoded frame.
pub fn derive_frame(
    record: &CsiRecord,
    request: ComponentRequest,
    interp: bool,
) -> Result<FrameNdarray, DeriveError> {
    let resampled;
    let tensor: &Array3<Complex32> = if interp && request.wants_tensor() {
        resampled = interpolate(record)?;
        &resampled
    } else {
        &record.csi
    };

    Ok(FrameNdarray {
        timestamp_ns: request.timestamp.then_some(record.timestamp_ns),
        csi: request.csi.then(|| tensor.clone()),
        magnitude: request.magnitude.then(|| magnitude(tensor)),
        phase: request.phase.then(|| phase(tensor)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DeviceInfo;
    use std::f32::consts::PI;

    fn record(cbw_mhz: u16, indices: Vec<i16>, samples: Vec<Complex32>) -> CsiRecord {
        let tones = indices.len();
        CsiRecord {
            device: DeviceInfo {
                format_version: 1,
                device_type: 0,
            },
            timestamp_ns: 1_000,
            cbw_mhz,
            subcarrier_indices: indices,
            csi: Array3::from_shape_vec((tones, 1, 1), samples).unwrap(),
        }
    }

    #[test]
    fn test_magnitude_phase_identity() {
        let samples = vec![
            Complex32::new(3.0, 4.0),
            Complex32::new(-1.0, 0.0),
            Complex32::new(0.0, -2.0),
            Complex32::new(0.0, 0.0),
        ];
        let rec = record(20, vec![-2, -1, 1, 2], samples.clone());

        let mag = magnitude(&rec.csi);
        let ph = phase(&rec.csi);

        assert_eq!(mag[[0, 0, 0]], 5.0);
        assert_eq!(mag[[3, 0, 0]], 0.0); // |0| == 0
        assert_eq!(ph[[1, 0, 0]], PI); // arg(-1) == π, not -π

        for (i, z) in samples.iter().enumerate() {
            let m = mag[[i, 0, 0]];
            let p = ph[[i, 0, 0]];
            assert!(p > -PI && p <= PI);
            assert!((m * p.cos() - z.re).abs() < 1e-5);
            assert!((m * p.sin() - z.im).abs() < 1e-5);
        }
    }

    #[test]
    fn test_phase_negative_zero_imaginary_maps_to_pi() {
        // atan2(-0.0, -1.0) is -π; the phase range stays (-π, π].
        let rec = record(
            20,
            vec![-1, 1],
            vec![Complex32::new(-1.0, -0.0), Complex32::new(-2.5, 0.0)],
        );
        let ph = phase(&rec.csi);
        assert_eq!(ph[[0, 0, 0]], PI);
        assert_eq!(ph[[1, 0, 0]], PI);
        for p in ph.iter() {
            assert!(*p > -PI && *p <= PI);
        }
    }

    #[test]
    fn test_canonical_grid_sizes() {
        assert_eq!(canonical_grid(20).unwrap().len(), 57);
        assert_eq!(canonical_grid(40).unwrap().len(), 117);
        assert_eq!(canonical_grid(80).unwrap().len(), 245);
        assert_eq!(canonical_grid(160).unwrap().len(), 501);
        assert!(matches!(
            canonical_grid(30),
            Err(DeriveError::UnknownBandwidth(30))
        ));
    }

    #[test]
    fn test_interpolation_identity_on_canonical_input() {
        // Native grid already equals the canonical grid: output must
        // be numerically equal to the input.
        let grid = canonical_grid(20).unwrap();
        let samples: Vec<Complex32> = grid
            .iter()
            .map(|&i| Complex32::new(i as f32, -i as f32))
            .collect();
        let rec = record(20, grid, samples);

        let out = interpolate(&rec).unwrap();
        assert_eq!(out, rec.csi);
    }

    #[test]
    fn test_interpolation_fills_gap_linearly() {
        // Native tones at -28..=28 except 0; the DC tone must be the
        // midpoint of its neighbours.
        let indices: Vec<i16> = (-28..=28).filter(|&i| i != 0).collect();
        let samples: Vec<Complex32> = indices
            .iter()
            .map(|&i| Complex32::new(2.0 * i as f32, 1.0))
            .collect();
        let rec = record(20, indices, samples);

        let out = interpolate(&rec).unwrap();
        assert_eq!(out.dim(), (57, 1, 1));
        let dc = out[[28, 0, 0]];
        assert!((dc.re - 0.0).abs() < 1e-5);
        assert!((dc.im - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_interpolation_holds_edges() {
        // Native range narrower than the canonical grid: outside
        // points hold the nearest native sample.
        let rec = record(
            20,
            vec![-10, 10],
            vec![Complex32::new(-5.0, 0.0), Complex32::new(5.0, 0.0)],
        );
        let out = interpolate(&rec).unwrap();
        assert_eq!(out[[0, 0, 0]], Complex32::new(-5.0, 0.0)); // index -28
        assert_eq!(out[[56, 0, 0]], Complex32::new(5.0, 0.0)); // index 28
        assert_eq!(out[[28, 0, 0]], Complex32::new(0.0, 0.0)); // midpoint
    }

    #[test]
    fn test_interpolation_rejects_unsorted_indices() {
        let rec = record(
            20,
            vec![3, -3],
            vec![Complex32::new(1.0, 0.0), Complex32::new(2.0, 0.0)],
        );
        assert!(matches!(
            interpolate(&rec),
            Err(DeriveError::UnsortedIndices)
        ));
    }

    #[test]
    fn test_derive_frame_component_independence() {
        let rec = record(
            20,
            vec![-1, 1],
            vec![Complex32::new(3.0, 4.0), Complex32::new(1.0, 0.0)],
        );

        let full = derive_frame(&rec, ComponentRequest::all(), false).unwrap();
        let partial = derive_frame(
            &rec,
            ComponentRequest::none().with_timestamp(true).with_phase(true),
            false,
        )
        .unwrap();

        assert!(partial.csi.is_none());
        assert!(partial.magnitude.is_none());
        assert_eq!(partial.timestamp_ns, full.timestamp_ns);
        assert_eq!(partial.phase, full.phase);
    }

    #[test]
    fn test_derive_frame_native_subcarriers_without_interp() {
        let rec = record(
            20,
            vec![-7, 7],
            vec![Complex32::new(1.0, 1.0), Complex32::new(2.0, 2.0)],
        );
        let out = derive_frame(&rec, ComponentRequest::all(), false).unwrap();
        assert_eq!(out.tensor_shape(), Some((2, 1, 1)));
        assert_eq!(out.csi.unwrap(), rec.csi);
    }

    #[test]
    fn test_derive_frame_skips_interpolation_when_no_tensor_wanted() {
        // Unknown bandwidth would fail interpolation, but a
        // timestamp-only request never touches the tensor.
        let rec = record(
            30,
            vec![-1, 1],
            vec![Complex32::new(1.0, 0.0), Complex32::new(1.0, 0.0)],
        );
        let out = derive_frame(
            &rec,
            ComponentRequest::none().with_timestamp(true),
            true,
        )
        .unwrap();
        assert_eq!(out.timestamp_ns, Some(1_000));
    }
}
