// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Numeric derivation and batch assembly over decoded CSI records.

pub mod batch;
pub mod derive;

pub use batch::{stack_frames, NdarrayBatch};
pub use derive::{
    canonical_grid, derive_frame, interpolate, magnitude, phase, DeriveError, FrameNdarray,
};
