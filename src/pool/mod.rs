// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Bounded worker pool for parallel frame decode and derivation.

pub mod worker;

pub use worker::{TaskContext, UnorderedFrames, WorkerPool};
