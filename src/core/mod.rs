// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Core types shared across the crate: errors and request flags.

pub mod error;
pub mod request;

pub use error::{ParseError, Result};
pub use request::ComponentRequest;
