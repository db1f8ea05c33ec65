// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Component request flags for frame extraction.
//!
//! Callers select which per-frame components to materialize. Disabled
//! components are absent from the results (`None`), never zero-filled
//! placeholders, and never affect the values of enabled components.

use serde::{Deserialize, Serialize};

/// Which components to extract for each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRequest {
    /// Extract the frame timestamp
    pub timestamp: bool,
    /// Extract the raw complex CSI tensor
    pub csi: bool,
    /// Derive the magnitude tensor
    pub magnitude: bool,
    /// Derive the phase tensor
    pub phase: bool,
}

impl ComponentRequest {
    /// Request every component.
    pub fn all() -> Self {
        Self {
            timestamp: true,
            csi: true,
            magnitude: true,
            phase: true,
        }
    }

    /// Request no components.
    pub fn none() -> Self {
        Self {
            timestamp: false,
            csi: false,
            magnitude: false,
            phase: false,
        }
    }

    /// Enable or disable the timestamp component.
    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = enabled;
        self
    }

    /// Enable or disable the raw CSI component.
    pub fn with_csi(mut self, enabled: bool) -> Self {
        self.csi = enabled;
        self
    }

    /// Enable or disable the magnitude component.
    pub fn with_magnitude(mut self, enabled: bool) -> Self {
        self.magnitude = enabled;
        self
    }

    /// Enable or disable the phase component.
    pub fn with_phase(mut self, enabled: bool) -> Self {
        self.phase = enabled;
        self
    }

    /// Check whether any component is requested.
    pub fn is_empty(&self) -> bool {
        !(self.timestamp || self.csi || self.magnitude || self.phase)
    }

    /// Check whether any tensor component (csi, magnitude, phase) is
    /// requested.
    pub fn wants_tensor(&self) -> bool {
        self.csi || self.magnitude || self.phase
    }
}

impl Default for ComponentRequest {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_and_none() {
        assert!(!ComponentRequest::all().is_empty());
        assert!(ComponentRequest::none().is_empty());
        assert!(ComponentRequest::all().wants_tensor());
        assert!(!ComponentRequest::none().wants_tensor());
    }

    #[test]
    fn test_builder_flags() {
        let req = ComponentRequest::none()
            .with_timestamp(true)
            .with_magnitude(true);
        assert!(req.timestamp);
        assert!(!req.csi);
        assert!(req.magnitude);
        assert!(!req.phase);
        assert!(req.wants_tensor());
    }

    #[test]
    fn test_timestamp_only_wants_no_tensor() {
        let req = ComponentRequest::none().with_timestamp(true);
        assert!(!req.is_empty());
        assert!(!req.wants_tensor());
    }

    #[test]
    fn test_default_is_all() {
        assert_eq!(ComponentRequest::default(), ComponentRequest::all());
    }
}
