// crates/tenant-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Tenant Gate Identifiers
// Description: Opaque identifiers attached to admission requests.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Request identifiers are opaque strings echoed back to the orchestrator and
//! used only for correlation. They carry no meaning for the decision.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Unique identifier the orchestrator assigns to one admission request.
///
/// # Invariants
/// - Opaque; echoed back in the admission response and used for correlation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestUid(String);

impl RequestUid {
    /// Creates a new request identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RequestUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequestUid {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
