// crates/tenant-gate-core/src/core/target.rs
// ============================================================================
// Module: Tenant Targets
// Description: Decoding of the raw target payload into a Tenant view.
// Purpose: Validate the object shape before any network call is made.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The handler's first stage decodes the raw payload into a [`TenantTarget`].
//! Only the fields the decision needs are extracted (kind, name, namespace);
//! the tenant spec itself is opaque to the engine. Any shape violation is
//! fatal for the request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Decoded view of the Tenant object under admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantTarget {
    /// Object kind as declared in the payload, when present.
    pub kind: Option<String>,
    /// Object name from `metadata.name`.
    pub name: String,
    /// Object namespace from `metadata.namespace`, when present.
    pub namespace: Option<String>,
}

/// Target payload decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetDecodeError {
    /// Payload is empty.
    #[error("target payload is empty")]
    Empty,
    /// Payload is not valid JSON.
    #[error("target payload is not valid json: {0}")]
    Malformed(String),
    /// Payload is valid JSON but does not have the object shape.
    #[error("target payload has invalid shape: {0}")]
    InvalidShape(String),
    /// `metadata.name` is missing or blank.
    #[error("target payload is missing metadata.name")]
    MissingName,
    /// Declared kind does not match the expected resource kind.
    #[error("target kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind the gate is configured for.
        expected: String,
        /// Kind found in the payload or request.
        found: String,
    },
}

/// Wire shape of the fields read from the payload.
#[derive(Deserialize)]
struct RawTarget {
    /// Optional declared kind.
    #[serde(default)]
    kind: Option<String>,
    /// Object metadata.
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

/// Wire shape of object metadata.
#[derive(Deserialize)]
struct RawMetadata {
    /// Object name.
    #[serde(default)]
    name: Option<String>,
    /// Object namespace.
    #[serde(default)]
    namespace: Option<String>,
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

impl TenantTarget {
    /// Decodes a raw payload, enforcing the expected kind when declared.
    ///
    /// # Errors
    ///
    /// Returns [`TargetDecodeError`] when the payload is empty, not JSON, not
    /// an object, lacks `metadata.name`, or declares a different kind.
    pub fn decode(payload: &[u8], expected_kind: &str) -> Result<Self, TargetDecodeError> {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return Err(TargetDecodeError::Empty);
        }
        let value: Value = serde_json::from_slice(payload)
            .map_err(|err| TargetDecodeError::Malformed(err.to_string()))?;
        if !value.is_object() {
            return Err(TargetDecodeError::InvalidShape("expected a json object".to_string()));
        }
        let raw: RawTarget = serde_json::from_value(value)
            .map_err(|err| TargetDecodeError::InvalidShape(err.to_string()))?;
        if let Some(kind) = raw.kind.as_deref()
            && kind != expected_kind
        {
            return Err(TargetDecodeError::KindMismatch {
                expected: expected_kind.to_string(),
                found: kind.to_string(),
            });
        }
        let metadata = raw.metadata.ok_or(TargetDecodeError::MissingName)?;
        let name = metadata
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or(TargetDecodeError::MissingName)?;
        let namespace = metadata.namespace.filter(|namespace| !namespace.trim().is_empty());
        Ok(Self {
            kind: raw.kind,
            name,
            namespace,
        })
    }
}
