// crates/tenant-gate-core/src/core/request.rs
// ============================================================================
// Module: Admission Requests
// Description: Inbound admission request model and principal projection.
// Purpose: Carry one change request from the transport into the engine.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`AdmissionRequest`] is immutable once received and is owned by the
//! admission handler for the duration of one evaluation. The [`Principal`] is
//! a borrowed projection of the requesting user, not a stored entity.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::identifiers::RequestUid;

// ============================================================================
// SECTION: Operation
// ============================================================================

/// Operation requested against the target object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Object creation.
    Create,
    /// Object update.
    Update,
    /// Object deletion.
    Delete,
    /// Connect to a subresource (exec, proxy, port-forward).
    Connect,
}

impl Operation {
    /// Returns the authorization verb checked for this operation.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Connect => "connect",
        }
    }

    /// Returns the wire label used by admission reviews.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Connect => "CONNECT",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "connect" => Ok(Self::Connect),
            _ => Err(UnknownOperation(value.to_string())),
        }
    }
}

/// Error returned when an operation label is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown admission operation: {0}")]
pub struct UnknownOperation(pub String);

// ============================================================================
// SECTION: Request
// ============================================================================

/// Requesting user as reported by the orchestrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Authenticated username.
    pub username: String,
    /// Group memberships reported for the user.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// One inbound admission request.
///
/// # Invariants
/// - `object` holds the raw serialized target as received; it is decoded by
///   the handler, never trusted up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionRequest {
    /// Unique request identifier.
    pub uid: RequestUid,
    /// Target object kind.
    pub kind: String,
    /// Target object name.
    pub name: String,
    /// Target object namespace when the request carries one.
    pub namespace: Option<String>,
    /// Requested operation.
    pub operation: Operation,
    /// Requesting principal.
    pub user_info: UserInfo,
    /// Raw serialized target object payload.
    pub object: Vec<u8>,
}

impl AdmissionRequest {
    /// Returns the principal projection for this request.
    #[must_use]
    pub fn principal(&self) -> Principal<'_> {
        Principal {
            username: &self.user_info.username,
            groups: &self.user_info.groups,
        }
    }
}

/// Borrowed view of the requesting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal<'a> {
    /// Username used for role resolution.
    pub username: &'a str,
    /// Group memberships (recorded for audit, not used for the decision).
    pub groups: &'a [String],
}
