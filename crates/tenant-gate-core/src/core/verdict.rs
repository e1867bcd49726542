// crates/tenant-gate-core/src/core/verdict.rs
// ============================================================================
// Module: Queries and Verdicts
// Description: Per-role permission queries and terminal admission verdicts.
// Purpose: Keep "access refused" and "evaluation failed" as distinct outcomes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PermissionQuery`] asks whether a single role may perform a verb on a
//! resource. The [`AdmissionVerdict`] is the terminal result of a whole
//! evaluation.
//!
//! ## Invariants
//! - `Denied` is a successful "no"; `Errored` means the system could not decide.
//!   The two are never interchangeable.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Permission Query
// ============================================================================

/// Single per-role access question for the cluster authorization subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionQuery {
    /// Role acting as the subject.
    pub role: String,
    /// Resource being accessed (plural resource name).
    pub resource: String,
    /// Verb being performed.
    pub verb: String,
    /// Namespace scope for the check.
    pub namespace: String,
    /// Object name, when the check targets a single object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Answer for exactly one [`PermissionQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionVerdict {
    /// Raw allow flag returned by the authorization subsystem.
    pub allowed: bool,
    /// Optional explanation supplied with the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionVerdict {
    /// Builds an allow verdict.
    #[must_use]
    pub const fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// Builds a deny verdict with an optional reason.
    #[must_use]
    pub const fn deny(reason: Option<String>) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

// ============================================================================
// SECTION: Admission Verdict
// ============================================================================

/// Failure classification for an errored evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Inbound payload could not be decoded.
    DecodeError,
    /// Roles could not be fetched from the identity provider.
    RoleResolutionError,
    /// A per-role permission query could not be completed.
    PermissionQueryError,
    /// Evaluation was aborted by an external cancellation signal.
    Cancelled,
}

impl ErrorKind {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DecodeError => "decode_error",
            Self::RoleResolutionError => "role_resolution_error",
            Self::PermissionQueryError => "permission_query_error",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one admission evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdmissionVerdict {
    /// Request is authorized.
    Allowed {
        /// Human-readable grant explanation.
        reason: String,
    },
    /// Request is correctly refused.
    Denied {
        /// Human-readable refusal explanation.
        reason: String,
    },
    /// Evaluation failed; no decision could be made.
    Errored {
        /// Failure classification.
        kind: ErrorKind,
        /// Failure description.
        message: String,
    },
}

impl AdmissionVerdict {
    /// Builds an allowed verdict.
    #[must_use]
    pub fn allowed(reason: impl Into<String>) -> Self {
        Self::Allowed {
            reason: reason.into(),
        }
    }

    /// Builds a denied verdict.
    #[must_use]
    pub fn denied(reason: impl Into<String>) -> Self {
        Self::Denied {
            reason: reason.into(),
        }
    }

    /// Builds an errored verdict.
    #[must_use]
    pub fn errored(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::Errored {
            kind,
            message: message.into(),
        }
    }

    /// Returns true for [`AdmissionVerdict::Allowed`].
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    /// Returns true for [`AdmissionVerdict::Denied`].
    #[must_use]
    pub const fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }

    /// Returns the error kind for errored verdicts.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Errored {
                kind, ..
            } => Some(*kind),
            Self::Allowed { .. } | Self::Denied { .. } => None,
        }
    }

    /// Returns the stable outcome label.
    #[must_use]
    pub const fn outcome_label(&self) -> &'static str {
        match self {
            Self::Allowed { .. } => "allowed",
            Self::Denied { .. } => "denied",
            Self::Errored { .. } => "errored",
        }
    }

    /// Returns the reason or error message carried by the verdict.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Allowed {
                reason,
            }
            | Self::Denied {
                reason,
            } => reason,
            Self::Errored {
                message, ..
            } => message,
        }
    }
}
