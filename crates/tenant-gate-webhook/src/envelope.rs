// crates/tenant-gate-webhook/src/envelope.rs
// ============================================================================
// Module: Admission Review Envelope
// Description: admission.k8s.io/v1 AdmissionReview decoding and rendering.
// Purpose: Map review payloads to engine requests and verdicts to responses.
// Dependencies: tenant-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Inbound reviews are decoded into an [`AdmissionRequest`]. For `DELETE` the
//! API server sends a null `object`, so `oldObject` is evaluated instead.
//! Verdicts render into a response review:
//! - `Allowed` answers `allowed: true`.
//! - `Denied` answers `allowed: false` with status code 403.
//! - `Errored` answers `allowed: false` with 400 for decode errors, 503 for
//!   cancellation, and 500 otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tenant_gate_core::AdmissionRequest;
use tenant_gate_core::AdmissionVerdict;
use tenant_gate_core::ErrorKind;
use tenant_gate_core::Operation;
use tenant_gate_core::RequestUid;
use tenant_gate_core::UnknownOperation;
use tenant_gate_core::UserInfo;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Admission review API version answered by this gate.
pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
/// Admission review kind.
pub const ADMISSION_KIND: &str = "AdmissionReview";

// ============================================================================
// SECTION: Inbound Types
// ============================================================================

/// Inbound admission review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdmissionReview {
    /// Review API version.
    #[serde(default)]
    api_version: Option<String>,
    /// Review kind.
    #[serde(default)]
    kind: Option<String>,
    /// Review request.
    #[serde(default)]
    request: Option<ReviewRequest>,
}

/// Request section of an inbound review.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewRequest {
    /// Request uid echoed in the response.
    #[serde(default)]
    uid: String,
    /// Kind of the object under review.
    #[serde(default)]
    kind: GroupVersionKind,
    /// Object name.
    #[serde(default)]
    name: String,
    /// Request namespace.
    #[serde(default)]
    namespace: Option<String>,
    /// Operation label.
    #[serde(default)]
    operation: String,
    /// Requesting principal.
    #[serde(default)]
    user_info: ReviewUserInfo,
    /// New object (absent on delete).
    #[serde(default)]
    object: Option<Value>,
    /// Existing object (present on update and delete).
    #[serde(default)]
    old_object: Option<Value>,
}

/// Group, version, and kind of the reviewed object.
#[derive(Debug, Clone, Default, Deserialize)]
struct GroupVersionKind {
    /// Object kind.
    #[serde(default)]
    kind: String,
}

/// Principal section of an inbound review.
#[derive(Debug, Clone, Default, Deserialize)]
struct ReviewUserInfo {
    /// Authenticated username.
    #[serde(default)]
    username: String,
    /// Authenticated groups.
    #[serde(default)]
    groups: Vec<String>,
}

// ============================================================================
// SECTION: Outbound Types
// ============================================================================

/// Response admission review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    /// Review API version.
    pub api_version: &'static str,
    /// Review kind.
    pub kind: &'static str,
    /// Review response.
    pub response: AdmissionResponse,
}

/// Response section of a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionResponse {
    /// Request uid echoed from the inbound review.
    pub uid: String,
    /// Final admission decision.
    pub allowed: bool,
    /// Refusal or failure detail; absent when allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ResponseStatus>,
}

/// Status detail attached to refused or failed reviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResponseStatus {
    /// HTTP-style status code.
    pub code: u16,
    /// Machine-readable status reason.
    pub reason: &'static str,
    /// Human-readable message.
    pub message: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Review envelope decoding failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// Body is not a JSON admission review.
    #[error("malformed admission review: {0}")]
    Malformed(String),
    /// Review declares an unsupported API version or kind.
    #[error("unsupported admission review: {0}")]
    Unsupported(String),
    /// Review has no request section.
    #[error("admission review has no request")]
    MissingRequest,
    /// Review request has no uid.
    #[error("admission review request has no uid")]
    MissingUid,
    /// Operation label is not recognized.
    #[error(transparent)]
    Operation(#[from] UnknownOperation),
    /// Selected object could not be re-encoded.
    #[error("admission object could not be encoded: {0}")]
    Object(String),
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes an admission review body into an engine request.
///
/// # Errors
///
/// Returns [`EnvelopeError`] when the body is not a usable `AdmissionReview`.
pub fn decode_review(body: &[u8]) -> Result<AdmissionRequest, EnvelopeError> {
    let review: AdmissionReview =
        serde_json::from_slice(body).map_err(|err| EnvelopeError::Malformed(err.to_string()))?;
    if let Some(api_version) = review.api_version.as_deref()
        && api_version != ADMISSION_API_VERSION
    {
        return Err(EnvelopeError::Unsupported(format!("apiVersion {api_version}")));
    }
    if let Some(kind) = review.kind.as_deref()
        && kind != ADMISSION_KIND
    {
        return Err(EnvelopeError::Unsupported(format!("kind {kind}")));
    }
    let request = review.request.ok_or(EnvelopeError::MissingRequest)?;
    if request.uid.trim().is_empty() {
        return Err(EnvelopeError::MissingUid);
    }
    let operation: Operation = request.operation.parse()?;
    let selected = match operation {
        Operation::Delete => request.old_object,
        Operation::Create | Operation::Update | Operation::Connect => request.object,
    };
    let object = match selected {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => {
            serde_json::to_vec(&value).map_err(|err| EnvelopeError::Object(err.to_string()))?
        }
    };
    Ok(AdmissionRequest {
        uid: RequestUid::new(request.uid),
        kind: request.kind.kind,
        name: request.name,
        namespace: request.namespace.filter(|ns| !ns.trim().is_empty()),
        operation,
        user_info: UserInfo {
            username: request.user_info.username,
            groups: request.user_info.groups,
        },
        object,
    })
}

/// Extracts `request.uid` from a body that may not decode as a review.
#[must_use]
pub fn review_uid(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| value.pointer("/request/uid").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_default()
}

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Returns the transport status code for a verdict.
#[must_use]
pub const fn status_code(verdict: &AdmissionVerdict) -> u16 {
    match verdict {
        AdmissionVerdict::Allowed { .. } | AdmissionVerdict::Denied { .. } => 200,
        AdmissionVerdict::Errored {
            kind, ..
        } => error_code(*kind),
    }
}

/// Returns the status code attached to an errored review.
const fn error_code(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::DecodeError => 400,
        ErrorKind::Cancelled => 503,
        ErrorKind::RoleResolutionError | ErrorKind::PermissionQueryError => 500,
    }
}

/// Renders a verdict into a response review for `uid`.
#[must_use]
pub fn render_review(uid: &str, verdict: &AdmissionVerdict) -> AdmissionReviewResponse {
    let status = match verdict {
        AdmissionVerdict::Allowed { .. } => None,
        AdmissionVerdict::Denied {
            reason,
        } => Some(ResponseStatus {
            code: 403,
            reason: "Forbidden",
            message: reason.clone(),
        }),
        AdmissionVerdict::Errored {
            kind,
            message,
        } => Some(ResponseStatus {
            code: error_code(*kind),
            reason: match kind {
                ErrorKind::DecodeError => "BadRequest",
                ErrorKind::Cancelled => "ServiceUnavailable",
                ErrorKind::RoleResolutionError | ErrorKind::PermissionQueryError => {
                    "InternalError"
                }
            },
            message: format!("{kind}: {message}"),
        }),
    };
    AdmissionReviewResponse {
        api_version: ADMISSION_API_VERSION,
        kind: ADMISSION_KIND,
        response: AdmissionResponse {
            uid: uid.to_string(),
            allowed: verdict.is_allowed(),
            status,
        },
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
