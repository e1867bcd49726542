// crates/tenant-gate-webhook/src/audit.rs
// ============================================================================
// Module: Decision Audit Logging
// Description: Structured audit events for admission decisions.
// Purpose: Emit one JSON line per evaluated review without hard dependencies.
// Dependencies: tenant-gate-core, serde, serde_json
// ============================================================================

//! ## Overview
//! Every review evaluated by the gate produces exactly one
//! `admission_decision` event. Sinks are best-effort: a sink that cannot
//! serialize or write drops the event silently and the verdict stands.
//! Bearer tokens never reach these events.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;
use tenant_gate_core::RoleDecision;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Admission decision audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Admission request uid.
    pub request_uid: String,
    /// Operation label, when the review decoded.
    pub operation: Option<&'static str>,
    /// Target object name, when decoded.
    pub name: Option<String>,
    /// Effective namespace used for permission checks, when reached.
    pub namespace: Option<String>,
    /// Requesting username, when the review decoded.
    pub username: Option<String>,
    /// Requesting groups.
    pub groups: Vec<String>,
    /// Roles resolved for the principal, when resolution succeeded.
    pub roles: Option<Vec<String>>,
    /// Per-role queries issued, in order.
    pub evaluated: Vec<RoleDecision>,
    /// Outcome label (`allowed`, `denied`, `errored`).
    pub outcome: &'static str,
    /// Error kind label for errored outcomes.
    pub error_kind: Option<&'static str>,
    /// Verdict reason or error message.
    pub reason: String,
    /// Transport status code of the rendered response.
    pub http_status: u16,
}

/// Inputs required to construct a decision audit event.
pub struct DecisionAuditEventParams {
    /// Admission request uid.
    pub request_uid: String,
    /// Operation label.
    pub operation: Option<&'static str>,
    /// Target object name.
    pub name: Option<String>,
    /// Effective namespace.
    pub namespace: Option<String>,
    /// Requesting username.
    pub username: Option<String>,
    /// Requesting groups.
    pub groups: Vec<String>,
    /// Resolved roles.
    pub roles: Option<Vec<String>>,
    /// Per-role queries issued.
    pub evaluated: Vec<RoleDecision>,
    /// Outcome label.
    pub outcome: &'static str,
    /// Error kind label.
    pub error_kind: Option<&'static str>,
    /// Verdict reason or error message.
    pub reason: String,
    /// Transport status code.
    pub http_status: u16,
}

impl DecisionAuditEvent {
    /// Creates a new decision audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: DecisionAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "admission_decision",
            timestamp_ms,
            request_uid: params.request_uid,
            operation: params.operation,
            name: params.name,
            namespace: params.namespace,
            username: params.username,
            groups: params.groups,
            roles: params.roles,
            evaluated: params.evaluated,
            outcome: params.outcome,
            error_kind: params.error_kind,
            reason: params.reason,
            http_status: params.http_status,
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for admission decisions.
pub trait DecisionAuditSink: Send + Sync {
    /// Record a decision event.
    fn record(&self, event: &DecisionAuditEvent);
}

/// Audit sink that discards events.
pub struct NoopAuditSink;

impl DecisionAuditSink for NoopAuditSink {
    fn record(&self, _event: &DecisionAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl DecisionAuditSink for StderrAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl DecisionAuditSink for FileAuditSink {
    fn record(&self, event: &DecisionAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
