// crates/tenant-gate-webhook/src/lib.rs
// ============================================================================
// Module: Tenant Gate Webhook
// Description: Admission review mapping, decision audit, and gate wiring.
// Purpose: Turn admission review payloads into rendered review responses.
// Dependencies: tenant-gate-{core,providers,config}, serde, serde_json
// ============================================================================

//! ## Overview
//! [`TenantGate`] binds a validated configuration to the HTTP collaborators
//! and the admission handler. Each call decodes one `admission.k8s.io/v1`
//! `AdmissionReview`, evaluates it, records one decision audit event, and
//! renders the response review with its transport status.
//! Invariants:
//! - A malformed review is answered with a decode error, never an allow.
//! - Audit sink failures never change the verdict.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod envelope;
pub mod gate;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::DecisionAuditEvent;
pub use audit::DecisionAuditEventParams;
pub use audit::DecisionAuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use envelope::AdmissionReviewResponse;
pub use envelope::EnvelopeError;
pub use envelope::decode_review;
pub use envelope::render_review;
pub use gate::GateError;
pub use gate::ReviewOutcome;
pub use gate::TenantGate;
