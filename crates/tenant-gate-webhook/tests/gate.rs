// crates/tenant-gate-webhook/tests/gate.rs
// ============================================================================
// Module: Tenant Gate Tests
// Description: Review bodies through the gate with in-memory collaborators.
// Purpose: Validate rendering, status codes, and one audit event per review.
// Dependencies: tenant-gate-{core,webhook}, serde_json, tokio
// ============================================================================

//! ## Overview
//! Each test feeds a raw admission review body to [`TenantGate::review`] and
//! checks the rendered response, the transport status, and the audit event.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::use_debug,
    reason = "Test-only assertions use unwrap/expect for clarity."
)]

mod common;

use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use tenant_gate_core::CancellationToken;
use tenant_gate_core::ErrorKind;
use tenant_gate_core::ResolverError;
use tenant_gate_core::RoleOutcome;
use tenant_gate_webhook::TenantGate;

use crate::common::CapturingSink;
use crate::common::FixedResolver;
use crate::common::GrantingEvaluator;
use crate::common::review_body;
use crate::common::scripted_gate;
use crate::common::tenant_object;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

struct Harness {
    gate: TenantGate,
    resolver: Arc<FixedResolver>,
    evaluator: Arc<GrantingEvaluator>,
    sink: Arc<CapturingSink>,
}

fn harness(resolver: FixedResolver, granted: &[&str]) -> Harness {
    let resolver = Arc::new(resolver);
    let evaluator = Arc::new(GrantingEvaluator::new(granted));
    let sink = Arc::new(CapturingSink::default());
    let gate = scripted_gate(Arc::clone(&resolver), Arc::clone(&evaluator), Arc::clone(&sink));
    Harness {
        gate,
        resolver,
        evaluator,
        sink,
    }
}

fn rendered(outcome: &tenant_gate_webhook::ReviewOutcome) -> Value {
    serde_json::to_value(&outcome.response).unwrap()
}

// ============================================================================
// SECTION: Verdicts
// ============================================================================

#[tokio::test]
async fn first_granting_role_allows_update() {
    let h = harness(FixedResolver::roles(&["viewer", "editor", "admin"]), &["editor", "admin"]);
    let body = review_body("uid-allow", "UPDATE", "bob", &tenant_object("alpha", None));

    let outcome = h.gate.review(&body, &CancellationToken::new()).await;

    assert!(outcome.verdict.is_allowed());
    assert_eq!(outcome.http_status, 200);
    assert_eq!(
        rendered(&outcome),
        json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "response": {"uid": "uid-allow", "allowed": true}
        })
    );
    let roles: Vec<String> = h.evaluator.calls().into_iter().map(|query| query.role).collect();
    assert_eq!(roles, ["viewer", "editor"]);
    assert!(h.evaluator.calls().iter().all(|query| query.verb == "update"));
}

#[tokio::test]
async fn no_granting_role_denies_with_forbidden_status() {
    let h = harness(FixedResolver::roles(&["viewer"]), &[]);
    let body = review_body("uid-deny", "CREATE", "alice", &tenant_object("alpha", Some("team-a")));

    let outcome = h.gate.review(&body, &CancellationToken::new()).await;

    assert!(outcome.verdict.is_denied());
    assert_eq!(outcome.http_status, 200);
    let value = rendered(&outcome);
    assert_eq!(value["response"]["allowed"], false);
    assert_eq!(value["response"]["status"]["code"], 403);
    assert_eq!(value["response"]["status"]["reason"], "Forbidden");
    assert_eq!(h.evaluator.calls()[0].namespace, "team-a");
}

#[tokio::test]
async fn delete_checks_the_old_object() {
    let h = harness(FixedResolver::roles(&["admin"]), &["admin"]);
    let body = review_body("uid-del", "DELETE", "carol", &tenant_object("gone", Some("team-b")));

    let outcome = h.gate.review(&body, &CancellationToken::new()).await;

    assert!(outcome.verdict.is_allowed());
    let calls = h.evaluator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].verb, "delete");
    assert_eq!(calls[0].namespace, "team-b");
}

// ============================================================================
// SECTION: Errors
// ============================================================================

#[tokio::test]
async fn resolver_failure_fails_closed_without_permission_checks() {
    let h = harness(FixedResolver::failing(ResolverError::Network("status 500".to_string())), &[
        "viewer",
    ]);
    let body = review_body("uid-idp", "UPDATE", "bob", &tenant_object("alpha", None));

    let outcome = h.gate.review(&body, &CancellationToken::new()).await;

    assert_eq!(outcome.verdict.error_kind(), Some(ErrorKind::RoleResolutionError));
    assert_eq!(outcome.http_status, 500);
    let value = rendered(&outcome);
    assert_eq!(value["response"]["uid"], "uid-idp");
    assert_eq!(value["response"]["allowed"], false);
    assert_eq!(value["response"]["status"]["reason"], "InternalError");
    assert_eq!(h.resolver.calls(), 1);
    assert!(h.evaluator.calls().is_empty());
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let h = harness(FixedResolver::roles(&["admin"]), &["admin"]);

    let outcome = h.gate.review(b"{not json", &CancellationToken::new()).await;

    assert_eq!(outcome.verdict.error_kind(), Some(ErrorKind::DecodeError));
    assert_eq!(outcome.http_status, 400);
    let value = rendered(&outcome);
    assert_eq!(value["response"]["uid"], "");
    assert_eq!(value["response"]["allowed"], false);
    assert_eq!(value["response"]["status"]["reason"], "BadRequest");
    assert_eq!(h.resolver.calls(), 0);
}

#[tokio::test]
async fn unknown_operation_keeps_the_request_uid() {
    let h = harness(FixedResolver::roles(&["admin"]), &["admin"]);
    let body = review_body("uid-op", "PATCH", "bob", &tenant_object("alpha", None));

    let outcome = h.gate.review(&body, &CancellationToken::new()).await;

    assert_eq!(outcome.verdict.error_kind(), Some(ErrorKind::DecodeError));
    assert_eq!(rendered(&outcome)["response"]["uid"], "uid-op");
    assert_eq!(h.resolver.calls(), 0);
}

#[tokio::test]
async fn wrong_object_kind_is_a_decode_error() {
    let h = harness(FixedResolver::roles(&["admin"]), &["admin"]);
    let mut object = tenant_object("alpha", None);
    object["kind"] = json!("ConfigMap");
    let body = review_body("uid-kind", "CREATE", "bob", &object);

    let outcome = h.gate.review(&body, &CancellationToken::new()).await;

    assert_eq!(outcome.verdict.error_kind(), Some(ErrorKind::DecodeError));
    assert_eq!(h.resolver.calls(), 0);
}

#[tokio::test]
async fn cancelled_review_is_unavailable() {
    let h = harness(FixedResolver::roles(&["admin"]), &["admin"]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let body = review_body("uid-cancel", "CREATE", "bob", &tenant_object("alpha", None));

    let outcome = h.gate.review(&body, &cancel).await;

    assert_eq!(outcome.verdict.error_kind(), Some(ErrorKind::Cancelled));
    assert_eq!(outcome.http_status, 503);
    assert_eq!(rendered(&outcome)["response"]["status"]["reason"], "ServiceUnavailable");
}

// ============================================================================
// SECTION: Audit
// ============================================================================

#[tokio::test]
async fn every_review_records_one_audit_event() {
    let h = harness(FixedResolver::roles(&["viewer", "editor"]), &["editor"]);
    let body = review_body("uid-audit", "UPDATE", "bob", &tenant_object("alpha", None));

    h.gate.review(&body, &CancellationToken::new()).await;
    h.gate.review(b"[]", &CancellationToken::new()).await;

    let events = h.sink.events();
    assert_eq!(events.len(), 2);

    let allowed = &events[0];
    assert_eq!(allowed.request_uid, "uid-audit");
    assert_eq!(allowed.operation, Some("UPDATE"));
    assert_eq!(allowed.name.as_deref(), Some("alpha"));
    assert_eq!(allowed.namespace.as_deref(), Some("default"));
    assert_eq!(allowed.username.as_deref(), Some("bob"));
    assert_eq!(allowed.roles.as_deref(), Some(&["viewer".to_string(), "editor".to_string()][..]));
    assert_eq!(allowed.evaluated.len(), 2);
    assert_eq!(allowed.evaluated[0].outcome, RoleOutcome::Denied);
    assert_eq!(allowed.evaluated[1].outcome, RoleOutcome::Allowed);
    assert_eq!(allowed.outcome, "allowed");
    assert_eq!(allowed.error_kind, None);
    assert_eq!(allowed.http_status, 200);

    let rejected = &events[1];
    assert_eq!(rejected.request_uid, "");
    assert_eq!(rejected.operation, None);
    assert_eq!(rejected.username, None);
    assert_eq!(rejected.outcome, "errored");
    assert_eq!(rejected.error_kind, Some("decode_error"));
    assert_eq!(rejected.http_status, 400);
}

#[tokio::test]
async fn audit_event_never_carries_credentials() {
    let h = harness(FixedResolver::failing(ResolverError::Auth("status 401".to_string())), &[]);
    let body = review_body("uid-cred", "CREATE", "bob", &tenant_object("alpha", None));

    h.gate.review(&body, &CancellationToken::new()).await;

    let events = h.sink.events();
    let payload = serde_json::to_string(&events[0]).unwrap();
    assert!(!payload.to_ascii_lowercase().contains("bearer"));
    assert_eq!(events[0].roles, None);
}
