// crates/tenant-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Scripted collaborators and request builders for engine tests.
// Purpose: Drive the aggregator and handler without network dependencies.
// Dependencies: tenant-gate-core, async-trait
// ============================================================================

//! ## Overview
//! Scripted doubles answer from a fixed table and record every call so tests
//! can assert call order, call counts, and short-circuiting.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use tenant_gate_core::AdmissionRequest;
use tenant_gate_core::EvaluatorError;
use tenant_gate_core::Operation;
use tenant_gate_core::PermissionEvaluator;
use tenant_gate_core::PermissionQuery;
use tenant_gate_core::PermissionVerdict;
use tenant_gate_core::RequestUid;
use tenant_gate_core::ResolverError;
use tenant_gate_core::RoleResolver;
use tenant_gate_core::RoleSet;
use tenant_gate_core::UserInfo;

// ============================================================================
// SECTION: Scripted Evaluator
// ============================================================================

/// Scripted answer for one role.
#[derive(Clone)]
pub enum Answer {
    /// Role grants the request.
    Allow,
    /// Role does not grant the request.
    Deny,
    /// Query fails.
    Fail(EvaluatorError),
    /// Query never completes.
    Hang,
}

/// Evaluator answering from a role table and recording queries.
#[derive(Default)]
pub struct ScriptedEvaluator {
    /// Answers keyed by role; unknown roles are denied.
    answers: HashMap<String, Answer>,
    /// Queries received, in order.
    calls: Mutex<Vec<PermissionQuery>>,
}

impl ScriptedEvaluator {
    /// Builds an evaluator from `(role, answer)` pairs.
    pub fn new(answers: &[(&str, Answer)]) -> Self {
        Self {
            answers: answers
                .iter()
                .map(|(role, answer)| ((*role).to_string(), answer.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the queries received so far.
    pub fn calls(&self) -> Vec<PermissionQuery> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the roles queried so far, in order.
    pub fn queried_roles(&self) -> Vec<String> {
        self.calls().into_iter().map(|query| query.role).collect()
    }
}

#[async_trait]
impl PermissionEvaluator for ScriptedEvaluator {
    async fn evaluate(
        &self,
        query: &PermissionQuery,
        _correlation_id: Option<&str>,
    ) -> Result<PermissionVerdict, EvaluatorError> {
        self.calls.lock().unwrap().push(query.clone());
        match self.answers.get(&query.role).cloned().unwrap_or(Answer::Deny) {
            Answer::Allow => Ok(PermissionVerdict::allow()),
            Answer::Deny => Ok(PermissionVerdict::deny(Some("no rbac rule".to_string()))),
            Answer::Fail(err) => Err(err),
            Answer::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// SECTION: Scripted Resolver
// ============================================================================

/// Scripted resolver outcome.
#[derive(Clone)]
pub enum Resolution {
    /// Return these roles.
    Roles(Vec<&'static str>),
    /// Fail with this error.
    Fail(ResolverError),
    /// Never complete.
    Hang,
}

/// Resolver returning a fixed outcome and recording usernames.
pub struct ScriptedResolver {
    /// Outcome returned for every call.
    outcome: Resolution,
    /// Usernames received, in order.
    calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    /// Builds a resolver with a fixed outcome.
    pub const fn new(outcome: Resolution) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the usernames received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleResolver for ScriptedResolver {
    async fn resolve_roles(
        &self,
        username: &str,
        _correlation_id: Option<&str>,
    ) -> Result<RoleSet, ResolverError> {
        self.calls.lock().unwrap().push(username.to_string());
        match self.outcome.clone() {
            Resolution::Roles(roles) => Ok(roles.into_iter().collect()),
            Resolution::Fail(err) => Err(err),
            Resolution::Hang => std::future::pending().await,
        }
    }
}

// ============================================================================
// SECTION: Request Builders
// ============================================================================

/// Builds a roles set from string slices.
pub fn roles(names: &[&str]) -> RoleSet {
    names.iter().copied().collect()
}

/// Builds a well-formed Tenant admission request.
pub fn tenant_request(username: &str, operation: Operation) -> AdmissionRequest {
    AdmissionRequest {
        uid: RequestUid::new("705ab4f5-6393-11e8-b7cc-42010a800002"),
        kind: "Tenant".to_string(),
        name: "alpha".to_string(),
        namespace: None,
        operation,
        user_info: UserInfo {
            username: username.to_string(),
            groups: vec!["system:authenticated".to_string()],
        },
        object: br#"{"apiVersion":"tenantoperator.stakater.com/v1beta2","kind":"Tenant","metadata":{"name":"alpha"},"spec":{}}"#.to_vec(),
    }
}
