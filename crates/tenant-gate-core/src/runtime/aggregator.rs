// crates/tenant-gate-core/src/runtime/aggregator.rs
// ============================================================================
// Module: Decision Aggregator
// Description: First-allow-wins aggregation of per-role permission answers.
// Purpose: Combine role grants into one admission verdict, failing closed.
// Dependencies: crate::{core, interfaces}, tokio-util
// ============================================================================

//! ## Overview
//! The aggregator walks the principal's roles in provider order and asks the
//! [`PermissionEvaluator`] about each one. Permission is the union of role
//! grants: the first role that is allowed authorizes the request and no
//! further roles are queried.
//!
//! ## Invariants
//! - An empty role set is denied without querying the evaluator.
//! - Roles are queried sequentially, each at most once, in order.
//! - A failed query aborts the walk with an errored verdict; it is never
//!   treated as an implicit deny.
//! - Cancellation aborts the walk before the next query is issued.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::AdmissionVerdict;
use crate::core::ErrorKind;
use crate::core::PermissionQuery;
use crate::core::RoleSet;
use crate::interfaces::PermissionEvaluator;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Inputs for one aggregation pass.
#[derive(Debug, Clone, Copy)]
pub struct AggregationRequest<'a> {
    /// Roles to walk, in provider order.
    pub roles: &'a RoleSet,
    /// Resource being accessed.
    pub resource: &'a str,
    /// Verb being performed.
    pub verb: &'a str,
    /// Namespace scope for every query.
    pub namespace: &'a str,
    /// Object name, when known.
    pub name: Option<&'a str>,
    /// Correlation identifier forwarded to the evaluator.
    pub correlation_id: Option<&'a str>,
}

/// Outcome recorded for one role that was queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleOutcome {
    /// The role grants the request.
    Allowed,
    /// The role does not grant the request.
    Denied,
    /// The query for this role failed.
    Errored,
}

/// Record of a single per-role query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDecision {
    /// Role that was queried.
    pub role: String,
    /// Query outcome.
    pub outcome: RoleOutcome,
    /// Reason reported by the authorization subsystem, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Verdict plus the ordered record of roles actually queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Terminal verdict.
    pub verdict: AdmissionVerdict,
    /// Roles queried, in order.
    pub evaluated: Vec<RoleDecision>,
}

// ============================================================================
// SECTION: Aggregator
// ============================================================================

/// Combines per-role permission answers into one verdict.
pub struct DecisionAggregator<'a> {
    /// Evaluator queried once per role.
    evaluator: &'a dyn PermissionEvaluator,
}

impl<'a> DecisionAggregator<'a> {
    /// Creates an aggregator over the given evaluator.
    #[must_use]
    pub const fn new(evaluator: &'a dyn PermissionEvaluator) -> Self {
        Self {
            evaluator,
        }
    }

    /// Aggregates role answers and returns the terminal verdict.
    pub async fn aggregate(
        &self,
        request: &AggregationRequest<'_>,
        cancel: &CancellationToken,
    ) -> AdmissionVerdict {
        self.aggregate_traced(request, cancel).await.verdict
    }

    /// Aggregates role answers and returns the verdict with the query record.
    pub async fn aggregate_traced(
        &self,
        request: &AggregationRequest<'_>,
        cancel: &CancellationToken,
    ) -> Aggregation {
        let mut evaluated = Vec::with_capacity(request.roles.len());
        if request.roles.is_empty() {
            return Aggregation {
                verdict: AdmissionVerdict::denied("no roles resolved for principal"),
                evaluated,
            };
        }

        for role in request.roles {
            if cancel.is_cancelled() {
                return cancelled(evaluated);
            }
            let query = PermissionQuery {
                role: role.clone(),
                resource: request.resource.to_string(),
                verb: request.verb.to_string(),
                namespace: request.namespace.to_string(),
                name: request.name.map(str::to_string),
            };
            let Some(result) = cancel
                .run_until_cancelled(self.evaluator.evaluate(&query, request.correlation_id))
                .await
            else {
                return cancelled(evaluated);
            };
            match result {
                Err(err) => {
                    evaluated.push(RoleDecision {
                        role: role.clone(),
                        outcome: RoleOutcome::Errored,
                        reason: None,
                    });
                    return Aggregation {
                        verdict: AdmissionVerdict::errored(
                            ErrorKind::PermissionQueryError,
                            format!("permission query for role {role} failed: {err}"),
                        ),
                        evaluated,
                    };
                }
                Ok(verdict) if verdict.allowed => {
                    evaluated.push(RoleDecision {
                        role: role.clone(),
                        outcome: RoleOutcome::Allowed,
                        reason: verdict.reason,
                    });
                    return Aggregation {
                        verdict: AdmissionVerdict::allowed(format!(
                            "role {role} may {} {} in namespace {}",
                            request.verb, request.resource, request.namespace
                        )),
                        evaluated,
                    };
                }
                Ok(verdict) => {
                    evaluated.push(RoleDecision {
                        role: role.clone(),
                        outcome: RoleOutcome::Denied,
                        reason: verdict.reason,
                    });
                }
            }
        }

        Aggregation {
            verdict: AdmissionVerdict::denied(format!(
                "none of the {} resolved roles may {} {} in namespace {}",
                request.roles.len(),
                request.verb,
                request.resource,
                request.namespace
            )),
            evaluated,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds the aggregation returned when cancellation interrupts the walk.
fn cancelled(evaluated: Vec<RoleDecision>) -> Aggregation {
    Aggregation {
        verdict: AdmissionVerdict::errored(
            ErrorKind::Cancelled,
            "evaluation cancelled during permission checks",
        ),
        evaluated,
    }
}
