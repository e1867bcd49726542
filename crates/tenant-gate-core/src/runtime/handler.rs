// crates/tenant-gate-core/src/runtime/handler.rs
// ============================================================================
// Module: Admission Handler
// Description: Per-request state machine from raw request to terminal verdict.
// Purpose: Sequence decoding, role resolution, and aggregation with explicit
//          per-stage failure policy.
// Dependencies: crate::{core, interfaces, runtime::aggregator}, tokio-util
// ============================================================================

//! ## Overview
//! Each request moves through `Decoding -> ResolvingRoles -> Evaluating ->
//! Resolved`. Every transition happens at most once; there is no retry loop.
//! A failure in any stage resolves the request immediately with the error kind
//! returned by [`HandlerStage::failure_kind`], so no later stage issues a
//! network call.
//!
//! ## Invariants
//! - The handler holds no mutable state; concurrent requests share nothing.
//! - Cancellation is observed before every transition and during every
//!   external call.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::AdmissionRequest;
use crate::core::AdmissionVerdict;
use crate::core::ErrorKind;
use crate::core::RoleSet;
use crate::core::TargetDecodeError;
use crate::core::TenantTarget;
use crate::interfaces::PermissionEvaluator;
use crate::interfaces::RoleResolver;
use crate::runtime::aggregator::AggregationRequest;
use crate::runtime::aggregator::DecisionAggregator;
use crate::runtime::aggregator::RoleDecision;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default plural resource name checked for every request.
pub const DEFAULT_RESOURCE: &str = "tenants";
/// Default object kind accepted in request payloads.
pub const DEFAULT_KIND: &str = "Tenant";
/// Namespace used when neither the object nor the request carries one.
pub const DEFAULT_NAMESPACE: &str = "default";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Fixed targeting parameters for the handler.
///
/// # Invariants
/// - All fields are non-empty; validated by the configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Plural resource name used in permission queries.
    pub resource: String,
    /// Object kind accepted in payloads.
    pub kind: String,
    /// Fallback namespace.
    pub default_namespace: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            resource: DEFAULT_RESOURCE.to_string(),
            kind: DEFAULT_KIND.to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }
}

// ============================================================================
// SECTION: Stages
// ============================================================================

/// Observable handler stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerStage {
    /// Decoding the raw target payload.
    Decoding,
    /// Fetching the principal's roles.
    ResolvingRoles,
    /// Aggregating per-role permission answers.
    Evaluating,
    /// Terminal verdict reached.
    Resolved,
}

impl HandlerStage {
    /// Returns the error kind a failure in this stage resolves to.
    ///
    /// Every stage fails closed: none of them downgrades a failure to a
    /// denial or falls through to an allow.
    #[must_use]
    pub const fn failure_kind(self) -> Option<ErrorKind> {
        match self {
            Self::Decoding => Some(ErrorKind::DecodeError),
            Self::ResolvingRoles => Some(ErrorKind::RoleResolutionError),
            Self::Evaluating => Some(ErrorKind::PermissionQueryError),
            Self::Resolved => None,
        }
    }

    /// Returns a stable label for the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Decoding => "decoding",
            Self::ResolvingRoles => "resolving_roles",
            Self::Evaluating => "evaluating",
            Self::Resolved => "resolved",
        }
    }
}

/// Internal state carried between transitions.
enum HandlerState {
    /// Initial state.
    Decoding,
    /// Target decoded; roles not yet fetched.
    ResolvingRoles {
        /// Decoded target.
        target: TenantTarget,
    },
    /// Roles fetched; aggregation pending.
    Evaluating {
        /// Decoded target.
        target: TenantTarget,
        /// Roles in provider order.
        roles: RoleSet,
    },
    /// Terminal state.
    Resolved(AdmissionVerdict),
}

impl HandlerState {
    /// Returns the observable stage for this state.
    const fn stage(&self) -> HandlerStage {
        match self {
            Self::Decoding => HandlerStage::Decoding,
            Self::ResolvingRoles { .. } => HandlerStage::ResolvingRoles,
            Self::Evaluating { .. } => HandlerStage::Evaluating,
            Self::Resolved(_) => HandlerStage::Resolved,
        }
    }
}

// ============================================================================
// SECTION: Evaluation Record
// ============================================================================

/// Terminal verdict together with what the handler observed on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Terminal verdict.
    pub verdict: AdmissionVerdict,
    /// Stages visited, in order, ending with [`HandlerStage::Resolved`].
    pub stages: Vec<HandlerStage>,
    /// Decoded target, when decoding succeeded.
    pub target: Option<TenantTarget>,
    /// Effective namespace used for permission checks, when reached.
    pub namespace: Option<String>,
    /// Roles resolved for the principal, when resolution succeeded.
    pub roles: Option<RoleSet>,
    /// Per-role queries issued, in order.
    pub evaluated: Vec<RoleDecision>,
}

/// Observations accumulated while the state machine runs.
#[derive(Default)]
struct EvaluationTrace {
    /// Stages visited so far.
    stages: Vec<HandlerStage>,
    /// Decoded target.
    target: Option<TenantTarget>,
    /// Effective namespace.
    namespace: Option<String>,
    /// Resolved roles.
    roles: Option<RoleSet>,
    /// Per-role queries issued.
    evaluated: Vec<RoleDecision>,
}

impl EvaluationTrace {
    /// Closes the trace with the terminal verdict.
    fn finish(self, verdict: AdmissionVerdict) -> Evaluation {
        Evaluation {
            verdict,
            stages: self.stages,
            target: self.target,
            namespace: self.namespace,
            roles: self.roles,
            evaluated: self.evaluated,
        }
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Orchestrates one admission evaluation.
pub struct AdmissionHandler {
    /// Fixed targeting parameters.
    config: HandlerConfig,
    /// Identity-provider role resolver.
    resolver: Arc<dyn RoleResolver>,
    /// Cluster permission evaluator.
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl AdmissionHandler {
    /// Creates a handler bound to its collaborators.
    #[must_use]
    pub fn new(
        config: HandlerConfig,
        resolver: Arc<dyn RoleResolver>,
        evaluator: Arc<dyn PermissionEvaluator>,
    ) -> Self {
        Self {
            config,
            resolver,
            evaluator,
        }
    }

    /// Returns the handler configuration.
    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Evaluates a request without external cancellation.
    pub async fn handle(&self, request: &AdmissionRequest) -> AdmissionVerdict {
        self.evaluate(request, &CancellationToken::new()).await.verdict
    }

    /// Evaluates a request, honoring `cancel`, and returns the full trace.
    pub async fn evaluate(
        &self,
        request: &AdmissionRequest,
        cancel: &CancellationToken,
    ) -> Evaluation {
        let mut trace = EvaluationTrace::default();
        let mut state = HandlerState::Decoding;
        loop {
            let stage = state.stage();
            trace.stages.push(stage);
            state = match state {
                HandlerState::Resolved(verdict) => return trace.finish(verdict),
                _ if cancel.is_cancelled() => HandlerState::Resolved(AdmissionVerdict::errored(
                    ErrorKind::Cancelled,
                    format!("evaluation cancelled while {}", stage.as_str()),
                )),
                HandlerState::Decoding => self.decode(request, &mut trace),
                HandlerState::ResolvingRoles {
                    target,
                } => self.resolve_roles(request, target, cancel, &mut trace).await,
                HandlerState::Evaluating {
                    target,
                    roles,
                } => self.aggregate(request, &target, &roles, cancel, &mut trace).await,
            };
        }
    }

    /// Decoding stage: validates the request kind and payload shape.
    fn decode(&self, request: &AdmissionRequest, trace: &mut EvaluationTrace) -> HandlerState {
        let fail = |err: TargetDecodeError| fail_stage(HandlerStage::Decoding, err.to_string());
        if !request.kind.is_empty() && request.kind != self.config.kind {
            return fail(TargetDecodeError::KindMismatch {
                expected: self.config.kind.clone(),
                found: request.kind.clone(),
            });
        }
        match TenantTarget::decode(&request.object, &self.config.kind) {
            Ok(target) => {
                trace.target = Some(target.clone());
                HandlerState::ResolvingRoles {
                    target,
                }
            }
            Err(err) => fail(err),
        }
    }

    /// Role resolution stage: one call to the identity provider.
    async fn resolve_roles(
        &self,
        request: &AdmissionRequest,
        target: TenantTarget,
        cancel: &CancellationToken,
        trace: &mut EvaluationTrace,
    ) -> HandlerState {
        let principal = request.principal();
        let correlation_id = correlation_id(request);
        let Some(result) = cancel
            .run_until_cancelled(self.resolver.resolve_roles(principal.username, correlation_id))
            .await
        else {
            return HandlerState::Resolved(AdmissionVerdict::errored(
                ErrorKind::Cancelled,
                "evaluation cancelled while resolving_roles",
            ));
        };
        match result {
            Ok(roles) => {
                trace.roles = Some(roles.clone());
                HandlerState::Evaluating {
                    target,
                    roles,
                }
            }
            Err(err) => fail_stage(
                HandlerStage::ResolvingRoles,
                format!("role resolution for {} failed: {err}", principal.username),
            ),
        }
    }

    /// Evaluation stage: first-allow-wins aggregation across roles.
    async fn aggregate(
        &self,
        request: &AdmissionRequest,
        target: &TenantTarget,
        roles: &RoleSet,
        cancel: &CancellationToken,
        trace: &mut EvaluationTrace,
    ) -> HandlerState {
        let namespace = target
            .namespace
            .as_deref()
            .or_else(|| request.namespace.as_deref().filter(|ns| !ns.trim().is_empty()))
            .unwrap_or(&self.config.default_namespace)
            .to_string();
        let aggregator = DecisionAggregator::new(self.evaluator.as_ref());
        let aggregation = aggregator
            .aggregate_traced(
                &AggregationRequest {
                    roles,
                    resource: &self.config.resource,
                    verb: request.operation.verb(),
                    namespace: &namespace,
                    name: Some(target.name.as_str()),
                    correlation_id: correlation_id(request),
                },
                cancel,
            )
            .await;
        trace.namespace = Some(namespace);
        trace.evaluated = aggregation.evaluated;
        HandlerState::Resolved(aggregation.verdict)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the request uid as a correlation identifier when non-empty.
fn correlation_id(request: &AdmissionRequest) -> Option<&str> {
    Some(request.uid.as_str()).filter(|uid| !uid.is_empty())
}

/// Resolves the request with the failure kind assigned to `stage`.
fn fail_stage(stage: HandlerStage, message: String) -> HandlerState {
    // Only active stages fail; `Resolved` has no failure kind.
    let kind = stage.failure_kind().unwrap_or(ErrorKind::Cancelled);
    HandlerState::Resolved(AdmissionVerdict::errored(kind, message))
}
