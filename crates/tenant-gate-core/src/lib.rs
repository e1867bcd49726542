// crates/tenant-gate-core/src/lib.rs
// ============================================================================
// Module: Tenant Gate Core Library
// Description: Public API surface for the Tenant admission decision engine.
// Purpose: Expose the data model, collaborator interfaces, and runtime engine.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Tenant Gate core turns one inbound admission request against a `Tenant`
//! resource into a terminal allow, deny, or error verdict. Roles are resolved
//! through an external identity provider, each role is checked against the
//! cluster authorization subsystem, and the first role that grants the
//! requested verb authorizes the request.
//!
//! The core performs no I/O of its own. Role resolution and permission checks
//! are reached through the [`RoleResolver`] and [`PermissionEvaluator`]
//! interfaces so the engine is fully determined by its inputs.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::EvaluatorError;
pub use interfaces::PermissionEvaluator;
pub use interfaces::ResolverError;
pub use interfaces::RoleResolver;
pub use runtime::AdmissionHandler;
pub use runtime::DEFAULT_KIND;
pub use runtime::DEFAULT_NAMESPACE;
pub use runtime::DEFAULT_RESOURCE;
pub use runtime::Aggregation;
pub use runtime::AggregationRequest;
pub use runtime::DecisionAggregator;
pub use runtime::Evaluation;
pub use runtime::HandlerConfig;
pub use runtime::HandlerStage;
pub use runtime::RoleDecision;
pub use runtime::RoleOutcome;
pub use tokio_util::sync::CancellationToken;
