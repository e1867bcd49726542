// crates/tenant-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Tenant Gate Runtime
// Description: Decision aggregation and the admission handler state machine.
// Purpose: Drive collaborators to a terminal verdict for one request.
// Dependencies: crate::{core, interfaces}, tokio-util
// ============================================================================

//! ## Overview
//! The handler validates and targets one admission request, then hands the
//! resolved roles to the aggregator, which stops at the first grant.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregator;
pub mod handler;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregator::Aggregation;
pub use aggregator::AggregationRequest;
pub use aggregator::DecisionAggregator;
pub use aggregator::RoleDecision;
pub use aggregator::RoleOutcome;
pub use handler::AdmissionHandler;
pub use handler::Evaluation;
pub use handler::HandlerConfig;
pub use handler::HandlerStage;
pub use handler::DEFAULT_KIND;
pub use handler::DEFAULT_NAMESPACE;
pub use handler::DEFAULT_RESOURCE;
