// crates/tenant-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Tenant Gate Interfaces
// Description: Collaborator contracts for role resolution and permission checks.
// Purpose: Define the I/O seams the decision engine drives.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! The engine reaches the identity provider and the cluster authorization
//! subsystem only through these traits. Endpoints and credentials are bound
//! at construction time by the implementation, never looked up ambiently.
//! Implementations must not retry internally; a failed call is surfaced to
//! the engine as-is.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use thiserror::Error;

use crate::core::PermissionQuery;
use crate::core::PermissionVerdict;
use crate::core::RoleSet;

// ============================================================================
// SECTION: Role Resolver
// ============================================================================

/// Role resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolverError {
    /// Input violates the resolver contract (for example, an empty username).
    #[error("invalid role query: {0}")]
    InvalidInput(String),
    /// Identity provider could not be reached or answered with a failure status.
    #[error("identity provider unavailable: {0}")]
    Network(String),
    /// Identity provider rejected the credential (401/403).
    #[error("identity provider rejected credential: {0}")]
    Auth(String),
    /// Identity provider response could not be parsed.
    #[error("identity provider response invalid: {0}")]
    Parse(String),
}

/// Resolves the roles held by a principal.
#[async_trait]
pub trait RoleResolver: Send + Sync {
    /// Fetches the ordered role set for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] when the username is invalid, the provider is
    /// unreachable or unauthorized, or its response cannot be parsed.
    async fn resolve_roles(
        &self,
        username: &str,
        correlation_id: Option<&str>,
    ) -> Result<RoleSet, ResolverError>;
}

// ============================================================================
// SECTION: Permission Evaluator
// ============================================================================

/// Permission query failures.
///
/// # Invariants
/// - A completed query answering "not allowed" is never an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluatorError {
    /// Query is malformed (for example, an empty verb or resource).
    #[error("invalid permission query: {0}")]
    InvalidQuery(String),
    /// Authorization subsystem could not be reached or failed.
    #[error("authorization subsystem unavailable: {0}")]
    Network(String),
    /// Authorization subsystem rejected the credential (401/403).
    #[error("authorization subsystem rejected credential: {0}")]
    Auth(String),
}

/// Answers per-role permission queries.
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    /// Evaluates a single query and returns the raw allow/deny answer.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluatorError`] when the query cannot be completed.
    async fn evaluate(
        &self,
        query: &PermissionQuery,
        correlation_id: Option<&str>,
    ) -> Result<PermissionVerdict, EvaluatorError>;
}
