// crates/tenant-gate-providers/src/lib.rs
// ============================================================================
// Module: Tenant Gate Providers
// Description: HTTP collaborators for role resolution and permission checks.
// Purpose: Bind the engine interfaces to the identity provider and cluster API.
// Dependencies: tenant-gate-core, reqwest, serde_json, url, tokio
// ============================================================================

//! ## Overview
//! This crate ships the network-backed collaborators driven by the Tenant Gate
//! engine: a Keycloak role-mapping resolver and a cluster `SubjectAccessReview`
//! evaluator. Both bind their endpoint and bearer credential at construction
//! time, issue exactly one request per call, and never retry.
//! Invariants:
//! - Response bodies are read under a hard byte limit.
//! - Bearer tokens never appear in error messages.
//! - Redirects are not followed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod access_review;
pub mod credentials;
pub mod http;
pub mod keycloak;
pub mod roles;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use access_review::AccessReviewConfig;
pub use access_review::AccessReviewEvaluator;
pub use credentials::CredentialError;
pub use credentials::CredentialSource;
pub use credentials::FileCredential;
pub use credentials::StaticCredential;
pub use http::HttpClientSettings;
pub use http::ProviderBuildError;
pub use keycloak::KeycloakResolverConfig;
pub use keycloak::KeycloakRoleResolver;
pub use roles::flatten_role_mappings;
