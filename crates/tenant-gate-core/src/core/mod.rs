// crates/tenant-gate-core/src/core/mod.rs
// ============================================================================
// Module: Tenant Gate Core Types
// Description: Data model for a single admission evaluation.
// Purpose: Group request, role, query, and verdict types under one namespace.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every type in this module is scoped to one admission evaluation. Nothing is
//! persisted or shared across requests.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identifiers;
pub mod request;
pub mod roles;
pub mod target;
pub mod verdict;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use identifiers::RequestUid;
pub use request::AdmissionRequest;
pub use request::Operation;
pub use request::Principal;
pub use request::UnknownOperation;
pub use request::UserInfo;
pub use roles::RoleSet;
pub use target::TargetDecodeError;
pub use target::TenantTarget;
pub use verdict::AdmissionVerdict;
pub use verdict::ErrorKind;
pub use verdict::PermissionQuery;
pub use verdict::PermissionVerdict;
