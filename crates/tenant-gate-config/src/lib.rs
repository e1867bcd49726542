// crates/tenant-gate-config/src/lib.rs
// ============================================================================
// Module: Tenant Gate Config Library
// Description: Canonical config model and fail-closed validation.
// Purpose: Single source of truth for tenant-gate.toml semantics.
// Dependencies: tenant-gate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! `tenant-gate-config` defines the configuration model for Tenant Gate:
//! where the identity provider and the cluster API live, which credentials
//! reach them, what the gate targets, and where decision audit events go.
//! Configuration is loaded once at startup and passed explicitly into
//! constructors; nothing in the engine looks it up ambiently.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
