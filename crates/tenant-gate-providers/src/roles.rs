// crates/tenant-gate-providers/src/roles.rs
// ============================================================================
// Module: Role Mapping Flattening
// Description: Collapse nested identity-provider role mappings into a RoleSet.
// Purpose: Turn client, realm, and composite role trees into one ordered list.
// Dependencies: serde_json, tenant-gate-core
// ============================================================================

//! ## Overview
//! Role-mapping documents nest role names under `client`, `realm`,
//! `clientRoles`, `compositeRoles`, and per-client sub-objects. Flattening
//! walks the document depth-first in document order and keeps every string
//! leaf. Numbers, booleans, and nulls are skipped. Duplicates are kept.

use serde_json::Value;
use tenant_gate_core::RoleSet;

/// Flattens every string leaf of `document` into a role set, in order.
#[must_use]
pub fn flatten_role_mappings(document: &Value) -> RoleSet {
    let mut roles = RoleSet::new();
    collect(document, &mut roles);
    roles
}

/// Depth-first collection of string leaves.
fn collect(value: &Value, roles: &mut RoleSet) {
    match value {
        Value::String(role) => roles.push(role.clone()),
        Value::Array(items) => items.iter().for_each(|item| collect(item, roles)),
        Value::Object(map) => map.values().for_each(|item| collect(item, roles)),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}
