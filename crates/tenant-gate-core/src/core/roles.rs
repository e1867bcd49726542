// crates/tenant-gate-core/src/core/roles.rs
// ============================================================================
// Module: Role Sets
// Description: Ordered role names resolved for one principal.
// Purpose: Carry identity-provider roles from resolution into aggregation.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`RoleSet`] keeps the identity provider's ordering so aggregation checks
//! roles in a deterministic sequence.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Role Set
// ============================================================================

/// Ordered sequence of role names held by a principal at evaluation time.
///
/// # Invariants
/// - Order is the order returned by the identity provider.
/// - Role names are opaque; duplicates are permitted.
/// - Built fresh per request and never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(Vec<String>);

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a role, keeping provider order.
    pub fn push(&mut self, role: impl Into<String>) {
        self.0.push(role.into());
    }

    /// Returns the number of roles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no roles were resolved.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates roles in order.
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// Returns the roles as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Consumes the set and returns the role names.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl<S: Into<String>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<'a> IntoIterator for &'a RoleSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
