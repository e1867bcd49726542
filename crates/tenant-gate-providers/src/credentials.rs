// crates/tenant-gate-providers/src/credentials.rs
// ============================================================================
// Module: Bearer Credentials
// Description: Static and file-backed bearer token sources.
// Purpose: Supply per-call bearer tokens without caching them in the engine.
// Dependencies: async-trait, thiserror, tokio
// ============================================================================

//! ## Overview
//! Outbound calls ask a [`CredentialSource`] for a token immediately before
//! each request. [`FileCredential`] re-reads its file every time, so a mounted
//! token that the platform rotates is picked up without a restart.
//! Security posture: token values are never formatted into errors or `Debug`
//! output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Credential retrieval failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Token file could not be read.
    #[error("credential file {path} unreadable: {message}")]
    Unreadable {
        /// File path.
        path: String,
        /// I/O failure description.
        message: String,
    },
    /// Token is empty or whitespace only.
    #[error("credential is empty")]
    Empty,
}

// ============================================================================
// SECTION: Interface
// ============================================================================

/// Source of bearer tokens for outbound requests.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Returns the bearer token to use for the next request.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when no usable token is available.
    async fn bearer_token(&self) -> Result<String, CredentialError>;
}

// ============================================================================
// SECTION: Static Credential
// ============================================================================

/// Token fixed at construction time.
#[derive(Clone)]
pub struct StaticCredential {
    /// Token value.
    token: String,
}

impl StaticCredential {
    /// Wraps a fixed token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredential").field("token", &"<redacted>").finish()
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn bearer_token(&self) -> Result<String, CredentialError> {
        if self.token.trim().is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(self.token.clone())
    }
}

// ============================================================================
// SECTION: File Credential
// ============================================================================

/// Token read from a file on every call.
#[derive(Debug, Clone)]
pub struct FileCredential {
    /// Token file path.
    path: PathBuf,
}

impl FileCredential {
    /// Binds the credential to a token file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for FileCredential {
    async fn bearer_token(&self) -> Result<String, CredentialError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            CredentialError::Unreadable {
                path: self.path.display().to_string(),
                message: err.kind().to_string(),
            }
        })?;
        let token = raw.trim();
        if token.is_empty() {
            return Err(CredentialError::Empty);
        }
        Ok(token.to_string())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
