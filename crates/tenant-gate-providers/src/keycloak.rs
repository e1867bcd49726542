// crates/tenant-gate-providers/src/keycloak.rs
// ============================================================================
// Module: Keycloak Role Resolver
// Description: Role resolution via the Keycloak admin role-mapping endpoint.
// Purpose: Fetch and flatten the roles held by an admission principal.
// Dependencies: tenant-gate-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! Issues `GET {base}/auth/admin/realms/{realm}/users/{username}/role-mappings`
//! with a bearer credential and flattens the nested response into a
//! [`RoleSet`]. The username is encoded as a single path segment.
//! Security posture: the identity provider is a trust boundary; any transport,
//! status, size, or parse failure fails the resolution.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde_json::Value;
use tenant_gate_core::ResolverError;
use tenant_gate_core::RoleResolver;
use tenant_gate_core::RoleSet;
use url::Url;

use crate::credentials::CredentialSource;
use crate::http::BodyReadError;
use crate::http::HttpClientSettings;
use crate::http::ProviderBuildError;
use crate::http::build_client;
use crate::http::join_segments;
use crate::http::parse_endpoint;
use crate::http::read_body_limited;
use crate::http::request_headers;
use crate::roles::flatten_role_mappings;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Default Keycloak realm.
pub const DEFAULT_REALM: &str = "poc-realm";

/// Keycloak resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeycloakResolverConfig {
    /// Keycloak base URL, without the `/auth` prefix.
    pub base_url: String,
    /// Realm holding the users.
    pub realm: String,
    /// Transport settings.
    pub http: HttpClientSettings,
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Role resolver backed by the Keycloak admin API.
///
/// # Invariants
/// - Exactly one request per `resolve_roles` call; no retries.
pub struct KeycloakRoleResolver {
    /// Validated base URL.
    base_url: Url,
    /// Realm name.
    realm: String,
    /// Bearer credential source.
    credential: Arc<dyn CredentialSource>,
    /// HTTP client configured with timeouts.
    client: Client,
    /// Response size limit.
    max_response_bytes: usize,
}

impl KeycloakRoleResolver {
    /// Builds a resolver bound to its endpoint and credential.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the endpoint, realm, or client is invalid.
    pub fn new(
        config: KeycloakResolverConfig,
        credential: Arc<dyn CredentialSource>,
    ) -> Result<Self, ProviderBuildError> {
        let base_url = parse_endpoint(&config.base_url, config.http.allow_http)?;
        if config.realm.trim().is_empty() {
            return Err(ProviderBuildError::InvalidEndpoint("realm is empty".to_string()));
        }
        let client = build_client(&config.http)?;
        Ok(Self {
            base_url,
            realm: config.realm,
            credential,
            client,
            max_response_bytes: config.http.max_response_bytes,
        })
    }

    /// Builds the role-mapping URL for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::InvalidInput`] when the URL cannot be formed.
    pub fn role_mappings_url(&self, username: &str) -> Result<Url, ResolverError> {
        join_segments(
            &self.base_url,
            &["auth", "admin", "realms", &self.realm, "users", username, "role-mappings"],
        )
        .map_err(ResolverError::InvalidInput)
    }
}

#[async_trait]
impl RoleResolver for KeycloakRoleResolver {
    async fn resolve_roles(
        &self,
        username: &str,
        correlation_id: Option<&str>,
    ) -> Result<RoleSet, ResolverError> {
        if username.trim().is_empty() {
            return Err(ResolverError::InvalidInput("username is empty".to_string()));
        }
        let url = self.role_mappings_url(username)?;
        let token = self
            .credential
            .bearer_token()
            .await
            .map_err(|err| ResolverError::Auth(err.to_string()))?;
        let headers = request_headers(&token, correlation_id).map_err(ResolverError::Auth)?;
        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|err| ResolverError::Network(err.without_url().to_string()))?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ResolverError::Auth(format!("status {}", response.status())));
            }
            status => return Err(ResolverError::Network(format!("status {status}"))),
        }
        let body =
            read_body_limited(response, self.max_response_bytes).await.map_err(|err| match err {
                BodyReadError::TooLarge {
                    ..
                } => ResolverError::Parse(err.to_string()),
                BodyReadError::Transport(_) => ResolverError::Network(err.to_string()),
            })?;
        let document: Value = serde_json::from_slice(&body)
            .map_err(|err| ResolverError::Parse(format!("invalid json: {err}")))?;
        if !document.is_object() {
            return Err(ResolverError::Parse("role mapping document is not an object".to_string()));
        }
        Ok(flatten_role_mappings(&document))
    }
}
