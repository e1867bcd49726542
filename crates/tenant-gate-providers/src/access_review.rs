// crates/tenant-gate-providers/src/access_review.rs
// ============================================================================
// Module: Access Review Evaluator
// Description: Per-role permission checks via SubjectAccessReview.
// Purpose: Ask the cluster whether a role's group may perform a verb.
// Dependencies: tenant-gate-core, reqwest, serde, url
// ============================================================================

//! ## Overview
//! Each [`PermissionQuery`] becomes one `SubjectAccessReview` posted to
//! `{api_server}/apis/authorization.k8s.io/v1/subjectaccessreviews`. The role
//! is conveyed as the subject's group (`role_group_prefix + role`), so RBAC
//! bindings on that group decide the answer. `status.allowed` is returned
//! verbatim; only transport, status, and decode failures are errors. A blank
//! role is denied locally without issuing a review.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde::Serialize;
use tenant_gate_core::EvaluatorError;
use tenant_gate_core::PermissionEvaluator;
use tenant_gate_core::PermissionQuery;
use tenant_gate_core::PermissionVerdict;
use url::Url;

use crate::credentials::CredentialSource;
use crate::http::HttpClientSettings;
use crate::http::ProviderBuildError;
use crate::http::build_client;
use crate::http::join_segments;
use crate::http::parse_endpoint;
use crate::http::read_body_limited;
use crate::http::request_headers;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Access review API version.
const REVIEW_API_VERSION: &str = "authorization.k8s.io/v1";
/// Access review kind.
const REVIEW_KIND: &str = "SubjectAccessReview";

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Access review evaluator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessReviewConfig {
    /// Cluster API server base URL.
    pub api_server_url: String,
    /// API group in resource attributes.
    pub api_group: String,
    /// Prefix prepended to role names to form the subject group.
    pub role_group_prefix: String,
    /// Transport settings.
    pub http: HttpClientSettings,
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Outbound access review.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubjectAccessReview<'a> {
    /// API version.
    api_version: &'static str,
    /// Object kind.
    kind: &'static str,
    /// Review spec.
    spec: ReviewSpec<'a>,
}

/// Review spec identifying the subject and the attributes checked.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReviewSpec<'a> {
    /// Attributes of the access being checked.
    resource_attributes: ResourceAttributes<'a>,
    /// Subject groups.
    groups: Vec<String>,
}

/// Resource attributes of the checked access.
#[derive(Debug, Serialize)]
struct ResourceAttributes<'a> {
    /// Namespace scope.
    namespace: &'a str,
    /// Verb.
    verb: &'a str,
    /// API group.
    group: &'a str,
    /// Plural resource.
    resource: &'a str,
    /// Object name.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

/// Inbound review; only the status is read.
#[derive(Debug, Deserialize)]
struct ReviewResponse {
    /// Review status.
    status: ReviewStatus,
}

/// Authorizer decision.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewStatus {
    /// Whether the access is allowed.
    allowed: bool,
    /// Authorizer explanation.
    #[serde(default)]
    reason: Option<String>,
    /// Authorizer evaluation error, if any.
    #[serde(default)]
    evaluation_error: Option<String>,
}

// ============================================================================
// SECTION: Evaluator
// ============================================================================

/// Permission evaluator backed by the cluster `SubjectAccessReview` API.
///
/// # Invariants
/// - Exactly one review per `evaluate` call; no retries.
pub struct AccessReviewEvaluator {
    /// Review endpoint.
    endpoint: Url,
    /// API group in resource attributes.
    api_group: String,
    /// Subject group prefix.
    role_group_prefix: String,
    /// Bearer credential source.
    credential: Arc<dyn CredentialSource>,
    /// HTTP client configured with timeouts and trusted roots.
    client: Client,
    /// Response size limit.
    max_response_bytes: usize,
}

impl AccessReviewEvaluator {
    /// Builds an evaluator bound to the API server and credential.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderBuildError`] when the endpoint or client is invalid.
    pub fn new(
        config: AccessReviewConfig,
        credential: Arc<dyn CredentialSource>,
    ) -> Result<Self, ProviderBuildError> {
        let base = parse_endpoint(&config.api_server_url, config.http.allow_http)?;
        let endpoint = join_segments(
            &base,
            &["apis", "authorization.k8s.io", "v1", "subjectaccessreviews"],
        )
        .map_err(ProviderBuildError::InvalidEndpoint)?;
        let client = build_client(&config.http)?;
        Ok(Self {
            endpoint,
            api_group: config.api_group,
            role_group_prefix: config.role_group_prefix,
            credential,
            client,
            max_response_bytes: config.http.max_response_bytes,
        })
    }

    /// Returns the review endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl PermissionEvaluator for AccessReviewEvaluator {
    async fn evaluate(
        &self,
        query: &PermissionQuery,
        correlation_id: Option<&str>,
    ) -> Result<PermissionVerdict, EvaluatorError> {
        for (field, value) in [("resource", &query.resource), ("verb", &query.verb)] {
            if value.trim().is_empty() {
                return Err(EvaluatorError::InvalidQuery(format!("{field} is empty")));
            }
        }
        // A blank role names no subject group; no binding can grant it.
        if query.role.trim().is_empty() {
            return Ok(PermissionVerdict::deny(Some("role name is empty".to_string())));
        }
        let review = SubjectAccessReview {
            api_version: REVIEW_API_VERSION,
            kind: REVIEW_KIND,
            spec: ReviewSpec {
                resource_attributes: ResourceAttributes {
                    namespace: &query.namespace,
                    verb: &query.verb,
                    group: &self.api_group,
                    resource: &query.resource,
                    name: query.name.as_deref(),
                },
                groups: vec![format!("{}{}", self.role_group_prefix, query.role)],
            },
        };
        let token = self
            .credential
            .bearer_token()
            .await
            .map_err(|err| EvaluatorError::Auth(err.to_string()))?;
        let headers = request_headers(&token, correlation_id).map_err(EvaluatorError::Auth)?;
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(&review)
            .send()
            .await
            .map_err(|err| EvaluatorError::Network(err.without_url().to_string()))?;
        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(EvaluatorError::Auth(format!("status {}", response.status())));
            }
            status => return Err(EvaluatorError::Network(format!("status {status}"))),
        }
        let body = read_body_limited(response, self.max_response_bytes)
            .await
            .map_err(|err| EvaluatorError::Network(err.to_string()))?;
        let decoded: ReviewResponse = serde_json::from_slice(&body)
            .map_err(|err| EvaluatorError::Network(format!("invalid access review: {err}")))?;
        let status = decoded.status;
        if status.allowed {
            return Ok(PermissionVerdict::allow());
        }
        let reason = [status.reason, status.evaluation_error]
            .into_iter()
            .flatten()
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>();
        Ok(PermissionVerdict::deny((!reason.is_empty()).then(|| reason.join("; "))))
    }
}
