// crates/tenant-gate-webhook/src/gate.rs
// ============================================================================
// Module: Tenant Gate
// Description: Config-driven wiring of the admission handler and audit sink.
// Purpose: Evaluate raw admission review bodies end to end.
// Dependencies: tenant-gate-{core,providers,config}
// ============================================================================

//! ## Overview
//! [`TenantGate::from_config`] builds the Keycloak role resolver, the access
//! review evaluator, and the audit sink from a validated
//! [`TenantGateConfig`]. [`TenantGate::review`] is total: every body, valid
//! or not, yields a rendered response review and exactly one audit event.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tenant_gate_config::AuditConfig;
use tenant_gate_config::AuditSinkKind;
use tenant_gate_config::CredentialConfig;
use tenant_gate_config::TenantGateConfig;
use tenant_gate_config::TransportConfig;
use tenant_gate_core::AdmissionHandler;
use tenant_gate_core::AdmissionRequest;
use tenant_gate_core::AdmissionVerdict;
use tenant_gate_core::CancellationToken;
use tenant_gate_core::ErrorKind;
use tenant_gate_core::Evaluation;
use tenant_gate_core::HandlerConfig;
use tenant_gate_core::HandlerStage;
use tenant_gate_providers::AccessReviewConfig;
use tenant_gate_providers::AccessReviewEvaluator;
use tenant_gate_providers::CredentialSource;
use tenant_gate_providers::FileCredential;
use tenant_gate_providers::HttpClientSettings;
use tenant_gate_providers::KeycloakResolverConfig;
use tenant_gate_providers::KeycloakRoleResolver;
use tenant_gate_providers::ProviderBuildError;
use tenant_gate_providers::StaticCredential;
use thiserror::Error;

use crate::audit::DecisionAuditEvent;
use crate::audit::DecisionAuditEventParams;
use crate::audit::DecisionAuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StderrAuditSink;
use crate::envelope::AdmissionReviewResponse;
use crate::envelope::decode_review;
use crate::envelope::render_review;
use crate::envelope::review_uid;
use crate::envelope::status_code;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Gate construction failures.
#[derive(Debug, Error)]
pub enum GateError {
    /// Role resolver or permission evaluator could not be built.
    #[error("{component}: {source}")]
    Provider {
        /// Component being built.
        component: &'static str,
        /// Underlying build error.
        #[source]
        source: ProviderBuildError,
    },
    /// CA bundle could not be read.
    #[error("cluster.ca_cert_path unreadable: {0}")]
    CaCert(String),
    /// Audit sink could not be opened.
    #[error("audit sink unavailable: {0}")]
    Audit(String),
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Result of reviewing one admission body.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    /// Terminal verdict.
    pub verdict: AdmissionVerdict,
    /// Transport status code for the rendered response.
    pub http_status: u16,
    /// Rendered response review.
    pub response: AdmissionReviewResponse,
}

// ============================================================================
// SECTION: Gate
// ============================================================================

/// Admission gate bound to its handler and audit sink.
pub struct TenantGate {
    /// Admission handler.
    handler: AdmissionHandler,
    /// Decision audit sink.
    audit: Arc<dyn DecisionAuditSink>,
}

impl TenantGate {
    /// Creates a gate from an existing handler and audit sink.
    #[must_use]
    pub fn new(handler: AdmissionHandler, audit: Arc<dyn DecisionAuditSink>) -> Self {
        Self {
            handler,
            audit,
        }
    }

    /// Builds a gate from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GateError`] when a collaborator cannot be constructed.
    pub fn from_config(config: &TenantGateConfig) -> Result<Self, GateError> {
        let idp = &config.identity_provider;
        let resolver = KeycloakRoleResolver::new(
            KeycloakResolverConfig {
                base_url: idp.base_url.clone(),
                realm: idp.realm.clone(),
                http: http_settings(&idp.transport, None),
            },
            credential_source(&idp.credential),
        )
        .map_err(|source| GateError::Provider {
            component: "identity provider",
            source,
        })?;

        let cluster = &config.cluster;
        let ca_cert_pem = match &cluster.ca_cert_path {
            Some(path) => Some(
                std::fs::read(path)
                    .map_err(|err| GateError::CaCert(format!("{}: {err}", path.display())))?,
            ),
            None => None,
        };
        let evaluator = AccessReviewEvaluator::new(
            AccessReviewConfig {
                api_server_url: cluster.api_server_url.clone(),
                api_group: cluster.api_group.clone(),
                role_group_prefix: cluster.role_group_prefix.clone(),
                http: http_settings(&cluster.transport, ca_cert_pem),
            },
            credential_source(&cluster.credential),
        )
        .map_err(|source| GateError::Provider {
            component: "cluster",
            source,
        })?;

        let handler = AdmissionHandler::new(
            HandlerConfig {
                resource: cluster.resource.clone(),
                kind: cluster.kind.clone(),
                default_namespace: cluster.default_namespace.clone(),
            },
            Arc::new(resolver),
            Arc::new(evaluator),
        );
        Ok(Self::new(handler, audit_sink(&config.audit)?))
    }

    /// Returns the admission handler.
    #[must_use]
    pub const fn handler(&self) -> &AdmissionHandler {
        &self.handler
    }

    /// Reviews one admission body, honoring `cancel`.
    pub async fn review(&self, body: &[u8], cancel: &CancellationToken) -> ReviewOutcome {
        let (uid, request, evaluation) = match decode_review(body) {
            Ok(request) => {
                let evaluation = self.handler.evaluate(&request, cancel).await;
                (request.uid.as_str().to_string(), Some(request), evaluation)
            }
            Err(err) => (review_uid(body), None, rejected_envelope(&err.to_string())),
        };
        let http_status = status_code(&evaluation.verdict);
        self.audit.record(&audit_event(&uid, request.as_ref(), &evaluation, http_status));
        let response = render_review(&uid, &evaluation.verdict);
        ReviewOutcome {
            verdict: evaluation.verdict,
            http_status,
            response,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Evaluation for a body that never reached the handler.
fn rejected_envelope(message: &str) -> Evaluation {
    Evaluation {
        verdict: AdmissionVerdict::errored(ErrorKind::DecodeError, message),
        stages: vec![HandlerStage::Resolved],
        target: None,
        namespace: None,
        roles: None,
        evaluated: Vec::new(),
    }
}

/// Maps a credential config onto a bearer credential source.
fn credential_source(config: &CredentialConfig) -> Arc<dyn CredentialSource> {
    match config {
        CredentialConfig::Static {
            token,
        } => Arc::new(StaticCredential::new(token.clone())),
        CredentialConfig::File {
            path,
        } => Arc::new(FileCredential::new(path.clone())),
    }
}

/// Maps transport config onto client settings.
fn http_settings(transport: &TransportConfig, ca_cert_pem: Option<Vec<u8>>) -> HttpClientSettings {
    HttpClientSettings {
        connect_timeout: transport.connect_timeout(),
        request_timeout: transport.request_timeout(),
        max_response_bytes: transport.max_response_bytes,
        allow_http: transport.allow_http,
        ca_cert_pem,
    }
}

/// Opens the configured audit sink.
fn audit_sink(config: &AuditConfig) -> Result<Arc<dyn DecisionAuditSink>, GateError> {
    match (config.sink, &config.path) {
        (AuditSinkKind::None, _) => Ok(Arc::new(NoopAuditSink)),
        (AuditSinkKind::Stderr, _) => Ok(Arc::new(StderrAuditSink)),
        (AuditSinkKind::File, Some(path)) => FileAuditSink::new(path)
            .map(|sink| Arc::new(sink) as Arc<dyn DecisionAuditSink>)
            .map_err(|err| GateError::Audit(format!("{}: {err}", path.display()))),
        (AuditSinkKind::File, None) => {
            Err(GateError::Audit("audit.sink=file requires audit.path".to_string()))
        }
    }
}

/// Builds the audit event for one review.
fn audit_event(
    uid: &str,
    request: Option<&AdmissionRequest>,
    evaluation: &Evaluation,
    http_status: u16,
) -> DecisionAuditEvent {
    let verdict = &evaluation.verdict;
    DecisionAuditEvent::new(DecisionAuditEventParams {
        request_uid: uid.to_string(),
        operation: request.map(|request| request.operation.as_str()),
        name: evaluation
            .target
            .as_ref()
            .map(|target| target.name.clone())
            .or_else(|| request.map(|request| request.name.clone())),
        namespace: evaluation.namespace.clone(),
        username: request.map(|request| request.user_info.username.clone()),
        groups: request.map(|request| request.user_info.groups.clone()).unwrap_or_default(),
        roles: evaluation.roles.as_ref().map(|roles| roles.as_slice().to_vec()),
        evaluated: evaluation.evaluated.clone(),
        outcome: verdict.outcome_label(),
        error_kind: verdict.error_kind().map(ErrorKind::as_str),
        reason: verdict.message().to_string(),
        http_status,
    })
}
