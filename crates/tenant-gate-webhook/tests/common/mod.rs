// crates/tenant-gate-webhook/tests/common/mod.rs
// ============================================================================
// Module: Webhook Test Fixtures
// Description: Scripted collaborators, audit capture, and review builders.
// Purpose: Drive the gate with and without real HTTP collaborators.
// Dependencies: tenant-gate-{core,webhook}, async-trait, axum, serde_json, tokio
// ============================================================================

//! ## Overview
//! In-memory doubles for the role resolver and permission evaluator, a sink
//! that keeps every audit event, and an axum server that plays both the
//! identity provider and the cluster API server.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only helpers use unwrap/expect for clarity."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::routing::post;
use serde_json::Value;
use serde_json::json;
use tenant_gate_core::AdmissionHandler;
use tenant_gate_core::EvaluatorError;
use tenant_gate_core::HandlerConfig;
use tenant_gate_core::PermissionEvaluator;
use tenant_gate_core::PermissionQuery;
use tenant_gate_core::PermissionVerdict;
use tenant_gate_core::ResolverError;
use tenant_gate_core::RoleResolver;
use tenant_gate_core::RoleSet;
use tenant_gate_webhook::DecisionAuditEvent;
use tenant_gate_webhook::DecisionAuditSink;
use tenant_gate_webhook::TenantGate;
use tokio::sync::oneshot;

// ============================================================================
// SECTION: Scripted Collaborators
// ============================================================================

/// Resolver returning a fixed result.
pub struct FixedResolver {
    /// Result handed back on every call.
    result: Result<Vec<String>, ResolverError>,
    /// Number of calls observed.
    calls: AtomicUsize,
}

impl FixedResolver {
    /// Resolver answering with `roles`.
    pub fn roles(roles: &[&str]) -> Self {
        Self {
            result: Ok(roles.iter().map(|role| (*role).to_string()).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Resolver failing with `error`.
    pub fn failing(error: ResolverError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of calls observed.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleResolver for FixedResolver {
    async fn resolve_roles(
        &self,
        _username: &str,
        _correlation_id: Option<&str>,
    ) -> Result<RoleSet, ResolverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map(|roles| {
            let mut set = RoleSet::new();
            roles.into_iter().for_each(|role| set.push(role));
            set
        })
    }
}

/// Evaluator granting a fixed set of roles and recording queries.
pub struct GrantingEvaluator {
    /// Roles that are granted.
    granted: HashSet<String>,
    /// Queries received, in order.
    calls: Mutex<Vec<PermissionQuery>>,
}

impl GrantingEvaluator {
    /// Evaluator granting `granted`.
    pub fn new(granted: &[&str]) -> Self {
        Self {
            granted: granted.iter().map(|role| (*role).to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns the queries received so far.
    pub fn calls(&self) -> Vec<PermissionQuery> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PermissionEvaluator for GrantingEvaluator {
    async fn evaluate(
        &self,
        query: &PermissionQuery,
        _correlation_id: Option<&str>,
    ) -> Result<PermissionVerdict, EvaluatorError> {
        self.calls.lock().unwrap().push(query.clone());
        if self.granted.contains(&query.role) {
            Ok(PermissionVerdict::allow())
        } else {
            Ok(PermissionVerdict::deny(None))
        }
    }
}

/// Audit sink keeping every event.
#[derive(Default)]
pub struct CapturingSink {
    /// Events recorded, in order.
    events: Mutex<Vec<DecisionAuditEvent>>,
}

impl CapturingSink {
    /// Returns the events recorded so far.
    pub fn events(&self) -> Vec<DecisionAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl DecisionAuditSink for CapturingSink {
    fn record(&self, event: &DecisionAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Builds a gate over the given doubles with default targeting.
pub fn scripted_gate(
    resolver: Arc<FixedResolver>,
    evaluator: Arc<GrantingEvaluator>,
    sink: Arc<CapturingSink>,
) -> TenantGate {
    TenantGate::new(AdmissionHandler::new(HandlerConfig::default(), resolver, evaluator), sink)
}

// ============================================================================
// SECTION: Review Builders
// ============================================================================

/// Tenant object payload.
pub fn tenant_object(name: &str, namespace: Option<&str>) -> Value {
    let mut metadata = json!({"name": name});
    if let Some(namespace) = namespace {
        metadata["namespace"] = json!(namespace);
    }
    json!({
        "apiVersion": "tenantoperator.stakater.com/v1beta3",
        "kind": "Tenant",
        "metadata": metadata,
        "spec": {"quota": "small"}
    })
}

/// Admission review body for `operation` by `username` against `object`.
pub fn review_body(uid: &str, operation: &str, username: &str, object: &Value) -> Vec<u8> {
    let object_key = if operation == "DELETE" { "oldObject" } else { "object" };
    let name = object["metadata"]["name"].clone();
    let mut request = json!({
        "uid": uid,
        "kind": {"group": "tenantoperator.stakater.com", "version": "v1beta3", "kind": "Tenant"},
        "resource": {
            "group": "tenantoperator.stakater.com",
            "version": "v1beta3",
            "resource": "tenants"
        },
        "name": name,
        "operation": operation,
        "userInfo": {"username": username, "groups": ["system:authenticated"]}
    });
    request[object_key] = object.clone();
    serde_json::to_vec(&json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": request
    }))
    .unwrap()
}

// ============================================================================
// SECTION: Cluster Double
// ============================================================================

/// Behavior of the combined identity provider and API server double.
struct ClusterState {
    /// Status returned by the role-mapping endpoint.
    idp_status: StatusCode,
    /// Role-mapping document returned on success.
    role_document: Value,
    /// Subject groups the API server allows.
    allowed_groups: HashSet<String>,
    /// Usernames requested from the identity provider.
    idp_users: Mutex<Vec<String>>,
    /// Access review bodies received.
    reviews: Mutex<Vec<Value>>,
    /// Authorization headers received by the API server.
    review_auth: Mutex<Vec<String>>,
}

/// Running identity provider and API server double.
pub struct ClusterDouble {
    /// Base URL serving both endpoints.
    pub base_url: String,
    /// Shared state.
    state: Arc<ClusterState>,
    /// Shutdown trigger; dropping it stops the server.
    _shutdown: oneshot::Sender<()>,
}

impl ClusterDouble {
    /// Usernames looked up at the identity provider.
    pub fn idp_users(&self) -> Vec<String> {
        self.state.idp_users.lock().unwrap().clone()
    }

    /// Access reviews posted to the API server.
    pub fn reviews(&self) -> Vec<Value> {
        self.state.reviews.lock().unwrap().clone()
    }

    /// Authorization headers sent to the API server.
    pub fn review_auth(&self) -> Vec<String> {
        self.state.review_auth.lock().unwrap().clone()
    }
}

async fn role_mappings(
    State(state): State<Arc<ClusterState>>,
    Path((_realm, username)): Path<(String, String)>,
) -> (StatusCode, Json<Value>) {
    state.idp_users.lock().unwrap().push(username);
    if state.idp_status.is_success() {
        (state.idp_status, Json(state.role_document.clone()))
    } else {
        (state.idp_status, Json(json!({"error": "unavailable"})))
    }
}

async fn access_review(
    State(state): State<Arc<ClusterState>>,
    headers: axum::http::HeaderMap,
    Json(review): Json<Value>,
) -> Json<Value> {
    if let Some(auth) = headers.get("authorization").and_then(|value| value.to_str().ok()) {
        state.review_auth.lock().unwrap().push(auth.to_string());
    }
    let allowed = review["spec"]["groups"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .any(|group| state.allowed_groups.contains(group));
    state.reviews.lock().unwrap().push(review.clone());
    let mut answer = review;
    answer["status"] = if allowed {
        json!({"allowed": true})
    } else {
        json!({"allowed": false, "reason": "no RBAC binding"})
    };
    Json(answer)
}

/// Spawns a double answering role lookups and access reviews.
pub async fn spawn_cluster(
    idp_status: StatusCode,
    role_document: Value,
    allowed_groups: &[&str],
) -> ClusterDouble {
    let state = Arc::new(ClusterState {
        idp_status,
        role_document,
        allowed_groups: allowed_groups.iter().map(|group| (*group).to_string()).collect(),
        idp_users: Mutex::new(Vec::new()),
        reviews: Mutex::new(Vec::new()),
        review_auth: Mutex::new(Vec::new()),
    });
    let app = Router::new()
        .route("/auth/admin/realms/{realm}/users/{username}/role-mappings", get(role_mappings))
        .route("/apis/authorization.k8s.io/v1/subjectaccessreviews", post(access_review))
        .with_state(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .await;
    });
    ClusterDouble {
        base_url: format!("http://{addr}"),
        state,
        _shutdown: shutdown_tx,
    }
}

/// Gate configuration pointing both endpoints at `base_url`.
pub fn local_config_toml(base_url: &str, prefix: &str) -> String {
    format!(
        r#"
[identity_provider]
base_url = "{base_url}"
allow_http = true
credential = {{ type = "static", token = "kc-admin-token" }}

[cluster]
api_server_url = "{base_url}"
allow_http = true
role_group_prefix = "{prefix}"
credential = {{ type = "static", token = "sa-token" }}
"#
    )
}
