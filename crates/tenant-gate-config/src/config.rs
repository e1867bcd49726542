// crates/tenant-gate-config/src/config.rs
// ============================================================================
// Module: Tenant Gate Configuration
// Description: Configuration loading and validation for Tenant Gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: tenant-gate-core, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: any invalid value rejects
//! the whole file.
//! Security posture: config inputs are untrusted and may carry bearer tokens;
//! token values are never formatted into errors or `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tenant_gate_core::DEFAULT_KIND;
use tenant_gate_core::DEFAULT_NAMESPACE;
use tenant_gate_core::DEFAULT_RESOURCE;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "tenant-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "TENANT_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default identity-provider realm.
pub const DEFAULT_REALM: &str = "poc-realm";
/// Default API group of the gated resource.
pub const DEFAULT_API_GROUP: &str = "tenantoperator.stakater.com";
/// Default connect timeout in milliseconds.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 500;
/// Default request timeout in milliseconds.
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;
/// Allowed connect timeout range in milliseconds.
const CONNECT_TIMEOUT_RANGE_MS: (u64, u64) = (100, 10_000);
/// Allowed request timeout range in milliseconds.
const REQUEST_TIMEOUT_RANGE_MS: (u64, u64) = (500, 30_000);
/// Default response body limit.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;
/// Hard ceiling for response body limits.
const MAX_RESPONSE_BYTES_CEILING: usize = 8 * 1024 * 1024;
/// Maximum length of a bearer token.
const MAX_TOKEN_LENGTH: usize = 16 * 1024;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Tenant Gate configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantGateConfig {
    /// Identity provider used for role resolution.
    pub identity_provider: IdentityProviderConfig,
    /// Cluster API used for permission checks.
    pub cluster: ClusterConfig,
    /// Decision audit sink.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl TenantGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, then [`CONFIG_ENV_VAR`], then
    /// `tenant-gate.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.identity_provider.validate()?;
        self.cluster.validate()?;
        self.audit.validate()
    }
}

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Bearer credential source.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialConfig {
    /// Token embedded in the config file.
    Static {
        /// Token value.
        token: String,
    },
    /// Token read from a file before every outbound call.
    File {
        /// Token file path.
        path: PathBuf,
    },
}

impl fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static {
                ..
            } => f.debug_struct("Static").field("token", &"<redacted>").finish(),
            Self::File {
                path,
            } => f.debug_struct("File").field("path", path).finish(),
        }
    }
}

impl CredentialConfig {
    /// Validates credential configuration under `field`.
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        match self {
            Self::Static {
                token,
            } => {
                let trimmed = token.trim();
                if trimmed.is_empty() {
                    return Err(ConfigError::Invalid(format!("{field}.token must be non-empty")));
                }
                if trimmed.len() > MAX_TOKEN_LENGTH {
                    return Err(ConfigError::Invalid(format!("{field}.token exceeds max length")));
                }
                if trimmed.chars().any(|ch| ch.is_ascii_whitespace() || ch.is_control()) {
                    return Err(ConfigError::Invalid(format!(
                        "{field}.token contains whitespace or control characters"
                    )));
                }
                Ok(())
            }
            Self::File {
                path,
            } => validate_path_string(&format!("{field}.path"), &path.to_string_lossy()),
        }
    }
}

// ============================================================================
// SECTION: Transport
// ============================================================================

/// Transport limits shared by both outbound endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// TCP connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Maximum response body size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Allow cleartext `http://` endpoints (disabled by default).
    #[serde(default)]
    pub allow_http: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            max_response_bytes: default_max_response_bytes(),
            allow_http: false,
        }
    }
}

impl TransportConfig {
    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Validates transport limits under `field`.
    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        let (min, max) = CONNECT_TIMEOUT_RANGE_MS;
        if !(min..=max).contains(&self.connect_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "{field}.connect_timeout_ms must be between {min} and {max}"
            )));
        }
        let (min, max) = REQUEST_TIMEOUT_RANGE_MS;
        if !(min..=max).contains(&self.request_timeout_ms) {
            return Err(ConfigError::Invalid(format!(
                "{field}.request_timeout_ms must be between {min} and {max}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES_CEILING {
            return Err(ConfigError::Invalid(format!(
                "{field}.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES_CEILING}"
            )));
        }
        Ok(())
    }

    /// Validates an endpoint URL against this transport policy.
    fn validate_url(&self, field: &str, raw: &str) -> Result<(), ConfigError> {
        let url = Url::parse(raw.trim())
            .map_err(|err| ConfigError::Invalid(format!("{field} is not a valid url: {err}")))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_http => {}
            "http" => {
                return Err(ConfigError::Invalid(format!(
                    "{field} uses http:// without allow_http"
                )));
            }
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "{field} must include http:// or https://"
                )));
            }
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Invalid(format!("{field} must not embed credentials")));
        }
        if url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!("{field} must include a host")));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(format!(
                "{field} must not include a query or fragment"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Identity Provider
// ============================================================================

/// Identity provider (Keycloak) configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProviderConfig {
    /// Base URL, without the `/auth` prefix.
    pub base_url: String,
    /// Realm holding the users.
    #[serde(default = "default_realm")]
    pub realm: String,
    /// Bearer credential for the admin API.
    pub credential: CredentialConfig,
    /// Transport limits.
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl IdentityProviderConfig {
    /// Validates identity provider configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.transport.validate("identity_provider")?;
        self.transport.validate_url("identity_provider.base_url", &self.base_url)?;
        require_token_like("identity_provider.realm", &self.realm)?;
        self.credential.validate("identity_provider.credential")
    }
}

// ============================================================================
// SECTION: Cluster
// ============================================================================

/// Cluster API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    /// API server base URL.
    pub api_server_url: String,
    /// Bearer credential for access reviews.
    pub credential: CredentialConfig,
    /// Optional PEM bundle trusted for the API server.
    #[serde(default)]
    pub ca_cert_path: Option<PathBuf>,
    /// API group of the gated resource.
    #[serde(default = "default_api_group")]
    pub api_group: String,
    /// Plural resource name of the gated resource.
    #[serde(default = "default_resource")]
    pub resource: String,
    /// Object kind accepted in payloads.
    #[serde(default = "default_kind")]
    pub kind: String,
    /// Namespace used when neither object nor request carries one.
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Prefix prepended to role names to form the review subject group.
    #[serde(default)]
    pub role_group_prefix: String,
    /// Transport limits.
    #[serde(flatten)]
    pub transport: TransportConfig,
}

impl ClusterConfig {
    /// Validates cluster configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.transport.validate("cluster")?;
        self.transport.validate_url("cluster.api_server_url", &self.api_server_url)?;
        self.credential.validate("cluster.credential")?;
        if let Some(path) = &self.ca_cert_path {
            validate_path_string("cluster.ca_cert_path", &path.to_string_lossy())?;
        }
        require_token_like("cluster.api_group", &self.api_group)?;
        require_token_like("cluster.resource", &self.resource)?;
        require_token_like("cluster.kind", &self.kind)?;
        require_token_like("cluster.default_namespace", &self.default_namespace)?;
        if self.role_group_prefix.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
            return Err(ConfigError::Invalid(
                "cluster.role_group_prefix must not contain whitespace".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Audit
// ============================================================================

/// Decision audit sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// Discard audit events.
    #[default]
    None,
    /// JSON lines on stderr.
    Stderr,
    /// JSON lines appended to a file.
    File,
}

/// Decision audit configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path (required for the file sink).
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, Some(path)) => {
                validate_path_string("audit.path", &path.to_string_lossy())
            }
            (AuditSinkKind::File, None) => {
                Err(ConfigError::Invalid("audit.sink=file requires audit.path".to_string()))
            }
            (AuditSinkKind::None | AuditSinkKind::Stderr, Some(_)) => Err(ConfigError::Invalid(
                "audit.path is only valid with audit.sink=file".to_string(),
            )),
            (AuditSinkKind::None | AuditSinkKind::Stderr, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default realm.
fn default_realm() -> String {
    DEFAULT_REALM.to_string()
}

/// Default API group.
fn default_api_group() -> String {
    DEFAULT_API_GROUP.to_string()
}

/// Default resource.
fn default_resource() -> String {
    DEFAULT_RESOURCE.to_string()
}

/// Default kind.
fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

/// Default namespace.
fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

/// Default connect timeout.
const fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

/// Default request timeout.
const fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

/// Default response body limit.
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Requires a non-empty value without whitespace or control characters.
fn require_token_like(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(ConfigError::Invalid(format!("{field} must not contain whitespace")));
    }
    Ok(())
}
