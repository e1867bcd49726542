// crates/tenant-gate-providers/src/http.rs
// ============================================================================
// Module: Shared HTTP Plumbing
// Description: Client construction, endpoint policy, headers, bounded reads.
// Purpose: Keep outbound request hygiene identical across collaborators.
// Dependencies: reqwest, url, thiserror
// ============================================================================

//! ## Overview
//! Both collaborators build their clients, validate their endpoints, attach
//! bearer and correlation headers, and read response bodies through this
//! module. Endpoints must be `https` unless cleartext is explicitly enabled,
//! embedded URL credentials are rejected, and redirects are never followed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use reqwest::Certificate;
use reqwest::Client;
use reqwest::Response;
use reqwest::header::AUTHORIZATION;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the admission request uid on outbound calls.
pub const CORRELATION_HEADER: &str = "x-correlation-id";
/// Maximum forwarded correlation identifier length.
pub const MAX_CORRELATION_ID_LENGTH: usize = 128;
/// Default response body limit.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Transport settings shared by the HTTP collaborators.
///
/// # Invariants
/// - `max_response_bytes` is a hard upper bound on buffered bodies.
/// - `allow_http = false` rejects `http://` endpoints at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientSettings {
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// Maximum response body size, in bytes.
    pub max_response_bytes: usize,
    /// Permit cleartext `http://` endpoints.
    pub allow_http: bool,
    /// Extra PEM-encoded root certificate(s) to trust.
    pub ca_cert_pem: Option<Vec<u8>>,
}

impl Default for HttpClientSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_millis(2_000),
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
            allow_http: false,
            ca_cert_pem: None,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Collaborator construction failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderBuildError {
    /// Endpoint URL is malformed or violates the transport policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Trusted root certificate could not be parsed.
    #[error("invalid ca certificate: {0}")]
    Certificate(String),
    /// HTTP client could not be built.
    #[error("http client error: {0}")]
    Client(String),
}

/// Failures while buffering a response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum BodyReadError {
    /// Body exceeded the configured limit.
    #[error("response exceeds {limit} bytes")]
    TooLarge {
        /// Configured limit.
        limit: usize,
    },
    /// Connection failed mid-body.
    #[error("failed to read response body: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Construction
// ============================================================================

/// Parses and validates a collaborator base URL.
///
/// # Errors
///
/// Returns [`ProviderBuildError::InvalidEndpoint`] when the URL is malformed,
/// uses a disallowed scheme, carries credentials, or has no host.
pub fn parse_endpoint(raw: &str, allow_http: bool) -> Result<Url, ProviderBuildError> {
    let url = Url::parse(raw.trim())
        .map_err(|err| ProviderBuildError::InvalidEndpoint(format!("{raw}: {err}")))?;
    match url.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(ProviderBuildError::InvalidEndpoint(
                "cleartext http is disabled".to_string(),
            ));
        }
        other => {
            return Err(ProviderBuildError::InvalidEndpoint(format!(
                "unsupported scheme: {other}"
            )));
        }
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ProviderBuildError::InvalidEndpoint(
            "credentials in url are not allowed".to_string(),
        ));
    }
    if url.host_str().is_none() || url.cannot_be_a_base() {
        return Err(ProviderBuildError::InvalidEndpoint("url has no host".to_string()));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ProviderBuildError::InvalidEndpoint(
            "query and fragment are not allowed".to_string(),
        ));
    }
    Ok(url)
}

/// Builds an async client honoring the supplied settings.
///
/// # Errors
///
/// Returns [`ProviderBuildError`] when the certificate or client is invalid.
pub(crate) fn build_client(settings: &HttpClientSettings) -> Result<Client, ProviderBuildError> {
    let mut builder = Client::builder()
        .connect_timeout(settings.connect_timeout)
        .timeout(settings.request_timeout)
        .redirect(Policy::none());
    if let Some(pem) = &settings.ca_cert_pem {
        let cert = Certificate::from_pem(pem)
            .map_err(|err| ProviderBuildError::Certificate(err.to_string()))?;
        builder = builder.add_root_certificate(cert);
    }
    builder.build().map_err(|err| ProviderBuildError::Client(err.to_string()))
}

/// Appends path segments to a base URL, percent-encoding each one.
///
/// # Errors
///
/// Returns a message when the base URL cannot carry a path.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Result<Url, String> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| "endpoint cannot carry a path".to_string())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ============================================================================
// SECTION: Headers
// ============================================================================

/// Builds bearer and correlation headers for one outbound call.
///
/// Invalid correlation identifiers are omitted rather than rejected.
///
/// # Errors
///
/// Returns a redacted message when the token is not a valid header value.
pub(crate) fn request_headers(
    token: &str,
    correlation_id: Option<&str>,
) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::new();
    let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| "bearer token is not a valid header value".to_string())?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    if let Some(value) = correlation_header(correlation_id) {
        headers.insert(CORRELATION_HEADER, value);
    }
    Ok(headers)
}

/// Returns the correlation header value when the identifier is a valid token.
fn correlation_header(correlation_id: Option<&str>) -> Option<HeaderValue> {
    let trimmed = correlation_id?.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CORRELATION_ID_LENGTH {
        return None;
    }
    if !trimmed.chars().all(is_tchar) {
        return None;
    }
    HeaderValue::from_str(trimmed).ok()
}

/// Returns true when the character is a valid HTTP token character.
const fn is_tchar(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '!' | '#'
                | '$'
                | '%'
                | '&'
                | '\''
                | '*'
                | '+'
                | '-'
                | '.'
                | '^'
                | '_'
                | '`'
                | '|'
                | '~'
        )
}

// ============================================================================
// SECTION: Bodies
// ============================================================================

/// Reads a response body while enforcing a hard byte limit.
pub(crate) async fn read_body_limited(
    mut response: Response,
    limit: usize,
) -> Result<Vec<u8>, BodyReadError> {
    if let Some(expected) = response.content_length()
        && usize::try_from(expected).ok().is_none_or(|expected| expected > limit)
    {
        return Err(BodyReadError::TooLarge {
            limit,
        });
    }
    let mut body = Vec::new();
    while let Some(chunk) =
        response.chunk().await.map_err(|err| BodyReadError::Transport(err.to_string()))?
    {
        let next_total = body.len().saturating_add(chunk.len());
        if next_total > limit {
            return Err(BodyReadError::TooLarge {
                limit,
            });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
