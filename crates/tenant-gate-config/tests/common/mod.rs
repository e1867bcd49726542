// crates/tenant-gate-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for tenant-gate-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use tenant_gate_config::ConfigError;
use tenant_gate_config::TenantGateConfig;

/// Smallest valid configuration: both endpoints and static credentials.
pub const MINIMAL_TOML: &str = r#"
[identity_provider]
base_url = "https://keycloak.example.com"
credential = { type = "static", token = "kc-admin-token" }

[cluster]
api_server_url = "https://kubernetes.default.svc"
credential = { type = "file", path = "/var/run/secrets/kubernetes.io/serviceaccount/token" }
"#;

/// Parses a TOML string into a `TenantGateConfig` without validation.
pub fn config_from_toml(toml_str: &str) -> Result<TenantGateConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Returns the minimal config with all defaults applied.
pub fn minimal_config() -> Result<TenantGateConfig, toml::de::Error> {
    config_from_toml(MINIMAL_TOML)
}

/// Asserts that validation failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
