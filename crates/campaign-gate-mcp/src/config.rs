// campaign-gate-mcp/src/config.rs
// ============================================================================
// Module: Campaign Gate Configuration
// Description: Configuration loading and validation for the MCP server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: campaign-gate-api, campaign-gate-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Guardrail settings may additionally be overridden from the environment so
//! operators can tighten limits without editing the config file. The resolved
//! configuration is read once at startup and treated as immutable afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use campaign_gate_api::GoogleAdsConfig;
use campaign_gate_core::GuardrailConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "campaign-gate.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "CAMPAIGN_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of server auth tokens.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a server auth token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Default maximum request body size in bytes.
const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Minimum remote request timeout in milliseconds.
const MIN_REQUEST_TIMEOUT_MS: u64 = 500;
/// Maximum remote request timeout in milliseconds.
const MAX_REQUEST_TIMEOUT_MS: u64 = 120_000;

/// Environment override for dry-run mode.
pub const DRY_RUN_ENV_VAR: &str = "DRY_RUN";
/// Environment override for bulk confirmation enforcement.
pub const REQUIRE_CONFIRMATION_ENV_VAR: &str = "REQUIRE_CONFIRMATION";
/// Environment override for the budget ceiling in micros.
pub const MAX_BUDGET_MICROS_ENV_VAR: &str = "MAX_BUDGET_MICROS";
/// Environment override for the bulk-size ceiling.
pub const MAX_CAMPAIGNS_BULK_ENV_VAR: &str = "MAX_CAMPAIGNS_BULK";

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Top-level Campaign Gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CampaignGateConfig {
    /// MCP server transport and auth configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Guardrail policy settings.
    #[serde(default)]
    pub guardrails: GuardrailSettings,
    /// Google Ads REST endpoint settings.
    #[serde(default)]
    pub ads: AdsSettings,
}

impl CampaignGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// When the resolved file does not exist the built-in defaults are used;
    /// guardrail environment overrides are applied in either case.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        let mut config = if resolved.exists() {
            let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            if bytes.len() > MAX_CONFIG_FILE_SIZE {
                return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
            }
            let content = std::str::from_utf8(&bytes)
                .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?
        } else if path.is_some() || env::var(CONFIG_ENV_VAR).is_ok() {
            // An explicitly requested config file must exist.
            return Err(ConfigError::Io(format!(
                "config file not found: {}",
                resolved.display()
            )));
        } else {
            Self::default()
        };
        config.guardrails.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.guardrails.validate()?;
        self.ads.validate()?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Server Configuration
// ============================================================================

/// MCP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport used to serve MCP requests.
    #[serde(default)]
    pub transport: ServerTransport,
    /// Bind address for the HTTP transport.
    #[serde(default)]
    pub bind: Option<String>,
    /// Maximum allowed request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Optional authentication policy.
    #[serde(default)]
    pub auth: Option<ServerAuthConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            bind: None,
            max_body_bytes: default_max_body_bytes(),
            auth: None,
        }
    }
}

impl ServerConfig {
    /// Validates server transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if let Some(auth) = &self.auth {
            auth.validate()?;
        }
        let auth_mode = self.auth.as_ref().map_or(ServerAuthMode::LocalOnly, |auth| auth.mode);
        match self.transport {
            ServerTransport::Http => {
                let bind = self.bind.as_deref().unwrap_or_default().trim();
                if bind.is_empty() {
                    return Err(ConfigError::Invalid(
                        "http transport requires bind address".to_string(),
                    ));
                }
                let addr: SocketAddr = bind
                    .parse()
                    .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))?;
                if !addr.ip().is_loopback() && auth_mode == ServerAuthMode::LocalOnly {
                    return Err(ConfigError::Invalid(
                        "non-loopback bind disallowed without auth policy".to_string(),
                    ));
                }
            }
            ServerTransport::Stdio => {
                if auth_mode != ServerAuthMode::LocalOnly {
                    return Err(ConfigError::Invalid(
                        "stdio transport only supports local_only auth".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Transports supported by the MCP server.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerTransport {
    /// JSON-RPC over stdin/stdout with Content-Length framing.
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST.
    Http,
}

/// Authentication policy for the MCP server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerAuthConfig {
    /// Authentication mode.
    #[serde(default)]
    pub mode: ServerAuthMode,
    /// Accepted bearer tokens (bearer_token mode only).
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
    /// Tool allowlist; empty allows every tool.
    #[serde(default)]
    pub allowed_tools: Vec<String>,
}

impl ServerAuthConfig {
    /// Validates auth policy limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bearer_tokens.len() > MAX_AUTH_TOKENS {
            return Err(ConfigError::Invalid("too many bearer tokens".to_string()));
        }
        for token in &self.bearer_tokens {
            if token.is_empty() || token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid("invalid bearer token length".to_string()));
            }
        }
        if self.mode == ServerAuthMode::BearerToken && self.bearer_tokens.is_empty() {
            return Err(ConfigError::Invalid(
                "bearer_token mode requires at least one token".to_string(),
            ));
        }
        Ok(())
    }
}

/// Authentication modes for the MCP server.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerAuthMode {
    /// Loopback or stdio callers only; no credentials required.
    #[default]
    LocalOnly,
    /// Bearer token required on every request.
    BearerToken,
}

// ============================================================================
// SECTION: Guardrail Settings
// ============================================================================

/// Guardrail policy settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardrailSettings {
    /// Intercept mutations and report what would happen instead.
    #[serde(default)]
    pub dry_run: bool,
    /// Require explicit confirmation for bulk operations.
    #[serde(default = "default_require_confirmation")]
    pub require_confirmation: bool,
    /// Maximum allowed budget in micros.
    #[serde(default = "default_max_budget_micros")]
    pub max_budget_micros: i64,
    /// Maximum number of campaigns per bulk operation.
    #[serde(default = "default_max_bulk_count")]
    pub max_bulk_count: usize,
}

impl Default for GuardrailSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            require_confirmation: default_require_confirmation(),
            max_budget_micros: default_max_budget_micros(),
            max_bulk_count: default_max_bulk_count(),
        }
    }
}

impl GuardrailSettings {
    /// Applies environment-style overrides through the supplied lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an override value cannot be parsed.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(DRY_RUN_ENV_VAR) {
            self.dry_run = parse_bool(DRY_RUN_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(REQUIRE_CONFIRMATION_ENV_VAR) {
            self.require_confirmation = parse_bool(REQUIRE_CONFIRMATION_ENV_VAR, &raw)?;
        }
        if let Some(raw) = lookup(MAX_BUDGET_MICROS_ENV_VAR) {
            self.max_budget_micros = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{MAX_BUDGET_MICROS_ENV_VAR} must be an integer"))
            })?;
        }
        if let Some(raw) = lookup(MAX_CAMPAIGNS_BULK_ENV_VAR) {
            self.max_bulk_count = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!("{MAX_CAMPAIGNS_BULK_ENV_VAR} must be an integer"))
            })?;
        }
        Ok(())
    }

    /// Validates guardrail limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_budget_micros <= 0 {
            return Err(ConfigError::Invalid(
                "max_budget_micros must be greater than zero".to_string(),
            ));
        }
        if self.max_bulk_count == 0 {
            return Err(ConfigError::Invalid(
                "max_bulk_count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Converts settings to the guardrail policy consulted by the engines.
    #[must_use]
    pub const fn to_policy(&self) -> GuardrailConfig {
        GuardrailConfig {
            dry_run: self.dry_run,
            require_confirmation: self.require_confirmation,
            max_budget_micros: self.max_budget_micros,
            max_bulk_count: self.max_bulk_count,
        }
    }
}

// ============================================================================
// SECTION: Ads Endpoint Settings
// ============================================================================

/// Google Ads REST endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdsSettings {
    /// Base endpoint URL.
    #[serde(default = "default_ads_endpoint")]
    pub endpoint: String,
    /// REST API version segment.
    #[serde(default = "default_ads_api_version")]
    pub api_version: String,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_ads_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for AdsSettings {
    fn default() -> Self {
        Self {
            endpoint: default_ads_endpoint(),
            api_version: default_ads_api_version(),
            timeout_ms: default_ads_timeout_ms(),
        }
    }
}

impl AdsSettings {
    /// Validates endpoint settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(ConfigError::Invalid(
                "ads.endpoint must be an http(s) url".to_string(),
            ));
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::Invalid("ads.api_version must be set".to_string()));
        }
        if self.timeout_ms < MIN_REQUEST_TIMEOUT_MS || self.timeout_ms > MAX_REQUEST_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "ads.timeout_ms must be between {MIN_REQUEST_TIMEOUT_MS} and \
                 {MAX_REQUEST_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }

    /// Converts settings to the REST client configuration.
    #[must_use]
    pub fn to_client_config(&self) -> GoogleAdsConfig {
        GoogleAdsConfig {
            endpoint: self.endpoint.clone(),
            api_version: self.api_version.clone(),
            timeout_ms: self.timeout_ms,
            ..GoogleAdsConfig::default()
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
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

/// Parses a lenient boolean override value.
fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::Invalid(format!("{key} must be a boolean"))),
    }
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default bulk confirmation enforcement.
const fn default_require_confirmation() -> bool {
    true
}

/// Default budget ceiling in micros.
const fn default_max_budget_micros() -> i64 {
    100_000_000_000
}

/// Default bulk-size ceiling.
const fn default_max_bulk_count() -> usize {
    50
}

/// Default REST endpoint.
fn default_ads_endpoint() -> String {
    "https://googleads.googleapis.com".to_string()
}

/// Default REST API version.
fn default_ads_api_version() -> String {
    "v19".to_string()
}

/// Default request timeout in milliseconds.
const fn default_ads_timeout_ms() -> u64 {
    30_000
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn defaults_match_guardrail_policy_defaults() {
        let settings = GuardrailSettings::default();
        let policy = settings.to_policy();
        assert_eq!(policy, GuardrailConfig::default());
    }

    #[test]
    fn parses_full_config() {
        let raw = r#"
            [server]
            transport = "http"
            bind = "127.0.0.1:8745"
            max_body_bytes = 65536

            [server.auth]
            mode = "bearer_token"
            bearer_tokens = ["secret-token"]
            allowed_tools = ["budget_update"]

            [guardrails]
            dry_run = true
            max_budget_micros = 5000000000

            [ads]
            api_version = "v20"
            timeout_ms = 10000
        "#;
        let config: CampaignGateConfig = toml::from_str(raw).expect("config parses");
        config.validate().expect("config is valid");
        assert_eq!(config.server.transport, ServerTransport::Http);
        assert_eq!(config.server.max_body_bytes, 65536);
        assert!(config.guardrails.dry_run);
        assert!(config.guardrails.require_confirmation);
        assert_eq!(config.guardrails.max_budget_micros, 5_000_000_000);
        assert_eq!(config.guardrails.max_bulk_count, 50);
        assert_eq!(config.ads.api_version, "v20");
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"
            [guardrails]
            max_budget = 100
        "#;
        let result: Result<CampaignGateConfig, _> = toml::from_str(raw);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_replace_file_values() {
        let mut settings = GuardrailSettings::default();
        settings
            .apply_overrides(|key| match key {
                DRY_RUN_ENV_VAR => Some("true".to_string()),
                REQUIRE_CONFIRMATION_ENV_VAR => Some("false".to_string()),
                MAX_BUDGET_MICROS_ENV_VAR => Some("2000000".to_string()),
                MAX_CAMPAIGNS_BULK_ENV_VAR => Some("10".to_string()),
                _ => None,
            })
            .expect("overrides apply");
        assert!(settings.dry_run);
        assert!(!settings.require_confirmation);
        assert_eq!(settings.max_budget_micros, 2_000_000);
        assert_eq!(settings.max_bulk_count, 10);
    }

    #[test]
    fn rejects_malformed_override() {
        let mut settings = GuardrailSettings::default();
        let result = settings.apply_overrides(|key| {
            (key == MAX_BUDGET_MICROS_ENV_VAR).then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn http_transport_requires_bind_address() {
        let config = CampaignGateConfig {
            server: ServerConfig {
                transport: ServerTransport::Http,
                ..ServerConfig::default()
            },
            ..CampaignGateConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_loopback_bind_requires_auth_policy() {
        let config = CampaignGateConfig {
            server: ServerConfig {
                transport: ServerTransport::Http,
                bind: Some("0.0.0.0:8745".to_string()),
                ..ServerConfig::default()
            },
            ..CampaignGateConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn bearer_mode_requires_tokens() {
        let auth = ServerAuthConfig {
            mode: ServerAuthMode::BearerToken,
            ..ServerAuthConfig::default()
        };
        assert!(auth.validate().is_err());
    }
}
