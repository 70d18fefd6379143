// campaign-gate-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure policy checks for the CLI server launcher.
// Purpose: Enforce safe-by-default bind behavior with explicit opt-in.
// Dependencies: campaign-gate-mcp, std.
// ============================================================================

//! ## Overview
//! Provides safety checks for binding the MCP server to non-loopback addresses.
//! The policy is fail-closed: explicit opt-in is required, and bearer auth must
//! be configured before network exposure is allowed. Campaign mutations behind
//! an exposed endpoint are a live-spend risk, so the launcher refuses ambiguous
//! bind configurations outright.

use std::env;
use std::net::SocketAddr;

use campaign_gate_mcp::CampaignGateConfig;
use campaign_gate_mcp::ServerAuthMode;
use campaign_gate_mcp::ServerTransport;

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "CAMPAIGN_GATE_ALLOW_NON_LOOPBACK";

/// Bind outcome metadata for transport warnings.
#[derive(Debug, Clone)]
pub struct BindOutcome {
    /// Selected transport.
    pub transport: ServerTransport,
    /// Bound socket address for the HTTP transport.
    pub bind_addr: Option<SocketAddr>,
    /// True when the server is bound to a non-loopback address.
    pub network_exposed: bool,
    /// Effective auth mode.
    pub auth_mode: ServerAuthMode,
}

/// Serve policy failures for bind safety.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServePolicyError {
    /// Environment variable was set to an invalid value.
    #[error("invalid {ALLOW_NON_LOOPBACK_ENV} value: {value}")]
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind string failed to parse.
    #[error("invalid bind address {bind}: {error}")]
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    #[error(
        "bind {bind} is not loopback; pass --allow-non-loopback or set {ALLOW_NON_LOOPBACK_ENV}=true"
    )]
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
    /// Non-loopback binding requires auth.
    #[error("bind {bind} is not loopback; configure bearer token auth before exposing the server")]
    NonLoopbackAuthRequired {
        /// Bind address.
        bind: String,
    },
}

/// Resolves the non-loopback opt-in flag from CLI and environment.
///
/// # Errors
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is invalid.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    let value = value.to_string_lossy().to_string();
    parse_allow_non_loopback_value(&value)
}

/// Enforces local-only transport restrictions for the MCP server.
///
/// # Errors
/// Returns [`ServePolicyError`] when configuration violates security requirements.
pub fn enforce_local_only(
    config: &CampaignGateConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let auth_mode = config.server.auth.as_ref().map_or(ServerAuthMode::LocalOnly, |auth| auth.mode);
    match config.server.transport {
        ServerTransport::Stdio => Ok(BindOutcome {
            transport: ServerTransport::Stdio,
            bind_addr: None,
            network_exposed: false,
            auth_mode,
        }),
        ServerTransport::Http => {
            let bind = config.server.bind.as_deref().unwrap_or_default();
            let addr: SocketAddr = bind.parse().map_err(|err: std::net::AddrParseError| {
                ServePolicyError::InvalidBind {
                    bind: bind.to_string(),
                    error: err.to_string(),
                }
            })?;
            if addr.ip().is_loopback() {
                return Ok(BindOutcome {
                    transport: ServerTransport::Http,
                    bind_addr: Some(addr),
                    network_exposed: false,
                    auth_mode,
                });
            }
            if !allow_non_loopback {
                return Err(ServePolicyError::NonLoopbackOptInRequired {
                    bind: bind.to_string(),
                });
            }
            if auth_mode == ServerAuthMode::LocalOnly {
                return Err(ServePolicyError::NonLoopbackAuthRequired {
                    bind: bind.to_string(),
                });
            }
            Ok(BindOutcome {
                transport: ServerTransport::Http,
                bind_addr: Some(addr),
                network_exposed: true,
                auth_mode,
            })
        }
    }
}

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an env value for allow-non-loopback.
fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).map_or_else(
        || {
            Err(ServePolicyError::InvalidEnv {
                value: value.to_string(),
            })
        },
        Ok,
    )
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        clippy::missing_docs_in_private_items,
        reason = "Test helpers use expect/expect_err for concise failure messages."
    )]
    use std::fs;
    use std::path::PathBuf;
    use std::time::SystemTime;
    use std::time::UNIX_EPOCH;

    use campaign_gate_mcp::CampaignGateConfig;

    use super::ServePolicyError;
    use super::enforce_local_only;
    use super::parse_allow_non_loopback_value;

    fn write_config(contents: &str) -> PathBuf {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).expect("time").as_nanos();
        let path = std::env::temp_dir().join(format!("cg-cli-test-{timestamp}.toml"));
        fs::write(&path, contents).expect("write config");
        path
    }

    fn load_config(contents: &str) -> CampaignGateConfig {
        let path = write_config(contents);
        let config = CampaignGateConfig::load(Some(&path)).expect("load config");
        let _ = fs::remove_file(path);
        config
    }

    #[test]
    fn stdio_transport_is_never_network_exposed() {
        let config = load_config("");
        let outcome = enforce_local_only(&config, false).expect("expected success");
        assert!(!outcome.network_exposed);
        assert!(outcome.bind_addr.is_none());
    }

    #[test]
    fn loopback_bind_needs_no_opt_in() {
        let config = load_config(
            r#"
[server]
transport = "http"
bind = "127.0.0.1:8080"
"#,
        );
        let outcome = enforce_local_only(&config, false).expect("expected success");
        assert!(!outcome.network_exposed);
        assert!(outcome.bind_addr.expect("bind addr").ip().is_loopback());
    }

    #[test]
    fn non_loopback_requires_opt_in() {
        let config = load_config(
            r#"
[server]
transport = "http"
bind = "0.0.0.0:8080"

[server.auth]
mode = "bearer_token"
bearer_tokens = ["token"]
"#,
        );
        let err = enforce_local_only(&config, false).expect_err("expected opt-in error");
        assert!(matches!(err, ServePolicyError::NonLoopbackOptInRequired { .. }));
    }

    #[test]
    fn non_loopback_requires_auth() {
        let mut config = load_config(
            r#"
[server]
transport = "http"
bind = "0.0.0.0:8080"

[server.auth]
mode = "bearer_token"
bearer_tokens = ["token"]
"#,
        );
        config.server.auth = None;
        let err = enforce_local_only(&config, true).expect_err("expected auth error");
        assert!(matches!(err, ServePolicyError::NonLoopbackAuthRequired { .. }));
    }

    #[test]
    fn non_loopback_allows_bearer_with_opt_in() {
        let config = load_config(
            r#"
[server]
transport = "http"
bind = "0.0.0.0:8080"

[server.auth]
mode = "bearer_token"
bearer_tokens = ["token"]
"#,
        );
        let outcome = enforce_local_only(&config, true).expect("expected success");
        assert!(outcome.network_exposed);
    }

    #[test]
    fn malformed_bind_is_rejected() {
        let mut config = load_config(
            r#"
[server]
transport = "http"
bind = "127.0.0.1:8080"
"#,
        );
        config.server.bind = Some("not-an-address".to_string());
        let err = enforce_local_only(&config, false).expect_err("expected bind error");
        assert!(matches!(err, ServePolicyError::InvalidBind { .. }));
    }

    #[test]
    fn parse_allow_non_loopback_accepts_true() {
        let result = parse_allow_non_loopback_value("true").expect("parse env");
        assert!(result);
    }

    #[test]
    fn parse_allow_non_loopback_rejects_invalid() {
        let err = parse_allow_non_loopback_value("maybe").expect_err("expected invalid env");
        assert!(matches!(err, ServePolicyError::InvalidEnv { .. }));
    }
}
