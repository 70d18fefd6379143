// campaign-gate-mcp/src/auth.rs
// ============================================================================
// Module: MCP Authn/Authz
// Description: Authentication and authorization enforcement for tool calls.
// Purpose: Provide strict, fail-closed auth policies for MCP tool requests.
// Dependencies: campaign-gate-core, serde, sha2
// ============================================================================

//! ## Overview
//! This module defines the authn/authz interfaces for MCP tool calls and
//! provides default policies for local-only and bearer-token enforcement.
//! All decisions are fail-closed and emit audit events. Bearer tokens are
//! never logged; audit events carry a sha256 fingerprint instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write as _;
use std::net::IpAddr;

use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

use crate::config::ServerAuthConfig;
use crate::config::ServerAuthMode;
use crate::config::ServerTransport;
use crate::tools::ToolName;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum accepted authorization header size.
const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Request Context
// ============================================================================

/// Per-request context used for auth decisions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Transport used by the caller.
    pub transport: ServerTransport,
    /// Peer IP address when available.
    pub peer_ip: Option<IpAddr>,
    /// Authorization header value (HTTP only).
    pub auth_header: Option<String>,
    /// Optional request identifier for auditing.
    pub request_id: Option<String>,
}

impl RequestContext {
    /// Builds a stdio request context.
    #[must_use]
    pub const fn stdio() -> Self {
        Self {
            transport: ServerTransport::Stdio,
            peer_ip: None,
            auth_header: None,
            request_id: None,
        }
    }

    /// Builds an HTTP request context.
    #[must_use]
    pub const fn http(peer_ip: Option<IpAddr>, auth_header: Option<String>) -> Self {
        Self {
            transport: ServerTransport::Http,
            peer_ip,
            auth_header,
            request_id: None,
        }
    }

    /// Returns a copy with the request identifier set.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns true when the peer IP is loopback.
    #[must_use]
    pub fn peer_is_loopback(&self) -> bool {
        self.peer_ip.is_some_and(|ip| ip.is_loopback())
    }
}

// ============================================================================
// SECTION: Auth Context
// ============================================================================

/// Authenticated caller context.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Authentication method.
    pub method: AuthMethod,
    /// Optional subject identifier.
    pub subject: Option<String>,
    /// Token fingerprint for bearer auth (hashed).
    pub token_fingerprint: Option<String>,
}

impl AuthContext {
    /// Returns the audit label for the auth method.
    const fn method_label(&self) -> &'static str {
        match self.method {
            AuthMethod::Local => "local",
            AuthMethod::BearerToken => "bearer_token",
        }
    }
}

/// Authentication method used for the request.
#[derive(Debug, Clone, Copy)]
pub enum AuthMethod {
    /// Local-only loopback or stdio access.
    Local,
    /// Bearer token authentication.
    BearerToken,
}

/// Authz action for MCP requests.
#[derive(Debug, Clone, Copy)]
pub enum AuthAction {
    /// List tools action.
    ListTools,
    /// Tool call action.
    CallTool(ToolName),
}

impl AuthAction {
    /// Returns the audit label for the action.
    fn label(self) -> String {
        match self {
            Self::ListTools => "tools/list".to_string(),
            Self::CallTool(tool) => tool.as_str().to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication or authorization errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Caller is authenticated but not authorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
}

// ============================================================================
// SECTION: Traits
// ============================================================================

/// Authn/authz interface for MCP tool calls.
pub trait ToolAuthz: Send + Sync {
    /// Authorizes a tool request. Returns an authenticated context on success.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when the caller is not authenticated or not
    /// authorized for the requested action.
    fn authorize(
        &self,
        ctx: &RequestContext,
        action: AuthAction,
    ) -> Result<AuthContext, AuthError>;
}

/// Audit sink for auth decisions.
pub trait AuthAuditSink: Send + Sync {
    /// Records an auth audit event.
    fn record(&self, event: &AuthAuditEvent);
}

// ============================================================================
// SECTION: Default Policies
// ============================================================================

/// Default authz implementation derived from server config.
pub struct DefaultToolAuthz {
    /// Configured authentication mode.
    mode: ServerAuthMode,
    /// Accepted bearer tokens.
    bearer_tokens: BTreeSet<String>,
    /// Tool allowlist; `None` allows every tool.
    allowed_tools: Option<BTreeSet<ToolName>>,
}

impl DefaultToolAuthz {
    /// Builds a default authz policy from server auth configuration.
    #[must_use]
    pub fn from_config(config: Option<&ServerAuthConfig>) -> Self {
        let mode = config.map_or(ServerAuthMode::LocalOnly, |cfg| cfg.mode);
        let bearer_tokens =
            config.map(|cfg| cfg.bearer_tokens.iter().cloned().collect()).unwrap_or_default();
        let allowed_tools = config.and_then(|cfg| {
            if cfg.allowed_tools.is_empty() {
                return None;
            }
            let mut parsed = BTreeSet::new();
            for name in &cfg.allowed_tools {
                if let Some(tool) = ToolName::parse(name) {
                    parsed.insert(tool);
                } else {
                    // Fail closed if a tool name cannot be parsed.
                    return Some(BTreeSet::new());
                }
            }
            Some(parsed)
        });
        Self {
            mode,
            bearer_tokens,
            allowed_tools,
        }
    }

    /// Returns the configured auth mode.
    #[must_use]
    pub const fn mode(&self) -> ServerAuthMode {
        self.mode
    }
}

impl ToolAuthz for DefaultToolAuthz {
    fn authorize(
        &self,
        ctx: &RequestContext,
        action: AuthAction,
    ) -> Result<AuthContext, AuthError> {
        let auth = match self.mode {
            ServerAuthMode::LocalOnly => authorize_local_only(ctx)?,
            ServerAuthMode::BearerToken => authorize_bearer(ctx, &self.bearer_tokens)?,
        };

        if let AuthAction::CallTool(tool) = action {
            if let Some(allowed) = &self.allowed_tools {
                if !allowed.contains(&tool) {
                    return Err(AuthError::Unauthorized("tool not authorized".to_string()));
                }
            }
        }

        Ok(auth)
    }
}

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Auth audit event payload.
#[derive(Debug, Serialize)]
pub struct AuthAuditEvent {
    /// Event identifier.
    event: &'static str,
    /// Decision outcome.
    decision: &'static str,
    /// MCP action name.
    action: String,
    /// Transport label.
    transport: &'static str,
    /// Caller IP address (if available).
    peer_ip: Option<String>,
    /// Auth method label.
    auth_method: Option<&'static str>,
    /// Caller subject or identity label.
    subject: Option<String>,
    /// Bearer token fingerprint (sha256).
    token_fingerprint: Option<String>,
    /// Failure reason (for deny events).
    reason: Option<String>,
    /// Request identifier (if provided).
    request_id: Option<String>,
}

impl AuthAuditEvent {
    /// Builds an allow event.
    #[must_use]
    pub fn allowed(ctx: &RequestContext, action: AuthAction, auth: &AuthContext) -> Self {
        Self {
            event: "tool_authz",
            decision: "allow",
            action: action.label(),
            transport: transport_label(ctx.transport),
            peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
            auth_method: Some(auth.method_label()),
            subject: auth.subject.clone(),
            token_fingerprint: auth.token_fingerprint.clone(),
            reason: None,
            request_id: ctx.request_id.clone(),
        }
    }

    /// Builds a deny event.
    #[must_use]
    pub fn denied(ctx: &RequestContext, action: AuthAction, error: &AuthError) -> Self {
        Self {
            event: "tool_authz",
            decision: "deny",
            action: action.label(),
            transport: transport_label(ctx.transport),
            peer_ip: ctx.peer_ip.map(|ip| ip.to_string()),
            auth_method: None,
            subject: None,
            token_fingerprint: None,
            reason: Some(error.to_string()),
            request_id: ctx.request_id.clone(),
        }
    }
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuthAuditSink;

impl AuthAuditSink for StderrAuthAuditSink {
    fn record(&self, event: &AuthAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuthAuditSink;

impl AuthAuditSink for NoopAuthAuditSink {
    fn record(&self, _event: &AuthAuditEvent) {}
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the audit label for the transport.
const fn transport_label(transport: ServerTransport) -> &'static str {
    match transport {
        ServerTransport::Stdio => "stdio",
        ServerTransport::Http => "http",
    }
}

/// Authorizes local-only callers (stdio or loopback HTTP).
fn authorize_local_only(ctx: &RequestContext) -> Result<AuthContext, AuthError> {
    match ctx.transport {
        ServerTransport::Stdio => Ok(AuthContext {
            method: AuthMethod::Local,
            subject: Some("stdio".to_string()),
            token_fingerprint: None,
        }),
        ServerTransport::Http => {
            if ctx.peer_is_loopback() {
                Ok(AuthContext {
                    method: AuthMethod::Local,
                    subject: Some("loopback".to_string()),
                    token_fingerprint: None,
                })
            } else {
                Err(AuthError::Unauthenticated(
                    "local-only mode requires loopback access".to_string(),
                ))
            }
        }
    }
}

/// Authorizes bearer-token callers against the configured token set.
fn authorize_bearer(
    ctx: &RequestContext,
    tokens: &BTreeSet<String>,
) -> Result<AuthContext, AuthError> {
    let token = parse_bearer_token(ctx.auth_header.as_deref())?;
    if !tokens.contains(&token) {
        return Err(AuthError::Unauthenticated("invalid bearer token".to_string()));
    }
    Ok(AuthContext {
        method: AuthMethod::BearerToken,
        subject: None,
        token_fingerprint: Some(sha256_hex(token.as_bytes())),
    })
}

/// Extracts the bearer token from an authorization header.
fn parse_bearer_token(auth_header: Option<&str>) -> Result<String, AuthError> {
    let header = auth_header
        .ok_or_else(|| AuthError::Unauthenticated("missing authorization".to_string()))?;
    if header.len() > MAX_AUTH_HEADER_BYTES {
        return Err(AuthError::Unauthenticated("authorization header too large".to_string()));
    }
    let mut parts = header.trim().splitn(2, ' ');
    let scheme = parts.next().unwrap_or_default();
    let token = parts.next().unwrap_or_default().trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AuthError::Unauthenticated("invalid authorization header".to_string()));
    }
    Ok(token.to_string())
}

/// Returns the lowercase hex sha256 digest of the input.
fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
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

    use std::net::IpAddr;
    use std::net::Ipv4Addr;

    use super::*;

    fn bearer_config(token: &str) -> ServerAuthConfig {
        ServerAuthConfig {
            mode: ServerAuthMode::BearerToken,
            bearer_tokens: vec![token.to_string()],
            allowed_tools: Vec::new(),
        }
    }

    #[test]
    fn stdio_is_always_local() {
        let authz = DefaultToolAuthz::from_config(None);
        let ctx = RequestContext::stdio();
        let auth = authz.authorize(&ctx, AuthAction::ListTools).expect("stdio is allowed");
        assert_eq!(auth.subject.as_deref(), Some("stdio"));
    }

    #[test]
    fn local_only_rejects_remote_peers() {
        let authz = DefaultToolAuthz::from_config(None);
        let ctx = RequestContext::http(Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9))), None);
        let result = authz.authorize(&ctx, AuthAction::ListTools);
        assert!(matches!(result, Err(AuthError::Unauthenticated(_))));
    }

    #[test]
    fn local_only_accepts_loopback() {
        let authz = DefaultToolAuthz::from_config(None);
        let ctx = RequestContext::http(Some(IpAddr::V4(Ipv4Addr::LOCALHOST)), None);
        let auth = authz.authorize(&ctx, AuthAction::ListTools).expect("loopback is allowed");
        assert_eq!(auth.subject.as_deref(), Some("loopback"));
    }

    #[test]
    fn bearer_mode_accepts_valid_token() {
        let config = bearer_config("sesame");
        let authz = DefaultToolAuthz::from_config(Some(&config));
        let ctx = RequestContext::http(
            Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9))),
            Some("Bearer sesame".to_string()),
        );
        let auth = authz
            .authorize(&ctx, AuthAction::CallTool(ToolName::GuardrailsGet))
            .expect("valid token is allowed");
        let fingerprint = auth.token_fingerprint.expect("bearer auth carries a fingerprint");
        assert_eq!(fingerprint.len(), 64);
        assert_ne!(fingerprint, "sesame");
    }

    #[test]
    fn bearer_mode_rejects_wrong_token() {
        let config = bearer_config("sesame");
        let authz = DefaultToolAuthz::from_config(Some(&config));
        let ctx = RequestContext::http(None, Some("Bearer other".to_string()));
        let result = authz.authorize(&ctx, AuthAction::ListTools);
        assert!(matches!(result, Err(AuthError::Unauthenticated(_))));
    }

    #[test]
    fn bearer_mode_rejects_missing_header() {
        let config = bearer_config("sesame");
        let authz = DefaultToolAuthz::from_config(Some(&config));
        let ctx = RequestContext::http(None, None);
        let result = authz.authorize(&ctx, AuthAction::ListTools);
        assert!(matches!(result, Err(AuthError::Unauthenticated(_))));
    }

    #[test]
    fn allowlist_blocks_unlisted_tools() {
        let config = ServerAuthConfig {
            mode: ServerAuthMode::LocalOnly,
            bearer_tokens: Vec::new(),
            allowed_tools: vec!["guardrails_get".to_string()],
        };
        let authz = DefaultToolAuthz::from_config(Some(&config));
        let ctx = RequestContext::stdio();
        assert!(authz.authorize(&ctx, AuthAction::CallTool(ToolName::GuardrailsGet)).is_ok());
        let result = authz.authorize(&ctx, AuthAction::CallTool(ToolName::BudgetUpdate));
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[test]
    fn unparseable_allowlist_fails_closed() {
        let config = ServerAuthConfig {
            mode: ServerAuthMode::LocalOnly,
            bearer_tokens: Vec::new(),
            allowed_tools: vec!["no_such_tool".to_string()],
        };
        let authz = DefaultToolAuthz::from_config(Some(&config));
        let ctx = RequestContext::stdio();
        let result = authz.authorize(&ctx, AuthAction::CallTool(ToolName::GuardrailsGet));
        assert!(matches!(result, Err(AuthError::Unauthorized(_))));
    }

    #[test]
    fn bearer_header_parsing_is_case_insensitive() {
        let token = parse_bearer_token(Some("bearer abc123")).expect("scheme is case-insensitive");
        assert_eq!(token, "abc123");
        assert!(parse_bearer_token(Some("Basic abc123")).is_err());
        assert!(parse_bearer_token(Some("Bearer ")).is_err());
    }
}
