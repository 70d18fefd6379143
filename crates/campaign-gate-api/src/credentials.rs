// campaign-gate-api/src/credentials.rs
// ============================================================================
// Module: Credential Sources
// Description: Authentication header production for the REST gateway.
// Purpose: Implement the core credential seam from static or env values.
// Dependencies: campaign-gate-core
// ============================================================================

//! ## Overview
//! Credential sources resolve the three headers every ads API request
//! carries: the bearer token, the developer token, and the optional
//! manager-account identifier. The static source holds values fixed at
//! construction; the environment constructor reads them once at startup so
//! a missing credential fails the process early instead of the first
//! request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use campaign_gate_core::AuthHeaders;
use campaign_gate_core::CredentialError;
use campaign_gate_core::CredentialSource;

// ============================================================================
// SECTION: Environment Keys
// ============================================================================

/// Environment variable carrying the OAuth access token.
const ACCESS_TOKEN_ENV: &str = "GOOGLE_ADS_ACCESS_TOKEN";
/// Environment variable carrying the developer token.
const DEVELOPER_TOKEN_ENV: &str = "GOOGLE_ADS_DEVELOPER_TOKEN";
/// Environment variable carrying the optional manager account identifier.
const LOGIN_CUSTOMER_ID_ENV: &str = "GOOGLE_ADS_LOGIN_CUSTOMER_ID";

// ============================================================================
// SECTION: Static Source
// ============================================================================

/// Credential source with values fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticCredentialSource {
    /// OAuth access token, without the `Bearer ` prefix.
    access_token: String,
    /// Developer token.
    developer_token: String,
    /// Optional manager account identifier.
    login_customer_id: Option<String>,
}

impl StaticCredentialSource {
    /// Creates a source from explicit values.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        developer_token: impl Into<String>,
        login_customer_id: Option<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            developer_token: developer_token.into(),
            login_customer_id,
        }
    }

    /// Creates a source from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when a required variable is absent or
    /// empty.
    pub fn from_env() -> Result<Self, CredentialError> {
        let access_token = require_env(ACCESS_TOKEN_ENV)?;
        let developer_token = require_env(DEVELOPER_TOKEN_ENV)?;
        let login_customer_id =
            std::env::var(LOGIN_CUSTOMER_ID_ENV).ok().filter(|value| !value.trim().is_empty());
        Ok(Self {
            access_token,
            developer_token,
            login_customer_id,
        })
    }
}

impl CredentialSource for StaticCredentialSource {
    fn headers(&self) -> Result<AuthHeaders, CredentialError> {
        Ok(AuthHeaders {
            authorization: format!("Bearer {}", self.access_token),
            developer_token: self.developer_token.clone(),
            login_customer_id: self.login_customer_id.clone(),
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a required environment variable, rejecting empty values.
fn require_env(key: &str) -> Result<String, CredentialError> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| CredentialError(format!("{key} is not set")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use campaign_gate_core::CredentialSource;

    use super::StaticCredentialSource;

    #[test]
    fn headers_carry_the_bearer_prefix() {
        let source = StaticCredentialSource::new("tok", "dev", Some("1234567890".to_string()));
        let headers = source.headers().unwrap();
        assert_eq!(headers.authorization, "Bearer tok");
        assert_eq!(headers.developer_token, "dev");
        assert_eq!(headers.login_customer_id.as_deref(), Some("1234567890"));
    }
}
