// campaign-gate-api/src/client.rs
// ============================================================================
// Module: REST Gateway Client
// Description: Blocking REST client for search and mutate calls.
// Purpose: Implement the ads gateway over the Google Ads REST surface.
// Dependencies: campaign-gate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Implements [`AdsGateway`] against the versioned REST endpoints: row
//! queries go to `googleAds:search`, mutations to `{collection}:mutate`
//! with a single-operation payload. Authentication headers are resolved per
//! request from the injected credential source. Non-success responses are
//! surfaced with their status and a bounded slice of the body.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use campaign_gate_core::AdsGateway;
use campaign_gate_core::CredentialSource;
use campaign_gate_core::CustomerId;
use campaign_gate_core::GatewayError;
use campaign_gate_core::ResourceName;
use reqwest::blocking::Client;
use reqwest::blocking::Response;
use reqwest::redirect::Policy;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum number of error-body bytes carried into gateway errors.
const MAX_ERROR_BODY_BYTES: usize = 2048;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the REST gateway client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GoogleAdsConfig {
    /// Base endpoint without a trailing slash.
    pub endpoint: String,
    /// API version segment, e.g. `v19`.
    pub api_version: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for GoogleAdsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://googleads.googleapis.com".to_string(),
            api_version: "v19".to_string(),
            timeout_ms: 30_000,
            user_agent: "campaign-gate/0.1".to_string(),
        }
    }
}

// ============================================================================
// SECTION: Client
// ============================================================================

/// Blocking REST gateway to the ads API.
pub struct GoogleAdsClient {
    /// Endpoint and timeout configuration.
    config: GoogleAdsConfig,
    /// HTTP client used for outbound requests.
    client: Client,
    /// Source of per-request authentication headers.
    credentials: Arc<dyn CredentialSource>,
}

impl GoogleAdsClient {
    /// Creates a client over the given configuration and credentials.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the HTTP client cannot be created.
    pub fn new(
        config: GoogleAdsConfig,
        credentials: Arc<dyn CredentialSource>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .redirect(Policy::none())
            .build()
            .map_err(|_| GatewayError::Transport("http client build failed".to_string()))?;
        Ok(Self {
            config,
            client,
            credentials,
        })
    }

    /// Issues an authenticated POST and checks the response status.
    fn post(&self, url: &str, payload: &Value) -> Result<Response, GatewayError> {
        let headers = self
            .credentials
            .headers()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let mut request = self
            .client
            .post(url)
            .header("authorization", headers.authorization)
            .header("developer-token", headers.developer_token)
            .json(payload);
        if let Some(login_customer_id) = headers.login_customer_id {
            request = request.header("login-customer-id", login_customer_id);
        }
        let response = request
            .send()
            .map_err(|err| GatewayError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }
        Ok(response)
    }

    /// Builds the versioned URL for a customer-scoped method.
    fn customer_url(&self, customer_id: &CustomerId, method: &str) -> String {
        format!(
            "{}/{}/customers/{}/{method}",
            self.config.endpoint,
            self.config.api_version,
            customer_id.as_str()
        )
    }
}

impl AdsGateway for GoogleAdsClient {
    fn search(&self, customer_id: &CustomerId, query: &str) -> Result<Vec<Value>, GatewayError> {
        let url = self.customer_url(customer_id, "googleAds:search");
        let response = self.post(&url, &json!({ "query": query }))?;
        let body: Value = response
            .json()
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        match body.get("results") {
            None => Ok(Vec::new()),
            Some(Value::Array(rows)) => Ok(rows.clone()),
            Some(_) => Err(GatewayError::Decode("results is not an array".to_string())),
        }
    }

    fn mutate(
        &self,
        customer_id: &CustomerId,
        collection: &str,
        operation: Value,
    ) -> Result<ResourceName, GatewayError> {
        let url = self.customer_url(customer_id, &format!("{collection}:mutate"));
        let response = self.post(&url, &json!({ "operations": [operation] }))?;
        let body: Value = response
            .json()
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        body.get("results")
            .and_then(|results| results.get(0))
            .and_then(|result| result.get("resourceName"))
            .and_then(Value::as_str)
            .map(ResourceName::from_raw)
            .ok_or_else(|| {
                GatewayError::Decode("mutate response is missing results[0].resourceName".to_string())
            })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Bounds an error body to a UTF-8 safe prefix.
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_BYTES {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_BYTES;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::truncate_body;

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(truncate_body("bad request"), "bad request");
    }

    #[test]
    fn long_bodies_are_bounded_on_char_boundaries() {
        let body = "é".repeat(2048);
        let truncated = truncate_body(&body);
        assert!(truncated.len() <= 2048);
        assert!(truncated.chars().all(|c| c == 'é'));
    }
}
