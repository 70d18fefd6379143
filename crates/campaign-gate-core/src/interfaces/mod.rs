// campaign-gate-core/src/interfaces/mod.rs
// ============================================================================
// Module: External Interfaces
// Description: Traits the runtime engines use to reach the ads API.
// Purpose: Keep the domain core free of transport and credential concerns.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! The engines never talk to the network directly. They depend on two
//! seams: [`AdsGateway`] for row queries and single-operation mutations,
//! and [`CredentialSource`] for per-request authentication headers.
//! Transport implementations live outside this crate; tests substitute
//! scripted doubles.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::CustomerId;
use crate::core::identifiers::ResourceName;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Headers attached to every ads API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// `Authorization` header value, including the `Bearer ` prefix.
    pub authorization: String,
    /// `developer-token` header value.
    pub developer_token: String,
    /// `login-customer-id` header value for manager-account access.
    pub login_customer_id: Option<String>,
}

/// Source of authentication headers, resolved per request.
pub trait CredentialSource: Send + Sync {
    /// Produces the headers for the next request.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError`] when credentials are missing or cannot be
    /// refreshed.
    fn headers(&self) -> Result<AuthHeaders, CredentialError>;
}

/// Failure to produce authentication headers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("credential error: {0}")]
pub struct CredentialError(pub String);

// ============================================================================
// SECTION: Gateway
// ============================================================================

/// Synchronous gateway to the ads API.
///
/// One mutation call carries exactly one operation; bulk flows issue one
/// call per item so failures partition cleanly.
pub trait AdsGateway: Send + Sync {
    /// Runs a row query against the account and returns the result rows.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport failure, non-success status, or
    /// an undecodable response body.
    fn search(&self, customer_id: &CustomerId, query: &str) -> Result<Vec<Value>, GatewayError>;

    /// Issues a single mutation against a resource collection and returns
    /// the resource name of the affected resource.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] on transport failure, non-success status, or
    /// an undecodable response body.
    fn mutate(
        &self,
        customer_id: &CustomerId,
        collection: &str,
        operation: Value,
    ) -> Result<ResourceName, GatewayError>;
}

/// Failure raised by an [`AdsGateway`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The request never produced an HTTP response.
    #[error("transport error: {0}")]
    Transport(String),
    /// The API answered with a non-success status.
    #[error("remote error (status {status}): {body}")]
    Status {
        /// HTTP status code of the response.
        status: u16,
        /// Response body, truncated by the transport layer.
        body: String,
    },
    /// The response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}
