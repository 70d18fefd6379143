// campaign-gate-core/src/core/identifiers.rs
// ============================================================================
// Module: Campaign Gate Identifiers
// Description: Canonical customer identifiers and hierarchical resource names.
// Purpose: Normalize account identifiers and build or parse resource names.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! This module defines the canonical string-based identifiers used throughout
//! Campaign Gate. Customer identifiers normalize to a ten-digit form with all
//! separators stripped. Resource names follow the platform's hierarchical
//! `customers/{customer}/{collection}/{resource}` shape and parse strictly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Canonical width of a customer identifier in digits.
const CUSTOMER_ID_WIDTH: usize = 10;

// ============================================================================
// SECTION: Customer Identifier
// ============================================================================

/// Canonical ten-digit customer (account) identifier.
///
/// # Invariants
/// - Contains only ASCII digits.
/// - At least [`CUSTOMER_ID_WIDTH`] digits wide; shorter inputs are
///   left-padded with zeros during normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerId(String);

impl CustomerId {
    /// Normalizes an arbitrary customer identifier input.
    ///
    /// Strips quote characters and any non-digit character (dashes, spaces),
    /// then left-pads with zeros to ten digits. Never fails: an empty input
    /// normalizes to ten zeros, which is an accepted edge case rather than an
    /// error path.
    #[must_use]
    pub fn normalize(raw: impl AsRef<str>) -> Self {
        let digits: String = raw.as_ref().chars().filter(char::is_ascii_digit).collect();
        if digits.len() >= CUSTOMER_ID_WIDTH {
            return Self(digits);
        }
        let mut padded = String::with_capacity(CUSTOMER_ID_WIDTH);
        for _ in 0..(CUSTOMER_ID_WIDTH - digits.len()) {
            padded.push('0');
        }
        padded.push_str(&digits);
        Self(padded)
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for CustomerId {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

impl From<String> for CustomerId {
    fn from(value: String) -> Self {
        Self::normalize(value)
    }
}

// ============================================================================
// SECTION: Resource Names
// ============================================================================

/// Hierarchical resource name referencing a remote platform entity.
///
/// # Invariants
/// - Serialized form is `customers/{customer}/{collection}/{resource}` with
///   exactly four `/`-delimited segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Builds a resource name from its components, normalizing the customer
    /// identifier first.
    #[must_use]
    pub fn build(customer: &CustomerId, collection: &str, resource_id: &str) -> Self {
        Self(format!("customers/{}/{collection}/{resource_id}", customer.as_str()))
    }

    /// Builds a campaign resource name.
    #[must_use]
    pub fn campaign(customer: &CustomerId, campaign_id: &str) -> Self {
        Self::build(customer, "campaigns", campaign_id)
    }

    /// Wraps an already-formed resource name string without validation.
    ///
    /// Used for resource names received from the remote platform, which are
    /// treated as opaque until parsed.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the resource name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the resource name into its components.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::MalformedResourceName`] when the name does
    /// not contain exactly four `/`-delimited segments or does not start with
    /// the `customers` collection.
    pub fn parse(&self) -> Result<ResourceParts, IdentifierError> {
        let segments: Vec<&str> = self.0.split('/').collect();
        let [root, customer, collection, resource_id] = segments.as_slice() else {
            return Err(IdentifierError::MalformedResourceName(self.0.clone()));
        };
        if *root != "customers" || customer.is_empty() || collection.is_empty() {
            return Err(IdentifierError::MalformedResourceName(self.0.clone()));
        }
        Ok(ResourceParts {
            customer_id: (*customer).to_string(),
            collection: (*collection).to_string(),
            resource_id: (*resource_id).to_string(),
        })
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parsed components of a [`ResourceName`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceParts {
    /// Customer identifier segment, as it appears in the name.
    pub customer_id: String,
    /// Resource collection segment (for example `campaigns`).
    pub collection: String,
    /// Resource identifier segment.
    pub resource_id: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Identifier parsing errors.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// Resource name does not match the expected four-segment shape.
    #[error("malformed resource name: {0}")]
    MalformedResourceName(String),
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

    use super::CustomerId;
    use super::IdentifierError;
    use super::ResourceName;

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(CustomerId::normalize("123-456-7890").as_str(), "1234567890");
    }

    #[test]
    fn normalize_pads_short_input() {
        assert_eq!(CustomerId::normalize("12345").as_str(), "0000012345");
    }

    #[test]
    fn normalize_strips_quotes() {
        assert_eq!(CustomerId::normalize("\"1234567890\"").as_str(), "1234567890");
    }

    #[test]
    fn normalize_accepts_empty_input() {
        assert_eq!(CustomerId::normalize("").as_str(), "0000000000");
    }

    #[test]
    fn parse_extracts_components() {
        let name = ResourceName::from_raw("customers/123/campaigns/456");
        let parts = name.parse().unwrap();
        assert_eq!(parts.customer_id, "123");
        assert_eq!(parts.collection, "campaigns");
        assert_eq!(parts.resource_id, "456");
    }

    #[test]
    fn parse_rejects_short_names() {
        let name = ResourceName::from_raw("bad");
        assert!(matches!(name.parse(), Err(IdentifierError::MalformedResourceName(_))));
    }

    #[test]
    fn parse_rejects_extra_segments() {
        let name = ResourceName::from_raw("customers/123/campaigns/456/extra");
        assert!(name.parse().is_err());
    }

    #[test]
    fn build_normalizes_customer() {
        let customer = CustomerId::normalize("123-456-7890");
        let name = ResourceName::campaign(&customer, "42");
        assert_eq!(name.as_str(), "customers/1234567890/campaigns/42");
    }
}
