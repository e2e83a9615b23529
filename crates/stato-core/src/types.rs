//! # Core Type Definitions
//!
//! This module contains the shared types of the stato merge engine:
//! - Network location of a monitored instance (`Protocol`, `Endpoint`)
//! - The raw per-instance payload (`RawDocument`)
//! - Error types (`StatoError`)
//!
//! `Endpoint` and `RawDocument` are transient: both are created fresh for
//! every fetch cycle and consumed by the merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

// =============================================================================
// PROTOCOL
// =============================================================================

/// Transport protocol of a snapshot source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// The URL scheme string for this protocol.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// The port implied when a source specification omits one.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

// =============================================================================
// ENDPOINT
// =============================================================================

/// A resolved network location for one monitored instance.
///
/// Immutable once constructed by the source parser. The `host` field holds
/// the bare host: an IPv6 literal is stored without its brackets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Endpoint {
    /// Render `scheme://host:port`, suitable for issuing requests.
    /// IPv6 hosts are re-bracketed.
    #[must_use]
    pub fn base_url(&self) -> String {
        if self.host.contains(':') {
            format!("{}://[{}]:{}", self.protocol.scheme(), self.host, self.port)
        } else {
            format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
        }
    }

    /// Render the canonical `scheme://host:port/path` origin string that the
    /// merge engine writes into each service entry's `source` field.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol.scheme(),
            self.host,
            self.port,
            self.path
        )
    }
}

// =============================================================================
// RAW DOCUMENT
// =============================================================================

/// The JSON payload one instance returned describing its own state, with
/// its originating endpoint attached by the fetcher.
///
/// Expected body shape: a `service` object (`name`, optional `component`,
/// `ident`, `version`), an optional free-form `stats` object, an optional
/// `types` list, and one identifier-to-value map per listed type.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    /// Where this document came from.
    pub source: Endpoint,
    /// The decoded top-level JSON object.
    pub body: Map<String, Value>,
}

impl RawDocument {
    /// Attach a source endpoint to a decoded response body.
    #[must_use]
    pub fn new(source: Endpoint, body: Map<String, Value>) -> Self {
        Self { source, body }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced by the pure core: source grammar violations and the
/// schema path convention.
///
/// Malformed snapshot documents are deliberately NOT represented here: the
/// merge engine has no fatal failure path and records those as warnings on
/// the resulting store instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatoError {
    /// The source specification contained no extractable host.
    #[error("no host specified")]
    NoHost,

    /// An IPv4-shaped host failed strict address validation.
    #[error("bad IPv4 address: {0:?}")]
    BadIpv4Address(String),

    /// A bracketed IPv6 host failed strict address validation.
    #[error("bad IPv6 address: {0:?}")]
    BadIpv6Address(String),

    /// The port suffix did not start with a base-10 number.
    #[error("invalid port: invalid number: {0:?}")]
    PortNotANumber(String),

    /// The port suffix had characters after the number.
    #[error("invalid port: trailing characters after number: {0:?}")]
    PortTrailingCharacters(String),

    /// The port parsed but is not in 1..=65535.
    #[error("invalid port: {0} (must be in range 1-65535)")]
    PortOutOfRange(String),

    /// The snapshot path does not end in the well-known suffix, so no
    /// schema URL can be derived from it.
    #[error("don't know how to infer schema URL from {0}")]
    SchemaPath(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_defaults() {
        assert_eq!(Protocol::Http.default_port(), 80);
        assert_eq!(Protocol::Https.default_port(), 443);
        assert_eq!(Protocol::Http.scheme(), "http");
        assert_eq!(Protocol::Https.scheme(), "https");
    }

    #[test]
    fn endpoint_urls() {
        let endpoint = Endpoint {
            protocol: Protocol::Http,
            host: "localhost".to_string(),
            port: 80,
            path: "/stato/snapshot".to_string(),
        };
        assert_eq!(endpoint.base_url(), "http://localhost:80");
        assert_eq!(endpoint.canonical(), "http://localhost:80/stato/snapshot");
    }

    #[test]
    fn endpoint_brackets_ipv6_for_requests_only() {
        let endpoint = Endpoint {
            protocol: Protocol::Https,
            host: "::1".to_string(),
            port: 8443,
            path: "/stato/snapshot".to_string(),
        };
        assert_eq!(endpoint.base_url(), "https://[::1]:8443");
        // The canonical origin string keeps the raw host.
        assert_eq!(endpoint.canonical(), "https://::1:8443/stato/snapshot");
    }
}
