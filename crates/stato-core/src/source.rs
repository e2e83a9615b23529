//! # Source Descriptor Parser
//!
//! Parses a source specification into an [`Endpoint`]. Specifications take
//! the form of a normal HTTP URL with most components optional:
//!
//! ```text
//! [http[s]://]host[:port][/path]
//! ```
//!
//! Defaults: `http`, the protocol's well-known port, and the snapshot URI
//! [`DEFAULT_SNAPSHOT_PATH`]. Hosts may be IPv4 literals, bracketed IPv6
//! literals, or DNS names, each with distinct validation.
//!
//! Parsing is a pure function: the same specification always yields the
//! same endpoint or the same error.

use crate::types::{Endpoint, Protocol, StatoError};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Environment variable consulted when no sources are supplied explicitly.
pub const SOURCES_ENV_VAR: &str = "STATO_SOURCES";

/// Default URI of a published snapshot.
pub const DEFAULT_SNAPSHOT_PATH: &str = "/stato/snapshot";

// =============================================================================
// SINGLE SOURCE
// =============================================================================

/// Parse one source specification.
pub fn parse_source(spec: &str) -> Result<Endpoint, StatoError> {
    let (protocol, rest) = if let Some(rest) = spec.strip_prefix("https://") {
        (Protocol::Https, rest)
    } else if let Some(rest) = spec.strip_prefix("http://") {
        (Protocol::Http, rest)
    } else {
        (Protocol::Http, spec)
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, DEFAULT_SNAPSHOT_PATH),
    };

    let (host, port_str) = parse_authority(authority)?;
    let port = match port_str {
        Some(p) => parse_port(p)?,
        None => protocol.default_port(),
    };

    Ok(Endpoint {
        protocol,
        host,
        port,
        path: path.to_string(),
    })
}

/// Split an authority into host and optional port suffix, validating the
/// host form. Matching priority: IPv4 literal, bracketed IPv6 literal,
/// then domain name.
fn parse_authority(authority: &str) -> Result<(String, Option<&str>), StatoError> {
    // Bracketed IPv6 literal: [addr][:port]
    if let Some(rest) = authority.strip_prefix('[') {
        let Some(close) = rest.find(']') else {
            return Err(StatoError::NoHost);
        };
        let addr = &rest[..close];
        let tail = &rest[close + 1..];

        if addr.parse::<Ipv6Addr>().is_err() {
            return Err(StatoError::BadIpv6Address(addr.to_string()));
        }

        let port = match tail.strip_prefix(':') {
            Some(p) => Some(p),
            None if tail.is_empty() => None,
            None => return Err(StatoError::NoHost),
        };
        return Ok((addr.to_string(), port));
    }

    let (host, port) = match authority.find(':') {
        Some(i) => (&authority[..i], Some(&authority[i + 1..])),
        None => (authority, None),
    };

    if host.is_empty() {
        return Err(StatoError::NoHost);
    }

    if is_ipv4_shaped(host) {
        // An IPv4-shaped host must be a valid address; malformed octets do
        // not fall back to domain matching.
        if host.parse::<Ipv4Addr>().is_err() {
            return Err(StatoError::BadIpv4Address(host.to_string()));
        }
    } else if !host
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(StatoError::NoHost);
    }

    Ok((host.to_string(), port))
}

/// Whether a host splits into exactly four non-empty all-digit groups.
fn is_ipv4_shaped(host: &str) -> bool {
    let mut groups = 0;
    for part in host.split('.') {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        groups += 1;
    }
    groups == 4
}

/// Parse a port suffix as a positive base-10 integer: no sign, no trailing
/// characters, range 1-65535. The error distinguishes a non-numeric port
/// from trailing garbage from an out-of-range value.
fn parse_port(s: &str) -> Result<u16, StatoError> {
    let digits = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());

    if digits == 0 {
        return Err(StatoError::PortNotANumber(s.to_string()));
    }
    if digits < s.len() {
        return Err(StatoError::PortTrailingCharacters(s[digits..].to_string()));
    }

    match s.parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Ok(port as u16),
        _ => Err(StatoError::PortOutOfRange(s.to_string())),
    }
}

// =============================================================================
// SOURCE LISTS
// =============================================================================

/// Parse a comma-separated series of source specifications. Empty segments
/// are skipped; the first parse error wins.
pub fn parse_source_list(spec: &str) -> Result<Vec<Endpoint>, StatoError> {
    let mut endpoints = Vec::new();
    for piece in spec.split(',') {
        if piece.is_empty() {
            continue;
        }
        endpoints.push(parse_source(piece)?);
    }
    Ok(endpoints)
}

/// Parse sources from an environment variable ([`SOURCES_ENV_VAR`] unless
/// another name is given). Unset or empty yields an empty list.
pub fn parse_env(var_name: Option<&str>) -> Result<Vec<Endpoint>, StatoError> {
    let name = var_name.unwrap_or(SOURCES_ENV_VAR);
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => parse_source_list(&value),
        _ => Ok(Vec::new()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
