//! # Concurrent Fetcher
//!
//! Issues one HTTP GET per endpoint concurrently and joins on all of them:
//! the first failure never short-circuits its siblings. Each request owns
//! its own task and response; the join loop is the only synchronization
//! point, and it preserves endpoint order among the successes.
//!
//! Per-endpoint outcomes are independent. A transport error, a non-200
//! status, and a malformed body all surface as the same [`FetchError`]
//! with the cause chained for diagnostics, and the caller receives both
//! the error list and the documents that did arrive: partial success is
//! the expected common case.

use crate::error::AppError;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use stato_core::{Endpoint, RawDocument, SchemaAggregate, StatoError, schema_path};
use thiserror::Error;

// =============================================================================
// OPTIONS
// =============================================================================

/// Knobs for the underlying HTTP client. Both timeouts are optional; an
/// unset timeout leaves the request unbounded.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Total per-request timeout.
    pub timeout: Option<Duration>,
    /// Connection establishment timeout.
    pub connect_timeout: Option<Duration>,
}

fn build_client(options: &FetchOptions) -> Result<reqwest::Client, AppError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(timeout) = options.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }
    builder.build().map_err(AppError::ClientSetup)
}

// =============================================================================
// ERRORS
// =============================================================================

/// Why one endpoint's fetch failed.
#[derive(Debug, Error)]
pub enum FetchErrorKind {
    /// DNS, connect, or transfer failure.
    #[error("request failed")]
    Transport(#[source] reqwest::Error),

    /// The endpoint answered with a status other than 200.
    #[error("response code {0}")]
    Status(u16),

    /// The body was not decodable JSON.
    #[error("invalid response body")]
    Decode(#[source] reqwest::Error),

    /// The body decoded but was not a JSON object.
    #[error("response body is not a JSON object")]
    NotAnObject,

    /// The source's snapshot path does not follow the convention a schema
    /// URL can be derived from.
    #[error(transparent)]
    SchemaPath(StatoError),

    /// The fetch task itself died.
    #[error("fetch task failed")]
    Join(#[source] tokio::task::JoinError),
}

/// A failed fetch, tied to the endpoint it was issued against.
#[derive(Debug)]
pub struct FetchError {
    pub endpoint: Endpoint,
    pub kind: FetchErrorKind,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint.canonical(), self.kind)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// The result of fetching a set of endpoints: the documents that arrived
/// plus the per-endpoint failures. Callers must inspect `documents` even
/// when `errors` is non-empty.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Successfully fetched documents, in endpoint order.
    pub documents: Vec<RawDocument>,
    /// Per-endpoint failures; the failed endpoints are simply omitted from
    /// `documents`, not left as holes.
    pub errors: Vec<FetchError>,
}

impl FetchOutcome {
    /// The first per-endpoint error, if any endpoint failed.
    #[must_use]
    pub fn first_error(&self) -> Option<&FetchError> {
        self.errors.first()
    }

    /// Whether at least one endpoint was asked and none delivered.
    #[must_use]
    pub fn is_total_failure(&self) -> bool {
        self.documents.is_empty() && !self.errors.is_empty()
    }
}

/// The result of a schema sweep: the merged aggregate plus per-endpoint
/// failures (including path-convention failures).
#[derive(Debug)]
pub struct SchemaOutcome {
    pub schemas: SchemaAggregate,
    pub errors: Vec<FetchError>,
}

// =============================================================================
// FETCHING
// =============================================================================

/// GET one document from one endpoint at the given path.
async fn fetch_document(
    client: &reqwest::Client,
    endpoint: &Endpoint,
    path: &str,
) -> Result<Map<String, Value>, FetchErrorKind> {
    let url = format!("{}{}", endpoint.base_url(), path);
    let response = client
        .get(&url)
        .send()
        .await
        .map_err(FetchErrorKind::Transport)?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(FetchErrorKind::Status(status));
    }

    let value: Value = response.json().await.map_err(FetchErrorKind::Decode)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(FetchErrorKind::NotAnObject),
    }
}

/// Spawn one fetch task per endpoint and join them in order, sorting each
/// result into the success or failure list.
async fn fetch_many<F, Fut>(
    endpoints: &[Endpoint],
    fetch_one: F,
) -> (Vec<(Endpoint, Map<String, Value>)>, Vec<FetchError>)
where
    F: Fn(Endpoint) -> Fut,
    Fut: Future<Output = Result<Map<String, Value>, FetchErrorKind>> + Send + 'static,
{
    let handles: Vec<_> = endpoints
        .iter()
        .map(|endpoint| tokio::spawn(fetch_one(endpoint.clone())))
        .collect();

    let mut documents = Vec::new();
    let mut errors = Vec::new();

    for (endpoint, handle) in endpoints.iter().zip(handles) {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join) => Err(FetchErrorKind::Join(join)),
        };
        match outcome {
            Ok(body) => documents.push((endpoint.clone(), body)),
            Err(kind) => errors.push(FetchError {
                endpoint: endpoint.clone(),
                kind,
            }),
        }
    }

    (documents, errors)
}

/// Fetch a snapshot from every endpoint concurrently. Each successful
/// document gets its originating endpoint attached before it is handed to
/// the merge stage.
pub async fn fetch_all(
    endpoints: &[Endpoint],
    options: &FetchOptions,
) -> Result<FetchOutcome, AppError> {
    let client = build_client(options)?;

    let (bodies, errors) = fetch_many(endpoints, |endpoint| {
        let client = client.clone();
        async move {
            let path = endpoint.path.clone();
            fetch_document(&client, &endpoint, &path).await
        }
    })
    .await;

    let documents = bodies
        .into_iter()
        .map(|(endpoint, body)| RawDocument::new(endpoint, body))
        .collect();

    Ok(FetchOutcome { documents, errors })
}

/// Fetch and merge schema documents from every endpoint concurrently.
/// Sources whose snapshot path cannot be rewritten to a schema path fail
/// schema fetch only; the others proceed.
pub async fn fetch_schemas(
    endpoints: &[Endpoint],
    options: &FetchOptions,
) -> Result<SchemaOutcome, AppError> {
    let client = build_client(options)?;

    let (bodies, errors) = fetch_many(endpoints, |endpoint| {
        let client = client.clone();
        async move {
            let path = schema_path(&endpoint).map_err(FetchErrorKind::SchemaPath)?;
            fetch_document(&client, &endpoint, &path).await
        }
    })
    .await;

    let documents = bodies
        .into_iter()
        .map(|(_, body)| Value::Object(body))
        .collect();

    Ok(SchemaOutcome {
        schemas: SchemaAggregate::merge(documents),
        errors,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use stato_core::parse_source;

    #[test]
    fn total_failure_requires_at_least_one_error() {
        let empty = FetchOutcome {
            documents: vec![],
            errors: vec![],
        };
        assert!(!empty.is_total_failure());
        assert!(empty.first_error().is_none());

        let failed = FetchOutcome {
            documents: vec![],
            errors: vec![FetchError {
                endpoint: parse_source("localhost").expect("source"),
                kind: FetchErrorKind::Status(500),
            }],
        };
        assert!(failed.is_total_failure());
        assert_eq!(
            failed.first_error().expect("error").to_string(),
            "http://localhost:80/stato/snapshot: response code 500"
        );
    }
}
