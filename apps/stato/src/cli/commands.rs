//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::OutputFormat;
use crate::api;
use crate::demo::{DemoReporter, demo_service};
use crate::error::AppError;
use crate::fetch::{self, FetchOptions};
use crate::repl::BrowseSession;
use crate::table;
use std::time::Duration;
use stato_core::{Endpoint, Publisher, Snapshot, parse_env, parse_source_list};

// =============================================================================
// HOST RESOLUTION
// =============================================================================

/// Resolve the source list: an explicit `-H` list wins, otherwise the
/// `STATO_SOURCES` environment variable. No sources at all is a
/// configuration error.
fn resolve_hosts(hosts: Option<&str>) -> Result<Vec<Endpoint>, AppError> {
    let endpoints = match hosts {
        Some(spec) => parse_source_list(spec)?,
        None => parse_env(None)?,
    };
    if endpoints.is_empty() {
        return Err(AppError::NoHosts);
    }
    Ok(endpoints)
}

fn fetch_options(timeout: Option<u64>) -> FetchOptions {
    FetchOptions {
        timeout: timeout.map(Duration::from_secs),
        connect_timeout: None,
    }
}

/// Fetch all sources and merge, logging per-endpoint failures and merge
/// warnings. Only a total fetch failure is fatal.
async fn fetch_and_merge(
    endpoints: &[Endpoint],
    options: &FetchOptions,
) -> Result<Snapshot, AppError> {
    let mut outcome = fetch::fetch_all(endpoints, options).await?;
    if outcome.is_total_failure() {
        return Err(AppError::AllFetchesFailed(outcome.errors.remove(0)));
    }
    for error in &outcome.errors {
        tracing::warn!("fetch failed: {}", error);
    }

    let snapshot = Snapshot::merge(outcome.documents);
    for warning in snapshot.warnings() {
        tracing::warn!(source = %warning.source, "document skipped: {}", warning.reason);
    }
    Ok(snapshot)
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// One-shot query: fetch, merge, query, print, discard.
pub async fn cmd_query(
    hosts: Option<&str>,
    long: bool,
    columns: Option<&str>,
    format: OutputFormat,
    timeout: Option<u64>,
    query: &str,
) -> Result<(), AppError> {
    let endpoints = resolve_hosts(hosts)?;
    let snapshot = fetch_and_merge(&endpoints, &fetch_options(timeout)).await?;
    let result = snapshot.query(query);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result.objects)?);
        }
        OutputFormat::Text => {
            let mut fields: Vec<String> = match columns {
                Some(spec) => spec.split(',').map(str::to_string).collect(),
                None => result.fields,
            };
            // Short listing shows the identity column only.
            if !long && columns.is_none() {
                fields.truncate(1);
            }
            let stdout = std::io::stdout();
            table::emit_table(&mut stdout.lock(), &fields, &result.objects)?;
        }
    }
    Ok(())
}

// =============================================================================
// SCHEMA COMMAND
// =============================================================================

/// Fetch and merge schema metadata, printing the aggregate as JSON.
pub async fn cmd_schema(hosts: Option<&str>, timeout: Option<u64>) -> Result<(), AppError> {
    let endpoints = resolve_hosts(hosts)?;
    let mut outcome = fetch::fetch_schemas(&endpoints, &fetch_options(timeout)).await?;

    if outcome.schemas.is_empty() && !outcome.errors.is_empty() {
        return Err(AppError::AllFetchesFailed(outcome.errors.remove(0)));
    }
    for error in &outcome.errors {
        tracing::warn!("schema fetch failed: {}", error);
    }

    println!("{}", serde_json::to_string_pretty(&outcome.schemas)?);
    Ok(())
}

// =============================================================================
// BROWSE COMMAND
// =============================================================================

/// Start the interactive browser.
pub async fn cmd_browse(hosts: Option<&str>, timeout: Option<u64>) -> Result<(), AppError> {
    let endpoints = resolve_hosts(hosts)?;
    BrowseSession::new(endpoints, fetch_options(timeout))
        .run()
        .await
}

// =============================================================================
// DEMO COMMAND
// =============================================================================

/// Run the demo publisher.
pub async fn cmd_demo(host: &str, port: u16, uri_base: &str) -> Result<(), AppError> {
    let publisher = Publisher::new(demo_service(), DemoReporter::new());
    let identity = publisher.service().identity();
    let router = api::publisher_router(uri_base, publisher);

    println!("stato demo publisher");
    println!();
    println!("  Service:  {}", identity);
    println!("  Snapshot: http://{}:{}{}/snapshot", host, port, uri_base);
    println!("  Schema:   http://{}:{}{}/schema", host, port, uri_base);
    println!();
    println!("Point the query tool at it:");
    println!("  stato query -H {}:{}{}/snapshot type", host, port, uri_base);
    println!();
    println!("Press Ctrl+C to stop");

    api::run_publisher(&format!("{host}:{port}"), router).await
}
