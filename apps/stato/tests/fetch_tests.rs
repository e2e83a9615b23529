//! Fetcher integration tests against real local listeners, including the
//! publisher-to-merge round trip.

#![allow(clippy::unwrap_used, clippy::panic)]

use serde_json::json;
use stato::api::publisher_router;
use stato::demo::DemoReporter;
use stato::fetch::{FetchOptions, fetch_all, fetch_schemas};
use stato_core::{Endpoint, Publisher, ServiceInfo, Snapshot, parse_source};

fn service(ident: &str) -> ServiceInfo {
    ServiceInfo {
        name: "stato_demo".to_string(),
        component: None,
        ident: ident.to_string(),
        version: "0.0.1".to_string(),
    }
}

/// Serve a demo publisher on an ephemeral port; returns the port.
async fn spawn_demo(ident: &str) -> u16 {
    let publisher = Publisher::new(service(ident), DemoReporter::new());
    let router = publisher_router("/stato", publisher);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    port
}

/// A port nothing is listening on.
async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn endpoint(port: u16, path: &str) -> Endpoint {
    parse_source(&format!("127.0.0.1:{port}{path}")).unwrap()
}

// =============================================================================
// ROUND TRIP
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn published_state_round_trips_through_fetch_and_merge() {
    let port_a = spawn_demo("node01").await;
    let port_b = spawn_demo("node02").await;
    let endpoints = vec![
        endpoint(port_a, "/stato/snapshot"),
        endpoint(port_b, "/stato/snapshot"),
    ];

    let outcome = fetch_all(&endpoints, &FetchOptions::default()).await.unwrap();
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.documents.len(), 2);
    // Document order follows endpoint order.
    assert_eq!(outcome.documents[0].source, endpoints[0]);
    assert_eq!(outcome.documents[1].source, endpoints[1]);

    let snapshot = Snapshot::merge(outcome.documents);
    assert_eq!(
        snapshot.types().collect::<Vec<_>>(),
        vec!["service", "stats", "worker", "build", "note"]
    );
    assert_eq!(
        snapshot.list("service").collect::<Vec<_>>(),
        vec!["stato_demo.node01", "stato_demo.node02"]
    );

    // Both instances reported worker w01; the bucket accumulated both.
    assert_eq!(snapshot.lookup("worker", "w01").len(), 2);

    // The origin endpoint survives into the service entry.
    let entry = snapshot.lookup_first("service", "stato_demo.node01").unwrap();
    assert_eq!(
        entry.get("source"),
        Some(&json!(format!("http://127.0.0.1:{port_a}/stato/snapshot")))
    );

    // Links published by the demo resolve in the merged store.
    let build = snapshot.lookup_first("build", "107").unwrap();
    assert_eq!(snapshot.links(build), vec!["worker:w02"]);
}

// =============================================================================
// PARTIAL FAILURE
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn partial_failure_returns_both_documents_and_errors() {
    let good = spawn_demo("node01").await;
    let bad = closed_port().await;
    let endpoints = vec![
        endpoint(bad, "/stato/snapshot"),
        endpoint(good, "/stato/snapshot"),
    ];

    let outcome = fetch_all(&endpoints, &FetchOptions::default()).await.unwrap();

    assert_eq!(outcome.documents.len(), 1);
    assert_eq!(outcome.errors.len(), 1);
    assert!(!outcome.is_total_failure());
    // Failures are omitted from the document list, not left as holes.
    assert_eq!(outcome.documents[0].source, endpoints[1]);
    assert_eq!(outcome.first_error().unwrap().endpoint, endpoints[0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn total_failure_still_reports_every_error() {
    let bad_a = closed_port().await;
    let bad_b = closed_port().await;
    let endpoints = vec![
        endpoint(bad_a, "/stato/snapshot"),
        endpoint(bad_b, "/stato/snapshot"),
    ];

    let outcome = fetch_all(&endpoints, &FetchOptions::default()).await.unwrap();
    assert!(outcome.is_total_failure());
    assert_eq!(outcome.errors.len(), 2);
    assert_eq!(outcome.first_error().unwrap().endpoint, endpoints[0]);
}

#[tokio::test(flavor = "multi_thread")]
async fn non_200_responses_are_per_endpoint_errors() {
    let port = spawn_demo("node01").await;
    let endpoints = vec![endpoint(port, "/nowhere")];

    let outcome = fetch_all(&endpoints, &FetchOptions::default()).await.unwrap();
    assert!(outcome.is_total_failure());
    let message = outcome.first_error().unwrap().to_string();
    assert!(message.contains("response code 404"), "message: {message}");
}

// =============================================================================
// SCHEMAS
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn schema_sweep_merges_fragments() {
    let port = spawn_demo("node01").await;
    let endpoints = vec![endpoint(port, "/stato/snapshot")];

    let outcome = fetch_schemas(&endpoints, &FetchOptions::default()).await.unwrap();
    assert!(outcome.errors.is_empty());
    // The demo reports no component, so fragments land under the empty key.
    assert_eq!(
        outcome.schemas.fragment("worker", "stato_demo", ""),
        Some(&json!({ "summary": "build workers by slot name" }))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn unconventional_paths_fail_schema_fetch_only() {
    let port = spawn_demo("node01").await;
    let endpoints = vec![
        endpoint(port, "/state"),
        endpoint(port, "/stato/snapshot"),
    ];

    let outcome = fetch_schemas(&endpoints, &FetchOptions::default()).await.unwrap();

    // The conventional source still delivered its schema.
    assert!(outcome.schemas.fragment("build", "stato_demo", "").is_some());
    assert_eq!(outcome.errors.len(), 1);
    let message = outcome.errors[0].to_string();
    assert!(
        message.contains("don't know how to infer schema URL from /state"),
        "message: {message}"
    );
}
