//! # Publisher HTTP Embedding
//!
//! The server-side handler a monitored instance mounts to publish its
//! state. Two routes under a caller-chosen base URI:
//!
//! - `GET <base>/snapshot` - the instance's state document
//! - `GET <base>/schema` - the instance's schema document
//!
//! Anything else 404s, and non-GET methods on the known paths 405.
//! Rendering is delegated entirely to the core [`Publisher`].

use axum::{Json, Router, extract::State, routing::get};
use serde_json::Value;
use std::sync::Arc;
use stato_core::{Publisher, StateReporter};
use tower_http::trace::TraceLayer;

use crate::error::AppError;

// =============================================================================
// ROUTER
// =============================================================================

/// Build the router serving one publisher under `uri_base` (trailing
/// slashes are chopped).
pub fn publisher_router<R>(uri_base: &str, publisher: Publisher<R>) -> Router
where
    R: StateReporter + Send + Sync + 'static,
{
    let base = chop_slashes(uri_base);
    let state = Arc::new(publisher);

    Router::new()
        .route(&format!("{base}/snapshot"), get(snapshot_handler::<R>))
        .route(&format!("{base}/schema"), get(schema_handler::<R>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn snapshot_handler<R>(State(publisher): State<Arc<Publisher<R>>>) -> Json<Value>
where
    R: StateReporter + Send + Sync + 'static,
{
    Json(Value::Object(publisher.render_snapshot()))
}

async fn schema_handler<R>(State(publisher): State<Arc<Publisher<R>>>) -> Json<Value>
where
    R: StateReporter + Send + Sync + 'static,
{
    Json(Value::Object(publisher.render_schema()))
}

/// Strip trailing slashes from a base URI.
fn chop_slashes(uri_base: &str) -> &str {
    uri_base.trim_end_matches('/')
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Bind and serve a publisher router until the process is stopped.
pub async fn run_publisher(addr: &str, router: Router) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("stato publisher listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chop_slashes_strips_only_trailing() {
        assert_eq!(chop_slashes("/stato"), "/stato");
        assert_eq!(chop_slashes("/stato/"), "/stato");
        assert_eq!(chop_slashes("/stato///"), "/stato");
        assert_eq!(chop_slashes("/a/b"), "/a/b");
    }
}
