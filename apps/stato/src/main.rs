//! # stato
//!
//! Aggregates self-reported runtime state from distributed service
//! instances and exposes the merged result through a query CLI, an
//! interactive browser, and a demo publisher.
//!
//! ## Usage
//!
//! ```bash
//! # One-shot query against two instances
//! stato query -H host1:8080,host2:8080 -l worker
//!
//! # Interactive browsing, sources from STATO_SOURCES
//! stato browse
//!
//! # Stand up a demo instance to poke at
//! stato demo --port 8080
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — STATO_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("STATO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "stato=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    // Parse CLI arguments. Usage errors exit 1; --help and --version are
    // not failures.
    let cli = match stato::cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let failed = err.use_stderr();
            let _ = err.print();
            std::process::exit(if failed { 1 } else { 0 });
        }
    };

    // Execute command
    if let Err(e) = stato::cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
