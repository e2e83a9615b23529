//! # Stato CLI Module
//!
//! This module implements the CLI interface for stato.
//!
//! ## Available Commands
//!
//! - `query` - Fetch snapshots and print objects matching a query
//! - `schema` - Fetch and merge schema metadata
//! - `browse` - Interactive snapshot browser
//! - `demo` - Run a demo publisher with built-in sample data

mod commands;

use crate::error::AppError;
use clap::{Parser, Subcommand, ValueEnum};

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// stato - aggregate and browse distributed service state
///
/// Queries remote instances for self-reported state snapshots, merges them
/// into one object space, and prints or interactively browses the result.
#[derive(Parser, Debug)]
#[command(name = "stato")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Desired query output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable fixed-width table
    Text,
    /// Pretty-printed JSON objects
    Json,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Query remote instances for objects matching a query
    ///
    /// "query" is an object type or identifier, as in:
    ///
    /// ```text
    /// worker             all objects of type "worker"
    /// worker:w01         all objects of type "worker" with id "w01"
    /// ```
    ///
    /// The special query "type" lists all available types.
    Query {
        /// Remote hosts, as comma-separated list of [http[s]://]host[:port][/uri]
        #[arg(short = 'H', long)]
        hosts: Option<String>,

        /// Long listing (emit object details, not just identifiers)
        #[arg(short, long)]
        long: bool,

        /// Column names to print, as comma-separated list (implies --long)
        #[arg(short = 'o', long)]
        columns: Option<String>,

        /// Output format
        #[arg(short = 'f', long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Object type or type:identifier
        query: String,
    },

    /// Fetch and merge per-type schema metadata from remote instances
    Schema {
        /// Remote hosts, as comma-separated list of [http[s]://]host[:port][/uri]
        #[arg(short = 'H', long)]
        hosts: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Browse snapshots interactively
    Browse {
        /// Remote hosts, as comma-separated list of [http[s]://]host[:port][/uri]
        #[arg(short = 'H', long)]
        hosts: Option<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Run a demo publisher with built-in sample data
    Demo {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value_t = 8080)]
        port: u16,

        /// Base URI the snapshot and schema routes are mounted under
        #[arg(long, default_value = "/stato")]
        uri_base: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Commands::Query {
            hosts,
            long,
            columns,
            format,
            timeout,
            query,
        } => cmd_query(hosts.as_deref(), long, columns.as_deref(), format, timeout, &query).await,
        Commands::Schema { hosts, timeout } => cmd_schema(hosts.as_deref(), timeout).await,
        Commands::Browse { hosts, timeout } => cmd_browse(hosts.as_deref(), timeout).await,
        Commands::Demo {
            host,
            port,
            uri_base,
        } => cmd_demo(&host, port, &uri_base).await,
    }
}
