//! # stato-core
//!
//! The snapshot merge and query engine for stato - THE LOGIC.
//!
//! This crate unifies heterogeneous per-instance state documents into one
//! typed, queryable, cross-linked object space:
//!
//! - `source` parses source specifications into endpoints
//! - `snapshot` folds raw documents into the append-only snapshot store
//!   and answers `type[:id]` queries and link scans against it
//! - `schema` aggregates per-type schema metadata (first write wins)
//! - `publisher` is the producer-side mirror: it renders the document
//!   shape a monitored instance serves
//!
//! ## Architectural Constraints
//!
//! The core:
//! - Has NO async, NO network dependencies (pure Rust); fetching lives in
//!   the application crate
//! - Is deterministic: ordered maps throughout, discovery order preserved
//! - Never fails hard while merging; malformed documents degrade to
//!   recorded warnings and the fold always produces a store

// =============================================================================
// MODULES
// =============================================================================

pub mod publisher;
pub mod schema;
pub mod snapshot;
pub mod source;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{Endpoint, Protocol, RawDocument, StatoError};

// =============================================================================
// RE-EXPORTS: Merge Engine
// =============================================================================

pub use snapshot::{MergeWarning, QueryResult, Snapshot};

// =============================================================================
// RE-EXPORTS: Source Parsing
// =============================================================================

pub use source::{
    DEFAULT_SNAPSHOT_PATH, SOURCES_ENV_VAR, parse_env, parse_source, parse_source_list,
};

// =============================================================================
// RE-EXPORTS: Schema Merge
// =============================================================================

pub use schema::{SchemaAggregate, schema_path};

// =============================================================================
// RE-EXPORTS: Publisher
// =============================================================================

pub use publisher::{Publisher, ServiceInfo, StateReporter};
