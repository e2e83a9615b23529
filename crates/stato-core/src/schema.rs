//! # Schema Merge
//!
//! Aggregates per-type schema metadata from multiple sources. Structurally
//! parallel to the snapshot merge but with the opposite write rule: the
//! first fragment written for a `(type, service, component)` triple wins
//! and later duplicates are discarded silently. The two rules are kept
//! distinct on purpose; downstream tooling may depend on either.

use crate::types::{Endpoint, StatoError};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// The trailing path segment a snapshot URI must carry for its schema URI
/// to be derivable.
pub const SNAPSHOT_PATH_SUFFIX: &str = "/snapshot";

/// The path segment that replaces [`SNAPSHOT_PATH_SUFFIX`] in a schema URI.
pub const SCHEMA_PATH_SUFFIX: &str = "/schema";

// =============================================================================
// SCHEMA PATH DERIVATION
// =============================================================================

/// Derive a source's schema path from its snapshot path by substituting
/// the trailing segment. Sources whose path does not follow the convention
/// fail schema fetch only; their snapshot fetch is unaffected.
pub fn schema_path(endpoint: &Endpoint) -> Result<String, StatoError> {
    endpoint
        .path
        .strip_suffix(SNAPSHOT_PATH_SUFFIX)
        .map(|prefix| format!("{prefix}{SCHEMA_PATH_SUFFIX}"))
        .ok_or_else(|| StatoError::SchemaPath(endpoint.path.clone()))
}

// =============================================================================
// SCHEMA AGGREGATE
// =============================================================================

/// Merged schema metadata: type name, then service name, then component
/// name, down to the raw per-type schema fragment. A schema document whose
/// service reports no component is recorded under the empty component key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemaAggregate {
    pub types: IndexMap<String, IndexMap<String, IndexMap<String, Value>>>,
}

impl SchemaAggregate {
    /// Fold schema documents into one aggregate. Documents missing the
    /// required `types` array, `schemas` object, or service name are
    /// skipped; there is no fatal failure path.
    #[must_use]
    pub fn merge(documents: Vec<Value>) -> Self {
        let mut aggregate = Self::default();
        for document in documents {
            aggregate.merge_document(&document);
        }
        aggregate
    }

    fn merge_document(&mut self, document: &Value) {
        if document.get("types").and_then(Value::as_array).is_none() {
            return;
        }
        let Some(schemas) = document.get("schemas").and_then(Value::as_object) else {
            return;
        };
        let Some(service) = document
            .get("service")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
        else {
            return;
        };
        let component = document
            .get("service")
            .and_then(|s| s.get("component"))
            .and_then(Value::as_str)
            .unwrap_or("");

        for (type_name, fragment) in schemas {
            self.types
                .entry(type_name.clone())
                .or_default()
                .entry(service.to_string())
                .or_default()
                .entry(component.to_string())
                .or_insert_with(|| fragment.clone());
        }
    }

    /// The schema fragment recorded for a `(type, service, component)`
    /// triple, if any.
    #[must_use]
    pub fn fragment(&self, type_name: &str, service: &str, component: &str) -> Option<&Value> {
        self.types.get(type_name)?.get(service)?.get(component)
    }

    /// Whether any fragment was merged at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
