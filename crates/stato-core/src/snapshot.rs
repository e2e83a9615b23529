//! # Snapshot Store / Merge Engine
//!
//! The central data structure of stato: a unified, queryable store built by
//! folding the raw documents fetched from every source into one object
//! space partitioned by type.
//!
//! ## Invariants
//!
//! - The store is append-only per `(type, identifier)` during a merge: no
//!   entry is ever dropped or replaced, so entries from every accepted
//!   document survive regardless of input order, and entries within one
//!   bucket follow document order.
//! - Type names and identifiers keep discovery order (`IndexMap`).
//! - Merging never fails: malformed documents are skipped with a recorded
//!   warning and the fold always produces a store, possibly empty.
//! - A store is immutable after `merge` returns; an interactive "update"
//!   builds a brand-new store rather than mutating a prior one.

use crate::types::RawDocument;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;

/// The literal meta-query that enumerates known type names.
const TYPE_META_QUERY: &str = "type";

const NO_ENTRIES: &[Value] = &[];

// =============================================================================
// MERGE WARNINGS
// =============================================================================

/// A document the merge skipped, and why. Warnings never abort the fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeWarning {
    /// Canonical origin of the offending document.
    pub source: String,
    /// Human-readable reason the document was skipped.
    pub reason: String,
}

// =============================================================================
// QUERY RESULT
// =============================================================================

/// The tabular answer to a query: the union of top-level keys across the
/// matched objects (identity column first, then alphabetical), plus the
/// matched objects themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub fields: Vec<String>,
    pub objects: Vec<Value>,
}

// =============================================================================
// SNAPSHOT STORE
// =============================================================================

/// The merged, queryable union of all fetched documents.
///
/// Internally a mapping from type name to identifier to an ordered list of
/// entries; multiple sources may contribute entries under the same
/// `(type, identifier)` pair and all of them accumulate.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    objects: IndexMap<String, IndexMap<String, Vec<Value>>>,
    warnings: Vec<MergeWarning>,
}

impl Snapshot {
    // =========================================================================
    // MERGE
    // =========================================================================

    /// Fold raw documents into one store. This is the only constructor of a
    /// non-empty store; the result never changes afterwards.
    #[must_use]
    pub fn merge(documents: Vec<RawDocument>) -> Self {
        let mut snapshot = Self::default();

        for document in documents {
            let source = document.source.canonical();
            if let Err(reason) = snapshot.merge_document(document) {
                snapshot.warnings.push(MergeWarning { source, reason });
            }
        }

        snapshot
    }

    /// Merge a single document, or report why it had to be skipped.
    fn merge_document(&mut self, document: RawDocument) -> Result<(), String> {
        let RawDocument { source, mut body } = document;

        let Some(Value::Object(mut service)) = body.remove("service") else {
            return Err("missing \"service\" property".to_string());
        };

        let identity = service_identity(&service)?;

        // Validate the type list before inserting anything, so a skipped
        // document contributes no partial entries.
        let type_names = match body.get("types") {
            None => Vec::new(),
            Some(Value::Array(names)) => names.clone(),
            Some(_) => return Err("\"types\" is not an array".to_string()),
        };

        // The service entry's source field is rewritten to the canonical
        // origin string, whatever the instance itself reported.
        service.insert("source".to_string(), Value::String(source.canonical()));
        self.add("service", &identity, Value::Object(service));

        if let Some(stats) = body.remove("stats") {
            self.add("stats", &identity, stats);
        }

        for type_name in type_names {
            let Value::String(type_name) = type_name else {
                // A non-string entry in the type list is a per-entry defect;
                // the rest of the document still merges.
                continue;
            };
            let Some(Value::Object(entries)) = body.remove(&type_name) else {
                continue;
            };
            for (ident, mut value) in entries {
                // Only object values can carry the origin tag; primitives
                // are wrapped later by add() and stay untagged.
                if let Value::Object(map) = &mut value {
                    map.insert("origin".to_string(), Value::String(identity.clone()));
                }
                self.add(&type_name, &ident, value);
            }
        }

        Ok(())
    }

    /// Append an entry at `(type, ident)`. Primitive values are promoted to
    /// `{body: value}`; every entry gets a self-referential field keyed by
    /// its type name so field discovery is uniform.
    fn add(&mut self, type_name: &str, ident: &str, value: Value) {
        let mut entry = match value {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("body".to_string(), other);
                map
            }
        };
        entry.insert(type_name.to_string(), Value::String(ident.to_string()));

        self.objects
            .entry(type_name.to_string())
            .or_default()
            .entry(ident.to_string())
            .or_default()
            .push(Value::Object(entry));
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    /// All known type names, in discovery order.
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    /// All identifiers under a type, in discovery order. Unknown types
    /// yield an empty iterator.
    pub fn list(&self, type_name: &str) -> impl Iterator<Item = &str> {
        self.objects
            .get(type_name)
            .into_iter()
            .flat_map(|idents| idents.keys().map(String::as_str))
    }

    /// The entry list at `(type, ident)`, empty when absent.
    #[must_use]
    pub fn lookup(&self, type_name: &str, ident: &str) -> &[Value] {
        self.objects
            .get(type_name)
            .and_then(|idents| idents.get(ident))
            .map_or(NO_ENTRIES, Vec::as_slice)
    }

    /// The first entry at `(type, ident)`, if any.
    #[must_use]
    pub fn lookup_first(&self, type_name: &str, ident: &str) -> Option<&Value> {
        self.lookup(type_name, ident).first()
    }

    /// Documents the merge skipped.
    #[must_use]
    pub fn warnings(&self) -> &[MergeWarning] {
        &self.warnings
    }

    /// Whether the store holds no objects at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    // =========================================================================
    // QUERY
    // =========================================================================

    /// Answer a query string of the form `type` or `type:id`.
    ///
    /// The literal query `type` enumerates the known type names as
    /// single-field objects. Any other bare type concatenates that type's
    /// buckets in identifier-discovery order; `type:id` returns exactly the
    /// bucket at that key.
    #[must_use]
    pub fn query(&self, query_str: &str) -> QueryResult {
        let (type_name, ident) = match query_str.find(':') {
            Some(i) => (&query_str[..i], Some(&query_str[i + 1..])),
            None => (query_str, None),
        };

        let objects: Vec<Value> = match ident {
            Some(ident) => self.lookup(type_name, ident).to_vec(),
            None if type_name == TYPE_META_QUERY => self
                .types()
                .map(|name| json!({ (TYPE_META_QUERY): name }))
                .collect(),
            None => self
                .objects
                .get(type_name)
                .into_iter()
                .flat_map(|idents| idents.values().flatten().cloned())
                .collect(),
        };

        let fields = fields_for(type_name, &objects);
        QueryResult { fields, objects }
    }

    // =========================================================================
    // LINKS
    // =========================================================================

    /// Collect every cross-reference contained in a value, in depth-first
    /// traversal order, duplicates retained.
    ///
    /// A link is any string of the form `type:id` whose `(type, id)` bucket
    /// is non-empty in this store. Object keys are candidate links just
    /// like values. The scan does not recurse into target entries, so link
    /// cycles between entries are harmless here.
    #[must_use]
    pub fn links(&self, value: &Value) -> Vec<String> {
        let mut found = Vec::new();
        self.links_into(value, &mut found);
        found
    }

    fn links_into(&self, value: &Value, found: &mut Vec<String>) {
        match value {
            Value::String(s) => self.link_from_str(s, found),
            Value::Array(items) => {
                for item in items {
                    self.links_into(item, found);
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    self.link_from_str(key, found);
                    self.links_into(item, found);
                }
            }
            _ => {}
        }
    }

    fn link_from_str(&self, candidate: &str, found: &mut Vec<String>) {
        let Some(i) = candidate.find(':') else {
            return;
        };
        let (type_name, ident) = (&candidate[..i], &candidate[i + 1..]);
        if !self.lookup(type_name, ident).is_empty() {
            found.push(candidate.to_string());
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Synthesize the canonical `name[.component].ident` identity string from a
/// service object.
fn service_identity(service: &Map<String, Value>) -> Result<String, String> {
    let Some(name) = service.get("name").and_then(Value::as_str) else {
        return Err("\"service\" has no \"name\" string".to_string());
    };
    let Some(ident) = service.get("ident").and_then(Value::as_str) else {
        return Err("\"service\" has no \"ident\" string".to_string());
    };

    let mut identity = name.to_string();
    if let Some(component) = service.get("component").and_then(Value::as_str) {
        identity.push('.');
        identity.push_str(component);
    }
    identity.push('.');
    identity.push_str(ident);
    Ok(identity)
}

/// Compute the field list for a set of matched objects: the sorted union
/// of their keys, with the type name pulled out to the front.
fn fields_for(type_name: &str, objects: &[Value]) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for object in objects {
        if let Value::Object(map) = object {
            for key in map.keys() {
                keys.insert(key.clone());
            }
        }
    }
    keys.remove(type_name);

    let mut fields = vec![type_name.to_string()];
    fields.extend(keys);
    fields
}

// =============================================================================
// TESTS
// =============================================================================
