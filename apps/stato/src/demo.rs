//! # Demo Publisher
//!
//! A built-in publisher instance with sample data, used by `stato demo`
//! to stand up a target the query and browse tools can be pointed at.
//! The data set exercises cross links (in value and key position) and a
//! plain-string object value.

use serde_json::{Map, Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use stato_core::{ServiceInfo, StateReporter};

/// The identity the demo instance publishes. The instance ident follows
/// the hostname when one is available.
#[must_use]
pub fn demo_service() -> ServiceInfo {
    ServiceInfo {
        name: "stato_demo".to_string(),
        component: None,
        ident: std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

// =============================================================================
// REPORTER
// =============================================================================

/// Serves a fixed object set and counts how often it has been listed.
pub struct DemoReporter {
    data: Map<String, Value>,
    lists: AtomicU64,
}

impl DemoReporter {
    #[must_use]
    pub fn new() -> Self {
        let data = json!({
            "worker": {
                "w01": { "state": "idle", "arch": "x86_64" },
                "w02": { "state": "busy", "running": "build:107" },
                "w03": { "state": "draining", "running": "build:105" }
            },
            "build": {
                "105": {
                    "target": "release",
                    "assigned": { "worker:w03": { "slot": 0 } }
                },
                "107": {
                    "target": "debug",
                    "assigned": { "worker:w02": { "slot": 1 } }
                }
            },
            "note": {
                "motd": "routine maintenance at 02:00 UTC"
            }
        });
        let Value::Object(data) = data else {
            unreachable!("sample data is an object");
        };
        Self {
            data,
            lists: AtomicU64::new(0),
        }
    }
}

impl Default for DemoReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StateReporter for DemoReporter {
    fn list_types(&self) -> Vec<String> {
        self.lists.fetch_add(1, Ordering::Relaxed);
        self.data.keys().cloned().collect()
    }

    fn list_objects(&self, type_name: &str) -> Vec<String> {
        self.data
            .get(type_name)
            .and_then(Value::as_object)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn get_object(&self, type_name: &str, ident: &str) -> Value {
        self.data
            .get(type_name)
            .and_then(|objects| objects.get(ident))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn stats(&self) -> Option<Map<String, Value>> {
        let mut stats = Map::new();
        stats.insert(
            "lists".to_string(),
            json!(self.lists.load(Ordering::Relaxed)),
        );
        Some(stats)
    }

    fn provides_schema(&self) -> bool {
        true
    }

    fn schema(&self, type_name: &str) -> Option<Value> {
        match type_name {
            "worker" => Some(json!({ "summary": "build workers by slot name" })),
            "build" => Some(json!({ "summary": "builds by serial number" })),
            "note" => Some(json!({ "summary": "operator notes" })),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_objects_are_gettable() {
        let reporter = DemoReporter::new();
        for type_name in reporter.list_types() {
            for ident in reporter.list_objects(&type_name) {
                assert!(!reporter.get_object(&type_name, &ident).is_null());
            }
        }
    }

    #[test]
    fn list_counter_feeds_stats() {
        let reporter = DemoReporter::new();
        let _ = reporter.list_types();
        let _ = reporter.list_types();
        let stats = reporter.stats().expect("stats");
        assert_eq!(stats.get("lists"), Some(&json!(2)));
    }

    #[test]
    fn every_type_has_a_schema() {
        let reporter = DemoReporter::new();
        for type_name in reporter.list_types() {
            assert!(reporter.schema(&type_name).is_some());
        }
        assert!(reporter.schema("unknown").is_none());
    }
}
