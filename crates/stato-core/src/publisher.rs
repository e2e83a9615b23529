//! # Service Publisher
//!
//! The producer-side mirror of the fetcher: given callbacks that enumerate
//! an instance's own object types, identifiers, and values, renders the
//! exact document shape the fetch-and-merge pipeline expects.
//!
//! Rendering is pure apart from invoking the supplied callbacks. Shape
//! contracts the original enforced with runtime assertions (type lists
//! must be string arrays, object lists must be arrays) are carried by the
//! [`StateReporter`] signatures instead, so a violation is a compile
//! error in the embedding service rather than a runtime fault.

use serde::Serialize;
use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// =============================================================================
// SERVICE IDENTITY
// =============================================================================

/// The identity an embedding service publishes about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceInfo {
    /// Global name of this service (not this instance).
    pub name: String,
    /// Component type within the service, for services with several.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Global name of this service instance (suggested: the hostname).
    pub ident: String,
    /// Service version.
    pub version: String,
}

impl ServiceInfo {
    /// The canonical `name[.component].ident` identity string the merge
    /// engine will synthesize for this service.
    #[must_use]
    pub fn identity(&self) -> String {
        let mut identity = self.name.clone();
        if let Some(component) = &self.component {
            identity.push('.');
            identity.push_str(component);
        }
        identity.push('.');
        identity.push_str(&self.ident);
        identity
    }

    fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::String(self.name.clone()));
        if let Some(component) = &self.component {
            map.insert("component".to_string(), Value::String(component.clone()));
        }
        map.insert("ident".to_string(), Value::String(self.ident.clone()));
        map.insert("version".to_string(), Value::String(self.version.clone()));
        Value::Object(map)
    }
}

// =============================================================================
// STATE REPORTER
// =============================================================================

/// The callbacks an embedding service supplies to publish its state.
///
/// `list_objects` and `get_object` are only invoked with types previously
/// returned by `list_types` (and identifiers previously returned by
/// `list_objects`); implementations may rely on that.
pub trait StateReporter {
    /// Enumerate the object types this instance exposes.
    fn list_types(&self) -> Vec<String>;

    /// Enumerate the object identifiers for one listed type.
    fn list_objects(&self, type_name: &str) -> Vec<String>;

    /// Fetch one object by type and identifier. Any JSON-shaped value is
    /// allowed; the merge engine promotes primitives itself.
    fn get_object(&self, type_name: &str, ident: &str) -> Value;

    /// Arbitrary stats about this instance (usually error and performance
    /// counters).
    fn stats(&self) -> Option<Map<String, Value>> {
        None
    }

    /// Whether this reporter publishes schemas at all. When false, the
    /// schema document renders as an empty object.
    fn provides_schema(&self) -> bool {
        false
    }

    /// The schema for one listed type.
    fn schema(&self, _type_name: &str) -> Option<Value> {
        None
    }
}

// =============================================================================
// PUBLISHER
// =============================================================================

/// Renders snapshot and schema documents for one service instance.
///
/// The `started` stat is captured once at construction so repeated
/// snapshots of the same instance agree on it.
pub struct Publisher<R> {
    service: ServiceInfo,
    reporter: R,
    started: String,
}

impl<R: StateReporter> Publisher<R> {
    /// Create a publisher for a service identity and its reporter.
    #[must_use]
    pub fn new(service: ServiceInfo, reporter: R) -> Self {
        let started = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        Self {
            service,
            reporter,
            started,
        }
    }

    /// The identity this publisher renders under.
    #[must_use]
    pub fn service(&self) -> &ServiceInfo {
        &self.service
    }

    /// Generate the body of a snapshot response:
    /// `{service, stats, types, <each type>: {<id>: <value>}}`.
    #[must_use]
    pub fn render_snapshot(&self) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("service".to_string(), self.service.to_value());

        let mut stats = self.reporter.stats().unwrap_or_default();
        stats.insert("started".to_string(), Value::String(self.started.clone()));
        body.insert("stats".to_string(), Value::Object(stats));

        let types = self.reporter.list_types();
        body.insert(
            "types".to_string(),
            Value::Array(types.iter().cloned().map(Value::String).collect()),
        );

        for type_name in &types {
            let mut objects = Map::new();
            for ident in self.reporter.list_objects(type_name) {
                let value = self.reporter.get_object(type_name, &ident);
                objects.insert(ident, value);
            }
            body.insert(type_name.clone(), Value::Object(objects));
        }

        body
    }

    /// Generate the body of a schema response: `{service, types, schemas}`,
    /// or an empty object when the reporter publishes no schemas.
    #[must_use]
    pub fn render_schema(&self) -> Map<String, Value> {
        let mut body = Map::new();
        if !self.reporter.provides_schema() {
            return body;
        }

        body.insert("service".to_string(), self.service.to_value());

        let types = self.reporter.list_types();
        body.insert(
            "types".to_string(),
            Value::Array(types.iter().cloned().map(Value::String).collect()),
        );

        let mut schemas = Map::new();
        for type_name in &types {
            if let Some(fragment) = self.reporter.schema(type_name) {
                schemas.insert(type_name.clone(), fragment);
            }
        }
        body.insert("schemas".to_string(), Value::Object(schemas));

        body
    }
}

// =============================================================================
// TESTS
// =============================================================================
