//! # Property-Based Tests
//!
//! Invariants of the source grammar and the merge engine under generated
//! input: parsing purity, append-only accumulation, and link soundness.

#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::collection::vec;
use proptest::prelude::*;
use serde_json::{Value, json};
use stato_core::{RawDocument, Snapshot, parse_source};

fn host_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}"
}

fn job_document(ident: &str, seq: usize) -> RawDocument {
    let source = parse_source("localhost").unwrap();
    let body = json!({
        "service": { "name": "svc", "ident": ident },
        "types": ["job"],
        "job": { "shared": { "seq": seq } }
    });
    let Value::Object(map) = body else {
        panic!("body is an object");
    };
    RawDocument::new(source, map)
}

proptest! {
    /// Parsing the same specification twice yields identical endpoints.
    #[test]
    fn parse_source_is_pure(
        host in host_strategy(),
        port in proptest::option::of(1u16..=65535),
        https in any::<bool>(),
    ) {
        let mut spec = if https { format!("https://{host}") } else { host };
        if let Some(port) = port {
            spec.push(':');
            spec.push_str(&port.to_string());
        }

        let first = parse_source(&spec).unwrap();
        let second = parse_source(&spec).unwrap();
        prop_assert_eq!(&first, &second);
        if let Some(port) = port {
            prop_assert_eq!(first.port, port);
        }
    }

    /// Every accepted document lands in the store, and entries within one
    /// bucket follow document order.
    #[test]
    fn merge_is_append_only(count in 1usize..8) {
        let documents: Vec<RawDocument> = (0..count)
            .map(|i| job_document(&format!("i{i}"), i))
            .collect();

        let snapshot = Snapshot::merge(documents);

        // One service identity per document, in input order.
        let identities: Vec<String> =
            (0..count).map(|i| format!("svc.i{i}")).collect();
        prop_assert_eq!(snapshot.list("service").collect::<Vec<_>>(), identities);

        // The shared bucket accumulated every entry, ordered by input.
        let bucket = snapshot.lookup("job", "shared");
        prop_assert_eq!(bucket.len(), count);
        for (i, entry) in bucket.iter().enumerate() {
            prop_assert_eq!(entry.get("seq"), Some(&json!(i)));
        }
    }

    /// Strings without a matching store entry are never reported as links.
    #[test]
    fn links_require_a_resolvable_target(strings in vec("[a-z:]{0,12}", 0..10)) {
        let snapshot = Snapshot::merge(vec![]);
        let value = Value::Array(strings.into_iter().map(Value::String).collect());
        prop_assert!(snapshot.links(&value).is_empty());
    }

    /// The meta-query returns one object per known type, and its field
    /// list is exactly the identity column.
    #[test]
    fn meta_query_matches_type_count(count in 0usize..5) {
        let documents: Vec<RawDocument> =
            (0..count).map(|i| job_document(&format!("i{i}"), i)).collect();
        let snapshot = Snapshot::merge(documents);

        let result = snapshot.query("type");
        prop_assert_eq!(result.objects.len(), snapshot.types().count());
        prop_assert_eq!(result.fields, vec!["type".to_string()]);
    }
}
