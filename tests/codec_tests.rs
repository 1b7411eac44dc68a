//! Resource id codec tests
//!
//! Round trip and id shape properties of `encode`/`decode`, plus batch
//! decoding with invalid entries.

use kubegraph::graph::{ResourceRef, decode, decode_all, encode};
use kubegraph::GraphError;
use proptest::prelude::*;

#[test]
fn test_namespaced_id() {
    let id = encode("Pod", "test-pod", Some("default"));
    assert_eq!(id, "Pod/test-pod@default");

    let decoded = decode(&id).unwrap();
    assert_eq!(decoded.kind, "Pod");
    assert_eq!(decoded.name, "test-pod");
    assert_eq!(decoded.namespace.as_deref(), Some("default"));
}

#[test]
fn test_cluster_scoped_id() {
    let id = encode("ClusterRole", "admin", None);
    assert_eq!(id, "ClusterRole/admin");

    let decoded = decode(&id).unwrap();
    assert!(decoded.is_cluster_scoped());
    assert_eq!(decoded.id(), id);
}

#[test]
fn test_invalid_ids() {
    for id in ["", "Pod", "/name", "Pod/", "Pod/x@", "@ns"] {
        let err = decode(id).unwrap_err();
        assert!(
            matches!(err, GraphError::Codec { .. }),
            "{id:?} should be a codec error, got {err:?}"
        );
    }
}

#[test]
fn test_from_str_and_display() {
    let r: ResourceRef = "Deployment/web@prod".parse().unwrap();
    assert_eq!(r, ResourceRef::new("Deployment", "web", Some("prod")));
    assert_eq!(r.to_string(), "Deployment/web@prod");
}

#[test]
fn test_batch_skips_and_counts_bad_ids() {
    let batch = decode_all([
        "Pod/a@default",
        "garbage",
        "Node/worker-1",
        "Service/@prod",
        "Pod/b@",
    ]);
    assert_eq!(batch.skipped, 3);
    let ids: Vec<String> = batch.refs.iter().map(ResourceRef::id).collect();
    assert_eq!(ids, vec!["Pod/a@default", "Node/worker-1"]);
}

fn kind() -> impl Strategy<Value = String> {
    "[A-Z][A-Za-z0-9]{0,15}"
}

fn name() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.-]{0,30}"
}

fn namespace() -> impl Strategy<Value = Option<String>> {
    proptest::option::of("[a-z0-9][a-z0-9-]{0,20}")
}

proptest! {
    /// Property: decode(encode(r)) == r
    #[test]
    fn test_round_trip(kind in kind(), name in name(), namespace in namespace()) {
        let id = encode(&kind, &name, namespace.as_deref());
        let decoded = decode(&id).unwrap();
        prop_assert_eq!(decoded.kind, kind);
        prop_assert_eq!(decoded.name, name);
        prop_assert_eq!(decoded.namespace, namespace);
    }

    /// Property: one '/' always; '@' exactly when a namespace is present
    #[test]
    fn test_id_shape(kind in kind(), name in name(), namespace in namespace()) {
        let id = encode(&kind, &name, namespace.as_deref());
        prop_assert_eq!(id.matches('/').count(), 1);
        prop_assert_eq!(id.contains('@'), namespace.is_some());
        let prefix = format!("{}/{}", kind, name);
        prop_assert!(id.starts_with(&prefix));
    }
}
