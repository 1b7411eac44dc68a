//! Graph model and subgraph extraction tests
//!
//! Covers the BFS extraction properties and the dangling-edge invariant of
//! every node-dropping operation.

use kubegraph::graph::{
    DependencyGraph, DependencyStrength, DependencyType, GraphEdge, GraphFilter, GraphNode,
    SecondaryFilter, ViewFilters, extract,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn node(kind: &str, name: &str) -> GraphNode {
    GraphNode::new(kind, name, Some("default"))
}

fn edge(from: &GraphNode, to: &GraphNode, t: DependencyType, s: DependencyStrength) -> GraphEdge {
    GraphEdge::new(&from.id, &to.id, t, s, "")
}

/// Pod A -> ReplicaSet B -> Deployment C, all owner edges
fn owner_chain() -> (DependencyGraph, [GraphNode; 3]) {
    let a = node("Pod", "a");
    let b = node("ReplicaSet", "b");
    let c = node("Deployment", "c");
    let edges = vec![
        edge(&a, &b, DependencyType::Owner, DependencyStrength::Strong),
        edge(&b, &c, DependencyType::Owner, DependencyStrength::Strong),
    ];
    let graph = DependencyGraph::new("default", vec![a.clone(), b.clone(), c.clone()], edges);
    (graph, [a, b, c])
}

fn assert_no_dangling(graph: &DependencyGraph) {
    let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    for e in &graph.edges {
        assert!(ids.contains(e.source.as_str()), "dangling source in {}", e.id);
        assert!(ids.contains(e.target.as_str()), "dangling target in {}", e.id);
    }
}

#[test]
fn test_extract_owner_chain() {
    let (graph, [a, b, c]) = owner_chain();
    let sub = extract(&graph, &a.id, 2);
    let ids: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
    assert_eq!(sub.edges.len(), 2);
}

#[test]
fn test_extract_walks_against_edge_direction() {
    let (graph, [a, b, c]) = owner_chain();
    let sub = extract(&graph, &c.id, 1);
    assert!(sub.contains(&b.id));
    assert!(!sub.contains(&a.id));
    assert_eq!(sub.edges.len(), 1);
}

#[test]
fn test_extract_depth_zero() {
    let (graph, [a, ..]) = owner_chain();
    let sub = extract(&graph, &a.id, 0);
    assert_eq!(sub.nodes.len(), 1);
    assert_eq!(sub.nodes[0].id, a.id);
    assert!(sub.edges.is_empty());
}

#[test]
fn test_extract_depth_zero_keeps_self_loop() {
    let a = node("Pod", "a");
    let looped = edge(&a, &a, DependencyType::Custom, DependencyStrength::Weak);
    let graph = DependencyGraph::new("default", vec![a.clone()], vec![looped]);
    let sub = extract(&graph, &a.id, 0);
    assert_eq!(sub.nodes.len(), 1);
    assert_eq!(sub.edges.len(), 1);
}

#[test]
fn test_extract_includes_edges_between_frontier_nodes() {
    // a - b, a - c, b - c: at depth 1 from a, b and c are frontier nodes
    let a = node("Service", "a");
    let b = node("Pod", "b");
    let c = node("Pod", "c");
    let edges = vec![
        edge(&a, &b, DependencyType::Selector, DependencyStrength::Weak),
        edge(&a, &c, DependencyType::Selector, DependencyStrength::Weak),
        edge(&b, &c, DependencyType::Network, DependencyStrength::Weak),
    ];
    let graph = DependencyGraph::new("default", vec![a.clone(), b, c], edges);
    let sub = extract(&graph, &a.id, 1);
    assert_eq!(sub.nodes.len(), 3);
    assert_eq!(sub.edges.len(), 3);
}

#[test]
fn test_extract_unknown_start() {
    let (graph, _) = owner_chain();
    let sub = extract(&graph, "Pod/ghost@default", 3);
    assert!(sub.nodes.is_empty());
    assert!(sub.edges.is_empty());
}

#[test]
fn test_extract_terminates_on_cycles() {
    let a = node("Pod", "a");
    let b = node("Pod", "b");
    let c = node("Pod", "c");
    let edges = vec![
        edge(&a, &b, DependencyType::Custom, DependencyStrength::Weak),
        edge(&b, &c, DependencyType::Custom, DependencyStrength::Weak),
        edge(&c, &a, DependencyType::Custom, DependencyStrength::Weak),
    ];
    let graph = DependencyGraph::new("default", vec![a.clone(), b, c], edges);
    let sub = extract(&graph, &a.id, 100);
    assert_eq!(sub.nodes.len(), 3);
    assert_eq!(sub.edges.len(), 3);
}

#[test]
fn test_subgraph_into_graph_recounts() {
    let (graph, [a, ..]) = owner_chain();
    let focused = extract(&graph, &a.id, 1).into_graph(&graph);
    assert_eq!(focused.metadata.node_count, 2);
    assert_eq!(focused.metadata.edge_count, 1);
    assert_eq!(focused.metadata.namespace, "default");
    assert!(focused.validate().is_ok());
}

#[test]
fn test_wire_snapshot_deserializes_and_validates() {
    let json = r#"{
        "metadata": {"namespace": "prod", "nodeCount": 2, "edgeCount": 1,
                     "timestamp": "2024-05-01T12:00:00Z"},
        "nodes": [
            {"id": "Deployment/web@prod", "kind": "Deployment", "name": "web",
             "namespace": "prod", "labels": {"app": "web"},
             "status": {"replicas": 3, "readyReplicas": 2}},
            {"id": "ServiceAccount/web@prod", "kind": "ServiceAccount", "name": "web",
             "namespace": "prod"}
        ],
        "edges": [
            {"id": "Deployment/web@prod-serviceAccount-ServiceAccount/web@prod",
             "source": "Deployment/web@prod", "target": "ServiceAccount/web@prod",
             "type": "serviceAccount", "strength": "strong",
             "metadata": {"reason": "pod template uses ServiceAccount",
                          "field": "spec.template.spec.serviceAccountName"}}
        ]
    }"#;
    let graph: DependencyGraph = serde_json::from_str(json).unwrap();
    assert!(graph.validate().is_ok());
    assert_eq!(graph.nodes[0].status.ready_replicas, Some(2));
    assert_eq!(graph.nodes[0].labels.get("app").map(String::as_str), Some("web"));
    assert_eq!(
        graph.edges[0].metadata.field.as_deref(),
        Some("spec.template.spec.serviceAccountName")
    );
}

const TYPES: [DependencyType; 4] = [
    DependencyType::Owner,
    DependencyType::Selector,
    DependencyType::Volume,
    DependencyType::Network,
];
const KINDS: [&str; 3] = ["Pod", "Service", "ConfigMap"];

/// Random graphs with unique ids and no dangling edges
fn arb_graph() -> impl Strategy<Value = DependencyGraph> {
    (1usize..12).prop_flat_map(|n| {
        let edges = proptest::collection::vec((0..n, 0..n, 0usize..4, any::<bool>()), 0..30);
        (Just(n), edges, proptest::collection::vec(0usize..3, n))
    })
    .prop_map(|(n, raw_edges, kinds)| {
        let nodes: Vec<GraphNode> = (0..n)
            .map(|i| GraphNode::new(KINDS[kinds[i]], &format!("r{}", i), Some("default")))
            .collect();
        let edges = raw_edges
            .into_iter()
            .enumerate()
            .map(|(i, (s, t, ty, strong))| {
                let strength = if strong {
                    DependencyStrength::Strong
                } else {
                    DependencyStrength::Weak
                };
                let mut e = GraphEdge::new(&nodes[s].id, &nodes[t].id, TYPES[ty], strength, "");
                e.id = format!("e{}", i);
                e
            })
            .collect();
        DependencyGraph::new("default", nodes, edges)
    })
}

proptest! {
    /// Property: a deeper extraction never loses nodes
    #[test]
    fn test_extraction_is_monotonic_in_depth(graph in arb_graph(), start in 0usize..12, depth in 0usize..5) {
        let start = &graph.nodes[start % graph.nodes.len()].id;
        let shallow: HashSet<String> = extract(&graph, start, depth).nodes.into_iter().map(|n| n.id).collect();
        let deep: HashSet<String> = extract(&graph, start, depth + 1).nodes.into_iter().map(|n| n.id).collect();
        prop_assert!(shallow.is_subset(&deep));
    }

    /// Property: extraction, filters and search never leave dangling edges
    #[test]
    fn test_no_dangling_edges(graph in arb_graph(), start in 0usize..12, depth in 0usize..4) {
        let start = &graph.nodes[start % graph.nodes.len()].id;
        let focused = extract(&graph, start, depth).into_graph(&graph);
        assert_no_dangling(&focused);

        assert_no_dangling(&SecondaryFilter::resource_types(&graph, &["Pod".to_string()]));
        assert_no_dangling(&SecondaryFilter::search(&graph, "r1"));

        let filter = GraphFilter {
            resource_types: Some(vec!["Service".to_string(), "ConfigMap".to_string()]),
            dependency_types: Some(vec![DependencyType::Owner]),
            ..Default::default()
        };
        assert_no_dangling(&filter.apply(&graph));

        let view = ViewFilters { search: "r".to_string(), strong_only: true, ..Default::default() };
        assert_no_dangling(&view.apply(&graph));
    }

    /// Property: the start node is always part of its own extraction
    #[test]
    fn test_extraction_contains_start(graph in arb_graph(), start in 0usize..12, depth in 0usize..4) {
        let start = &graph.nodes[start % graph.nodes.len()].id;
        prop_assert!(extract(&graph, start, depth).contains(start));
    }
}
