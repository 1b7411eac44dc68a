//! Secondary filter and retrieval filter tests

use kubegraph::graph::{
    DependencyGraph, DependencyStrength, DependencyType, GraphEdge, GraphFilter, GraphNode,
    SecondaryFilter, ViewFilters,
};

/// web Service selects two Pods, each owned by a ReplicaSet and mounting a ConfigMap
fn sample() -> DependencyGraph {
    let svc = GraphNode::new("Service", "web", Some("shop"));
    let pod1 = GraphNode::new("Pod", "web-1", Some("shop"));
    let pod2 = GraphNode::new("Pod", "web-2", Some("shop"));
    let rs = GraphNode::new("ReplicaSet", "web-5c9", Some("shop"));
    let cm = GraphNode::new("ConfigMap", "web-config", Some("shop"));
    let node = GraphNode::new("Node", "worker-1", None);
    let edges = vec![
        GraphEdge::new(&svc.id, &pod1.id, DependencyType::Selector, DependencyStrength::Weak, "selector app=web"),
        GraphEdge::new(&svc.id, &pod2.id, DependencyType::Selector, DependencyStrength::Weak, "selector app=web"),
        GraphEdge::new(&pod1.id, &rs.id, DependencyType::Owner, DependencyStrength::Strong, "ownerReference"),
        GraphEdge::new(&pod2.id, &rs.id, DependencyType::Owner, DependencyStrength::Strong, "ownerReference"),
        GraphEdge::new(&pod1.id, &cm.id, DependencyType::Volume, DependencyStrength::Strong, "volume config"),
        GraphEdge::new(&pod1.id, &node.id, DependencyType::Custom, DependencyStrength::Weak, "scheduled on"),
    ];
    DependencyGraph::new("shop", vec![svc, pod1, pod2, rs, cm, node], edges)
}

fn node_names(graph: &DependencyGraph) -> Vec<&str> {
    graph.nodes.iter().map(|n| n.name.as_str()).collect()
}

#[test]
fn test_empty_filters_are_identity() {
    let graph = sample();
    assert_eq!(SecondaryFilter::search(&graph, ""), graph);
    assert_eq!(SecondaryFilter::search(&graph, "   "), graph);
    assert_eq!(SecondaryFilter::resource_types(&graph, &[]), graph);
    assert_eq!(SecondaryFilter::dependency_types(&graph, &[]), graph);
    assert_eq!(SecondaryFilter::strong_only(&graph, false), graph);
    assert_eq!(ViewFilters::default().apply(&graph), graph);
    assert_eq!(GraphFilter::default().apply(&graph), graph);
}

#[test]
fn test_resource_type_allow_list_drops_dangling_edges() {
    let graph = sample();
    let pods = SecondaryFilter::resource_types(&graph, &["Pod".to_string(), "ConfigMap".to_string()]);
    assert_eq!(node_names(&pods), vec!["web-1", "web-2", "web-config"]);
    assert_eq!(pods.edges.len(), 1);
    assert_eq!(pods.edges[0].dependency_type, DependencyType::Volume);
    assert_eq!(pods.metadata.node_count, 3);
    assert_eq!(pods.metadata.edge_count, 1);
}

#[test]
fn test_resource_type_match_is_exact() {
    let graph = sample();
    let none = SecondaryFilter::resource_types(&graph, &["pod".to_string()]);
    assert!(none.is_empty());
    assert!(none.edges.is_empty());
}

#[test]
fn test_dependency_type_allow_list_keeps_nodes() {
    let graph = sample();
    let owners = SecondaryFilter::dependency_types(&graph, &[DependencyType::Owner]);
    assert_eq!(owners.nodes.len(), graph.nodes.len());
    assert_eq!(owners.edges.len(), 2);
    assert!(owners.edges.iter().all(|e| e.dependency_type == DependencyType::Owner));
}

#[test]
fn test_search_is_case_insensitive_over_name_kind_namespace() {
    let graph = sample();
    assert_eq!(node_names(&SecondaryFilter::search(&graph, "WEB-1")), vec!["web-1"]);
    assert_eq!(
        node_names(&SecondaryFilter::search(&graph, "replicaset")),
        vec!["web-5c9"]
    );
    // Namespace match keeps every namespaced node; the cluster-scoped Node is dropped
    let by_ns = SecondaryFilter::search(&graph, "SHOP");
    assert_eq!(by_ns.nodes.len(), 5);
    assert!(by_ns.edges.iter().all(|e| e.target != "Node/worker-1"));
}

#[test]
fn test_search_without_matches_is_empty() {
    let graph = sample();
    let result = SecondaryFilter::search(&graph, "database");
    assert!(result.is_empty());
    assert!(result.edges.is_empty());
}

#[test]
fn test_strong_only() {
    let graph = sample();
    let strong = SecondaryFilter::strong_only(&graph, true);
    assert_eq!(strong.nodes.len(), graph.nodes.len());
    assert_eq!(strong.edges.len(), 3);
    assert!(strong.edges.iter().all(GraphEdge::is_strong));
}

#[test]
fn test_view_filters_compose() {
    let graph = sample();
    let view = ViewFilters {
        search: "web".to_string(),
        resource_types: vec!["Pod".to_string(), "ReplicaSet".to_string()],
        dependency_types: vec![DependencyType::Owner, DependencyType::Selector],
        strong_only: true,
    };
    let result = view.apply(&graph);
    assert_eq!(node_names(&result), vec!["web-1", "web-2", "web-5c9"]);
    assert_eq!(result.edges.len(), 2);
    assert!(result.edges.iter().all(|e| e.dependency_type == DependencyType::Owner));
}

#[test]
fn test_filters_keep_snapshot_metadata() {
    let graph = sample();
    let filtered = SecondaryFilter::search(&graph, "web-2");
    assert_eq!(filtered.metadata.namespace, "shop");
    assert_eq!(filtered.metadata.timestamp, graph.metadata.timestamp);
}

#[test]
fn test_graph_filter_applies_local_part() {
    let graph = sample();
    let filter = GraphFilter::from_raw(
        Some("shop".to_string()),
        None,
        &["Pod".to_string(), "ReplicaSet".to_string(), "Service".to_string()],
        &["owner".to_string()],
        Some(100),
    )
    .unwrap();
    let result = filter.apply(&graph);
    assert_eq!(result.nodes.len(), 4);
    assert_eq!(result.edges.len(), 2);

    let query = filter.query();
    assert_eq!(query.namespace.as_deref(), Some("shop"));
    assert_eq!(query.max_nodes, Some(100));
}
