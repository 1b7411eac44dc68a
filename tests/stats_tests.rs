//! Graph statistics tests

use kubegraph::graph::{
    DependencyGraph, DependencyStrength, DependencyType, GraphEdge, GraphNode, summarize,
};
use proptest::prelude::*;

#[test]
fn test_empty_graph() {
    let stats = summarize(&DependencyGraph::default());
    assert_eq!(stats.total_nodes, 0);
    assert_eq!(stats.total_edges, 0);
    assert_eq!(stats.strong_dependencies, 0);
    assert_eq!(stats.weak_dependencies, 0);
    assert!(stats.resource_types.is_empty());
    assert!(stats.dependency_types.is_empty());
    assert!(stats.namespaces.is_empty());
    assert!(stats.nodes_by_type.is_empty());
    assert!(stats.edges_by_type.is_empty());
}

#[test]
fn test_missing_collections_count_as_empty() {
    let graph: DependencyGraph =
        serde_json::from_str(r#"{"metadata": {"namespace": "prod"}}"#).unwrap();
    let stats = summarize(&graph);
    assert_eq!(stats.total_nodes, 0);
    assert_eq!(stats.total_edges, 0);
}

#[test]
fn test_mixed_graph_counts() {
    let pod1 = GraphNode::new("Pod", "api-1", Some("prod"));
    let pod2 = GraphNode::new("Pod", "api-2", Some("prod"));
    let svc = GraphNode::new("Service", "api", Some("prod"));
    let node = GraphNode::new("Node", "worker-1", None);
    let edges = vec![
        GraphEdge::new(&svc.id, &pod1.id, DependencyType::Service, DependencyStrength::Weak, ""),
        GraphEdge::new(&svc.id, &pod2.id, DependencyType::Service, DependencyStrength::Weak, ""),
        GraphEdge::new(&pod1.id, &node.id, DependencyType::Owner, DependencyStrength::Strong, ""),
    ];
    let graph = DependencyGraph::new("prod", vec![pod1, pod2, svc, node], edges);

    let stats = summarize(&graph);
    assert_eq!(stats.total_nodes, 4);
    assert_eq!(stats.total_edges, 3);
    assert_eq!(stats.strong_dependencies, 1);
    assert_eq!(stats.weak_dependencies, 2);
    assert_eq!(stats.nodes_by_type.get("Pod"), Some(&2));
    assert_eq!(stats.nodes_by_type.get("Service"), Some(&1));
    assert_eq!(stats.nodes_by_type.get("Node"), Some(&1));
    assert_eq!(stats.edges_by_type.get(&DependencyType::Service), Some(&2));
    assert_eq!(stats.edges_by_type.get(&DependencyType::Owner), Some(&1));
    assert_eq!(stats.namespaces, vec!["prod"]);
    assert_eq!(stats.resource_types, vec!["Pod", "Service", "Node"]);
}

fn arb_graph() -> impl Strategy<Value = DependencyGraph> {
    let kinds = proptest::sample::select(vec!["Pod", "Service", "Secret", "Node"]);
    let types = proptest::sample::select(DependencyType::all().to_vec());
    (
        proptest::collection::vec((kinds, proptest::option::of("[a-c]")), 1..10),
        proptest::collection::vec((any::<prop::sample::Index>(), any::<prop::sample::Index>(), types, any::<bool>()), 0..20),
    )
        .prop_map(|(specs, raw_edges)| {
            let nodes: Vec<GraphNode> = specs
                .iter()
                .enumerate()
                .map(|(i, (kind, ns))| GraphNode::new(kind, &format!("n{}", i), ns.as_deref()))
                .collect();
            let edges = raw_edges
                .iter()
                .enumerate()
                .map(|(i, (s, t, ty, strong))| {
                    let strength = if *strong {
                        DependencyStrength::Strong
                    } else {
                        DependencyStrength::Weak
                    };
                    let mut e = GraphEdge::new(
                        &nodes[s.index(nodes.len())].id,
                        &nodes[t.index(nodes.len())].id,
                        *ty,
                        strength,
                        "",
                    );
                    e.id = format!("e{}", i);
                    e
                })
                .collect();
            DependencyGraph::new("", nodes, edges)
        })
}

proptest! {
    /// Property: group-bys and strength counts always add up to the totals
    #[test]
    fn test_counts_are_consistent(graph in arb_graph()) {
        let stats = summarize(&graph);
        prop_assert_eq!(stats.total_nodes, graph.nodes.len());
        prop_assert_eq!(stats.total_edges, graph.edges.len());
        prop_assert_eq!(stats.strong_dependencies + stats.weak_dependencies, stats.total_edges);
        prop_assert_eq!(stats.nodes_by_type.values().sum::<usize>(), stats.total_nodes);
        prop_assert_eq!(stats.edges_by_type.values().sum::<usize>(), stats.total_edges);
        prop_assert_eq!(stats.resource_types.len(), stats.nodes_by_type.len());
        prop_assert_eq!(stats.dependency_types.len(), stats.edges_by_type.len());
    }
}
