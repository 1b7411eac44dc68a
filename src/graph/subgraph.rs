//! Connected subgraph extraction
//!
//! Finds everything within `max_depth` hops of a resource. Edges are walked in
//! both directions: dependency direction carries meaning, but "what touches
//! this resource" has to look at dependents and dependencies alike.

use super::model::{DependencyGraph, GraphEdge, GraphNode};
use std::collections::{HashMap, HashSet, VecDeque};

/// Nodes and edges around a focus resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Subgraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl Subgraph {
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Wrap the result as a snapshot derived from `parent`
    pub fn into_graph(self, parent: &DependencyGraph) -> DependencyGraph {
        parent.derive(self.nodes, self.edges)
    }
}

/// Breadth-first extraction of the subgraph reachable from `start_id`
///
/// Each node is enqueued at most once, so cycles terminate. A node at depth
/// `max_depth` is visited but not expanded. An edge is part of the result
/// whenever both of its endpoints were visited. Nodes and edges keep the order
/// they have in `graph`.
pub fn extract(graph: &DependencyGraph, start_id: &str, max_depth: usize) -> Subgraph {
    let index = graph.index();
    if !index.contains_key(start_id) {
        tracing::debug!("Focus resource {} is not in the graph", start_id);
        return Subgraph::default();
    }

    // Adjacency over edge indices, both directions
    let mut adjacency: HashMap<&str, Vec<usize>> = HashMap::with_capacity(graph.nodes.len());
    for (idx, edge) in graph.edges.iter().enumerate() {
        adjacency.entry(edge.source.as_str()).or_default().push(idx);
        if edge.target != edge.source {
            adjacency.entry(edge.target.as_str()).or_default().push(idx);
        }
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    visited.insert(start_id);
    queue.push_back((start_id, 0));

    while let Some((id, depth)) = queue.pop_front() {
        if depth >= max_depth {
            continue;
        }
        let Some(edge_indices) = adjacency.get(id) else {
            continue;
        };
        for &idx in edge_indices {
            let Some(next) = graph.edges[idx].other_end(id) else {
                continue;
            };
            if visited.insert(next) {
                queue.push_back((next, depth + 1));
            }
        }
    }

    let mut positions: Vec<usize> = visited
        .iter()
        .filter_map(|id| index.get(id).copied())
        .collect();
    positions.sort_unstable();
    let nodes: Vec<GraphNode> = positions
        .into_iter()
        .map(|i| graph.nodes[i].clone())
        .collect();
    let edges: Vec<GraphEdge> = graph
        .edges
        .iter()
        .filter(|e| visited.contains(e.source.as_str()) && visited.contains(e.target.as_str()))
        .cloned()
        .collect();

    tracing::debug!(
        "Extracted {} nodes and {} edges within depth {} of {}",
        nodes.len(),
        edges.len(),
        max_depth,
        start_id
    );

    Subgraph { nodes, edges }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::{DependencyStrength, DependencyType};

    fn node(kind: &str, name: &str) -> GraphNode {
        GraphNode::new(kind, name, Some("default"))
    }

    fn owner(source: &GraphNode, target: &GraphNode) -> GraphEdge {
        GraphEdge::new(
            &source.id,
            &target.id,
            DependencyType::Owner,
            DependencyStrength::Strong,
            "ownerReference",
        )
    }

    #[test]
    fn test_unknown_start_returns_empty() {
        let graph = DependencyGraph::new("default", vec![node("Pod", "a")], vec![]);
        let sub = extract(&graph, "Pod/missing@default", 3);
        assert!(sub.nodes.is_empty());
        assert!(sub.edges.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let a = node("Pod", "a");
        let b = node("Pod", "b");
        let c = node("Pod", "c");
        let edges = vec![owner(&a, &b), owner(&b, &c), owner(&c, &a)];
        let graph = DependencyGraph::new("default", vec![a.clone(), b, c], edges);

        let sub = extract(&graph, &a.id, 10);
        assert_eq!(sub.nodes.len(), 3);
        assert_eq!(sub.edges.len(), 3);
    }

    #[test]
    fn test_boundary_edge_between_frontier_nodes_is_included() {
        // a -> b, a -> c, b -> c: at depth 1 both b and c are visited but not
        // expanded, and the b -> c edge connects two visited nodes.
        let a = node("Deployment", "a");
        let b = node("Pod", "b");
        let c = node("Pod", "c");
        let edges = vec![owner(&b, &a), owner(&c, &a), owner(&b, &c)];
        let graph = DependencyGraph::new("default", vec![a.clone(), b, c], edges);

        let sub = extract(&graph, &a.id, 1);
        assert_eq!(sub.nodes.len(), 3);
        assert_eq!(sub.edges.len(), 3);
    }

    #[test]
    fn test_result_keeps_graph_order() {
        let a = node("Pod", "a");
        let b = node("ReplicaSet", "b");
        let c = node("Deployment", "c");
        let edges = vec![owner(&a, &b), owner(&b, &c)];
        let graph = DependencyGraph::new("default", vec![a.clone(), b.clone(), c.clone()], edges);

        let sub = extract(&graph, &c.id, 2);
        let ids: Vec<&str> = sub.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), b.id.as_str(), c.id.as_str()]);
    }
}
