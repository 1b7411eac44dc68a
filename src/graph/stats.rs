//! Graph statistics

use super::model::{DependencyGraph, DependencyStrength, DependencyType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Counts and group-bys over one snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    /// Node kinds in first-seen order
    pub resource_types: Vec<String>,
    /// Edge types in first-seen order
    pub dependency_types: Vec<DependencyType>,
    /// Non-empty namespaces in first-seen order
    pub namespaces: Vec<String>,
    pub strong_dependencies: usize,
    pub weak_dependencies: usize,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub edges_by_type: BTreeMap<DependencyType, usize>,
}

/// Summarize a snapshot
///
/// An empty graph (including one whose collections were missing on the wire)
/// yields all-zero counts.
pub fn summarize(graph: &DependencyGraph) -> GraphStats {
    let mut stats = GraphStats {
        total_nodes: graph.nodes.len(),
        total_edges: graph.edges.len(),
        ..Default::default()
    };

    let mut seen_kinds = HashSet::new();
    let mut seen_namespaces = HashSet::new();
    for node in &graph.nodes {
        if seen_kinds.insert(node.kind.as_str()) {
            stats.resource_types.push(node.kind.clone());
        }
        if let Some(ns) = node.namespace.as_deref().filter(|ns| !ns.is_empty()) {
            if seen_namespaces.insert(ns) {
                stats.namespaces.push(ns.to_string());
            }
        }
        *stats.nodes_by_type.entry(node.kind.clone()).or_insert(0) += 1;
    }

    let mut seen_types = HashSet::new();
    for edge in &graph.edges {
        if seen_types.insert(edge.dependency_type) {
            stats.dependency_types.push(edge.dependency_type);
        }
        match edge.strength {
            DependencyStrength::Strong => stats.strong_dependencies += 1,
            DependencyStrength::Weak => stats.weak_dependencies += 1,
        }
        *stats.edges_by_type.entry(edge.dependency_type).or_insert(0) += 1;
    }

    stats
}
