//! Dependencies of a single resource

use super::id::{DecodedBatch, ResourceRef, decode_all};
use super::model::{DependencyGraph, GraphEdge};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Edges around one resource, grouped by direction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencySet {
    /// Edges whose source is the resource
    #[serde(default)]
    pub outgoing: Vec<GraphEdge>,
    /// Edges whose target is the resource
    #[serde(default)]
    pub incoming: Vec<GraphEdge>,
    /// Edges between the resource's direct neighbours and other resources
    #[serde(default)]
    pub related: Vec<GraphEdge>,
}

/// Dependencies of one resource as returned by the graph backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDependencies {
    pub resource: ResourceRef,
    #[serde(default)]
    pub dependencies: DependencySet,
}

impl ResourceDependencies {
    /// Derive the dependencies of `resource` from a full snapshot
    pub fn from_graph(graph: &DependencyGraph, resource: &ResourceRef) -> Self {
        let id = resource.id();
        let mut set = DependencySet::default();
        let mut neighbours: HashSet<&str> = HashSet::new();

        for edge in &graph.edges {
            if edge.source == id {
                neighbours.insert(&edge.target);
                set.outgoing.push(edge.clone());
            } else if edge.target == id {
                neighbours.insert(&edge.source);
                set.incoming.push(edge.clone());
            }
        }
        set.related = graph
            .edges
            .iter()
            .filter(|e| e.source != id && e.target != id)
            .filter(|e| {
                neighbours.contains(e.source.as_str()) || neighbours.contains(e.target.as_str())
            })
            .cloned()
            .collect();

        Self {
            resource: resource.clone(),
            dependencies: set,
        }
    }

    pub fn total(&self) -> usize {
        self.dependencies.outgoing.len()
            + self.dependencies.incoming.len()
            + self.dependencies.related.len()
    }

    /// Every other resource named by these dependencies, decoded
    ///
    /// Ids that do not parse are skipped and counted in the batch.
    pub fn peers(&self) -> DecodedBatch {
        let own = self.resource.id();
        let mut seen = HashSet::new();
        let ids = self
            .dependencies
            .outgoing
            .iter()
            .chain(&self.dependencies.incoming)
            .chain(&self.dependencies.related)
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .filter(|id| *id != own && seen.insert(*id))
            .collect::<Vec<_>>();
        decode_all(ids)
    }
}
