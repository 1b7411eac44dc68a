//! Graph filters
//!
//! `GraphFilter` is what a caller hands to retrieval; part of it is sent to the
//! graph backend as a `GraphQuery` and the rest is applied locally. The
//! `SecondaryFilter` operations run on an already fetched snapshot and never
//! need another round trip. Every node filter drops the edges left dangling.

use super::model::{DependencyGraph, DependencyType};
use crate::error::GraphError;
use serde::{Deserialize, Serialize};

/// Caller-supplied constraints for a graph retrieval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_custom_resources: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_types: Option<Vec<DependencyType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
}

impl GraphFilter {
    /// Build a filter from untyped input such as command-line arguments
    ///
    /// Unknown dependency type names are rejected with `InvalidFilter`.
    pub fn from_raw(
        namespace: Option<String>,
        include_custom_resources: Option<bool>,
        resource_types: &[String],
        dependency_types: &[String],
        max_nodes: Option<usize>,
    ) -> Result<Self, GraphError> {
        let dependency_types = dependency_types
            .iter()
            .map(|s| s.parse::<DependencyType>())
            .collect::<Result<Vec<_>, _>>()?;

        let filter = Self {
            namespace: namespace.filter(|ns| !ns.is_empty()),
            include_custom_resources,
            resource_types: (!resource_types.is_empty()).then(|| resource_types.to_vec()),
            dependency_types: (!dependency_types.is_empty()).then_some(dependency_types),
            max_nodes,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn validate(&self) -> Result<(), GraphError> {
        if self.max_nodes == Some(0) {
            return Err(GraphError::InvalidFilter(
                "maxNodes must be at least 1".to_string(),
            ));
        }
        if let Some(types) = &self.resource_types {
            if types.iter().any(|t| t.trim().is_empty()) {
                return Err(GraphError::InvalidFilter(
                    "resource type names must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// The part of this filter the graph backend evaluates
    pub fn query(&self) -> GraphQuery {
        GraphQuery {
            namespace: self.namespace.clone(),
            include_custom: self.include_custom_resources,
            max_nodes: self.max_nodes,
        }
    }

    /// Apply the locally evaluated part of this filter
    pub fn apply(&self, graph: &DependencyGraph) -> DependencyGraph {
        let graph = match &self.resource_types {
            Some(types) => SecondaryFilter::resource_types(graph, types),
            None => graph.clone(),
        };
        match &self.dependency_types {
            Some(types) => SecondaryFilter::dependency_types(&graph, types),
            None => graph,
        }
    }
}

/// Parameters sent to the graph backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_custom: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,
}

impl GraphQuery {
    /// Query parameters in wire form, in a stable order
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ns) = &self.namespace {
            params.push(("namespace", ns.clone()));
        }
        if let Some(include) = self.include_custom {
            params.push(("includeCustom", include.to_string()));
        }
        if let Some(max) = self.max_nodes {
            params.push(("maxNodes", max.to_string()));
        }
        params
    }
}

/// Client-side filters over a fetched snapshot
pub struct SecondaryFilter;

impl SecondaryFilter {
    /// Case-insensitive substring match over name, kind and namespace
    pub fn search(graph: &DependencyGraph, term: &str) -> DependencyGraph {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return graph.clone();
        }
        graph.retain_nodes(|n| {
            n.name.to_lowercase().contains(&term)
                || n.kind.to_lowercase().contains(&term)
                || n
                    .namespace
                    .as_deref()
                    .is_some_and(|ns| ns.to_lowercase().contains(&term))
        })
    }

    /// Keep nodes whose kind is in `kinds`; an empty list keeps everything
    pub fn resource_types(graph: &DependencyGraph, kinds: &[String]) -> DependencyGraph {
        if kinds.is_empty() {
            return graph.clone();
        }
        graph.retain_nodes(|n| kinds.iter().any(|k| k == &n.kind))
    }

    /// Keep edges whose type is in `types`; an empty list keeps everything
    pub fn dependency_types(graph: &DependencyGraph, types: &[DependencyType]) -> DependencyGraph {
        if types.is_empty() {
            return graph.clone();
        }
        graph.retain_edges(|e| types.contains(&e.dependency_type))
    }

    /// Drop weak edges when `strong_only` is set
    pub fn strong_only(graph: &DependencyGraph, strong_only: bool) -> DependencyGraph {
        if !strong_only {
            return graph.clone();
        }
        graph.retain_edges(|e| e.is_strong())
    }
}

/// A set of secondary filters applied together, as a view would hold them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilters {
    pub search: String,
    pub resource_types: Vec<String>,
    pub dependency_types: Vec<DependencyType>,
    pub strong_only: bool,
}

impl ViewFilters {
    pub fn apply(&self, graph: &DependencyGraph) -> DependencyGraph {
        let graph = SecondaryFilter::search(graph, &self.search);
        let graph = SecondaryFilter::resource_types(&graph, &self.resource_types);
        let graph = SecondaryFilter::dependency_types(&graph, &self.dependency_types);
        SecondaryFilter::strong_only(&graph, self.strong_only)
    }
}
