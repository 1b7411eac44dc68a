//! Graph sources
//!
//! A `GraphSource` answers the three questions the engine asks of the graph
//! backend: the dependency graph, the dependencies of one resource, and the
//! relationships between CRDs. Implementations:
//! - `HttpGraphSource`: the backend's REST API over HTTP
//! - `ServiceGraphSource`: the same API reached through the Kubernetes API
//!   server's service proxy
//! - `FileGraphSource`: a JSON snapshot on disk
//! - `DegradedGraphSource`: placeholder data for offline views

mod degraded;
mod file;
mod http;
mod service;

pub use degraded::DegradedGraphSource;
pub use file::FileGraphSource;
pub use http::HttpGraphSource;
pub use service::ServiceGraphSource;

use crate::error::GraphError;
use crate::graph::{
    CrdRelationshipOptions, CrdRelationshipResponse, DependencyGraph, GraphQuery, ResourceRef,
    ResourceDependencies,
};
use async_trait::async_trait;

/// Paths of the graph backend API, relative to its base
pub(crate) const GRAPH_PATH: &str = "dependencies/graph";
pub(crate) const RESOURCE_PATH: &str = "dependencies/resource";
pub(crate) const CRD_PATH: &str = "dependencies/crds";

/// Kinds built into Kubernetes; anything else counts as a custom resource
const BUILTIN_KINDS: &[&str] = &[
    "Pod",
    "Service",
    "Deployment",
    "ReplicaSet",
    "StatefulSet",
    "DaemonSet",
    "Job",
    "CronJob",
    "ConfigMap",
    "Secret",
    "ServiceAccount",
    "PersistentVolume",
    "PersistentVolumeClaim",
    "StorageClass",
    "Ingress",
    "IngressClass",
    "NetworkPolicy",
    "Endpoints",
    "EndpointSlice",
    "Node",
    "Namespace",
    "Role",
    "RoleBinding",
    "ClusterRole",
    "ClusterRoleBinding",
    "HorizontalPodAutoscaler",
    "PodDisruptionBudget",
    "CustomResourceDefinition",
];

pub fn is_builtin_kind(kind: &str) -> bool {
    BUILTIN_KINDS.contains(&kind)
}

/// Source of graph data
#[async_trait]
pub trait GraphSource: Send + Sync {
    /// Fetch a dependency graph snapshot
    async fn fetch_graph(&self, query: &GraphQuery) -> Result<DependencyGraph, GraphError>;

    /// Fetch the dependencies of one resource
    async fn fetch_dependencies(
        &self,
        resource: &ResourceRef,
    ) -> Result<ResourceDependencies, GraphError>;

    /// Fetch relationships between custom resource definitions
    async fn fetch_crd_relationships(
        &self,
        options: &CrdRelationshipOptions,
    ) -> Result<CrdRelationshipResponse, GraphError>;

    /// Short name used in logs
    fn source_type(&self) -> &str;
}

/// Apply a backend query to a snapshot held locally
///
/// Namespaced queries keep cluster-scoped resources. `maxNodes` keeps the
/// first nodes in list order and drops the edges left dangling.
pub fn apply_query(graph: &DependencyGraph, query: &GraphQuery) -> DependencyGraph {
    let mut result = match &query.namespace {
        Some(ns) => graph.retain_nodes(|n| n.namespace.as_deref().is_none_or(|n_ns| n_ns == ns)),
        None => graph.clone(),
    };
    if query.include_custom == Some(false) {
        result = result.retain_nodes(|n| is_builtin_kind(&n.kind));
    }
    if let Some(max) = query.max_nodes {
        if result.nodes.len() > max {
            let keep: std::collections::HashSet<String> =
                result.nodes.iter().take(max).map(|n| n.id.clone()).collect();
            result = result.retain_nodes(|n| keep.contains(&n.id));
        }
    }
    if let Some(ns) = &query.namespace {
        result.metadata.namespace = ns.clone();
    }
    result
}

/// Query parameters for a CRD relationship request, in wire form
pub(crate) fn crd_params(options: &CrdRelationshipOptions) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(groups) = options.api_groups.as_ref().filter(|g| !g.is_empty()) {
        params.push(("apiGroups", groups.join(",")));
    }
    if let Some(crds) = options.crds.as_ref().filter(|c| !c.is_empty()) {
        params.push(("crds", crds.join(",")));
    }
    if let Some(max) = options.max_relationships {
        params.push(("maxRelationships", max.to_string()));
    }
    if let Some(types) = options.relationship_types.as_ref().filter(|t| !t.is_empty()) {
        let names: Vec<&str> = types.iter().map(|t| t.as_str()).collect();
        params.push(("relationshipTypes", names.join(",")));
    }
    if let Some(include) = options.include_metadata {
        params.push(("includeMetadata", include.to_string()));
    }
    params
}

/// Query parameters for a single-resource dependency request, in wire form
pub(crate) fn resource_params(resource: &ResourceRef) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("kind", resource.kind.clone()),
        ("name", resource.name.clone()),
    ];
    if let Some(ns) = &resource.namespace {
        params.push(("namespace", ns.clone()));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        CrdRelationshipType, DependencyStrength, DependencyType, GraphEdge, GraphNode,
    };

    fn sample() -> DependencyGraph {
        let node = GraphNode::new("Node", "n1", None);
        let pod = GraphNode::new("Pod", "a", Some("prod"));
        let other = GraphNode::new("Pod", "b", Some("dev"));
        let widget = GraphNode::new("Widget", "w", Some("prod"));
        let edges = vec![
            GraphEdge::new(&pod.id, &node.id, DependencyType::Custom, DependencyStrength::Weak, ""),
            GraphEdge::new(&widget.id, &pod.id, DependencyType::Custom, DependencyStrength::Weak, ""),
        ];
        DependencyGraph::new("", vec![node, pod, other, widget], edges)
    }

    #[test]
    fn test_apply_query_namespace_keeps_cluster_scoped() {
        let query = GraphQuery {
            namespace: Some("prod".to_string()),
            ..Default::default()
        };
        let result = apply_query(&sample(), &query);
        let ids: Vec<&str> = result.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Node/n1", "Pod/a@prod", "Widget/w@prod"]);
        assert_eq!(result.edges.len(), 2);
        assert_eq!(result.metadata.namespace, "prod");
    }

    #[test]
    fn test_apply_query_excludes_custom_resources() {
        let query = GraphQuery {
            include_custom: Some(false),
            ..Default::default()
        };
        let result = apply_query(&sample(), &query);
        assert!(result.nodes.iter().all(|n| n.kind != "Widget"));
        assert_eq!(result.edges.len(), 1);
    }

    #[test]
    fn test_apply_query_max_nodes() {
        let query = GraphQuery {
            max_nodes: Some(1),
            ..Default::default()
        };
        let result = apply_query(&sample(), &query);
        assert_eq!(result.nodes.len(), 1);
        assert!(result.edges.is_empty());
    }

    #[test]
    fn test_crd_params() {
        let options = CrdRelationshipOptions {
            api_groups: Some(vec!["example.com".to_string(), "acme.io".to_string()]),
            relationship_types: Some(vec![
                CrdRelationshipType::Reference,
                CrdRelationshipType::Dependency,
            ]),
            max_relationships: Some(20),
            ..Default::default()
        };
        assert_eq!(
            crd_params(&options),
            vec![
                ("apiGroups", "example.com,acme.io".to_string()),
                ("maxRelationships", "20".to_string()),
                ("relationshipTypes", "reference,dependency".to_string()),
            ]
        );
    }
}
