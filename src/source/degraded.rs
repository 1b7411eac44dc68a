//! Placeholder data for degraded and offline views
//!
//! Everything produced here lives in `PLACEHOLDER_NAMESPACE` and carries a
//! `Placeholder` degradation marker, so it can never pass for cluster state.

use super::{GraphSource, apply_query};
use crate::error::GraphError;
use crate::graph::{
    CrdInfo, CrdRelationship, CrdRelationshipOptions, CrdRelationshipResponse,
    CrdRelationshipType, CrdScope, DegradationMode, DependencyGraph, DependencyStrength,
    DependencyType, GraphEdge, GraphNode, GraphQuery, PLACEHOLDER_NAMESPACE, ResourceRef,
    ResourceDependencies,
};
use async_trait::async_trait;

const DEFAULT_CAUSE: &str = "graph backend unavailable";

/// Graph source that answers every request with generated sample data
#[derive(Debug, Clone)]
pub struct DegradedGraphSource {
    cause: String,
}

impl Default for DegradedGraphSource {
    fn default() -> Self {
        Self::new(DEFAULT_CAUSE)
    }
}

impl DegradedGraphSource {
    /// `cause` is recorded in the degradation marker of everything returned
    pub fn new(cause: impl Into<String>) -> Self {
        Self {
            cause: cause.into(),
        }
    }

    /// A small application: Deployment, ReplicaSet, Pods, Service,
    /// ConfigMap and ServiceAccount
    pub fn placeholder_graph(&self) -> DependencyGraph {
        let ns = Some(PLACEHOLDER_NAMESPACE);
        let deploy = GraphNode::new("Deployment", "sample-app", ns).with_label("app", "sample");
        let rs = GraphNode::new("ReplicaSet", "sample-app-7d9f", ns).with_label("app", "sample");
        let pod_a = GraphNode::new("Pod", "sample-app-7d9f-a", ns).with_label("app", "sample");
        let pod_b = GraphNode::new("Pod", "sample-app-7d9f-b", ns).with_label("app", "sample");
        let svc = GraphNode::new("Service", "sample-app", ns);
        let cm = GraphNode::new("ConfigMap", "sample-config", ns);
        let sa = GraphNode::new("ServiceAccount", "sample-app", ns);

        let mut edges = vec![GraphEdge::new(
            &rs.id,
            &deploy.id,
            DependencyType::Owner,
            DependencyStrength::Strong,
            "ReplicaSet is owned by Deployment",
        )];
        for pod in [&pod_a, &pod_b] {
            edges.push(GraphEdge::new(
                &pod.id,
                &rs.id,
                DependencyType::Owner,
                DependencyStrength::Strong,
                "Pod is owned by ReplicaSet",
            ));
            edges.push(GraphEdge::new(
                &svc.id,
                &pod.id,
                DependencyType::Selector,
                DependencyStrength::Weak,
                "Service selects Pod by label",
            ));
            edges.push(GraphEdge::new(
                &pod.id,
                &cm.id,
                DependencyType::Volume,
                DependencyStrength::Strong,
                "Pod mounts ConfigMap",
            ));
            edges.push(GraphEdge::new(
                &pod.id,
                &sa.id,
                DependencyType::ServiceAccount,
                DependencyStrength::Strong,
                "Pod runs as ServiceAccount",
            ));
        }

        DependencyGraph::new(
            PLACEHOLDER_NAMESPACE,
            vec![deploy, rs, pod_a, pod_b, svc, cm, sa],
            edges,
        )
        .with_degradation(DegradationMode::Placeholder, self.cause.clone())
    }

    pub fn placeholder_crd_response(&self) -> CrdRelationshipResponse {
        let crd = |kind: &str, plural: &str| CrdInfo {
            name: format!("{}.placeholder.kubegraph.io", plural),
            group: "placeholder.kubegraph.io".to_string(),
            version: "v1".to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            scope: CrdScope::Namespaced,
            versions: vec!["v1".to_string()],
            description: Some("Placeholder type; not read from the cluster".to_string()),
        };
        let app = crd("Application", "applications");
        let source = crd("Source", "sources");
        let relationship = CrdRelationship {
            id: format!("{}-reference-{}", app.name, source.name),
            source: app.name.clone(),
            target: source.name.clone(),
            relationship_type: CrdRelationshipType::Reference,
            confidence: 0.5,
            reason: "spec.sourceRef names a Source".to_string(),
            field: Some("spec.sourceRef".to_string()),
        };
        CrdRelationshipResponse::new(vec![app, source], vec![relationship])
            .with_degradation(DegradationMode::Placeholder, self.cause.clone())
    }
}

#[async_trait]
impl GraphSource for DegradedGraphSource {
    async fn fetch_graph(&self, query: &GraphQuery) -> Result<DependencyGraph, GraphError> {
        // The namespace part of the query would filter out every placeholder node
        let query = GraphQuery {
            namespace: None,
            ..query.clone()
        };
        Ok(apply_query(&self.placeholder_graph(), &query))
    }

    async fn fetch_dependencies(
        &self,
        resource: &ResourceRef,
    ) -> Result<ResourceDependencies, GraphError> {
        Ok(ResourceDependencies::from_graph(
            &self.placeholder_graph(),
            resource,
        ))
    }

    async fn fetch_crd_relationships(
        &self,
        options: &CrdRelationshipOptions,
    ) -> Result<CrdRelationshipResponse, GraphError> {
        Ok(self.placeholder_crd_response().restrict(options))
    }

    fn source_type(&self) -> &str {
        "placeholder"
    }
}
