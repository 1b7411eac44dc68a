//! Graph retrieval service
//!
//! `GraphService` is constructed explicitly with the source it talks to and
//! handed to whatever needs graph data. It validates filters before any
//! request is made, applies the degradation policy, and wraps failures with a
//! message naming the operation.

use super::degradation::{self, DegradationPolicy, Stages, deferred};
use crate::config::schema::Config;
use crate::error::{GraphError, ServiceError};
use crate::graph::{
    CrdRelationshipOptions, CrdRelationshipResponse, DependencyGraph, GraphFilter, GraphQuery,
    ResourceDependencies, ResourceRef,
};
use crate::source::{DegradedGraphSource, GraphSource};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct GraphService {
    source: Arc<dyn GraphSource>,
    placeholder: Option<Arc<dyn GraphSource>>,
    graph_policy: DegradationPolicy,
    crd_policy: DegradationPolicy,
}

impl GraphService {
    /// Service over `source` with default budgets and no placeholder data
    pub fn new(source: Arc<dyn GraphSource>) -> Self {
        Self {
            source,
            placeholder: None,
            graph_policy: DegradationPolicy::graph(),
            crd_policy: DegradationPolicy::crd(),
        }
    }

    /// Service over `source` with budgets from configuration
    ///
    /// When `retrieval.placeholderOnFailure` is set, a `DegradedGraphSource`
    /// answers once the primary and fallback requests have both failed.
    pub fn from_config(source: Arc<dyn GraphSource>, config: &Config) -> Self {
        let retrieval = &config.retrieval;
        let graph_policy = DegradationPolicy {
            timeout: Duration::from_secs(retrieval.timeout_seconds),
            fallback_timeout: Duration::from_secs(retrieval.fallback_timeout_seconds),
            limit: retrieval.max_nodes,
            fallback_limit: retrieval.fallback_max_nodes,
            placeholder_on_failure: retrieval.placeholder_on_failure,
        };
        let crd_policy = DegradationPolicy {
            timeout: Duration::from_secs(config.crd.timeout_seconds),
            fallback_timeout: Duration::from_secs(config.crd.fallback_timeout_seconds),
            limit: config.crd.max_relationships,
            fallback_limit: config.crd.fallback_max_relationships,
            placeholder_on_failure: retrieval.placeholder_on_failure,
        };

        let service = Self::new(source)
            .with_graph_policy(graph_policy)
            .with_crd_policy(crd_policy);
        if retrieval.placeholder_on_failure {
            service.with_placeholder(Arc::new(DegradedGraphSource::default()))
        } else {
            service
        }
    }

    /// Source of placeholder data used as the last degradation stage
    pub fn with_placeholder(mut self, placeholder: Arc<dyn GraphSource>) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn with_graph_policy(mut self, policy: DegradationPolicy) -> Self {
        self.graph_policy = policy;
        self
    }

    pub fn with_crd_policy(mut self, policy: DegradationPolicy) -> Self {
        self.crd_policy = policy;
        self
    }

    pub fn graph_policy(&self) -> &DegradationPolicy {
        &self.graph_policy
    }

    pub fn crd_policy(&self) -> &DegradationPolicy {
        &self.crd_policy
    }

    pub fn source_type(&self) -> &str {
        self.source.source_type()
    }

    /// Retrieve a dependency graph
    pub async fn retrieve(&self, filter: &GraphFilter) -> Result<DependencyGraph, ServiceError> {
        self.retrieve_cancellable(filter, &CancellationToken::new())
            .await
    }

    /// Retrieve a dependency graph, giving up when `cancel` fires
    ///
    /// A cancelled request fails with `GraphError::Cancelled` and never
    /// moves on to the fallback stage.
    pub async fn retrieve_cancellable(
        &self,
        filter: &GraphFilter,
        cancel: &CancellationToken,
    ) -> Result<DependencyGraph, ServiceError> {
        filter.validate().map_err(ServiceError::Graph)?;

        let requested = filter.max_nodes.unwrap_or(self.graph_policy.limit);
        let primary_query = GraphQuery {
            max_nodes: Some(requested),
            ..filter.query()
        };
        let fallback_query = self
            .graph_policy
            .fallback_limit_for(requested)
            .map(|limit| GraphQuery {
                max_nodes: Some(limit),
                ..filter.query()
            });

        tracing::debug!(
            "Retrieving graph from {} source: {:?}",
            self.source.source_type(),
            primary_query
        );

        let primary = &primary_query;
        let stages = Stages {
            primary: deferred(move || self.source.fetch_graph(primary)),
            fallback: fallback_query
                .as_ref()
                .map(|query| deferred(move || self.source.fetch_graph(query))),
            placeholder: self
                .placeholder
                .as_ref()
                .map(|placeholder| deferred(move || placeholder.fetch_graph(primary))),
        };
        let graph = degradation::execute("graph retrieval", &self.graph_policy, cancel, stages)
            .await
            .map_err(ServiceError::Graph)?;

        let graph = filter.apply(&graph);
        tracing::debug!(
            "Retrieved graph: {} nodes, {} edges{}",
            graph.nodes.len(),
            graph.edges.len(),
            if graph.is_degraded() { " (degraded)" } else { "" }
        );
        Ok(graph)
    }

    /// Retrieve the dependencies of one resource
    ///
    /// Runs within the retrieval timeout; there is no fallback or placeholder
    /// for single-resource lookups.
    pub async fn resource_dependencies(
        &self,
        resource: &ResourceRef,
    ) -> Result<ResourceDependencies, ServiceError> {
        tracing::debug!("Retrieving dependencies of {}", resource);

        let cancel = CancellationToken::new();
        let deps = degradation::bounded(
            self.source.fetch_dependencies(resource),
            self.graph_policy.timeout,
            &cancel,
        )
        .await
        .map_err(|e| {
            tracing::error!("dependency lookup for {} failed: {}", resource, e);
            ServiceError::Dependencies(e)
        })?;

        if deps.resource != *resource {
            return Err(ServiceError::Dependencies(GraphError::MalformedResponse(
                format!(
                    "requested dependencies of {} but the response describes {}",
                    resource, deps.resource
                ),
            )));
        }
        Ok(deps)
    }

    /// Retrieve relationships between custom resource definitions
    pub async fn crd_relationships(
        &self,
        options: &CrdRelationshipOptions,
    ) -> Result<CrdRelationshipResponse, ServiceError> {
        options.validate().map_err(ServiceError::CrdRelationships)?;

        let requested = options
            .max_relationships
            .unwrap_or(self.crd_policy.limit);
        let primary_options = CrdRelationshipOptions {
            max_relationships: Some(requested),
            ..options.clone()
        };
        let fallback_options =
            self.crd_policy
                .fallback_limit_for(requested)
                .map(|limit| CrdRelationshipOptions {
                    max_relationships: Some(limit),
                    ..options.clone()
                });

        let primary = &primary_options;
        let stages = Stages {
            primary: deferred(move || self.source.fetch_crd_relationships(primary)),
            fallback: fallback_options
                .as_ref()
                .map(|opts| deferred(move || self.source.fetch_crd_relationships(opts))),
            placeholder: self
                .placeholder
                .as_ref()
                .map(|placeholder| deferred(move || placeholder.fetch_crd_relationships(primary))),
        };
        let response = degradation::execute(
            "CRD relationship analysis",
            &self.crd_policy,
            &CancellationToken::new(),
            stages,
        )
        .await
        .map_err(ServiceError::CrdRelationships)?;

        Ok(response.restrict(&primary_options))
    }
}
