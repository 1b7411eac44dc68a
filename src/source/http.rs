//! Graph backend reached directly over HTTP

use super::{CRD_PATH, GRAPH_PATH, GraphSource, RESOURCE_PATH, crd_params, resource_params};
use crate::error::GraphError;
use crate::graph::{
    CrdRelationshipOptions, CrdRelationshipResponse, DependencyGraph, GraphQuery, ResourceRef,
    ResourceDependencies,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// HTTP graph source
pub struct HttpGraphSource {
    client: reqwest::Client,
    base: Url,
}

impl HttpGraphSource {
    /// Create a source for the backend rooted at `base_url`
    ///
    /// `timeout` is a transport-level ceiling; request budgets are enforced
    /// by the service layer.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GraphError> {
        let mut base = Url::parse(base_url)
            .map_err(|e| GraphError::Transport(format!("invalid base URL '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GraphError::Transport(format!("failed to create HTTP client: {}", e)))?;

        tracing::debug!("Created HTTP graph source for: {}", base);

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, GraphError> {
        let url = self
            .base
            .join(path)
            .map_err(|e| GraphError::Transport(format!("invalid request path '{}': {}", path, e)))?;
        tracing::debug!("Fetching {} with {:?}", url, params);

        let resp = self.client.get(url.clone()).query(params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(GraphError::Transport(format!(
                "HTTP request failed: {} (status: {})",
                url, status
            )));
        }

        let body = resp.text().await?;
        let data = serde_json::from_str(&body).map_err(|e| {
            GraphError::MalformedResponse(format!("failed to parse response from {}: {}", url, e))
        })?;

        tracing::debug!("Successfully fetched {} ({} bytes)", url, body.len());
        Ok(data)
    }
}

#[async_trait]
impl GraphSource for HttpGraphSource {
    async fn fetch_graph(&self, query: &GraphQuery) -> Result<DependencyGraph, GraphError> {
        self.get(GRAPH_PATH, &query.params()).await
    }

    async fn fetch_dependencies(
        &self,
        resource: &ResourceRef,
    ) -> Result<ResourceDependencies, GraphError> {
        self.get(RESOURCE_PATH, &resource_params(resource)).await
    }

    async fn fetch_crd_relationships(
        &self,
        options: &CrdRelationshipOptions,
    ) -> Result<CrdRelationshipResponse, GraphError> {
        self.get(CRD_PATH, &crd_params(options)).await
    }

    fn source_type(&self) -> &str {
        "http"
    }
}
