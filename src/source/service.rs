//! Graph backend reached through the Kubernetes API server service proxy
//!
//! Uses the current kubeconfig context, so no port-forward or in-cluster DNS
//! is needed to reach a backend running as a Service.

use super::{CRD_PATH, GRAPH_PATH, GraphSource, RESOURCE_PATH, crd_params, resource_params};
use crate::error::GraphError;
use crate::graph::{
    CrdRelationshipOptions, CrdRelationshipResponse, DependencyGraph, GraphQuery, ResourceRef,
    ResourceDependencies,
};
use async_trait::async_trait;
use kube::Client;
use serde::de::DeserializeOwned;

/// Service proxy graph source
pub struct ServiceGraphSource {
    client: Client,
    namespace: String,
    service: String,
    port: u16,
}

impl ServiceGraphSource {
    pub fn new(client: Client, namespace: &str, service: &str, port: u16) -> Self {
        tracing::debug!(
            "Created service graph source: {}.{}.svc:{}",
            service,
            namespace,
            port
        );
        Self {
            client,
            namespace: namespace.to_string(),
            service: service.to_string(),
            port,
        }
    }

    /// API server path for `path` on the backend service, with query string
    fn proxy_uri(&self, path: &str, params: &[(&'static str, String)]) -> String {
        proxy_uri(&self.namespace, &self.service, self.port, path, params)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, GraphError> {
        let uri = self.proxy_uri(path, params);
        tracing::debug!("Fetching from Kubernetes service: {}", uri);

        let request = http::Request::get(&uri)
            .body(Vec::new())
            .map_err(|e| GraphError::Transport(format!("failed to build request {}: {}", uri, e)))?;
        let data = self.client.request::<T>(request).await?;

        tracing::debug!("Successfully fetched from service: {}", uri);
        Ok(data)
    }
}

fn proxy_uri(
    namespace: &str,
    service: &str,
    port: u16,
    path: &str,
    params: &[(&'static str, String)],
) -> String {
    let base = format!(
        "/api/v1/namespaces/{}/services/{}:{}/proxy/{}",
        namespace, service, port, path
    );
    if params.is_empty() {
        return base;
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{}?{}", base, query)
}

#[async_trait]
impl GraphSource for ServiceGraphSource {
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
        "kubernetes_service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proxy_uri() {
        let uri = proxy_uri(
            "monitoring",
            "graph-backend",
            8080,
            GRAPH_PATH,
            &[
                ("namespace", "team a".to_string()),
                ("maxNodes", "100".to_string()),
            ],
        );
        assert_eq!(
            uri,
            "/api/v1/namespaces/monitoring/services/graph-backend:8080/proxy/dependencies/graph?namespace=team+a&maxNodes=100"
        );
    }

    #[test]
    fn test_proxy_uri_without_params() {
        let uri = proxy_uri("ns", "svc", 80, CRD_PATH, &[]);
        assert_eq!(uri, "/api/v1/namespaces/ns/services/svc:80/proxy/dependencies/crds");
    }
}
