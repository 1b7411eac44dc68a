//! Kubernetes client module
//!
//! Builds the client used to reach the graph backend through the API server
//! service proxy, and reads CRD objects for `crds --live`.

use crate::graph::CrdInfo;
use anyhow::{Context, Result};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, ListParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};

/// Initialize and return a Kubernetes client
///
/// Without a context name the default loading strategy applies:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
pub async fn create_client(context: Option<&str>) -> Result<Client> {
    let config = match context {
        Some(name) => {
            let kubeconfig = Kubeconfig::read().context("Failed to read kubeconfig")?;
            let options = KubeConfigOptions {
                context: Some(name.to_string()),
                ..Default::default()
            };
            Config::from_custom_kubeconfig(kubeconfig, &options)
                .await
                .with_context(|| format!("Failed to load context '{}'", name))?
        }
        None => Config::infer()
            .await
            .context("Failed to infer Kubernetes configuration")?,
    };

    tracing::debug!("Connecting to Kubernetes API at {}", config.cluster_url);
    Client::try_from(config).context("Failed to create Kubernetes client")
}

/// Describe every CRD installed in the cluster
///
/// CRDs that cannot be described (no versions, unknown scope) are skipped
/// with a warning.
pub async fn list_crds(client: Client, api_groups: &[String]) -> Result<Vec<CrdInfo>> {
    let api: Api<CustomResourceDefinition> = Api::all(client);
    let list = api
        .list(&ListParams::default())
        .await
        .context("Failed to list CustomResourceDefinitions")?;

    let mut crds = Vec::with_capacity(list.items.len());
    for crd in &list.items {
        if !api_groups.is_empty() && !api_groups.contains(&crd.spec.group) {
            continue;
        }
        match CrdInfo::from_definition(crd) {
            Ok(info) => crds.push(info),
            Err(e) => tracing::warn!("Skipping CRD: {}", e),
        }
    }
    crds.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(crds)
}
