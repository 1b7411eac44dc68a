//! Graph snapshot read from a local JSON file
//!
//! The file holds a graph in wire form (`metadata`, `nodes`, `edges`) and may
//! carry CRD analysis under `crdRelationships`. Structured exports load as-is.

use super::{GraphSource, apply_query};
use crate::error::GraphError;
use crate::graph::{
    CrdRelationshipOptions, CrdRelationshipResponse, DependencyGraph, GraphQuery, ResourceRef,
    ResourceDependencies,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotFile {
    #[serde(flatten)]
    graph: DependencyGraph,
    #[serde(default)]
    crd_relationships: Option<CrdRelationshipResponse>,
}

/// File graph source
///
/// The file is re-read on every request so edits show up on refresh.
pub struct FileGraphSource {
    file_path: PathBuf,
}

impl FileGraphSource {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        let file_path = file_path.into();
        tracing::debug!("Created file graph source: {:?}", file_path);
        Self { file_path }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    async fn load(&self) -> Result<SnapshotFile, GraphError> {
        tracing::debug!("Reading graph snapshot from file: {:?}", self.file_path);

        let content = tokio::fs::read_to_string(&self.file_path)
            .await
            .map_err(|e| {
                GraphError::Transport(format!("failed to read {:?}: {}", self.file_path, e))
            })?;

        serde_json::from_str(&content).map_err(|e| {
            GraphError::MalformedResponse(format!(
                "failed to parse JSON from {:?}: {}",
                self.file_path, e
            ))
        })
    }
}

#[async_trait]
impl GraphSource for FileGraphSource {
    async fn fetch_graph(&self, query: &GraphQuery) -> Result<DependencyGraph, GraphError> {
        let snapshot = self.load().await?;
        Ok(apply_query(&snapshot.graph, query))
    }

    async fn fetch_dependencies(
        &self,
        resource: &ResourceRef,
    ) -> Result<ResourceDependencies, GraphError> {
        let snapshot = self.load().await?;
        Ok(ResourceDependencies::from_graph(&snapshot.graph, resource))
    }

    async fn fetch_crd_relationships(
        &self,
        options: &CrdRelationshipOptions,
    ) -> Result<CrdRelationshipResponse, GraphError> {
        let snapshot = self.load().await?;
        let Some(response) = snapshot.crd_relationships else {
            return Ok(CrdRelationshipResponse::new(Vec::new(), Vec::new()));
        };

        let wanted = |name: &str, group: &str| {
            let by_group = options
                .api_groups
                .as_ref()
                .is_none_or(|g| g.is_empty() || g.iter().any(|g| g == group));
            let by_name = options
                .crds
                .as_ref()
                .is_none_or(|c| c.is_empty() || c.iter().any(|c| c == name));
            by_group && by_name
        };
        let crds: Vec<_> = response
            .crds
            .into_iter()
            .filter(|c| wanted(&c.name, &c.group))
            .collect();
        let relationships = response
            .relationships
            .into_iter()
            .filter(|r| {
                crds.iter().any(|c| c.name == r.source) && crds.iter().any(|c| c.name == r.target)
            })
            .collect();

        let mut filtered = CrdRelationshipResponse::new(crds, relationships);
        filtered.metadata.degradation = response.metadata.degradation;
        Ok(filtered.restrict(options))
    }

    fn source_type(&self) -> &str {
        "file"
    }
}
