//! Custom resource definition relationships
//!
//! The relationship analysis itself (walking CRD schemas for cross-references
//! and scoring them) belongs to the graph backend. This module carries the
//! request and response shapes, validates what comes back, and can describe a
//! live `CustomResourceDefinition` in the same terms.

use crate::error::GraphError;
use chrono::{DateTime, Utc};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::model::{Degradation, DegradationMode};

/// Scope of a custom resource type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrdScope {
    Cluster,
    Namespaced,
}

impl FromStr for CrdScope {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cluster" => Ok(CrdScope::Cluster),
            "Namespaced" => Ok(CrdScope::Namespaced),
            other => Err(GraphError::MalformedResponse(format!(
                "CRD scope must be Cluster or Namespaced, got '{}'",
                other
            ))),
        }
    }
}

/// Kind of relationship between two custom resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrdRelationshipType {
    /// A field of one type names an instance of the other
    Reference,
    /// One type embeds the other's schema
    Composition,
    /// One type requires the other to exist
    Dependency,
}

impl CrdRelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrdRelationshipType::Reference => "reference",
            CrdRelationshipType::Composition => "composition",
            CrdRelationshipType::Dependency => "dependency",
        }
    }
}

impl fmt::Display for CrdRelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrdRelationshipType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reference" => Ok(CrdRelationshipType::Reference),
            "composition" => Ok(CrdRelationshipType::Composition),
            "dependency" => Ok(CrdRelationshipType::Dependency),
            _ => Err(GraphError::InvalidFilter(format!(
                "unknown CRD relationship type '{}' (expected reference, composition or dependency)",
                s
            ))),
        }
    }
}

/// Description of one custom resource type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdInfo {
    /// Full CRD name, `plural.group`
    pub name: String,
    pub group: String,
    /// Storage version
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub scope: CrdScope,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CrdInfo {
    /// Describe a live CRD object
    pub fn from_definition(crd: &CustomResourceDefinition) -> Result<Self, GraphError> {
        let spec = &crd.spec;
        let name = crd
            .metadata
            .name
            .clone()
            .unwrap_or_else(|| format!("{}.{}", spec.names.plural, spec.group));

        let storage = spec
            .versions
            .iter()
            .find(|v| v.storage)
            .or_else(|| spec.versions.first())
            .ok_or_else(|| {
                GraphError::MalformedResponse(format!("CRD '{}' declares no versions", name))
            })?;

        let description = storage
            .schema
            .as_ref()
            .and_then(|s| s.open_api_v3_schema.as_ref())
            .and_then(|s| s.description.clone());

        Ok(Self {
            name,
            group: spec.group.clone(),
            version: storage.name.clone(),
            kind: spec.names.kind.clone(),
            plural: spec.names.plural.clone(),
            scope: spec.scope.parse()?,
            versions: spec.versions.iter().map(|v| v.name.clone()).collect(),
            description,
        })
    }
}

/// A relationship between two custom resource types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdRelationship {
    pub id: String,
    /// Name of the referring CRD
    pub source: String,
    /// Name of the referenced CRD
    pub target: String,
    #[serde(rename = "type")]
    pub relationship_type: CrdRelationshipType,
    /// Classifier confidence in `[0, 1]`
    pub confidence: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

/// Options for a CRD relationship request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdRelationshipOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crds: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_relationships: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationship_types: Option<Vec<CrdRelationshipType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_metadata: Option<bool>,
}

impl CrdRelationshipOptions {
    pub fn validate(&self) -> Result<(), GraphError> {
        if self.max_relationships == Some(0) {
            return Err(GraphError::InvalidFilter(
                "maxRelationships must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Metadata of a CRD relationship response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdAnalysisMetadata {
    #[serde(default)]
    pub total_crds: usize,
    #[serde(default)]
    pub total_relationships: usize,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

impl Default for CrdAnalysisMetadata {
    fn default() -> Self {
        Self {
            total_crds: 0,
            total_relationships: 0,
            timestamp: Utc::now(),
            degradation: None,
        }
    }
}

/// Response of a CRD relationship request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrdRelationshipResponse {
    #[serde(default)]
    pub crds: Vec<CrdInfo>,
    #[serde(default)]
    pub relationships: Vec<CrdRelationship>,
    #[serde(default)]
    pub metadata: CrdAnalysisMetadata,
}

impl CrdRelationshipResponse {
    pub fn new(crds: Vec<CrdInfo>, relationships: Vec<CrdRelationship>) -> Self {
        Self {
            metadata: CrdAnalysisMetadata {
                total_crds: crds.len(),
                total_relationships: relationships.len(),
                timestamp: Utc::now(),
                degradation: None,
            },
            crds,
            relationships,
        }
    }

    pub fn with_degradation(mut self, mode: DegradationMode, cause: impl Into<String>) -> Self {
        self.metadata.degradation = Some(Degradation {
            mode,
            cause: cause.into(),
        });
        self
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self.metadata.degradation,
            Some(Degradation {
                mode: DegradationMode::Placeholder,
                ..
            })
        )
    }

    /// Check confidence ranges and that relationships only name returned CRDs
    pub fn validate(&self) -> Result<(), GraphError> {
        let names: HashSet<&str> = self.crds.iter().map(|c| c.name.as_str()).collect();
        for rel in &self.relationships {
            if !(0.0..=1.0).contains(&rel.confidence) {
                return Err(GraphError::MalformedResponse(format!(
                    "relationship '{}' confidence {} is outside [0, 1]",
                    rel.id, rel.confidence
                )));
            }
            for endpoint in [&rel.source, &rel.target] {
                if !names.contains(endpoint.as_str()) {
                    return Err(GraphError::MalformedResponse(format!(
                        "relationship '{}' references CRD '{}' which is not in the response",
                        rel.id, endpoint
                    )));
                }
            }
        }
        Ok(())
    }

    /// Keep only relationships of the requested types, up to `max`
    pub fn restrict(&self, options: &CrdRelationshipOptions) -> Self {
        let relationships: Vec<CrdRelationship> = self
            .relationships
            .iter()
            .filter(|r| {
                options
                    .relationship_types
                    .as_ref()
                    .is_none_or(|types| types.is_empty() || types.contains(&r.relationship_type))
            })
            .take(options.max_relationships.unwrap_or(usize::MAX))
            .cloned()
            .collect();

        Self {
            metadata: CrdAnalysisMetadata {
                total_crds: self.crds.len(),
                total_relationships: relationships.len(),
                ..self.metadata.clone()
            },
            crds: self.crds.clone(),
            relationships,
        }
    }
}
