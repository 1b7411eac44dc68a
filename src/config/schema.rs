//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.
//! Every field has a default, so a partial file is a valid configuration.

use super::defaults;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Namespace used when a command names none
    #[serde(default = "defaults::namespace")]
    pub default_namespace: String,

    /// Where the graph backend lives
    #[serde(default)]
    pub collaborator: CollaboratorConfig,

    /// Dependency graph retrieval budgets
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// CRD relationship analysis budgets
    #[serde(default)]
    pub crd: CrdConfig,

    #[serde(default)]
    pub view: ViewConfig,
}

/// Graph backend location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorConfig {
    /// Base URL of the backend's REST API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Reach the backend through the API server service proxy instead
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceRef>,
}

/// In-cluster Service exposing the graph backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRef {
    pub namespace: String,
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    #[serde(default = "defaults::retrieval_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Must be strictly shorter than `timeoutSeconds`
    #[serde(default = "defaults::retrieval_fallback_timeout_seconds")]
    pub fallback_timeout_seconds: u64,

    /// Node limit sent when a request sets none
    #[serde(default = "defaults::max_nodes")]
    pub max_nodes: usize,

    /// Upper bound of the node limit of the fallback request
    #[serde(default = "defaults::fallback_max_nodes")]
    pub fallback_max_nodes: usize,

    /// Show clearly marked placeholder data when the backend is unreachable
    #[serde(default = "defaults::default_true")]
    pub placeholder_on_failure: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CrdConfig {
    #[serde(default = "defaults::crd_timeout_seconds")]
    pub timeout_seconds: u64,

    #[serde(default = "defaults::crd_fallback_timeout_seconds")]
    pub fallback_timeout_seconds: u64,

    #[serde(default = "defaults::max_relationships")]
    pub max_relationships: usize,

    #[serde(default = "defaults::fallback_max_relationships")]
    pub fallback_max_relationships: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViewConfig {
    /// Depth of focus views
    #[serde(default = "defaults::default_depth")]
    pub default_depth: usize,

    #[serde(default = "defaults::refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_namespace: defaults::namespace(),
            collaborator: CollaboratorConfig::default(),
            retrieval: RetrievalConfig::default(),
            crd: CrdConfig::default(),
            view: ViewConfig::default(),
        }
    }
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            service: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::retrieval_timeout_seconds(),
            fallback_timeout_seconds: defaults::retrieval_fallback_timeout_seconds(),
            max_nodes: defaults::max_nodes(),
            fallback_max_nodes: defaults::fallback_max_nodes(),
            placeholder_on_failure: true,
        }
    }
}

impl Default for CrdConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: defaults::crd_timeout_seconds(),
            fallback_timeout_seconds: defaults::crd_fallback_timeout_seconds(),
            max_relationships: defaults::max_relationships(),
            fallback_max_relationships: defaults::fallback_max_relationships(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_depth: defaults::default_depth(),
            refresh_interval_seconds: defaults::refresh_interval_seconds(),
        }
    }
}
