//! Graph data structures for resource relationships
//!
//! A `DependencyGraph` is an immutable snapshot as returned by the graph
//! backend. Nodes live in a flat list addressed by their canonical id, and
//! edges refer to nodes only through `(source, target)` id pairs.

use super::id::ResourceRef;
use crate::error::GraphError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Namespace reserved for placeholder snapshots
pub const PLACEHOLDER_NAMESPACE: &str = "__kubegraph_placeholder__";

/// Kind of relationship between two resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyType {
    /// Owner reference (ReplicaSet owned by a Deployment)
    Owner,
    /// Label selector match (Service selecting Pods)
    Selector,
    /// Volume mount of a ConfigMap, Secret or PVC
    Volume,
    /// Pod running under a ServiceAccount
    ServiceAccount,
    /// NetworkPolicy or Ingress routing
    Network,
    /// Reference declared by a custom resource
    Custom,
    /// Service backing relationship
    Service,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::Owner => "owner",
            DependencyType::Selector => "selector",
            DependencyType::Volume => "volume",
            DependencyType::ServiceAccount => "serviceAccount",
            DependencyType::Network => "network",
            DependencyType::Custom => "custom",
            DependencyType::Service => "service",
        }
    }

    pub fn all() -> &'static [Self] {
        &[
            DependencyType::Owner,
            DependencyType::Selector,
            DependencyType::Volume,
            DependencyType::ServiceAccount,
            DependencyType::Network,
            DependencyType::Custom,
            DependencyType::Service,
        ]
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DependencyType::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                GraphError::InvalidFilter(format!(
                    "unknown dependency type '{}' (expected one of: {})",
                    s,
                    DependencyType::all()
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Whether a dependency is required for the dependent resource to function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyStrength {
    Strong,
    Weak,
}

impl DependencyStrength {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyStrength::Strong => "strong",
            DependencyStrength::Weak => "weak",
        }
    }
}

impl fmt::Display for DependencyStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a resource as reported by the graph backend
///
/// Known keys are typed; everything else is carried verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A resource in the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub kind: String,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "status_or_default")]
    pub status: NodeStatus,
}

impl GraphNode {
    /// Build a node whose id is derived from its reference
    pub fn new(kind: &str, name: &str, namespace: Option<&str>) -> Self {
        let reference = ResourceRef::new(kind, name, namespace);
        Self {
            id: reference.id(),
            kind: reference.kind,
            name: reference.name,
            namespace: reference.namespace,
            labels: BTreeMap::new(),
            creation_timestamp: None,
            status: NodeStatus::default(),
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn reference(&self) -> ResourceRef {
        ResourceRef {
            kind: self.kind.clone(),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
        }
    }
}

/// Context attached to an edge
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeMetadata {
    /// Human-readable explanation of the relationship
    #[serde(default)]
    pub reason: String,
    /// Field path the relationship was read from (e.g. `spec.volumes`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Whether the owner reference is the managing controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<bool>,
    /// Label selector, kept opaque
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A directed dependency between two resources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub id: String,
    /// Id of the dependent resource
    pub source: String,
    /// Id of the resource depended upon
    pub target: String,
    #[serde(rename = "type")]
    pub dependency_type: DependencyType,
    pub strength: DependencyStrength,
    #[serde(default)]
    pub metadata: EdgeMetadata,
}

impl GraphEdge {
    pub fn new(
        source: &str,
        target: &str,
        dependency_type: DependencyType,
        strength: DependencyStrength,
        reason: &str,
    ) -> Self {
        Self {
            id: format!("{}-{}-{}", source, dependency_type, target),
            source: source.to_string(),
            target: target.to_string(),
            dependency_type,
            strength,
            metadata: EdgeMetadata {
                reason: reason.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn is_strong(&self) -> bool {
        self.strength == DependencyStrength::Strong
    }

    /// The endpoint opposite `id`, if `id` is one of this edge's endpoints
    pub fn other_end(&self, id: &str) -> Option<&str> {
        if self.source == id {
            Some(&self.target)
        } else if self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// How a snapshot was obtained when the primary request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegradationMode {
    /// Real data from the reduced fallback request
    Fallback,
    /// Generated stand-in data; never real cluster state
    Placeholder,
}

/// Marker recorded in the metadata of degraded snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degradation {
    pub mode: DegradationMode,
    /// Message of the failure that caused the degradation
    pub cause: String,
}

/// Snapshot metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub node_count: usize,
    #[serde(default)]
    pub edge_count: usize,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degradation: Option<Degradation>,
}

impl Default for GraphMetadata {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            node_count: 0,
            edge_count: 0,
            timestamp: Utc::now(),
            degradation: None,
        }
    }
}

/// An immutable snapshot of resource dependencies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyGraph {
    #[serde(default)]
    pub metadata: GraphMetadata,
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl DependencyGraph {
    /// Create a snapshot taken now
    pub fn new(namespace: &str, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            metadata: GraphMetadata {
                namespace: namespace.to_string(),
                node_count: nodes.len(),
                edge_count: edges.len(),
                timestamp: Utc::now(),
                degradation: None,
            },
            nodes,
            edges,
        }
    }

    /// Create a snapshot that keeps this snapshot's metadata but holds a
    /// different node and edge selection
    pub fn derive(&self, nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        Self {
            metadata: GraphMetadata {
                node_count: nodes.len(),
                edge_count: edges.len(),
                ..self.metadata.clone()
            },
            nodes,
            edges,
        }
    }

    /// Mark this snapshot as degraded
    pub fn with_degradation(mut self, mode: DegradationMode, cause: impl Into<String>) -> Self {
        self.metadata.degradation = Some(Degradation {
            mode,
            cause: cause.into(),
        });
        self
    }

    pub fn is_degraded(&self) -> bool {
        self.metadata.degradation.is_some()
    }

    /// Whether this snapshot is generated stand-in data
    pub fn is_placeholder(&self) -> bool {
        self.metadata.namespace == PLACEHOLDER_NAMESPACE
            || matches!(
                self.metadata.degradation,
                Some(Degradation {
                    mode: DegradationMode::Placeholder,
                    ..
                })
            )
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Map from node id to its position in `nodes`
    pub fn index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Keep the nodes matching `keep` and every edge whose endpoints both survive
    pub fn retain_nodes<F>(&self, keep: F) -> Self
    where
        F: Fn(&GraphNode) -> bool,
    {
        let nodes: Vec<GraphNode> = self.nodes.iter().filter(|&n| keep(n)).cloned().collect();
        let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
            .cloned()
            .collect();
        self.derive(nodes, edges)
    }

    /// Keep the edges matching `keep`; nodes are left untouched
    pub fn retain_edges<F>(&self, keep: F) -> Self
    where
        F: Fn(&GraphEdge) -> bool,
    {
        let edges = self.edges.iter().filter(|&e| keep(e)).cloned().collect();
        self.derive(self.nodes.clone(), edges)
    }

    /// Check the snapshot invariants: unique node ids, unique edge ids and no
    /// dangling edges
    pub fn validate(&self) -> Result<(), GraphError> {
        let mut node_ids = HashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphError::MalformedResponse(format!(
                    "node ids must be unique, '{}' appears more than once",
                    node.id
                )));
            }
        }

        let mut edge_ids = HashSet::with_capacity(self.edges.len());
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphError::MalformedResponse(format!(
                    "edge ids must be unique, '{}' appears more than once",
                    edge.id
                )));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphError::MalformedResponse(format!(
                        "edge '{}' references node '{}' which is not in the graph",
                        edge.id, endpoint
                    )));
                }
            }
        }

        Ok(())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn status_or_default<'de, D>(deserializer: D) -> Result<NodeStatus, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(NodeStatus::default()),
        Some(obj @ Value::Object(_)) => {
            serde_json::from_value(obj).map_err(serde::de::Error::custom)
        }
        Some(other) => {
            let mut extra = Map::new();
            extra.insert("value".to_string(), other);
            Ok(NodeStatus {
                extra,
                ..Default::default()
            })
        }
    }
}
