//! Resource identity codec
//!
//! Resources are addressed across every collaborator boundary by a canonical
//! string id: `kind/name` for cluster-scoped resources and
//! `kind/name@namespace` for namespaced ones. Kinds, names and namespaces are
//! assumed never to contain `/` or `@`; that holds for standard resource names
//! and is not checked here.

use crate::error::GraphError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A structured reference to a single resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub kind: String,
    pub name: String,
    /// `None` for cluster-scoped resources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ResourceRef {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            namespace: namespace.map(str::to_string),
        }
    }

    /// Canonical id of this resource
    pub fn id(&self) -> String {
        encode(&self.kind, &self.name, self.namespace.as_deref())
    }

    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_none()
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}@{}", self.kind, self.name, ns),
            None => write!(f, "{}/{}", self.kind, self.name),
        }
    }
}

impl FromStr for ResourceRef {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

/// Encode a resource reference as its canonical id
pub fn encode(kind: &str, name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("{}/{}@{}", kind, name, ns),
        None => format!("{}/{}", kind, name),
    }
}

/// Decode a canonical id back into a resource reference
///
/// The namespace is whatever follows the last `@`; the remainder is split on
/// its first `/` into kind and name.
pub fn decode(id: &str) -> Result<ResourceRef, GraphError> {
    let (rest, namespace) = match id.rsplit_once('@') {
        Some((_, ns)) if ns.is_empty() => {
            return Err(GraphError::codec(id, "namespace after '@' is empty"));
        }
        Some((rest, ns)) => (rest, Some(ns)),
        None => (id, None),
    };

    let (kind, name) = rest
        .split_once('/')
        .ok_or_else(|| GraphError::codec(id, "missing '/' between kind and name"))?;

    if kind.is_empty() {
        return Err(GraphError::codec(id, "kind is empty"));
    }
    if name.is_empty() {
        return Err(GraphError::codec(id, "name is empty"));
    }

    Ok(ResourceRef::new(kind, name, namespace))
}

/// Result of decoding a batch of ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedBatch {
    /// Successfully decoded references, in input order
    pub refs: Vec<ResourceRef>,
    /// Number of ids that did not parse
    pub skipped: usize,
}

/// Decode many ids, skipping and counting the ones that do not parse
pub fn decode_all<'a, I>(ids: I) -> DecodedBatch
where
    I: IntoIterator<Item = &'a str>,
{
    let mut batch = DecodedBatch::default();
    for id in ids {
        match decode(id) {
            Ok(r) => batch.refs.push(r),
            Err(e) => {
                tracing::warn!("Skipping resource id: {}", e);
                batch.skipped += 1;
            }
        }
    }
    batch
}
