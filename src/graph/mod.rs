//! Resource relationship graph
//!
//! Pure, synchronous operations over immutable graph snapshots: identity
//! codec, filtering, subgraph extraction, statistics and export. Nothing in
//! this module performs I/O or mutates its input.

pub mod crd;
pub mod dependencies;
pub mod export;
pub mod filter;
pub mod id;
pub mod model;
pub mod stats;
pub mod subgraph;

pub use crd::{
    CrdInfo, CrdRelationship, CrdRelationshipOptions, CrdRelationshipResponse,
    CrdRelationshipType, CrdScope,
};
pub use dependencies::{DependencySet, ResourceDependencies};
pub use export::{
    ExportFormat, ExportOptions, ExportPayload, export, export_with_schema, import_structured,
};
pub use filter::{GraphFilter, GraphQuery, SecondaryFilter, ViewFilters};
pub use id::{DecodedBatch, ResourceRef, decode, decode_all, encode};
pub use model::{
    Degradation, DegradationMode, DependencyGraph, DependencyStrength, DependencyType,
    EdgeMetadata, GraphEdge, GraphMetadata, GraphNode, NodeStatus, PLACEHOLDER_NAMESPACE,
};
pub use stats::{GraphStats, summarize};
pub use subgraph::{Subgraph, extract};
