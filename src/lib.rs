//! kubegraph library
//!
//! Models dependency relationships between Kubernetes resources, retrieves
//! them from a graph backend under caller-supplied constraints, and degrades
//! to clearly marked fallback or placeholder data when the backend fails.
//!
//! ```rust,no_run
//! use kubegraph::graph::{GraphFilter, extract, summarize};
//! use kubegraph::services::GraphService;
//! use kubegraph::source::FileGraphSource;
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let service = GraphService::new(Arc::new(FileGraphSource::new("snapshot.json")));
//! let graph = service.retrieve(&GraphFilter::default()).await?;
//! let focus = extract(&graph, "Deployment/web@prod", 2);
//! println!("{} nodes around web", focus.nodes.len());
//! println!("{:?}", summarize(&graph));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod kube;
pub mod services;
pub mod source;

pub use error::{GraphError, ServiceError};
pub use graph::{DependencyGraph, GraphEdge, GraphFilter, GraphNode, ResourceRef};
pub use services::{GraphService, ViewSession};
pub use source::GraphSource;
