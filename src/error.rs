//! Error taxonomy for the graph engine
//!
//! `GraphError` classifies what went wrong; `ServiceError` is what callers of
//! the service layer see, and always embeds the original cause.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by graph operations and collaborator sources
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    /// Network failure reaching a collaborator
    #[error("transport failure: {0}")]
    Transport(String),

    /// The collaborator did not answer within the request budget
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The collaborator answered with a shape that violates the graph invariants
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The caller-supplied filter is unusable
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A resource id does not follow the `kind/name[@namespace]` grammar
    #[error("invalid resource id '{id}': {reason}")]
    Codec { id: String, reason: String },

    /// The request was cancelled before it completed
    #[error("request cancelled")]
    Cancelled,

    /// Encoding or decoding a payload failed
    #[error("serialization failure: {0}")]
    Serialization(String),
}

impl GraphError {
    /// Whether this error is a transport-class failure that the degradation
    /// policy may retry
    pub fn is_transport(&self) -> bool {
        matches!(self, GraphError::Transport(_) | GraphError::Timeout(_))
    }

    pub(crate) fn codec(id: &str, reason: impl Into<String>) -> Self {
        GraphError::Codec {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        GraphError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for GraphError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            GraphError::MalformedResponse(e.to_string())
        } else {
            GraphError::Transport(e.to_string())
        }
    }
}

impl From<kube::Error> for GraphError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::SerdeError(err) => GraphError::MalformedResponse(err.to_string()),
            other => GraphError::Transport(other.to_string()),
        }
    }
}

/// Errors surfaced by the service layer
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServiceError {
    #[error("Failed to get dependency graph: {0}")]
    Graph(#[source] GraphError),

    #[error("Failed to get resource dependencies: {0}")]
    Dependencies(#[source] GraphError),

    #[error("Failed to get CRD relationships: {0}")]
    CrdRelationships(#[source] GraphError),

    /// A newer request was issued before this one completed
    #[error("request {sequence} was superseded by request {latest}")]
    Superseded { sequence: u64, latest: u64 },
}

impl ServiceError {
    /// The underlying graph error, if any
    pub fn cause(&self) -> Option<&GraphError> {
        match self {
            ServiceError::Graph(e)
            | ServiceError::Dependencies(e)
            | ServiceError::CrdRelationships(e) => Some(e),
            ServiceError::Superseded { .. } => None,
        }
    }
}
