//! Graph integrity errors.

use super::edge::EdgeId;
use super::vertex::VertexId;

/// Structural integrity violations. The store is left unchanged when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Another vertex already uses this label
    #[error("duplicate vertex label: {0}")]
    DuplicateLabel(String),

    /// No live vertex has this id
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// No live vertex has this label
    #[error("unknown vertex label: {0}")]
    UnknownLabel(String),

    /// The edge is already attached to its endpoints
    #[error("edge {0} is already attached")]
    DuplicateEdge(EdgeId),

    /// The edge is not attached to its endpoints
    #[error("edge {0} not found")]
    EdgeNotFound(EdgeId),

    /// Edge variant cannot join these vertex variants
    #[error("{edge} edge cannot join {from} to {to}")]
    IncompatibleEdge {
        edge: &'static str,
        from: String,
        to: String,
    },
}
