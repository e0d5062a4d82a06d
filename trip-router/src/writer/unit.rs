//! Mutation units: ordered batches of edge operations.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::graph::{Edge, Graph};

/// A single structural change to the graph.
#[derive(Debug, Clone)]
pub enum GraphOp {
    /// Attach an edge built with [`Graph::new_edge`].
    AddEdge(Arc<Edge>),
    /// Detach an edge currently in the graph.
    RemoveEdge(Arc<Edge>),
}

impl GraphOp {
    pub fn edge(&self) -> &Arc<Edge> {
        match self {
            GraphOp::AddEdge(edge) | GraphOp::RemoveEdge(edge) => edge,
        }
    }
}

impl fmt::Display for GraphOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphOp::AddEdge(edge) => write!(f, "add {}", edge.id()),
            GraphOp::RemoveEdge(edge) => write!(f, "remove {}", edge.id()),
        }
    }
}

/// An ordered batch of operations from one source.
///
/// Operations are applied in order. Each vertex's edge list changes
/// atomically, but a reader may observe some operations of a unit before
/// others.
#[derive(Debug, Clone)]
pub struct MutationUnit {
    source: String,
    ops: Vec<GraphOp>,
}

/// What happened when a unit was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub applied: usize,
    /// Operations the graph refused (duplicate insert, missing edge,
    /// unknown endpoint). They leave the graph untouched.
    pub rejected: usize,
}

impl MutationUnit {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ops: Vec::new(),
        }
    }

    pub fn add_edge(mut self, edge: Arc<Edge>) -> Self {
        self.ops.push(GraphOp::AddEdge(edge));
        self
    }

    pub fn remove_edge(mut self, edge: Arc<Edge>) -> Self {
        self.ops.push(GraphOp::RemoveEdge(edge));
        self
    }

    pub fn push(&mut self, op: GraphOp) {
        self.ops.push(op);
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ops(&self) -> &[GraphOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every operation in order.
    ///
    /// A refused operation is logged and skipped; the rest of the unit
    /// still applies.
    pub fn apply(&self, graph: &Graph) -> ApplyReport {
        let mut report = ApplyReport::default();
        for op in &self.ops {
            let result = match op {
                GraphOp::AddEdge(edge) => graph.insert_edge(edge),
                GraphOp::RemoveEdge(edge) => graph.remove_edge(edge),
            };
            match result {
                Ok(()) => report.applied += 1,
                Err(e) => {
                    warn!(source = %self.source, op = %op, error = %e, "graph operation rejected");
                    report.rejected += 1;
                }
            }
        }
        debug!(
            source = %self.source,
            applied = report.applied,
            rejected = report.rejected,
            "mutation unit applied"
        );
        report
    }
}
