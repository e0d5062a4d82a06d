//! The graph store: an arena of vertices plus edge insertion and removal.
//!
//! Vertices live in an append-only arena; their ids are slot indices and
//! are never reused, so ids held by in-flight searches stay meaningful
//! after removal (the slot becomes a tombstone). Edge mutations lock only
//! the vertices whose lists change. There is no whole-graph write lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, warn};

use crate::domain::Coordinate;

use super::annotation::Annotation;
use super::edge::{Edge, EdgeId, EdgeKind};
use super::error::GraphError;
use super::vertex::{Vertex, VertexId, VertexKind};

#[derive(Default)]
struct Arena {
    slots: Vec<Option<Arc<Vertex>>>,
    by_label: HashMap<String, VertexId>,
}

/// The transportation graph shared by searches and updaters.
#[derive(Default)]
pub struct Graph {
    arena: RwLock<Arena>,
    next_edge_id: AtomicU64,
    annotations: Mutex<Vec<Annotation>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex with a unique label.
    pub fn add_vertex(
        &self,
        label: impl Into<String>,
        name: Option<String>,
        coordinate: Coordinate,
        kind: VertexKind,
    ) -> Result<Arc<Vertex>, GraphError> {
        let label = label.into();
        let mut arena = self.arena.write();
        if arena.by_label.contains_key(&label) {
            error!(label = %label, "duplicate vertex label");
            return Err(GraphError::DuplicateLabel(label));
        }
        let id = VertexId(arena.slots.len());
        let vertex = Arc::new(Vertex::new(id, label.clone(), name, coordinate, kind));
        arena.slots.push(Some(vertex.clone()));
        arena.by_label.insert(label, id);
        Ok(vertex)
    }

    /// Detach every incident edge, then remove the vertex.
    ///
    /// The vertex stops accepting edges before its lists are emptied, so an
    /// edge being attached concurrently either gets detached here or is
    /// refused. The slot is left as a tombstone; the id is never handed out
    /// again.
    pub fn remove_vertex(&self, id: VertexId) -> Result<(), GraphError> {
        let vertex = self.vertex(id).ok_or(GraphError::UnknownVertex(id))?;
        let (outgoing, incoming) = vertex.retire();
        self.detach_from_neighbours(&vertex, &outgoing, &incoming);

        let mut arena = self.arena.write();
        arena.by_label.remove(vertex.label());
        if let Some(slot) = arena.slots.get_mut(id.0) {
            *slot = None;
        }
        debug!(vertex = %vertex.label(), "removed vertex");
        Ok(())
    }

    /// Clear a vertex's edge lists and remove those edges from its neighbours.
    pub fn remove_all_edges(&self, vertex: &Vertex) {
        let (outgoing, incoming) = vertex.take_edges();
        self.detach_from_neighbours(vertex, &outgoing, &incoming);
    }

    // A neighbour may not hold its half yet when an insert is in flight;
    // `insert_edge` notices the removal and cleans up after itself.
    fn detach_from_neighbours(
        &self,
        vertex: &Vertex,
        outgoing: &[Arc<Edge>],
        incoming: &[Arc<Edge>],
    ) {
        for e in outgoing {
            if e.to() != vertex.id()
                && let Some(target) = self.vertex(e.to())
            {
                target.discard_incoming(e);
            }
        }
        for e in incoming {
            if e.from() != vertex.id()
                && let Some(source) = self.vertex(e.from())
            {
                source.discard_outgoing(e);
            }
        }
    }

    pub fn vertex(&self, id: VertexId) -> Option<Arc<Vertex>> {
        self.arena.read().slots.get(id.0).cloned().flatten()
    }

    pub fn vertex_by_label(&self, label: &str) -> Option<Arc<Vertex>> {
        let arena = self.arena.read();
        let id = arena.by_label.get(label)?;
        arena.slots.get(id.0).cloned().flatten()
    }

    /// All live vertices in id order.
    pub fn vertices(&self) -> Vec<Arc<Vertex>> {
        self.arena.read().slots.iter().flatten().cloned().collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.arena.read().by_label.len()
    }

    /// All edges, each once (taken from the outgoing lists).
    pub fn edges(&self) -> Vec<Arc<Edge>> {
        self.vertices()
            .iter()
            .flat_map(|v| v.outgoing().iter().cloned().collect::<Vec<_>>())
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.vertices().iter().map(|v| v.degree_out()).sum()
    }

    /// Create an edge without attaching it.
    ///
    /// Validates that both endpoints exist and that the edge variant may
    /// join them. The edge becomes part of the graph once passed to
    /// [`Graph::insert_edge`].
    pub fn new_edge(
        &self,
        from: VertexId,
        to: VertexId,
        kind: EdgeKind,
    ) -> Result<Arc<Edge>, GraphError> {
        let from_v = self.vertex(from).ok_or(GraphError::UnknownVertex(from))?;
        let to_v = self.vertex(to).ok_or(GraphError::UnknownVertex(to))?;
        if !kind.accepts_endpoints(from_v.kind(), to_v.kind(), from == to) {
            let err = GraphError::IncompatibleEdge {
                edge: tag_name(&kind),
                from: from_v.label().to_string(),
                to: to_v.label().to_string(),
            };
            error!(error = %err, "edge type mismatch");
            return Err(err);
        }
        let id = EdgeId(self.next_edge_id.fetch_add(1, Ordering::Relaxed));
        Ok(Arc::new(Edge::new(id, from, to, kind)))
    }

    /// Create an edge and attach it to both endpoints.
    pub fn add_edge(
        &self,
        from: VertexId,
        to: VertexId,
        kind: EdgeKind,
    ) -> Result<Arc<Edge>, GraphError> {
        let edge = self.new_edge(from, to, kind)?;
        self.insert_edge(&edge)?;
        Ok(edge)
    }

    /// Attach an edge to its source's outgoing and target's incoming lists.
    ///
    /// Fails without attaching anything if either endpoint is gone, even
    /// when it is removed while the edge is being attached.
    pub fn insert_edge(&self, edge: &Arc<Edge>) -> Result<(), GraphError> {
        let from = self
            .vertex(edge.from())
            .ok_or(GraphError::UnknownVertex(edge.from()))?;
        let to = self
            .vertex(edge.to())
            .ok_or(GraphError::UnknownVertex(edge.to()))?;

        from.add_outgoing(edge.clone())?;
        if let Err(e) = to.add_incoming(edge.clone()) {
            from.discard_outgoing(edge);
            return Err(e);
        }

        // An endpoint removed between the two halves may have missed the
        // half installed on the other one
        let gone = [&from, &to].into_iter().find(|v| v.is_removed());
        if let Some(gone) = gone {
            from.discard_outgoing(edge);
            to.discard_incoming(edge);
            warn!(edge = %edge, vertex = %gone.label(), "endpoint removed while attaching edge");
            return Err(GraphError::UnknownVertex(gone.id()));
        }
        Ok(())
    }

    /// Detach an edge from both endpoints.
    ///
    /// Returns [`GraphError::EdgeNotFound`] if neither endpoint held it.
    pub fn remove_edge(&self, edge: &Arc<Edge>) -> Result<(), GraphError> {
        let removed_out = self
            .vertex(edge.from())
            .is_some_and(|v| v.remove_outgoing(edge));
        let removed_in = self
            .vertex(edge.to())
            .is_some_and(|v| v.remove_incoming(edge));
        if removed_out || removed_in {
            Ok(())
        } else {
            Err(GraphError::EdgeNotFound(edge.id()))
        }
    }

    /// Check every incident edge of a vertex against the compatibility rules.
    pub fn edge_types_valid(&self, vertex: &Vertex) -> bool {
        let valid = |e: &Arc<Edge>| match (self.vertex(e.from()), self.vertex(e.to())) {
            (Some(f), Some(t)) => e.kind().accepts_endpoints(f.kind(), t.kind(), f.id() == t.id()),
            _ => false,
        };
        vertex.outgoing().iter().all(valid) && vertex.incoming().iter().all(valid)
    }

    /// Record an annotation, returning its message for logging.
    pub fn add_annotation(&self, annotation: Annotation) -> String {
        let message = annotation.to_string();
        self.annotations.lock().push(annotation);
        message
    }

    pub fn annotations(&self) -> Vec<Annotation> {
        self.annotations.lock().clone()
    }
}

fn tag_name(kind: &EdgeKind) -> &'static str {
    use super::edge::EdgeTag;
    match kind.tag() {
        EdgeTag::Street => "Street",
        EdgeTag::StreetLink => "StreetLink",
        EdgeTag::BoardAlight => "BoardAlight",
        EdgeTag::TimedTransfer => "TimedTransfer",
        EdgeTag::SimpleTransfer => "SimpleTransfer",
        EdgeTag::RentVehicle => "RentVehicle",
        EdgeTag::RentVehicleAnywhere => "RentVehicleAnywhere",
        EdgeTag::RentBike => "RentBike",
        EdgeTag::ReturnBike => "ReturnBike",
        EdgeTag::ParkBike => "ParkBike",
        EdgeTag::ParkCar => "ParkCar",
    }
}
