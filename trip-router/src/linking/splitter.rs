//! Links stops, stations and parks to the street network.
//!
//! The linker projects the point onto nearby street edges and attaches it at
//! the closest projection, splitting the edge there unless the projection is
//! practically on top of one of the edge's own vertices. Candidates are
//! ordered by distance, then edge id, then position along the edge, so the
//! chosen split point does not depend on hash or index iteration order.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::{Projection, haversine_m, project_onto_polyline, split_polyline};
use crate::graph::{
    Annotation, Edge, EdgeKind, EdgeTag, Graph, GraphError, StreetSegment, Vertex, VertexId,
    VertexKind,
};

use super::config::LinkerConfig;
use super::index::StreetIndex;

/// Result of linking one vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Connected to these street vertices.
    Linked(Vec<VertexId>),
    /// No qualifying street edge in range.
    Unlinked,
}

impl LinkOutcome {
    pub fn is_linked(&self) -> bool {
        matches!(self, LinkOutcome::Linked(_))
    }
}

/// Summary of a [`StreetSplitter::link_all`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub linked: usize,
    pub unlinked: usize,
}

struct Candidate {
    edge: Arc<Edge>,
    projection: Projection,
}

fn by_distance_then_id(a: &Candidate, b: &Candidate) -> Ordering {
    a.projection
        .distance_m
        .total_cmp(&b.projection.distance_m)
        .then_with(|| a.edge.id().cmp(&b.edge.id()))
        .then_with(|| a.projection.fraction.total_cmp(&b.projection.fraction))
}

/// Splits street edges to attach off-street vertices.
///
/// Only one splitter should modify a graph at a time; it owns the street
/// index it keeps in step with the edges it splits.
pub struct StreetSplitter<'g> {
    graph: &'g Graph,
    index: StreetIndex,
    config: LinkerConfig,
}

impl<'g> StreetSplitter<'g> {
    /// Create a splitter, indexing the graph's current street edges.
    pub fn new(graph: &'g Graph, config: LinkerConfig) -> Self {
        Self::with_index(graph, StreetIndex::build(graph), config)
    }

    pub fn with_index(graph: &'g Graph, index: StreetIndex, config: LinkerConfig) -> Self {
        Self {
            graph,
            index,
            config,
        }
    }

    pub fn index(&self) -> &StreetIndex {
        &self.index
    }

    /// Link every linkable vertex that has no street connector yet.
    ///
    /// Failures are recorded as graph annotations and do not stop the pass.
    pub fn link_all(&mut self) -> LinkReport {
        let mut report = LinkReport::default();
        for vertex in self.graph.vertices() {
            if !needs_linking(&vertex) {
                continue;
            }
            if self.link(&vertex).is_linked() {
                report.linked += 1;
            } else {
                report.unlinked += 1;
                if let Some(annotation) = Annotation::unlinked(&vertex) {
                    warn!("{}", self.graph.add_annotation(annotation));
                }
            }
        }
        info!(
            linked = report.linked,
            unlinked = report.unlinked,
            "linked vertices to street network"
        );
        report
    }

    /// Link one vertex to the closest qualifying street edge.
    pub fn link(&mut self, vertex: &Arc<Vertex>) -> LinkOutcome {
        let point = vertex.coordinate();
        let mut candidates: Vec<Candidate> = self
            .index
            .query_around(&point, self.config.search_radius_m)
            .into_iter()
            .filter_map(|edge| {
                let street = edge.as_street()?;
                if !street.can_traverse(self.config.link_mode) {
                    return None;
                }
                let projection = project_onto_polyline(&point, &street.geometry)?;
                (projection.distance_m <= self.config.search_radius_m)
                    .then_some(Candidate { edge, projection })
            })
            .collect();

        if candidates.is_empty() {
            debug!(vertex = %vertex.label(), "no street edges in range");
            return LinkOutcome::Unlinked;
        }
        candidates.sort_by(by_distance_then_id);

        let best = &candidates[0];
        let mut chosen = vec![best];
        // The other direction of a two-way street gets linked at the same point
        if let Some(twin) = candidates[1..].iter().find(|c| {
            c.edge.from() == best.edge.to()
                && c.edge.to() == best.edge.from()
                && c.projection.distance_m - best.projection.distance_m
                    <= self.config.duplicate_way_epsilon_m
        }) {
            chosen.push(twin);
        }

        let mut split_vertex: Option<Arc<Vertex>> = None;
        let mut targets: Vec<VertexId> = Vec::new();
        for candidate in chosen {
            let target = match self.attachment_point(candidate, &mut split_vertex) {
                Ok(target) => target,
                Err(e) => {
                    error!(vertex = %vertex.label(), edge = %candidate.edge, error = %e, "failed to split edge");
                    continue;
                }
            };
            if targets.contains(&target) {
                continue;
            }
            match self.connect(vertex, target) {
                Ok(()) => targets.push(target),
                Err(e) => {
                    error!(vertex = %vertex.label(), error = %e, "failed to add street link");
                }
            }
        }

        if targets.is_empty() {
            LinkOutcome::Unlinked
        } else {
            debug!(vertex = %vertex.label(), targets = ?targets, "linked");
            LinkOutcome::Linked(targets)
        }
    }

    /// The street vertex to connect to for a candidate: one of the edge's
    /// endpoints when the projection lies on it, otherwise a split vertex.
    fn attachment_point(
        &mut self,
        candidate: &Candidate,
        split_vertex: &mut Option<Arc<Vertex>>,
    ) -> Result<VertexId, GraphError> {
        let edge = &candidate.edge;
        let at = candidate.projection.point;
        for endpoint in [edge.from(), edge.to()] {
            let v = self
                .graph
                .vertex(endpoint)
                .ok_or(GraphError::UnknownVertex(endpoint))?;
            if haversine_m(&v.coordinate(), &at) <= self.config.snap_epsilon_m {
                return Ok(endpoint);
            }
        }

        // Reuse the split vertex of the twin edge if it is in the same spot
        let reuse = split_vertex
            .as_ref()
            .filter(|v| haversine_m(&v.coordinate(), &at) <= self.config.snap_epsilon_m)
            .cloned();
        let split = self.split(candidate, reuse)?;
        let id = split.id();
        *split_vertex = Some(split);
        Ok(id)
    }

    /// Replace an edge by two halves meeting at a split vertex.
    fn split(
        &mut self,
        candidate: &Candidate,
        reuse: Option<Arc<Vertex>>,
    ) -> Result<Arc<Vertex>, GraphError> {
        let edge = &candidate.edge;
        let Some(street) = edge.as_street() else {
            return Err(GraphError::EdgeNotFound(edge.id()));
        };
        let projection = &candidate.projection;

        let split = match reuse {
            Some(v) => v,
            None => self.graph.add_vertex(
                format!("split:{}", edge.id()),
                Some(street.name.clone()),
                projection.point,
                VertexKind::Split,
            )?,
        };

        let (head, tail) = split_polyline(&street.geometry, projection);
        let head_length = street.length_m * projection.fraction;
        let first = StreetSegment {
            name: street.name.clone(),
            geometry: head,
            length_m: head_length,
            permission: street.permission,
            turn_restrictions: Vec::new(),
        };
        let second = StreetSegment {
            name: street.name.clone(),
            geometry: tail,
            length_m: street.length_m - head_length,
            permission: street.permission,
            turn_restrictions: street.turn_restrictions.clone(),
        };

        let first = self
            .graph
            .new_edge(edge.from(), split.id(), EdgeKind::Street(first))?;
        let second = self
            .graph
            .new_edge(split.id(), edge.to(), EdgeKind::Street(second))?;

        // Halves go in before the original comes out so the street is never
        // missing from either endpoint
        self.graph.insert_edge(&first)?;
        self.graph.insert_edge(&second)?;
        self.graph.remove_edge(edge)?;

        self.index.remove(edge);
        self.index.insert(first);
        self.index.insert(second);

        debug!(edge = %edge, split = %split.label(), "split street edge");
        Ok(split)
    }

    /// Add connectors both ways between a vertex and a street vertex.
    fn connect(&self, vertex: &Vertex, street_vertex: VertexId) -> Result<(), GraphError> {
        let target = self
            .graph
            .vertex(street_vertex)
            .ok_or(GraphError::UnknownVertex(street_vertex))?;
        let length_m = haversine_m(&vertex.coordinate(), &target.coordinate());
        let there = self
            .graph
            .new_edge(vertex.id(), target.id(), EdgeKind::StreetLink { length_m })?;
        let back = self
            .graph
            .new_edge(target.id(), vertex.id(), EdgeKind::StreetLink { length_m })?;
        self.graph.insert_edge(&there)?;
        self.graph.insert_edge(&back)?;
        Ok(())
    }
}

fn needs_linking(vertex: &Vertex) -> bool {
    vertex.kind().is_linkable() && !vertex.has_outgoing(EdgeTag::StreetLink)
}
