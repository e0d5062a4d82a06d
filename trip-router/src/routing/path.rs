//! Paths reconstructed from back-pointer chains.

use std::sync::Arc;

use crate::graph::{Edge, VertexId};

use super::state::State;

/// A path from the origin to some state, in travel order.
#[derive(Debug, Clone)]
pub struct GraphPath {
    states: Vec<Arc<State>>,
    edges: Vec<Arc<Edge>>,
}

impl GraphPath {
    /// Walk back from `last` to the origin.
    pub fn new(last: &Arc<State>) -> Self {
        let mut states = Vec::new();
        let mut edges = Vec::new();
        let mut cursor = Some(last.clone());
        while let Some(state) = cursor {
            if let Some(edge) = state.back_edge() {
                edges.push(edge.clone());
            }
            cursor = state.back_state().cloned();
            states.push(state);
        }
        states.reverse();
        edges.reverse();
        Self { states, edges }
    }

    pub fn states(&self) -> &[Arc<State>] {
        &self.states
    }

    pub fn edges(&self) -> &[Arc<Edge>] {
        &self.edges
    }

    fn last(&self) -> &Arc<State> {
        // A path always holds at least the state it was built from
        &self.states[self.states.len() - 1]
    }

    pub fn start_vertex(&self) -> VertexId {
        self.states[0].vertex()
    }

    pub fn end_vertex(&self) -> VertexId {
        self.last().vertex()
    }

    /// Vertices visited, in order. Loop edges repeat their vertex.
    pub fn vertices(&self) -> Vec<VertexId> {
        self.states.iter().map(|s| s.vertex()).collect()
    }

    pub fn duration_secs(&self) -> i64 {
        self.last().elapsed_secs()
    }

    pub fn weight(&self) -> f64 {
        self.last().weight()
    }

    pub fn walk_distance_m(&self) -> f64 {
        self.last().distance_in_walk_m()
    }

    pub fn price(&self) -> f64 {
        self.last().traversal_price()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coordinate, StreetTraversalPermission, TraverseModeSet};
    use crate::graph::{EdgeKind, Graph, StreetSegment, VertexKind};
    use crate::routing::{RoutingRequest, traverse};

    #[test]
    fn path_follows_back_pointers() {
        let graph = Graph::new();
        let v: Vec<_> = (0..3)
            .map(|i| {
                graph
                    .add_vertex(
                        format!("v{i}"),
                        None,
                        Coordinate::new(0.001 * i as f64, 0.0),
                        VertexKind::Intersection,
                    )
                    .unwrap()
            })
            .collect();
        let street = |a: usize, b: usize| {
            graph
                .add_edge(
                    v[a].id(),
                    v[b].id(),
                    EdgeKind::Street(StreetSegment::new(
                        "s",
                        vec![v[a].coordinate(), v[b].coordinate()],
                        StreetTraversalPermission::ALL,
                    )),
                )
                .unwrap()
        };
        let e01 = street(0, 1);
        let e12 = street(1, 2);

        let request = Arc::new(RoutingRequest::new(v[0].id(), None, TraverseModeSet::walk_only()));
        let s0 = Arc::new(State::origin(request));
        let s1 = Arc::new(traverse(&e01, &s0).unwrap());
        let s2 = Arc::new(traverse(&e12, &s1).unwrap());

        let path = GraphPath::new(&s2);
        assert_eq!(path.vertices(), vec![v[0].id(), v[1].id(), v[2].id()]);
        assert_eq!(path.edges().len(), 2);
        assert!(Arc::ptr_eq(&path.edges()[0], &e01));
        assert_eq!(path.start_vertex(), v[0].id());
        assert_eq!(path.end_vertex(), v[2].id());
        assert_eq!(path.duration_secs(), s2.elapsed_secs());
        assert!(path.walk_distance_m() > 200.0);
        assert_eq!(path.price(), 0.0);
    }
}
