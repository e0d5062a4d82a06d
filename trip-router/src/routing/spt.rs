//! Shortest path trees holding the surviving states at each vertex.

use std::collections::HashMap;
use std::sync::Arc;

use crate::graph::VertexId;

use super::dominance::DominanceFunction;
use super::path::GraphPath;
use super::request::RoutingRequest;
use super::state::State;

/// Why a search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The origin has no outgoing edges; nothing was explored.
    OriginUnlinked,
    /// Every reachable state was expanded.
    FrontierExhausted,
    /// A final state at the destination was settled.
    DestinationReached,
    /// The explored-state budget ran out.
    StateLimit,
    /// The wall-clock budget ran out.
    Timeout,
}

/// The non-dominated states found at each vertex.
#[derive(Debug)]
pub struct ShortestPathTree {
    request: Arc<RoutingRequest>,
    dominance: &'static dyn DominanceFunction,
    states: HashMap<VertexId, Vec<Arc<State>>>,
    termination: Termination,
}

impl ShortestPathTree {
    pub fn new(request: Arc<RoutingRequest>, dominance: &'static dyn DominanceFunction) -> Self {
        Self {
            request,
            dominance,
            states: HashMap::new(),
            termination: Termination::FrontierExhausted,
        }
    }

    pub fn request(&self) -> &RoutingRequest {
        &self.request
    }

    /// Offer a state to the tree.
    ///
    /// The state is rejected if any retained state at its vertex is better
    /// or equal and comparable. Otherwise it evicts every retained state it
    /// is better than or equal to and comparable with. Returns whether the
    /// state was kept.
    pub fn add(&mut self, candidate: Arc<State>) -> bool {
        let dominance = self.dominance;
        let states = self.states.entry(candidate.vertex()).or_default();

        if states
            .iter()
            .any(|existing| dominance.better_or_equal_and_comparable(existing, &candidate))
        {
            return false;
        }
        states.retain(|existing| !dominance.better_or_equal_and_comparable(&candidate, existing));
        states.push(candidate);
        true
    }

    /// Whether this exact state is still retained.
    pub fn is_retained(&self, state: &Arc<State>) -> bool {
        self.states
            .get(&state.vertex())
            .is_some_and(|states| states.iter().any(|s| Arc::ptr_eq(s, state)))
    }

    /// The retained states at a vertex, in insertion order.
    pub fn states_at(&self, vertex: VertexId) -> &[Arc<State>] {
        self.states.get(&vertex).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_reached(&self, vertex: VertexId) -> bool {
        !self.states_at(vertex).is_empty()
    }

    /// The lowest-weight final state at a vertex.
    pub fn best_state_at(&self, vertex: VertexId) -> Option<&Arc<State>> {
        self.states_at(vertex)
            .iter()
            .filter(|s| s.is_final())
            .min_by(|a, b| a.weight().total_cmp(&b.weight()))
    }

    /// Paths to every final state at a vertex, best first.
    pub fn paths(&self, vertex: VertexId) -> Vec<GraphPath> {
        let mut paths: Vec<GraphPath> = self
            .states_at(vertex)
            .iter()
            .filter(|s| s.is_final())
            .map(GraphPath::new)
            .collect();
        paths.sort_by(|a, b| a.weight().total_cmp(&b.weight()));
        paths
    }

    /// The best path to a vertex.
    pub fn path(&self, vertex: VertexId) -> Option<GraphPath> {
        self.best_state_at(vertex).map(GraphPath::new)
    }

    /// Vertices with at least one retained state.
    pub fn vertex_count(&self) -> usize {
        self.states.values().filter(|s| !s.is_empty()).count()
    }

    pub fn state_count(&self) -> usize {
        self.states.values().map(Vec::len).sum()
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub(crate) fn set_termination(&mut self, termination: Termination) {
        self.termination = termination;
    }
}
