//! Multi-state best-first search.
//!
//! States wait on a priority frontier ordered by a key that depends on the
//! dominance function (weight plus an optional distance estimate, elapsed
//! time, price or walk distance). Each expansion traverses the current
//! outgoing snapshot of the state's vertex; successors are offered to the
//! tree, which keeps only non-dominated ones. States evicted while waiting
//! are skipped when popped.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, trace};

use crate::domain::{Coordinate, haversine_m};
use crate::graph::{Graph, VertexId};

use super::dominance::DominanceKind;
use super::error::RoutingError;
use super::path::GraphPath;
use super::profile::OptimizationProfileFactory;
use super::request::RoutingRequest;
use super::spt::{ShortestPathTree, Termination};
use super::state::State;
use super::traverse::traverse;

/// How often the wall clock is checked, in expansions.
const TIMEOUT_CHECK_INTERVAL: usize = 256;

struct QueueEntry {
    key: f64,
    /// Insertion order; breaks key ties so results are deterministic.
    seq: u64,
    state: Arc<State>,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed: BinaryHeap is a max-heap and the smallest key goes first
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Straight-line lower bound on the weight still needed to reach the target.
struct Heuristic {
    target: Coordinate,
    weight_per_meter: f64,
}

impl Heuristic {
    fn for_request(graph: &Graph, request: &RoutingRequest) -> Option<Self> {
        let target = graph.vertex(request.destination?)?.coordinate();
        let speed = request.max_street_speed_mps()?;
        Some(Self {
            target,
            weight_per_meter: request.min_weight_per_second() / speed,
        })
    }

    fn estimate(&self, graph: &Graph, vertex: VertexId) -> f64 {
        graph
            .vertex(vertex)
            .map(|v| haversine_m(&v.coordinate(), &self.target) * self.weight_per_meter)
            .unwrap_or(0.0)
    }
}

/// Runs path searches over a graph.
///
/// Searches never lock the graph; they read each vertex's current edge
/// snapshot as they expand it.
pub struct Router<'g> {
    graph: &'g Graph,
}

impl<'g> Router<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    /// Build a shortest path tree for the request.
    ///
    /// An origin without outgoing edges gives an empty tree terminated with
    /// [`Termination::OriginUnlinked`]. A destination that is never reached
    /// gives a tree terminated with [`Termination::FrontierExhausted`].
    pub fn get_new_shortest_path_tree(
        &self,
        request: Arc<RoutingRequest>,
    ) -> Result<ShortestPathTree, RoutingError> {
        request.validate(self.graph)?;

        let profile = OptimizationProfileFactory::profile(
            request.config.optimization_profile.as_deref(),
            &request,
        );
        let mut spt = ShortestPathTree::new(request.clone(), profile.dominance_function());

        let origin = self
            .graph
            .vertex(request.origin)
            .ok_or_else(|| RoutingError::VertexNotFound {
                missing: vec![format!("origin {}", request.origin)],
            })?;
        if origin.degree_out() == 0 {
            debug!(origin = %origin.label(), "origin has no outgoing edges");
            spt.set_termination(Termination::OriginUnlinked);
            return Ok(spt);
        }

        let heuristic = if profile.use_heuristic && profile.dominance.orders_by_weight() {
            Heuristic::for_request(self.graph, &request)
        } else {
            None
        };
        let key = |state: &State| -> f64 {
            match profile.dominance {
                DominanceKind::MinimumWeight | DominanceKind::Pareto => {
                    state.weight()
                        + heuristic
                            .as_ref()
                            .map_or(0.0, |h| h.estimate(self.graph, state.vertex()))
                }
                DominanceKind::EarliestArrival => state.elapsed_secs() as f64,
                DominanceKind::LowestPrice => state.traversal_price(),
                DominanceKind::LeastWalk => state.distance_in_walk_m(),
            }
        };

        let config = &request.config;
        let started = Instant::now();
        let mut frontier = BinaryHeap::new();
        let mut seq = 0u64;
        let mut explored = 0usize;

        let s0 = Arc::new(State::origin(request.clone()));
        spt.add(s0.clone());
        frontier.push(QueueEntry {
            key: key(&s0),
            seq,
            state: s0,
        });

        let termination = loop {
            let Some(QueueEntry { state, .. }) = frontier.pop() else {
                break Termination::FrontierExhausted;
            };
            if !spt.is_retained(&state) {
                continue;
            }
            if request.destination == Some(state.vertex()) && state.is_final() {
                break Termination::DestinationReached;
            }

            explored += 1;
            if explored > config.max_explored_states {
                break Termination::StateLimit;
            }
            if explored % TIMEOUT_CHECK_INTERVAL == 0 && started.elapsed() > config.timeout() {
                break Termination::Timeout;
            }

            // The vertex may have been removed since the state was created
            let Some(vertex) = self.graph.vertex(state.vertex()) else {
                continue;
            };
            for edge in vertex.outgoing().iter() {
                let Some(next) = traverse(edge, &state) else {
                    continue;
                };
                if config
                    .max_duration_secs
                    .is_some_and(|max| next.elapsed_secs() > max)
                    || config.max_weight.is_some_and(|max| next.weight() > max)
                {
                    continue;
                }
                let next = Arc::new(next);
                if spt.add(next.clone()) {
                    seq += 1;
                    trace!(vertex = %next.vertex(), weight = next.weight(), "state added");
                    frontier.push(QueueEntry {
                        key: key(&next),
                        seq,
                        state: next,
                    });
                }
            }
        };

        debug!(
            explored,
            vertices = spt.vertex_count(),
            states = spt.state_count(),
            termination = ?termination,
            "search complete"
        );
        spt.set_termination(termination);
        Ok(spt)
    }

    /// Find the best path to the request's destination.
    pub fn plan(&self, request: RoutingRequest) -> Result<GraphPath, RoutingError> {
        let Some(destination) = request.destination else {
            return Err(RoutingError::BogusParameter(
                "a destination is required".to_string(),
            ));
        };
        let origin = request.origin;
        let spt = self.get_new_shortest_path_tree(Arc::new(request))?;
        if spt.termination() == Termination::OriginUnlinked {
            return Err(RoutingError::LocationNotAccessible(origin));
        }
        spt.path(destination).ok_or(RoutingError::PathNotFound)
    }
}
