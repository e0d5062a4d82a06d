//! Dominance between states at the same vertex.
//!
//! Even the single-criterion functions run inside a multi-state tree: bike
//! and vehicle rental, parking and turn restrictions all need several
//! incomparable states at one vertex. The core ordering therefore only
//! applies once two states pass every gate in
//! [`DominanceFunction::better_or_equal_and_comparable`], meaning they lie on
//! the same plane of the graph.

use std::fmt;

use serde::Deserialize;

use crate::graph::{EdgeTag, same_edge};

use super::state::State;

/// Decides which search branch prunes another at the same vertex.
pub trait DominanceFunction: fmt::Debug + Send + Sync {
    /// Whether `a` defeats or ties with `b`.
    ///
    /// Ties return true so that an existing state rejects a new one.
    fn better_or_equal(&self, a: &State, b: &State) -> bool;

    /// The core ordering, applied only when both states are on the same plane.
    fn better_or_equal_and_comparable(&self, a: &State, b: &State) -> bool {
        comparable(a, b) && self.better_or_equal(a, b)
    }
}

fn back_tag(s: &State) -> Option<EdgeTag> {
    s.back_edge().map(|e| e.tag())
}

/// Whether two states at the same vertex may be compared at all.
pub fn comparable(a: &State, b: &State) -> bool {
    // Before and after boarding transit are kept apart so transit options
    // survive even when walking is best
    if a.is_ever_boarded() != b.is_ever_boarded() {
        return false;
    }

    if a.non_transit_mode() != b.non_transit_mode() {
        return false;
    }

    // A walking transfer must not block alighting normally
    if (back_tag(a) == Some(EdgeTag::SimpleTransfer)) != (back_tag(b) == Some(EdgeTag::SimpleTransfer)) {
        return false;
    }

    // A timed transfer may be invalidated later
    if back_tag(a) == Some(EdgeTag::TimedTransfer) || back_tag(b) == Some(EdgeTag::TimedTransfer) {
        return false;
    }

    if a.is_bike_renting() != b.is_bike_renting() {
        return false;
    }
    if a.is_bike_renting() && a.bike_rental_networks() != b.bike_rental_networks() {
        return false;
    }

    if a.is_car_parked() != b.is_car_parked() {
        return false;
    }
    if a.is_bike_parked() != b.is_bike_parked() {
        return false;
    }

    if let (Some(va), Some(vb)) = (a.current_vehicle(), b.current_vehicle()) {
        if va.vehicle_type != vb.vehicle_type {
            return false;
        }

        let options = &a.request().config.state_diff;
        if options.differ_range_groups {
            let group_a = options.range_group(a.remaining_range_m());
            let group_b = options.range_group(b.remaining_range_m());

            // Worse range but no worse on weight and time: keep both
            if group_a < group_b
                && a.weight() <= b.weight()
                && a.time_seconds() <= b.time_seconds()
            {
                return false;
            }
            if group_b < group_a
                && b.weight() <= a.weight()
                && b.time_seconds() <= a.time_seconds()
            {
                return false;
            }
        }
    }

    // Arriving from different directions where turn restrictions apply
    if !same_edge(a.back_edge(), b.back_edge())
        && a.back_edge().is_some_and(|e| !e.turn_restrictions().is_empty())
    {
        return false;
    }

    true
}

/// Lower cumulative weight wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumWeight;

impl DominanceFunction for MinimumWeight {
    fn better_or_equal(&self, a: &State, b: &State) -> bool {
        a.weight() <= b.weight()
    }
}

/// Lower elapsed time wins. Branches less than weight-based functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EarliestArrival;

impl DominanceFunction for EarliestArrival {
    fn better_or_equal(&self, a: &State, b: &State) -> bool {
        a.elapsed_secs() <= b.elapsed_secs()
    }
}

/// Lower money spent wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestPrice;

impl DominanceFunction for LowestPrice {
    fn better_or_equal(&self, a: &State, b: &State) -> bool {
        a.traversal_price() <= b.traversal_price()
    }
}

/// Less walking wins.
///
/// Only meaningful for walk-only searches: it ignores time completely.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastWalk;

impl DominanceFunction for LeastWalk {
    fn better_or_equal(&self, a: &State, b: &State) -> bool {
        a.distance_in_walk_m() <= b.distance_in_walk_m()
    }
}

/// Time and weight both count; states that trade one for the other coexist.
///
/// Time and weight are correlated, so near-identical states would pile up.
/// The first state gets a little slack so it beats near-duplicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pareto;

impl Pareto {
    pub const EPSILON: f64 = 1e-4;
}

impl DominanceFunction for Pareto {
    fn better_or_equal(&self, a: &State, b: &State) -> bool {
        (a.elapsed_secs() as f64) <= b.elapsed_secs() as f64 + Self::EPSILON
            && a.weight() <= b.weight() + Self::EPSILON
    }
}

/// Selects one of the provided dominance functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DominanceKind {
    #[default]
    MinimumWeight,
    EarliestArrival,
    LowestPrice,
    LeastWalk,
    Pareto,
}

impl DominanceKind {
    pub fn function(self) -> &'static dyn DominanceFunction {
        match self {
            DominanceKind::MinimumWeight => &MinimumWeight,
            DominanceKind::EarliestArrival => &EarliestArrival,
            DominanceKind::LowestPrice => &LowestPrice,
            DominanceKind::LeastWalk => &LeastWalk,
            DominanceKind::Pareto => &Pareto,
        }
    }

    /// Whether the search frontier is ordered by weight.
    pub fn orders_by_weight(self) -> bool {
        matches!(self, DominanceKind::MinimumWeight | DominanceKind::Pareto)
    }
}
