//! Search configuration for the router.

use std::time::Duration;

use serde::Deserialize;

use super::dominance::DominanceKind;

/// Options that split states into separate dominance planes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RoutingStateDiffOptions {
    /// Keep states with rented vehicles of different remaining range apart.
    pub differ_range_groups: bool,

    /// Remaining-range boundaries between groups (meters, ascending).
    pub range_group_thresholds_m: Vec<f64>,
}

impl RoutingStateDiffOptions {
    /// The range group of a vehicle with the given remaining range.
    ///
    /// Higher is better. A vehicle with unknown range falls in the best group.
    pub fn range_group(&self, remaining_range_m: Option<f64>) -> usize {
        match remaining_range_m {
            Some(remaining) => self
                .range_group_thresholds_m
                .iter()
                .filter(|&&threshold| remaining >= threshold)
                .count(),
            None => self.range_group_thresholds_m.len(),
        }
    }
}

impl Default for RoutingStateDiffOptions {
    fn default() -> Self {
        Self {
            differ_range_groups: false,
            range_group_thresholds_m: vec![5_000.0, 15_000.0, 50_000.0],
        }
    }
}

/// Configuration parameters for path search.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Walking speed (m/s).
    pub walk_speed_mps: f64,

    /// Cycling speed on an owned or rented bike (m/s).
    pub bike_speed_mps: f64,

    /// Driving speed in an owned car (m/s).
    pub car_speed_mps: f64,

    /// Multiplier applied to the weight of walking time.
    pub walk_reluctance: f64,

    /// Extra weight for every boarding (seconds).
    pub board_cost_secs: i64,

    /// Stop after expanding this many states.
    pub max_explored_states: usize,

    /// Wall-clock budget for one search (milliseconds).
    pub timeout_ms: u64,

    /// States taking longer than this are not kept (seconds).
    pub max_duration_secs: Option<i64>,

    /// States heavier than this are not kept.
    pub max_weight: Option<f64>,

    /// Which states prune which at the same vertex.
    pub dominance: DominanceKind,

    pub state_diff: RoutingStateDiffOptions,

    /// Named optimization profile; `None` selects the default.
    pub optimization_profile: Option<String>,
}

impl SearchConfig {
    /// Returns the search timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_dominance(mut self, dominance: DominanceKind) -> Self {
        self.dominance = dominance;
        self
    }

    pub fn with_max_explored_states(mut self, max: usize) -> Self {
        self.max_explored_states = max;
        self
    }

    pub fn with_max_duration_secs(mut self, secs: i64) -> Self {
        self.max_duration_secs = Some(secs);
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            walk_speed_mps: 1.33,
            bike_speed_mps: 5.0,
            car_speed_mps: 11.0,
            walk_reluctance: 2.0,
            board_cost_secs: 60,
            max_explored_states: 100_000,
            timeout_ms: 5_000,
            max_duration_secs: None,
            max_weight: None,
            dominance: DominanceKind::MinimumWeight,
            state_diff: RoutingStateDiffOptions::default(),
            optimization_profile: None,
        }
    }
}
