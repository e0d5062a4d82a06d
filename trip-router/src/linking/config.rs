//! Linker configuration.

use serde::Deserialize;

use crate::domain::TraverseMode;

/// Tuning for attaching off-street vertices to the street network.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// How far from the point to look for street edges (meters).
    pub search_radius_m: f64,

    /// A projection this close to an existing street vertex reuses that
    /// vertex instead of splitting (meters).
    pub snap_epsilon_m: f64,

    /// The reverse edge of a two-way street is linked too if it lies
    /// within this distance of the best edge (meters).
    pub duplicate_way_epsilon_m: f64,

    /// Only edges this mode may traverse are candidates.
    pub link_mode: TraverseMode,
}

impl LinkerConfig {
    pub fn new(search_radius_m: f64, snap_epsilon_m: f64, link_mode: TraverseMode) -> Self {
        Self {
            search_radius_m,
            snap_epsilon_m,
            link_mode,
            ..Self::default()
        }
    }
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            search_radius_m: 1000.0,
            snap_epsilon_m: 0.5,
            duplicate_way_epsilon_m: 0.001,
            link_mode: TraverseMode::Walk,
        }
    }
}
