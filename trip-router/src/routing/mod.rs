//! Path search over the live graph.
//!
//! A search grows a [`ShortestPathTree`] from the origin. Every vertex may
//! hold several states at once (one per combination of rental, parking and
//! boarding status, or per Pareto trade-off) and a [`DominanceFunction`]
//! decides which of them survive.

mod config;
mod dominance;
mod error;
mod path;
mod profile;
mod request;
mod search;
mod spt;
mod state;
mod traverse;

#[cfg(test)]
mod search_tests;

pub use config::{RoutingStateDiffOptions, SearchConfig};
pub use dominance::{
    DominanceFunction, DominanceKind, EarliestArrival, LeastWalk, LowestPrice, MinimumWeight,
    Pareto, comparable,
};
pub use error::RoutingError;
pub use path::GraphPath;
pub use profile::{OptimizationProfile, OptimizationProfileFactory, PROFILE_NAME_ORIGINAL};
pub use request::RoutingRequest;
pub use search::Router;
pub use spt::{ShortestPathTree, Termination};
pub use state::{State, StateEditor};
pub use traverse::traverse;
