//! Optimization profiles.

use tracing::error;

use super::dominance::{DominanceFunction, DominanceKind};
use super::request::RoutingRequest;

pub const PROFILE_NAME_ORIGINAL: &str = "original";

/// How a search orders and prunes its states.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationProfile {
    pub name: &'static str,
    pub dominance: DominanceKind,
    /// Add a remaining-distance estimate to weight-ordered frontier keys.
    pub use_heuristic: bool,
}

impl OptimizationProfile {
    /// Uses the dominance function named in the request's configuration.
    fn original(request: &RoutingRequest) -> Self {
        Self {
            name: PROFILE_NAME_ORIGINAL,
            dominance: request.config.dominance,
            use_heuristic: true,
        }
    }

    pub fn dominance_function(&self) -> &'static dyn DominanceFunction {
        self.dominance.function()
    }
}

pub struct OptimizationProfileFactory;

impl OptimizationProfileFactory {
    /// Look up a profile by name; `None` selects the original profile.
    ///
    /// Unknown names fall back to the original profile.
    pub fn profile(name: Option<&str>, request: &RoutingRequest) -> OptimizationProfile {
        match name.unwrap_or(PROFILE_NAME_ORIGINAL) {
            PROFILE_NAME_ORIGINAL => OptimizationProfile::original(request),
            other => {
                error!(profile = %other, "optimization profile undefined, returning default profile");
                OptimizationProfile::original(request)
            }
        }
    }
}
