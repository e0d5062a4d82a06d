//! Routing requests.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::domain::{TraverseModeSet, VehicleType};
use crate::graph::{Graph, VertexId};

use super::config::SearchConfig;
use super::error::RoutingError;

/// Top speed of any rentable vehicle, used to bound the A* heuristic.
const MAX_RENTED_VEHICLE_SPEED_MPS: f64 = 25.0;

/// A request for a shortest path tree.
#[derive(Debug, Clone)]
pub struct RoutingRequest {
    /// Where the search starts.
    pub origin: VertexId,

    /// Where the search may stop early. `None` builds a full tree.
    pub destination: Option<VertexId>,

    /// Modes the trip may use.
    pub modes: TraverseModeSet,

    pub departure: DateTime<Utc>,

    /// Bike networks whose bikes may be rented. `None` allows all.
    pub allowed_bike_networks: Option<BTreeSet<String>>,

    /// Shared vehicle types that may be rented. `None` allows all.
    pub allowed_vehicle_types: Option<BTreeSet<VehicleType>>,

    pub config: SearchConfig,
}

impl RoutingRequest {
    /// Create a request departing now with the default configuration.
    pub fn new(origin: VertexId, destination: Option<VertexId>, modes: TraverseModeSet) -> Self {
        Self {
            origin,
            destination,
            modes,
            departure: Utc::now(),
            allowed_bike_networks: None,
            allowed_vehicle_types: None,
            config: SearchConfig::default(),
        }
    }

    pub fn with_departure(mut self, departure: DateTime<Utc>) -> Self {
        self.departure = departure;
        self
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_allowed_vehicle_types(mut self, types: impl IntoIterator<Item = VehicleType>) -> Self {
        self.allowed_vehicle_types = Some(types.into_iter().collect());
        self
    }

    pub fn with_allowed_bike_networks(
        mut self,
        networks: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.allowed_bike_networks = Some(networks.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a shared vehicle of this type may be rented.
    pub fn allows_vehicle_type(&self, vehicle_type: VehicleType) -> bool {
        self.modes.rent
            && self
                .allowed_vehicle_types
                .as_ref()
                .is_none_or(|types| types.contains(&vehicle_type))
    }

    /// The bike networks usable at a station, or `None` if none of them are.
    pub fn usable_bike_networks(&self, station: &BTreeSet<String>) -> Option<BTreeSet<String>> {
        if !self.modes.rent {
            return None;
        }
        let usable: BTreeSet<String> = match &self.allowed_bike_networks {
            Some(allowed) => station.intersection(allowed).cloned().collect(),
            None => station.clone(),
        };
        (!usable.is_empty()).then_some(usable)
    }

    /// Check the request against the graph it will run on.
    pub fn validate(&self, graph: &Graph) -> Result<(), RoutingError> {
        let mut missing = Vec::new();
        if graph.vertex(self.origin).is_none() {
            missing.push(format!("origin {}", self.origin));
        }
        if let Some(destination) = self.destination
            && graph.vertex(destination).is_none()
        {
            missing.push(format!("destination {destination}"));
        }
        if !missing.is_empty() {
            return Err(RoutingError::VertexNotFound { missing });
        }

        if self.destination == Some(self.origin) {
            return Err(RoutingError::TrivialPath);
        }

        let config = &self.config;
        for (name, speed) in [
            ("walk", config.walk_speed_mps),
            ("bike", config.bike_speed_mps),
            ("car", config.car_speed_mps),
        ] {
            if speed.is_nan() || speed <= 0.0 {
                return Err(RoutingError::BogusParameter(format!(
                    "{name} speed must be positive"
                )));
            }
        }
        if config.walk_reluctance.is_nan() || config.walk_reluctance <= 0.0 {
            return Err(RoutingError::BogusParameter(
                "walk reluctance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The fastest the traveller can move on streets, for the A* heuristic.
    ///
    /// `None` when transit is allowed, since transit legs carry no speed bound.
    pub fn max_street_speed_mps(&self) -> Option<f64> {
        if self.modes.transit {
            return None;
        }
        let config = &self.config;
        let mut speed = config.walk_speed_mps;
        if self.modes.bicycle {
            speed = speed.max(config.bike_speed_mps);
        }
        if self.modes.car {
            speed = speed.max(config.car_speed_mps);
        }
        if self.modes.rent {
            speed = speed
                .max(config.bike_speed_mps)
                .max(MAX_RENTED_VEHICLE_SPEED_MPS);
        }
        Some(speed)
    }

    /// The smallest weight one second of travel can add.
    pub fn min_weight_per_second(&self) -> f64 {
        self.config.walk_reluctance.min(1.0)
    }
}
