//! Search states.
//!
//! A state is the result of arriving at a vertex along one particular path.
//! States are immutable once built and point back to the state they were
//! derived from, so every state is also the head of a path to the origin.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::domain::{TraverseMode, VehicleDescription};
use crate::graph::{Edge, VertexId};

use super::request::RoutingRequest;

#[derive(Clone)]
pub struct State {
    vertex: VertexId,
    weight: f64,
    elapsed_secs: i64,
    distance_in_walk_m: f64,
    traversal_price: f64,
    /// Distance driven in the current rented vehicle.
    vehicle_distance_m: f64,
    non_transit_mode: TraverseMode,
    ever_boarded: bool,
    bike_renting: bool,
    bike_rental_networks: Option<BTreeSet<String>>,
    car_parked: bool,
    bike_parked: bool,
    current_vehicle: Option<Arc<VehicleDescription>>,
    back_edge: Option<Arc<Edge>>,
    back_state: Option<Arc<State>>,
    request: Arc<RoutingRequest>,
}

impl State {
    /// The state a search starts from.
    pub fn origin(request: Arc<RoutingRequest>) -> Self {
        Self {
            vertex: request.origin,
            weight: 0.0,
            elapsed_secs: 0,
            distance_in_walk_m: 0.0,
            traversal_price: 0.0,
            vehicle_distance_m: 0.0,
            non_transit_mode: request.modes.initial_mode(),
            ever_boarded: false,
            bike_renting: false,
            bike_rental_networks: None,
            car_parked: false,
            bike_parked: false,
            current_vehicle: None,
            back_edge: None,
            back_state: None,
            request,
        }
    }

    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Generalized cost.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn elapsed_secs(&self) -> i64 {
        self.elapsed_secs
    }

    /// Absolute time as seconds since the epoch.
    pub fn time_seconds(&self) -> i64 {
        self.request.departure.timestamp() + self.elapsed_secs
    }

    pub fn distance_in_walk_m(&self) -> f64 {
        self.distance_in_walk_m
    }

    /// Money spent so far.
    pub fn traversal_price(&self) -> f64 {
        self.traversal_price
    }

    pub fn vehicle_distance_m(&self) -> f64 {
        self.vehicle_distance_m
    }

    /// The street mode currently in use.
    pub fn non_transit_mode(&self) -> TraverseMode {
        self.non_transit_mode
    }

    pub fn is_ever_boarded(&self) -> bool {
        self.ever_boarded
    }

    pub fn is_bike_renting(&self) -> bool {
        self.bike_renting
    }

    pub fn bike_rental_networks(&self) -> Option<&BTreeSet<String>> {
        self.bike_rental_networks.as_ref()
    }

    pub fn is_car_parked(&self) -> bool {
        self.car_parked
    }

    pub fn is_bike_parked(&self) -> bool {
        self.bike_parked
    }

    /// The rented vehicle in use, if any.
    pub fn current_vehicle(&self) -> Option<&Arc<VehicleDescription>> {
        self.current_vehicle.as_ref()
    }

    /// Range left in the rented vehicle, if it reports one.
    pub fn remaining_range_m(&self) -> Option<f64> {
        let vehicle = self.current_vehicle.as_ref()?;
        vehicle
            .range_in_meters
            .map(|range| range - self.vehicle_distance_m)
    }

    /// The edge traversed to reach this state.
    pub fn back_edge(&self) -> Option<&Arc<Edge>> {
        self.back_edge.as_ref()
    }

    pub fn back_state(&self) -> Option<&Arc<State>> {
        self.back_state.as_ref()
    }

    pub fn request(&self) -> &RoutingRequest {
        &self.request
    }

    /// Whether a trip may end in this state: nothing rented is still in hand.
    pub fn is_final(&self) -> bool {
        self.current_vehicle.is_none() && !self.bike_renting
    }

    /// Start deriving a successor state across `edge`.
    pub fn edit(self: &Arc<Self>, edge: &Arc<Edge>) -> StateEditor {
        let mut child = State::clone(self);
        child.vertex = edge.to();
        child.back_edge = Some(edge.clone());
        child.back_state = Some(self.clone());
        StateEditor { child }
    }
}

impl fmt::Debug for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("vertex", &self.vertex)
            .field("weight", &self.weight)
            .field("elapsed_secs", &self.elapsed_secs)
            .field("mode", &self.non_transit_mode)
            .field("ever_boarded", &self.ever_boarded)
            .field("vehicle", &self.current_vehicle.as_ref().map(|v| &v.provider_vehicle_id))
            .field("back_edge", &self.back_edge.as_ref().map(|e| e.id()))
            .finish()
    }
}

/// Mutable builder for a successor state.
pub struct StateEditor {
    child: State,
}

impl StateEditor {
    pub fn increment_weight(&mut self, weight: f64) -> &mut Self {
        self.child.weight += weight;
        self
    }

    pub fn increment_time(&mut self, secs: i64) -> &mut Self {
        self.child.elapsed_secs += secs;
        self
    }

    pub fn increment_walk_distance(&mut self, meters: f64) -> &mut Self {
        self.child.distance_in_walk_m += meters;
        self
    }

    pub fn increment_price(&mut self, price: f64) -> &mut Self {
        self.child.traversal_price += price;
        self
    }

    pub fn increment_vehicle_distance(&mut self, meters: f64) -> &mut Self {
        self.child.vehicle_distance_m += meters;
        self
    }

    pub fn set_ever_boarded(&mut self) -> &mut Self {
        self.child.ever_boarded = true;
        self
    }

    pub fn begin_vehicle_rental(&mut self, vehicle: Arc<VehicleDescription>) -> &mut Self {
        self.child.non_transit_mode = vehicle.traverse_mode();
        self.child.vehicle_distance_m = 0.0;
        self.child.current_vehicle = Some(vehicle);
        self
    }

    pub fn end_vehicle_rental(&mut self) -> &mut Self {
        self.child.current_vehicle = None;
        self.child.vehicle_distance_m = 0.0;
        self.child.non_transit_mode = TraverseMode::Walk;
        self
    }

    pub fn begin_bike_rental(&mut self, networks: BTreeSet<String>) -> &mut Self {
        self.child.bike_renting = true;
        self.child.bike_rental_networks = Some(networks);
        self.child.non_transit_mode = TraverseMode::Bicycle;
        self
    }

    pub fn end_bike_rental(&mut self) -> &mut Self {
        self.child.bike_renting = false;
        self.child.bike_rental_networks = None;
        self.child.non_transit_mode = TraverseMode::Walk;
        self
    }

    pub fn park_car(&mut self) -> &mut Self {
        self.child.car_parked = true;
        self.child.non_transit_mode = TraverseMode::Walk;
        self
    }

    pub fn park_bike(&mut self) -> &mut Self {
        self.child.bike_parked = true;
        self.child.non_transit_mode = TraverseMode::Walk;
        self
    }

    /// Finish the state. Returns `None` if the accumulated cost is invalid.
    pub fn make_state(self) -> Option<State> {
        let s = &self.child;
        if !s.weight.is_finite() || s.weight < 0.0 || s.elapsed_secs < 0 {
            return None;
        }
        Some(self.child)
    }
}
