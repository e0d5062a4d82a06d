//! Edge traversal: how each kind of edge turns one state into the next.

use std::sync::Arc;

use crate::domain::TraverseMode;
use crate::graph::{Edge, EdgeKind, StreetSegment, TransitLeg};

use super::state::State;

/// Seconds to unlock a station bike.
const BIKE_RENTAL_PICKUP_SECS: i64 = 60;
/// Seconds to dock a station bike.
const BIKE_RENTAL_DROPOFF_SECS: i64 = 30;
const BIKE_PARK_SECS: i64 = 60;
const CAR_PARK_SECS: i64 = 120;

/// Traverse an edge from a state.
///
/// Returns `None` when the state cannot use the edge.
pub fn traverse(edge: &Arc<Edge>, s0: &Arc<State>) -> Option<State> {
    match edge.kind() {
        EdgeKind::Street(street) => traverse_street(edge, street, s0),
        EdgeKind::StreetLink { length_m } => traverse_link(edge, *length_m, s0),
        EdgeKind::BoardAlight(leg) => ride(edge, leg, s0),
        EdgeKind::TimedTransfer { transfer_secs } => {
            if !s0.is_ever_boarded() {
                return None;
            }
            let mut editor = s0.edit(edge);
            editor
                .increment_time(*transfer_secs)
                .increment_weight(*transfer_secs as f64);
            editor.make_state()
        }
        EdgeKind::SimpleTransfer { distance_m } => {
            if !s0.is_ever_boarded() || !on_foot(s0) {
                return None;
            }
            walk(edge, *distance_m, s0)
        }
        EdgeKind::RentVehicle(vehicle) => {
            let request = s0.request();
            if !on_foot(s0) || !request.allows_vehicle_type(vehicle.vehicle_type) {
                return None;
            }
            let rent_secs = vehicle.vehicle_type.rent_time_secs();
            let mut editor = s0.edit(edge);
            editor
                .begin_vehicle_rental(vehicle.clone())
                .increment_time(rent_secs)
                .increment_weight(rent_secs as f64)
                .increment_price(vehicle.pricing.start_price);
            editor.make_state()
        }
        EdgeKind::RentVehicleAnywhere(zones) => {
            let vehicle = s0.current_vehicle()?;
            if !zones.can_drop_off(vehicle) {
                return None;
            }
            let dropoff_secs = vehicle.vehicle_type.dropoff_time_secs();
            let mut editor = s0.edit(edge);
            editor
                .end_vehicle_rental()
                .increment_time(dropoff_secs)
                .increment_weight(dropoff_secs as f64);
            editor.make_state()
        }
        EdgeKind::RentBike { networks } => {
            if !on_foot(s0) {
                return None;
            }
            let usable = s0.request().usable_bike_networks(networks)?;
            let mut editor = s0.edit(edge);
            editor
                .begin_bike_rental(usable)
                .increment_time(BIKE_RENTAL_PICKUP_SECS)
                .increment_weight(BIKE_RENTAL_PICKUP_SECS as f64);
            editor.make_state()
        }
        EdgeKind::ReturnBike { networks } => {
            let renting = s0.bike_rental_networks()?;
            if !s0.is_bike_renting() || renting.is_disjoint(networks) {
                return None;
            }
            let mut editor = s0.edit(edge);
            editor
                .end_bike_rental()
                .increment_time(BIKE_RENTAL_DROPOFF_SECS)
                .increment_weight(BIKE_RENTAL_DROPOFF_SECS as f64);
            editor.make_state()
        }
        EdgeKind::ParkBike => {
            let owned_bike = s0.non_transit_mode() == TraverseMode::Bicycle
                && !s0.is_bike_renting()
                && s0.current_vehicle().is_none();
            if !owned_bike || s0.is_bike_parked() {
                return None;
            }
            let mut editor = s0.edit(edge);
            editor
                .park_bike()
                .increment_time(BIKE_PARK_SECS)
                .increment_weight(BIKE_PARK_SECS as f64);
            editor.make_state()
        }
        EdgeKind::ParkCar => {
            let owned_car = s0.non_transit_mode() == TraverseMode::Car && s0.current_vehicle().is_none();
            if !owned_car || s0.is_car_parked() {
                return None;
            }
            let mut editor = s0.edit(edge);
            editor
                .park_car()
                .increment_time(CAR_PARK_SECS)
                .increment_weight(CAR_PARK_SECS as f64);
            editor.make_state()
        }
    }
}

/// Walking, with nothing rented and no owned vehicle in use.
fn on_foot(s0: &State) -> bool {
    s0.non_transit_mode() == TraverseMode::Walk
        && s0.current_vehicle().is_none()
        && !s0.is_bike_renting()
}

fn turn_forbidden(edge: &Edge, s0: &State) -> bool {
    s0.back_edge()
        .is_some_and(|back| back.turn_restrictions().contains(&edge.id()))
}

fn traverse_street(edge: &Arc<Edge>, street: &StreetSegment, s0: &Arc<State>) -> Option<State> {
    if turn_forbidden(edge, s0) {
        return None;
    }
    let config = &s0.request().config;
    let length = street.length_m;

    if let Some(vehicle) = s0.current_vehicle() {
        if !vehicle.vehicle_type.can_traverse(street.permission) {
            return None;
        }
        if let Some(range) = vehicle.range_in_meters
            && s0.vehicle_distance_m() + length > range
        {
            return None;
        }
        let secs = length / vehicle.vehicle_type.max_speed_mps(street.permission);
        let mut editor = s0.edit(edge);
        editor
            .increment_time(secs.round() as i64)
            .increment_weight(secs)
            .increment_vehicle_distance(length)
            .increment_price(length / 1000.0 * vehicle.pricing.price_per_km);
        return editor.make_state();
    }

    let mode = s0.non_transit_mode();
    if !street.permission.allows(mode) {
        return None;
    }
    match mode {
        TraverseMode::Walk => walk(edge, length, s0),
        TraverseMode::Bicycle | TraverseMode::Car => {
            let speed = if mode == TraverseMode::Car {
                config.car_speed_mps
            } else {
                config.bike_speed_mps
            };
            let secs = length / speed;
            let mut editor = s0.edit(edge);
            editor.increment_time(secs.round() as i64).increment_weight(secs);
            editor.make_state()
        }
        TraverseMode::Transit => None,
    }
}

/// Connectors between streets and stops, stations or parks.
///
/// Vehicles stay on the street; an owned bike may be wheeled to a bike park
/// or station.
fn traverse_link(edge: &Arc<Edge>, length_m: f64, s0: &Arc<State>) -> Option<State> {
    if s0.current_vehicle().is_some() {
        return None;
    }
    match s0.non_transit_mode() {
        TraverseMode::Walk => walk(edge, length_m, s0),
        TraverseMode::Bicycle => {
            let secs = length_m / s0.request().config.walk_speed_mps;
            let mut editor = s0.edit(edge);
            editor.increment_time(secs.round() as i64).increment_weight(secs);
            editor.make_state()
        }
        TraverseMode::Car => {
            let secs = length_m / s0.request().config.car_speed_mps;
            let mut editor = s0.edit(edge);
            editor.increment_time(secs.round() as i64).increment_weight(secs);
            editor.make_state()
        }
        TraverseMode::Transit => None,
    }
}

fn walk(edge: &Arc<Edge>, meters: f64, s0: &Arc<State>) -> Option<State> {
    let config = &s0.request().config;
    let secs = meters / config.walk_speed_mps;
    let mut editor = s0.edit(edge);
    editor
        .increment_time(secs.round() as i64)
        .increment_weight(secs * config.walk_reluctance)
        .increment_walk_distance(meters);
    editor.make_state()
}

/// Board, wait half a headway on average, ride and alight.
fn ride(edge: &Arc<Edge>, leg: &TransitLeg, s0: &Arc<State>) -> Option<State> {
    let request = s0.request();
    if !request.modes.transit || !on_foot(s0) {
        return None;
    }
    let wait = leg.headway_secs / 2;
    let mut editor = s0.edit(edge);
    editor
        .set_ever_boarded()
        .increment_time(wait + leg.run_secs)
        .increment_weight((wait + leg.run_secs + request.config.board_cost_secs) as f64)
        .increment_price(leg.fare);
    editor.make_state()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Coordinate, ParkingZoneInfo, Provider, SingleParkingZone, StreetTraversalPermission,
        TraverseModeSet, VehicleDescription, VehicleType,
    };
    use crate::graph::{EdgeKind, Graph, VertexId, VertexKind};
    use crate::routing::RoutingRequest;

    struct Fixture {
        graph: Graph,
        a: VertexId,
        b: VertexId,
    }

    fn fixture() -> Fixture {
        let graph = Graph::new();
        let a = graph
            .add_vertex("a", None, Coordinate::new(0.0, 0.0), VertexKind::Intersection)
            .unwrap()
            .id();
        let b = graph
            .add_vertex("b", None, Coordinate::new(0.001, 0.0), VertexKind::Intersection)
            .unwrap()
            .id();
        Fixture { graph, a, b }
    }

    fn street(f: &Fixture, permission: StreetTraversalPermission, length_m: f64) -> Arc<Edge> {
        let a = f.graph.vertex(f.a).unwrap();
        let b = f.graph.vertex(f.b).unwrap();
        f.graph
            .add_edge(
                f.a,
                f.b,
                EdgeKind::Street(
                    StreetSegment::new("s", vec![a.coordinate(), b.coordinate()], permission)
                        .with_length(length_m),
                ),
            )
            .unwrap()
    }

    fn origin(f: &Fixture, modes: TraverseModeSet) -> Arc<State> {
        Arc::new(State::origin(Arc::new(RoutingRequest::new(f.a, None, modes))))
    }

    fn scooter(provider: i32) -> Arc<VehicleDescription> {
        Arc::new(
            VehicleDescription::new(
                "sc",
                Coordinate::new(0.0, 0.0),
                VehicleType::KickScooter,
                Provider {
                    id: provider,
                    name: "p".into(),
                },
            )
            .with_range(500.0),
        )
    }

    #[test]
    fn walking_a_street() {
        let f = fixture();
        let e = street(&f, StreetTraversalPermission::PEDESTRIAN, 133.0);
        let s1 = traverse(&e, &origin(&f, TraverseModeSet::walk_only())).unwrap();
        assert_eq!(s1.elapsed_secs(), 100);
        assert!((s1.weight() - 200.0).abs() < 1e-9);
        assert_eq!(s1.distance_in_walk_m(), 133.0);
        assert_eq!(s1.vertex(), f.b);
    }

    #[test]
    fn permissions_are_enforced() {
        let f = fixture();
        let e = street(&f, StreetTraversalPermission::CAR, 100.0);
        assert!(traverse(&e, &origin(&f, TraverseModeSet::walk_only())).is_none());
        let car = origin(&f, TraverseModeSet::walk_only().with_car());
        let s1 = traverse(&e, &car).unwrap();
        assert_eq!(s1.non_transit_mode(), TraverseMode::Car);
        assert_eq!(s1.distance_in_walk_m(), 0.0);
    }

    #[test]
    fn turn_restrictions_block_the_forbidden_successor() {
        let f = fixture();
        let next = street(&f, StreetTraversalPermission::ALL, 10.0);
        let a = f.graph.vertex(f.a).unwrap();
        let b = f.graph.vertex(f.b).unwrap();
        let restricted = f
            .graph
            .add_edge(
                f.b,
                f.a,
                EdgeKind::Street(
                    StreetSegment::new(
                        "r",
                        vec![b.coordinate(), a.coordinate()],
                        StreetTraversalPermission::ALL,
                    )
                    .with_turn_restriction(next.id()),
                ),
            )
            .unwrap();

        let s0 = origin(&f, TraverseModeSet::walk_only());
        // Reach a via the restricted edge, then try the forbidden one
        let at_b = Arc::new(traverse(&next, &s0).unwrap());
        let at_a = Arc::new(traverse(&restricted, &at_b).unwrap());
        assert!(traverse(&next, &at_a).is_none());
        assert!(traverse(&next, &s0).is_some());
    }

    #[test]
    fn rent_ride_and_drop_a_vehicle() {
        let f = fixture();
        let rent = f
            .graph
            .add_edge(f.a, f.a, EdgeKind::RentVehicle(scooter(1)))
            .unwrap();
        let e = street(&f, StreetTraversalPermission::PEDESTRIAN_AND_BICYCLE, 400.0);
        let drop = f
            .graph
            .add_edge(
                f.b,
                f.b,
                EdgeKind::RentVehicleAnywhere(ParkingZoneInfo::unrestricted()),
            )
            .unwrap();

        let walker = origin(&f, TraverseModeSet::walk_only());
        assert!(traverse(&rent, &walker).is_none(), "renting not requested");

        let s0 = origin(&f, TraverseModeSet::walk_only().with_rent());
        // Nothing to drop yet
        assert!(traverse(&drop, &s0).is_none());

        let renting = Arc::new(traverse(&rent, &s0).unwrap());
        assert_eq!(renting.elapsed_secs(), 30);
        assert!(traverse(&rent, &renting).is_none(), "already renting");

        let moved = Arc::new(traverse(&e, &renting).unwrap());
        assert_eq!(moved.elapsed_secs(), 30 + 50);
        assert_eq!(moved.vehicle_distance_m(), 400.0);
        assert_eq!(moved.distance_in_walk_m(), 0.0);

        let dropped = traverse(&drop, &moved).unwrap();
        assert!(dropped.is_final());
        assert_eq!(dropped.elapsed_secs(), 30 + 50 + 30);
    }

    #[test]
    fn range_limits_vehicle_travel() {
        let f = fixture();
        let rent = f
            .graph
            .add_edge(f.a, f.a, EdgeKind::RentVehicle(scooter(1)))
            .unwrap();
        let long = street(&f, StreetTraversalPermission::ALL, 600.0);
        let s0 = origin(&f, TraverseModeSet::walk_only().with_rent());
        let renting = Arc::new(traverse(&rent, &s0).unwrap());
        assert!(traverse(&long, &renting).is_none());
    }

    #[test]
    fn parking_zones_restrict_drop_off() {
        let f = fixture();
        let rent = f
            .graph
            .add_edge(f.a, f.a, EdgeKind::RentVehicle(scooter(1)))
            .unwrap();
        let key = SingleParkingZone::new(1, VehicleType::KickScooter);
        let forbidden = f
            .graph
            .add_edge(
                f.a,
                f.a,
                EdgeKind::RentVehicleAnywhere(ParkingZoneInfo::new(
                    Vec::new(),
                    Arc::new(vec![key]),
                )),
            )
            .unwrap();
        let allowed = f
            .graph
            .add_edge(
                f.a,
                f.a,
                EdgeKind::RentVehicleAnywhere(ParkingZoneInfo::new(vec![key], Arc::new(vec![key]))),
            )
            .unwrap();

        let s0 = origin(&f, TraverseModeSet::walk_only().with_rent());
        let renting = Arc::new(traverse(&rent, &s0).unwrap());
        assert!(traverse(&forbidden, &renting).is_none());
        assert!(traverse(&allowed, &renting).is_some());
    }

    #[test]
    fn transit_requires_transit_mode_and_walking() {
        let graph = Graph::new();
        let stop = |label: &str| {
            graph
                .add_vertex(
                    label,
                    None,
                    Coordinate::new(0.0, 0.0),
                    VertexKind::TransitStop {
                        stop_id: label.into(),
                    },
                )
                .unwrap()
                .id()
        };
        let (s1, s2) = (stop("s1"), stop("s2"));
        let leg = graph
            .add_edge(
                s1,
                s2,
                EdgeKind::BoardAlight(TransitLeg {
                    route: "10".into(),
                    run_secs: 300,
                    headway_secs: 600,
                    fare: 2.5,
                }),
            )
            .unwrap();
        let walk_only = Arc::new(State::origin(Arc::new(RoutingRequest::new(
            s1,
            None,
            TraverseModeSet::walk_only(),
        ))));
        assert!(traverse(&leg, &walk_only).is_none());

        let s0 = Arc::new(State::origin(Arc::new(RoutingRequest::new(
            s1,
            None,
            TraverseModeSet::walk_only().with_transit(),
        ))));
        let rode = traverse(&leg, &s0).unwrap();
        assert!(rode.is_ever_boarded());
        assert_eq!(rode.elapsed_secs(), 600);
        assert_eq!(rode.weight(), 660.0);
        assert_eq!(rode.traversal_price(), 2.5);
    }

    #[test]
    fn owned_car_must_park_before_walking_off() {
        let graph = Graph::new();
        let street_v = graph
            .add_vertex("st", None, Coordinate::new(0.0, 0.0), VertexKind::Intersection)
            .unwrap()
            .id();
        let park = graph
            .add_vertex("park", None, Coordinate::new(0.0, 0.0), VertexKind::CarPark)
            .unwrap()
            .id();
        let link = graph
            .add_edge(street_v, park, EdgeKind::StreetLink { length_m: 11.0 })
            .unwrap();
        let park_edge = graph.add_edge(park, park, EdgeKind::ParkCar).unwrap();

        let s0 = Arc::new(State::origin(Arc::new(RoutingRequest::new(
            street_v,
            None,
            TraverseModeSet::walk_only().with_car(),
        ))));
        let at_park = Arc::new(traverse(&link, &s0).unwrap());
        let parked = traverse(&park_edge, &at_park).unwrap();
        assert!(parked.is_car_parked());
        assert_eq!(parked.non_transit_mode(), TraverseMode::Walk);

        let parked = Arc::new(parked);
        assert!(traverse(&park_edge, &parked).is_none());
    }

    #[test]
    fn bike_rental_networks() {
        let graph = Graph::new();
        let networks: std::collections::BTreeSet<String> = ["city".to_string()].into();
        let station = graph
            .add_vertex(
                "bikes",
                None,
                Coordinate::new(0.0, 0.0),
                VertexKind::BikeRentalStation {
                    networks: networks.clone(),
                },
            )
            .unwrap()
            .id();
        let rent = graph
            .add_edge(
                station,
                station,
                EdgeKind::RentBike {
                    networks: networks.clone(),
                },
            )
            .unwrap();
        let other: std::collections::BTreeSet<String> = ["other".to_string()].into();
        let wrong_return = graph
            .add_edge(station, station, EdgeKind::ReturnBike { networks: other })
            .unwrap();
        let ret = graph
            .add_edge(station, station, EdgeKind::ReturnBike { networks })
            .unwrap();

        let s0 = Arc::new(State::origin(Arc::new(RoutingRequest::new(
            station,
            None,
            TraverseModeSet::walk_only().with_rent(),
        ))));
        let renting = Arc::new(traverse(&rent, &s0).unwrap());
        assert!(renting.is_bike_renting());
        assert_eq!(renting.non_transit_mode(), TraverseMode::Bicycle);
        assert!(traverse(&wrong_return, &renting).is_none());
        let returned = traverse(&ret, &renting).unwrap();
        assert!(!returned.is_bike_renting());
        assert!(returned.is_final());
    }
}
