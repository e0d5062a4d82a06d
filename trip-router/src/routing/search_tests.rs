//! Unit tests for the multi-state search.

use super::*;
use crate::domain::{
    Coordinate, ParkingZoneInfo, Provider, StreetTraversalPermission, TraverseModeSet,
    VehicleDescription, VehiclePricing, VehicleType,
};
use crate::graph::{EdgeKind, EdgeTag, Graph, StreetSegment, TransitLeg, VertexId, VertexKind};
use std::collections::BTreeSet;
use std::sync::Arc;

fn vertex(graph: &Graph, label: &str, lon: f64, lat: f64, kind: VertexKind) -> VertexId {
    graph
        .add_vertex(label, None, Coordinate::new(lon, lat), kind)
        .unwrap()
        .id()
}

fn corner(graph: &Graph, label: &str, lon: f64) -> VertexId {
    vertex(graph, label, lon, 0.0, VertexKind::Intersection)
}

fn street(graph: &Graph, a: VertexId, b: VertexId, permission: StreetTraversalPermission) {
    let ca = graph.vertex(a).unwrap().coordinate();
    let cb = graph.vertex(b).unwrap().coordinate();
    graph
        .add_edge(
            a,
            b,
            EdgeKind::Street(StreetSegment::new("s", vec![ca, cb], permission)),
        )
        .unwrap();
    graph
        .add_edge(
            b,
            a,
            EdgeKind::Street(StreetSegment::new("s", vec![cb, ca], permission)),
        )
        .unwrap();
}

fn link(graph: &Graph, street_vertex: VertexId, other: VertexId) {
    let length_m = graph
        .vertex(street_vertex)
        .unwrap()
        .coordinate()
        .distance_to(&graph.vertex(other).unwrap().coordinate());
    graph
        .add_edge(street_vertex, other, EdgeKind::StreetLink { length_m })
        .unwrap();
    graph
        .add_edge(other, street_vertex, EdgeKind::StreetLink { length_m })
        .unwrap();
}

fn tags(path: &GraphPath) -> Vec<EdgeTag> {
    path.edges().iter().map(|e| e.tag()).collect()
}

#[test]
fn walks_along_a_chain() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.001);
    let c = corner(&graph, "c", 0.002);
    street(&graph, a, b, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, b, c, StreetTraversalPermission::PEDESTRIAN);

    let router = Router::new(&graph);
    let path = router
        .plan(RoutingRequest::new(a, Some(c), TraverseModeSet::walk_only()))
        .unwrap();

    assert_eq!(path.vertices(), vec![a, b, c]);
    assert!(path.walk_distance_m() > 220.0 && path.walk_distance_m() < 225.0);
    assert!(path.states().iter().all(|s| s.is_final()));
}

#[test]
fn full_tree_without_destination() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.001);
    let c = corner(&graph, "c", 0.002);
    let island = corner(&graph, "island", 0.5);
    street(&graph, a, b, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, b, c, StreetTraversalPermission::PEDESTRIAN);

    let router = Router::new(&graph);
    let request = Arc::new(RoutingRequest::new(a, None, TraverseModeSet::walk_only()));
    let spt = router.get_new_shortest_path_tree(request).unwrap();

    assert_eq!(spt.termination(), Termination::FrontierExhausted);
    assert!(spt.is_reached(a));
    assert!(spt.is_reached(b));
    assert!(spt.is_reached(c));
    assert!(!spt.is_reached(island));
    assert_eq!(spt.vertex_count(), 3);
    assert!(spt.best_state_at(c).unwrap().weight() > spt.best_state_at(b).unwrap().weight());
}

#[test]
fn rents_a_car_across_a_motorway() {
    // a --foot-- b ==car== c --foot-- d
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.001);
    let c = corner(&graph, "c", 0.011);
    let d = corner(&graph, "d", 0.012);
    street(&graph, a, b, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, b, c, StreetTraversalPermission::CAR);
    street(&graph, c, d, StreetTraversalPermission::PEDESTRIAN);

    let car = VehicleDescription::new(
        "car-1",
        Coordinate::new(0.001, 0.0),
        VehicleType::Car,
        Provider {
            id: 7,
            name: "Cars".into(),
        },
    )
    .with_pricing(VehiclePricing {
        start_price: 2.0,
        price_per_km: 1.0,
    });
    graph
        .add_edge(b, b, EdgeKind::RentVehicle(Arc::new(car)))
        .unwrap();
    graph
        .add_edge(c, c, EdgeKind::RentVehicleAnywhere(ParkingZoneInfo::unrestricted()))
        .unwrap();

    let router = Router::new(&graph);

    let walking = router.plan(RoutingRequest::new(a, Some(d), TraverseModeSet::walk_only()));
    assert!(matches!(walking, Err(RoutingError::PathNotFound)));

    let path = router
        .plan(RoutingRequest::new(a, Some(d), TraverseModeSet::walk_only().with_rent()))
        .unwrap();
    assert_eq!(
        tags(&path),
        vec![
            EdgeTag::Street,
            EdgeTag::RentVehicle,
            EdgeTag::Street,
            EdgeTag::RentVehicleAnywhere,
            EdgeTag::Street,
        ]
    );
    assert_eq!(path.end_vertex(), d);
    assert!(path.price() > 3.0 && path.price() < 3.2);
    assert!(path.states().last().unwrap().current_vehicle().is_none());
}

#[test]
fn vehicle_type_filter_blocks_rental() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.01);
    street(&graph, a, b, StreetTraversalPermission::CAR);
    let scooter = VehicleDescription::new(
        "sc-1",
        Coordinate::new(0.0, 0.0),
        VehicleType::Motorbike,
        Provider {
            id: 1,
            name: "Mopeds".into(),
        },
    );
    graph
        .add_edge(a, a, EdgeKind::RentVehicle(Arc::new(scooter)))
        .unwrap();
    graph
        .add_edge(b, b, EdgeKind::RentVehicleAnywhere(ParkingZoneInfo::unrestricted()))
        .unwrap();

    let router = Router::new(&graph);
    let modes = TraverseModeSet::walk_only().with_rent();
    assert!(router.plan(RoutingRequest::new(a, Some(b), modes)).is_ok());

    let request =
        RoutingRequest::new(a, Some(b), modes).with_allowed_vehicle_types([VehicleType::Car]);
    assert!(matches!(router.plan(request), Err(RoutingError::PathNotFound)));
}

#[test]
fn transit_beats_a_long_walk() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let c = corner(&graph, "c", 0.05);
    street(&graph, a, c, StreetTraversalPermission::PEDESTRIAN);
    let stop = |label: &str, lon: f64| {
        vertex(
            &graph,
            label,
            lon,
            0.0001,
            VertexKind::TransitStop {
                stop_id: label.to_string(),
            },
        )
    };
    let s1 = stop("s1", 0.0);
    let s2 = stop("s2", 0.05);
    link(&graph, a, s1);
    link(&graph, c, s2);
    graph
        .add_edge(
            s1,
            s2,
            EdgeKind::BoardAlight(TransitLeg {
                route: "1".into(),
                run_secs: 300,
                headway_secs: 600,
                fare: 2.5,
            }),
        )
        .unwrap();

    let router = Router::new(&graph);

    let walk = router
        .plan(RoutingRequest::new(a, Some(c), TraverseModeSet::walk_only()))
        .unwrap();
    assert_eq!(tags(&walk), vec![EdgeTag::Street]);

    let ride = router
        .plan(RoutingRequest::new(a, Some(c), TraverseModeSet::walk_only().with_transit()))
        .unwrap();
    assert_eq!(
        tags(&ride),
        vec![EdgeTag::StreetLink, EdgeTag::BoardAlight, EdgeTag::StreetLink]
    );
    assert!(ride.weight() < walk.weight());
    assert_eq!(ride.price(), 2.5);
    assert!(ride.states().last().unwrap().is_ever_boarded());
}

#[test]
fn rents_and_returns_a_station_bike() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let c = corner(&graph, "c", 0.01);
    street(&graph, a, c, StreetTraversalPermission::PEDESTRIAN_AND_BICYCLE);
    let networks: BTreeSet<String> = ["city".to_string()].into();
    let station = |label: &str, lon: f64| {
        let id = vertex(
            &graph,
            label,
            lon,
            0.0001,
            VertexKind::BikeRentalStation {
                networks: networks.clone(),
            },
        );
        graph
            .add_edge(
                id,
                id,
                EdgeKind::RentBike {
                    networks: networks.clone(),
                },
            )
            .unwrap();
        graph
            .add_edge(
                id,
                id,
                EdgeKind::ReturnBike {
                    networks: networks.clone(),
                },
            )
            .unwrap();
        id
    };
    let st1 = station("st1", 0.0);
    let st2 = station("st2", 0.01);
    link(&graph, a, st1);
    link(&graph, c, st2);

    let router = Router::new(&graph);
    let path = router
        .plan(RoutingRequest::new(a, Some(st2), TraverseModeSet::walk_only().with_rent()))
        .unwrap();
    assert_eq!(
        tags(&path),
        vec![
            EdgeTag::StreetLink,
            EdgeTag::RentBike,
            EdgeTag::StreetLink,
            EdgeTag::Street,
            EdgeTag::StreetLink,
            EdgeTag::ReturnBike,
        ]
    );

    // Bikes of another network are off limits
    let request = RoutingRequest::new(a, Some(st2), TraverseModeSet::walk_only().with_rent())
        .with_allowed_bike_networks(["other".to_string()]);
    let path = router.plan(request).unwrap();
    assert_eq!(tags(&path), vec![EdgeTag::Street, EdgeTag::StreetLink]);
}

#[test]
fn origin_without_edges_is_not_accessible() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.001);
    let c = corner(&graph, "c", 0.002);
    street(&graph, b, c, StreetTraversalPermission::PEDESTRIAN);

    let router = Router::new(&graph);
    let request = Arc::new(RoutingRequest::new(a, Some(c), TraverseModeSet::walk_only()));
    let spt = router.get_new_shortest_path_tree(request).unwrap();
    assert_eq!(spt.termination(), Termination::OriginUnlinked);
    assert_eq!(spt.state_count(), 0);

    let err = router
        .plan(RoutingRequest::new(a, Some(c), TraverseModeSet::walk_only()))
        .unwrap_err();
    assert!(matches!(err, RoutingError::LocationNotAccessible(v) if v == a));
}

#[test]
fn disconnected_destination_is_not_found() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.001);
    let c = corner(&graph, "c", 0.5);
    let d = corner(&graph, "d", 0.501);
    street(&graph, a, b, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, c, d, StreetTraversalPermission::PEDESTRIAN);

    let router = Router::new(&graph);
    let err = router
        .plan(RoutingRequest::new(a, Some(d), TraverseModeSet::walk_only()))
        .unwrap_err();
    assert!(matches!(err, RoutingError::PathNotFound));
}

#[test]
fn state_limit_stops_the_search() {
    let graph = Graph::new();
    let ids: Vec<_> = (0..6)
        .map(|i| corner(&graph, &format!("v{i}"), 0.001 * i as f64))
        .collect();
    for pair in ids.windows(2) {
        street(&graph, pair[0], pair[1], StreetTraversalPermission::PEDESTRIAN);
    }

    let router = Router::new(&graph);
    let config = SearchConfig::default().with_max_explored_states(1);
    let request = Arc::new(
        RoutingRequest::new(ids[0], Some(ids[5]), TraverseModeSet::walk_only()).with_config(config),
    );
    let spt = router.get_new_shortest_path_tree(request).unwrap();
    assert_eq!(spt.termination(), Termination::StateLimit);
    assert!(!spt.is_reached(ids[5]));
}

#[test]
fn duration_bound_prunes_far_vertices() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let b = corner(&graph, "b", 0.001);
    let c = corner(&graph, "c", 0.1);
    street(&graph, a, b, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, b, c, StreetTraversalPermission::PEDESTRIAN);

    let router = Router::new(&graph);
    let config = SearchConfig::default().with_max_duration_secs(600);
    let request =
        Arc::new(RoutingRequest::new(a, None, TraverseModeSet::walk_only()).with_config(config));
    let spt = router.get_new_shortest_path_tree(request).unwrap();
    assert!(spt.is_reached(b));
    assert!(!spt.is_reached(c));
}

#[test]
fn invalid_requests_are_rejected() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let router = Router::new(&graph);

    let err = router
        .plan(RoutingRequest::new(a, Some(a), TraverseModeSet::walk_only()))
        .unwrap_err();
    assert!(matches!(err, RoutingError::TrivialPath));

    let err = router
        .plan(RoutingRequest::new(a, Some(VertexId(42)), TraverseModeSet::walk_only()))
        .unwrap_err();
    assert!(matches!(err, RoutingError::VertexNotFound { .. }));

    let err = router
        .plan(RoutingRequest::new(a, None, TraverseModeSet::walk_only()))
        .unwrap_err();
    assert!(matches!(err, RoutingError::BogusParameter(_)));
}

#[test]
fn pareto_drops_a_detour_worse_on_both_counts() {
    let graph = Graph::new();
    let a = corner(&graph, "a", 0.0);
    let c = corner(&graph, "c", 0.002);
    let detour = vertex(&graph, "detour", 0.001, 0.001, VertexKind::Intersection);
    street(&graph, a, c, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, a, detour, StreetTraversalPermission::PEDESTRIAN);
    street(&graph, detour, c, StreetTraversalPermission::PEDESTRIAN);

    let router = Router::new(&graph);
    let config = SearchConfig::default().with_dominance(DominanceKind::Pareto);
    let request =
        Arc::new(RoutingRequest::new(a, None, TraverseModeSet::walk_only()).with_config(config));
    let spt = router.get_new_shortest_path_tree(request).unwrap();

    // The detour is worse on both time and weight, so only one state survives
    assert_eq!(spt.states_at(c).len(), 1);
    assert_eq!(spt.path(c).unwrap().vertices(), vec![a, c]);
}

#[test]
fn searches_see_a_consistent_graph_while_it_changes() {
    let graph = Graph::new();
    let ids: Vec<_> = (0..8)
        .map(|i| corner(&graph, &format!("v{i}"), 0.001 * i as f64))
        .collect();
    for pair in ids.windows(2) {
        street(&graph, pair[0], pair[1], StreetTraversalPermission::PEDESTRIAN);
    }
    let shortcut_geometry = vec![
        graph.vertex(ids[0]).unwrap().coordinate(),
        graph.vertex(ids[7]).unwrap().coordinate(),
    ];

    std::thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                let edge = graph
                    .add_edge(
                        ids[0],
                        ids[7],
                        EdgeKind::Street(StreetSegment::new(
                            "shortcut",
                            shortcut_geometry.clone(),
                            StreetTraversalPermission::PEDESTRIAN,
                        )),
                    )
                    .unwrap();
                graph.remove_edge(&edge).unwrap();
            }
        });

        let router = Router::new(&graph);
        for _ in 0..50 {
            let path = router
                .plan(RoutingRequest::new(ids[0], Some(ids[7]), TraverseModeSet::walk_only()))
                .unwrap();
            assert_eq!(path.start_vertex(), ids[0]);
            assert_eq!(path.end_vertex(), ids[7]);
            for (edge, pair) in path.edges().iter().zip(path.states().windows(2)) {
                assert_eq!(edge.from(), pair[0].vertex());
                assert_eq!(edge.to(), pair[1].vertex());
            }
        }
    });
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    const COLUMNS: usize = 4;

    fn build(n: usize, pairs: &[(usize, usize)]) -> (Graph, Vec<VertexId>) {
        let graph = Graph::new();
        let ids: Vec<_> = (0..n)
            .map(|i| {
                vertex(
                    &graph,
                    &format!("v{i}"),
                    0.001 * (i % COLUMNS) as f64,
                    0.001 * (i / COLUMNS) as f64,
                    VertexKind::Intersection,
                )
            })
            .collect();
        for &(a, b) in pairs {
            let (a, b) = (a % n, b % n);
            if a == b {
                continue;
            }
            let ca = graph.vertex(ids[a]).unwrap().coordinate();
            let cb = graph.vertex(ids[b]).unwrap().coordinate();
            graph
                .add_edge(
                    ids[a],
                    ids[b],
                    EdgeKind::Street(StreetSegment::new(
                        "s",
                        vec![ca, cb],
                        StreetTraversalPermission::PEDESTRIAN,
                    )),
                )
                .unwrap();
        }
        (graph, ids)
    }

    /// Reference shortest weights by repeated relaxation.
    fn reference_weights(graph: &Graph, ids: &[VertexId], config: &SearchConfig) -> Vec<Option<f64>> {
        let mut best: Vec<Option<f64>> = vec![None; ids.len()];
        best[0] = Some(0.0);
        let edges = graph.edges();
        for _ in 0..ids.len() {
            for edge in &edges {
                let Some(street) = edge.as_street() else { continue };
                let Some(from) = best[edge.from().0] else { continue };
                let w = from + street.length_m / config.walk_speed_mps * config.walk_reluctance;
                if best[edge.to().0].is_none_or(|b| w < b) {
                    best[edge.to().0] = Some(w);
                }
            }
        }
        best
    }

    proptest! {
        #[test]
        fn reaches_exactly_the_connected_vertices(
            n in 2usize..12,
            pairs in prop::collection::vec((0usize..12, 0usize..12), 0..30),
        ) {
            let (graph, ids) = build(n, &pairs);
            let router = Router::new(&graph);
            let request = Arc::new(RoutingRequest::new(ids[0], None, TraverseModeSet::walk_only()));
            let config = request.config.clone();
            let spt = router.get_new_shortest_path_tree(request).unwrap();
            let reference = reference_weights(&graph, &ids, &config);

            if graph.vertex(ids[0]).unwrap().degree_out() == 0 {
                prop_assert_eq!(spt.termination(), Termination::OriginUnlinked);
                return Ok(());
            }
            prop_assert_eq!(spt.termination(), Termination::FrontierExhausted);
            for (i, id) in ids.iter().enumerate() {
                match reference[i] {
                    Some(expected) => {
                        let state = spt.best_state_at(*id);
                        prop_assert!(state.is_some(), "{} should be reached", id);
                        let got = state.map(|s| s.weight()).unwrap_or_default();
                        prop_assert!((got - expected).abs() < 1e-6, "{}: {} != {}", id, got, expected);
                    }
                    None => prop_assert!(!spt.is_reached(*id), "{} should be unreachable", id),
                }
            }
        }
    }
}
