//! Small JSON network descriptions.
//!
//! Used to stand up a runnable graph for development and tests. This is a
//! convenience loader, not a street import pipeline: geometry is a straight
//! line between vertices and lengths are derived from it.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;

use crate::config::ConfigError;
use crate::domain::{Coordinate, ParkingZoneInfo, StreetTraversalPermission};

use super::edge::{EdgeKind, StreetSegment, TransitLeg};
use super::error::GraphError;
use super::store::Graph;
use super::vertex::VertexKind;

#[derive(Debug, Clone, Deserialize)]
pub struct VertexDescription {
    pub label: String,
    #[serde(default)]
    pub name: Option<String>,
    pub lon: f64,
    pub lat: f64,
    #[serde(default = "default_kind")]
    pub kind: VertexKind,
}

fn default_kind() -> VertexKind {
    VertexKind::Intersection
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreetDescription {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub name: String,
    pub permission: StreetTraversalPermission,
    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitDescription {
    pub from: String,
    pub to: String,
    pub route: String,
    pub run_secs: i64,
    pub headway_secs: i64,
    #[serde(default)]
    pub fare: f64,
}

/// A whole network.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkDescription {
    pub vertices: Vec<VertexDescription>,
    pub streets: Vec<StreetDescription>,
    pub transit: Vec<TransitDescription>,
    /// Labels of street vertices where shared vehicles may be picked up and returned.
    pub rental_anchors: Vec<String>,
}

impl NetworkDescription {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Build a graph. Stops and stations still need linking afterwards.
    pub fn build(&self) -> Result<Graph, GraphError> {
        let graph = Graph::new();

        for v in &self.vertices {
            graph.add_vertex(
                v.label.clone(),
                v.name.clone(),
                Coordinate::new(v.lon, v.lat),
                v.kind.clone(),
            )?;
        }

        let lookup = |label: &str| {
            graph
                .vertex_by_label(label)
                .ok_or_else(|| GraphError::UnknownLabel(label.to_string()))
        };

        for s in &self.streets {
            let from = lookup(&s.from)?;
            let to = lookup(&s.to)?;
            let segment = StreetSegment::new(
                s.name.clone(),
                vec![from.coordinate(), to.coordinate()],
                s.permission,
            );
            if s.bidirectional {
                let mut back = segment.clone();
                back.geometry.0.reverse();
                graph.add_edge(to.id(), from.id(), EdgeKind::Street(back))?;
            }
            graph.add_edge(from.id(), to.id(), EdgeKind::Street(segment))?;
        }

        for t in &self.transit {
            let from = lookup(&t.from)?;
            let to = lookup(&t.to)?;
            let leg = TransitLeg {
                route: t.route.clone(),
                run_secs: t.run_secs,
                headway_secs: t.headway_secs,
                fare: t.fare,
            };
            graph.add_edge(from.id(), to.id(), EdgeKind::BoardAlight(leg))?;
        }

        for label in &self.rental_anchors {
            let anchor = lookup(label)?;
            graph.add_edge(
                anchor.id(),
                anchor.id(),
                EdgeKind::RentVehicleAnywhere(ParkingZoneInfo::unrestricted()),
            )?;
        }

        for v in graph.vertices() {
            match v.kind() {
                VertexKind::BikeRentalStation { networks } => {
                    let networks: BTreeSet<String> = networks.clone();
                    graph.add_edge(
                        v.id(),
                        v.id(),
                        EdgeKind::RentBike {
                            networks: networks.clone(),
                        },
                    )?;
                    graph.add_edge(v.id(), v.id(), EdgeKind::ReturnBike { networks })?;
                }
                VertexKind::BikePark => {
                    graph.add_edge(v.id(), v.id(), EdgeKind::ParkBike)?;
                }
                VertexKind::CarPark => {
                    graph.add_edge(v.id(), v.id(), EdgeKind::ParkCar)?;
                }
                _ => {}
            }
        }

        Ok(graph)
    }
}
