//! Shared vehicle availability.
//!
//! Each poll compares the vehicles a feed publishes now with the ones
//! attached to the graph after the previous poll. A vehicle is attached as a
//! `RentVehicle` loop edge at the rental anchor nearest to it; vehicles that
//! disappear or move lose exactly the edge they were given.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::domain::{
    Coordinate, FuelType, Gearbox, Provider, VehicleDescription, VehiclePricing, VehicleType,
    haversine_m,
};
use crate::graph::{Edge, EdgeKind, EdgeTag, Graph, Vertex, VertexId};
use crate::writer::{GraphOp, MutationUnit};

use super::error::UpdaterError;
use super::feed::{VehicleFeed, VehicleRecord};
use super::manager::PollingUpdater;

/// Convert a feed record, or `None` if the router cannot use it.
pub fn map_vehicle(record: &VehicleRecord) -> Option<VehicleDescription> {
    let Some(provider) = &record.provider else {
        warn!(vehicle = %record.provider_vehicle_id, "omitting vehicle without provider");
        return None;
    };
    let Some(vehicle_type) = VehicleType::from_provider_type(&record.vehicle_type) else {
        warn!(
            vehicle = %record.provider_vehicle_id,
            vehicle_type = %record.vehicle_type,
            "omitting vehicle of unsupported type"
        );
        return None;
    };
    let position = match Coordinate::checked(record.longitude, record.latitude) {
        Ok(position) => position,
        Err(e) => {
            warn!(vehicle = %record.provider_vehicle_id, error = %e, "omitting vehicle");
            return None;
        }
    };

    let mut vehicle = VehicleDescription::new(
        record.provider_vehicle_id.clone(),
        position,
        vehicle_type,
        Provider {
            id: provider.provider_id,
            name: provider.provider_name.clone(),
        },
    )
    .with_pricing(VehiclePricing {
        start_price: record.start_price.unwrap_or_default(),
        price_per_km: record.km_price.unwrap_or_default(),
    });
    vehicle.fuel_type = record.fuel_type.as_deref().and_then(FuelType::from_provider);
    vehicle.gearbox = record.gearbox.as_deref().and_then(Gearbox::from_provider);
    vehicle.range_in_meters = record.range_in_meters;
    Some(vehicle)
}

/// The anchor closest to a point; ties go to the lower vertex id.
pub fn nearest_anchor(point: &Coordinate, anchors: &[Arc<Vertex>]) -> Option<VertexId> {
    anchors
        .iter()
        .map(|v| (haversine_m(point, &v.coordinate()), v.id()))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

/// Vertices where shared vehicles may be picked up and left.
pub fn rental_anchors(graph: &Graph) -> Vec<Arc<Vertex>> {
    graph
        .vertices()
        .into_iter()
        .filter(|v| v.has_outgoing(EdgeTag::RentVehicleAnywhere))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct VehicleKey {
    provider_id: i32,
    vehicle_id: String,
    anchor: VertexId,
}

/// Keeps the graph's rental edges in line with a vehicle feed.
pub struct SharedVehicleUpdater<F> {
    graph: Arc<Graph>,
    feed: F,
    poll_period: Duration,
    attached: BTreeMap<VehicleKey, Arc<Edge>>,
}

impl<F: VehicleFeed> SharedVehicleUpdater<F> {
    pub fn new(graph: Arc<Graph>, feed: F, poll_period: Duration) -> Self {
        Self {
            graph,
            feed,
            poll_period,
            attached: BTreeMap::new(),
        }
    }

    /// Number of vehicles currently attached.
    pub fn attached(&self) -> usize {
        self.attached.len()
    }

    /// Build the unit that brings the graph in line with `vehicles`.
    ///
    /// Removals come first. The updater assumes the unit will be applied.
    pub fn prepare(&mut self, vehicles: Vec<VehicleDescription>) -> MutationUnit {
        let anchors = rental_anchors(&self.graph);
        if anchors.is_empty() && !vehicles.is_empty() {
            warn!("no rental anchors in graph; vehicles cannot be attached");
        }

        let mut current = BTreeMap::new();
        for vehicle in vehicles {
            let Some(anchor) = nearest_anchor(&vehicle.position, &anchors) else {
                continue;
            };
            let key = VehicleKey {
                provider_id: vehicle.provider.id,
                vehicle_id: vehicle.provider_vehicle_id.clone(),
                anchor,
            };
            current.insert(key, vehicle);
        }

        let mut unit = MutationUnit::new("shared-vehicles");
        let mut removed = 0;
        self.attached.retain(|key, edge| {
            let keep = match (current.get(key), edge.kind()) {
                (Some(vehicle), EdgeKind::RentVehicle(attached)) => **attached == *vehicle,
                _ => false,
            };
            if !keep {
                unit.push(GraphOp::RemoveEdge(edge.clone()));
                removed += 1;
            }
            keep
        });

        let mut added = 0;
        for (key, vehicle) in current {
            if self.attached.contains_key(&key) {
                continue;
            }
            match self
                .graph
                .new_edge(key.anchor, key.anchor, EdgeKind::RentVehicle(Arc::new(vehicle)))
            {
                Ok(edge) => {
                    unit = unit.add_edge(edge.clone());
                    self.attached.insert(key, edge);
                    added += 1;
                }
                Err(e) => warn!(vehicle = %key.vehicle_id, error = %e, "cannot attach vehicle"),
            }
        }

        debug!(added, removed, attached = self.attached.len(), "vehicle diff prepared");
        unit
    }
}

impl<F: VehicleFeed + 'static> PollingUpdater for SharedVehicleUpdater<F> {
    fn name(&self) -> &str {
        "shared-vehicles"
    }

    fn poll_period(&self) -> Duration {
        self.poll_period
    }

    async fn poll(&mut self) -> Result<MutationUnit, UpdaterError> {
        let records = self.feed.fetch().await?;
        let total = records.len();
        let vehicles: Vec<_> = records.iter().filter_map(map_vehicle).collect();
        info!(total, usable = vehicles.len(), "polled shared vehicles");
        Ok(self.prepare(vehicles))
    }
}
