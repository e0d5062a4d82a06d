//! Parking zones for shared vehicles.
//!
//! Providers publish polygons where their vehicles may (or may not) be
//! left. Every rental anchor carries the resulting rules on its
//! `RentVehicleAnywhere` edge, so each poll rebuilds those edges.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use geo::{Contains, Point, Polygon};
use tracing::{info, warn};

use crate::domain::{Coordinate, ParkingZoneInfo, SingleParkingZone, VehicleType, polygon};
use crate::graph::{EdgeKind, Graph};
use crate::writer::MutationUnit;

use super::error::UpdaterError;
use super::feed::{ParkingZoneFeed, ParkingZoneRecord};
use super::manager::PollingUpdater;

/// Polygons one provider publishes for one vehicle type.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryParkingZone {
    pub provider_id: i32,
    pub vehicle_type: VehicleType,
    pub polygons: Vec<Polygon<f64>>,
    /// Whether the polygons allow parking or forbid it.
    pub is_allowed: bool,
}

impl GeometryParkingZone {
    /// Convert a feed record, or `None` for unsupported vehicle types.
    pub fn from_record(record: &ParkingZoneRecord) -> Option<Self> {
        let Some(vehicle_type) = VehicleType::from_provider_type(&record.vehicle_type) else {
            warn!(
                provider = record.provider_id,
                vehicle_type = %record.vehicle_type,
                "omitting parking zone of unsupported type"
            );
            return None;
        };
        let polygons = record
            .polygons
            .iter()
            .map(|ring| {
                let ring: Vec<Coordinate> =
                    ring.iter().map(|&[lon, lat]| Coordinate::new(lon, lat)).collect();
                polygon(&ring)
            })
            .collect();
        Some(Self {
            provider_id: record.provider_id,
            vehicle_type,
            polygons,
            is_allowed: record.is_allowed,
        })
    }

    pub fn key(&self) -> SingleParkingZone {
        SingleParkingZone::new(self.provider_id, self.vehicle_type)
    }

    pub fn contains(&self, point: &Coordinate) -> bool {
        let point = Point::from(*point);
        self.polygons.iter().any(|p| p.contains(&point))
    }
}

/// Works out which parking rules apply where.
#[derive(Debug, Clone)]
pub struct ParkingZonesCalculator {
    zones: Vec<GeometryParkingZone>,
    enabled: Arc<Vec<SingleParkingZone>>,
}

impl ParkingZonesCalculator {
    pub fn new(zones: Vec<GeometryParkingZone>) -> Self {
        let enabled: BTreeSet<_> = zones.iter().map(GeometryParkingZone::key).collect();
        Self {
            zones,
            enabled: Arc::new(enabled.into_iter().collect()),
        }
    }

    /// Every (provider, vehicle type) that restricts parking at all, sorted.
    pub fn enabled_zones(&self) -> &Arc<Vec<SingleParkingZone>> {
        &self.enabled
    }

    /// The restricting pairs whose vehicles may be left at a point.
    ///
    /// A pair qualifies when one of its allowed zones contains the point and
    /// none of its forbidden zones does.
    pub fn zones_for(&self, point: &Coordinate) -> Vec<SingleParkingZone> {
        self.enabled
            .iter()
            .copied()
            .filter(|key| {
                let mut allowed = false;
                for zone in self
                    .zones
                    .iter()
                    .filter(|z| z.key() == *key && z.contains(point))
                {
                    if !zone.is_allowed {
                        return false;
                    }
                    allowed = true;
                }
                allowed
            })
            .collect()
    }

    /// Parking rules for a rental anchor at a point.
    pub fn info_for(&self, point: &Coordinate) -> ParkingZoneInfo {
        ParkingZoneInfo::new(self.zones_for(point), self.enabled.clone())
    }
}

/// Rewrites every rental anchor's parking rules from a zone feed.
pub struct ParkingZonesUpdater<F> {
    graph: Arc<Graph>,
    feed: F,
    poll_period: Duration,
}

impl<F: ParkingZoneFeed> ParkingZonesUpdater<F> {
    pub fn new(graph: Arc<Graph>, feed: F, poll_period: Duration) -> Self {
        Self {
            graph,
            feed,
            poll_period,
        }
    }

    /// Build the unit replacing every anchor's `RentVehicleAnywhere` edge.
    pub fn prepare(&self, calculator: &ParkingZonesCalculator) -> MutationUnit {
        let mut unit = MutationUnit::new("parking-zones");
        for vertex in self.graph.vertices() {
            let outgoing = vertex.outgoing();
            let Some(old) = outgoing
                .iter()
                .find(|e| matches!(e.kind(), EdgeKind::RentVehicleAnywhere(_)))
            else {
                continue;
            };
            let info = calculator.info_for(&vertex.coordinate());
            match self
                .graph
                .new_edge(vertex.id(), vertex.id(), EdgeKind::RentVehicleAnywhere(info))
            {
                // New edge first so the vertex never looks like a non-anchor
                Ok(new) => unit = unit.add_edge(new).remove_edge(old.clone()),
                Err(e) => warn!(vertex = %vertex.label(), error = %e, "cannot rebuild rental anchor"),
            }
        }
        unit
    }
}

impl<F: ParkingZoneFeed + 'static> PollingUpdater for ParkingZonesUpdater<F> {
    fn name(&self) -> &str {
        "parking-zones"
    }

    fn poll_period(&self) -> Duration {
        self.poll_period
    }

    async fn poll(&mut self) -> Result<MutationUnit, UpdaterError> {
        info!("polling parking zones");
        let records = self.feed.fetch().await?;
        let zones: Vec<_> = records
            .iter()
            .filter_map(GeometryParkingZone::from_record)
            .collect();
        let calculator = ParkingZonesCalculator::new(zones);
        let unit = self.prepare(&calculator);
        info!(
            zones = records.len(),
            enabled = calculator.enabled_zones().len(),
            anchors = unit.len() / 2,
            "parking zones calculated"
        );
        Ok(unit)
    }
}
