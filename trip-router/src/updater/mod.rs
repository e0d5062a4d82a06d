//! Updaters that keep the graph in line with external feeds.
//!
//! Each updater polls a feed, compares it with what it attached last time
//! and turns the difference into a [`MutationUnit`](crate::writer::MutationUnit)
//! for the graph writer.

mod error;
mod feed;
mod manager;
mod parking_zones;
mod vehicles;

pub use error::UpdaterError;
pub use feed::{
    HttpParkingZoneFeed, HttpVehicleFeed, ParkingZoneFeed, ParkingZoneRecord, ProviderRecord,
    StaticFeed, VehicleFeed, VehicleRecord,
};
pub use manager::{PollingUpdater, UpdaterManager, poll_and_submit};
pub use parking_zones::{GeometryParkingZone, ParkingZonesCalculator, ParkingZonesUpdater};
pub use vehicles::{SharedVehicleUpdater, map_vehicle, nearest_anchor, rental_anchors};
