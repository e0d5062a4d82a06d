//! Domain types for the trip router.
//!
//! Geographic primitives, travel modes, shared vehicles and parking rules.
//! All types enforce their invariants at construction time, so code that
//! receives these types can trust their validity.

mod error;
mod geometry;
mod mode;
mod vehicle;
mod zone;

pub use error::DomainError;
pub use geometry::{
    Coordinate, EARTH_RADIUS_M, METERS_PER_DEGREE_LAT, Projection, bounding_box, haversine_m,
    meters_per_degree_lon, polygon, polyline_length_m, project_onto_polyline, split_polyline,
};
pub use mode::{StreetTraversalPermission, TraverseMode, TraverseModeSet};
pub use vehicle::{FuelType, Gearbox, Provider, VehicleDescription, VehiclePricing, VehicleType};
pub use zone::{ParkingZoneInfo, SingleParkingZone};
