//! Parking zones that restrict where rented vehicles may be returned.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::vehicle::{VehicleDescription, VehicleType};

/// A (provider, vehicle type) pair that publishes parking zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SingleParkingZone {
    pub provider_id: i32,
    pub vehicle_type: VehicleType,
}

impl SingleParkingZone {
    pub fn new(provider_id: i32, vehicle_type: VehicleType) -> Self {
        Self {
            provider_id,
            vehicle_type,
        }
    }

    /// The zone key a vehicle is governed by.
    pub fn of(vehicle: &VehicleDescription) -> Self {
        Self::new(vehicle.provider.id, vehicle.vehicle_type)
    }
}

/// Parking rules attached to one rentable-vehicle-anywhere point.
///
/// `enabled` lists every (provider, type) pair that restricts parking at
/// all; it is shared between all points updated in the same pass.
/// `allowed` lists the pairs whose zones cover this point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParkingZoneInfo {
    allowed: Vec<SingleParkingZone>,
    enabled: Arc<Vec<SingleParkingZone>>,
}

impl ParkingZoneInfo {
    /// Create zone info; `allowed` is sorted so equal rule sets compare equal.
    pub fn new(mut allowed: Vec<SingleParkingZone>, enabled: Arc<Vec<SingleParkingZone>>) -> Self {
        allowed.sort();
        allowed.dedup();
        Self { allowed, enabled }
    }

    /// Zone info with no restrictions: every vehicle may be returned.
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn allowed(&self) -> &[SingleParkingZone] {
        &self.allowed
    }

    pub fn enabled(&self) -> &[SingleParkingZone] {
        &self.enabled
    }

    /// Whether the vehicle may be returned here.
    pub fn can_drop_off(&self, vehicle: &VehicleDescription) -> bool {
        let key = SingleParkingZone::of(vehicle);
        !self.enabled.contains(&key) || self.allowed.contains(&key)
    }
}
