//! Shared vehicles offered by rental providers.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::Coordinate;
use super::mode::{StreetTraversalPermission, TraverseMode};

/// Class of a rentable vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Motorbike,
    KickScooter,
}

impl VehicleType {
    /// Parse the type names used by provider feeds.
    ///
    /// Returns `None` for types this router does not support.
    pub fn from_provider_type(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "car" => Some(VehicleType::Car),
            "motorbike" | "scooter" | "moped" => Some(VehicleType::Motorbike),
            "kickscooter" | "kick_scooter" | "un-pedal-scooter" => Some(VehicleType::KickScooter),
            _ => None,
        }
    }

    /// The street mode a vehicle of this type moves in.
    pub fn traverse_mode(&self) -> TraverseMode {
        match self {
            VehicleType::Car | VehicleType::Motorbike => TraverseMode::Car,
            VehicleType::KickScooter => TraverseMode::Bicycle,
        }
    }

    /// Seconds needed to unlock and start the vehicle.
    pub fn rent_time_secs(&self) -> i64 {
        match self {
            VehicleType::Car => 90,
            VehicleType::Motorbike => 60,
            VehicleType::KickScooter => 30,
        }
    }

    /// Seconds needed to park and end the rental.
    pub fn dropoff_time_secs(&self) -> i64 {
        match self {
            VehicleType::Car => 120,
            VehicleType::Motorbike => 60,
            VehicleType::KickScooter => 30,
        }
    }

    /// Whether a vehicle of this type may use a street with the given permission.
    ///
    /// Kick scooters ride on bike paths and, more slowly, on footways.
    pub fn can_traverse(&self, permission: StreetTraversalPermission) -> bool {
        match self {
            VehicleType::Car | VehicleType::Motorbike => permission.allows(TraverseMode::Car),
            VehicleType::KickScooter => {
                permission.allows(TraverseMode::Bicycle) || permission.allows(TraverseMode::Walk)
            }
        }
    }

    /// Top speed on a street with the given permission, in m/s.
    pub fn max_speed_mps(&self, permission: StreetTraversalPermission) -> f64 {
        match self {
            VehicleType::Car => 25.0,
            VehicleType::Motorbike => 20.0,
            VehicleType::KickScooter => {
                if permission.allows(TraverseMode::Bicycle) {
                    8.0
                } else {
                    5.0
                }
            }
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleType::Car => "car",
            VehicleType::Motorbike => "motorbike",
            VehicleType::KickScooter => "kickscooter",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelType {
    Electric,
    Fossil,
    Hybrid,
}

impl FuelType {
    /// Lenient parse; unknown values yield `None`.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "electric" => Some(FuelType::Electric),
            "fossil" | "petrol" | "diesel" => Some(FuelType::Fossil),
            "hybrid" => Some(FuelType::Hybrid),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gearbox {
    Manual,
    Automatic,
}

impl Gearbox {
    /// Lenient parse; unknown values yield `None`.
    pub fn from_provider(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "manual" => Some(Gearbox::Manual),
            "automatic" => Some(Gearbox::Automatic),
            _ => None,
        }
    }
}

/// A vehicle rental operator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provider {
    pub id: i32,
    pub name: String,
}

/// Monetary cost of renting a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VehiclePricing {
    /// Fixed price charged on unlock.
    pub start_price: f64,
    /// Price per driven kilometer.
    pub price_per_km: f64,
}

/// A concrete vehicle available for rental at a position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleDescription {
    pub provider_vehicle_id: String,
    pub position: Coordinate,
    pub vehicle_type: VehicleType,
    pub provider: Provider,
    pub fuel_type: Option<FuelType>,
    pub gearbox: Option<Gearbox>,
    /// Remaining range, if the provider reports it.
    pub range_in_meters: Option<f64>,
    pub pricing: VehiclePricing,
}

impl VehicleDescription {
    /// Create a vehicle with no optional attributes.
    pub fn new(
        provider_vehicle_id: impl Into<String>,
        position: Coordinate,
        vehicle_type: VehicleType,
        provider: Provider,
    ) -> Self {
        Self {
            provider_vehicle_id: provider_vehicle_id.into(),
            position,
            vehicle_type,
            provider,
            fuel_type: None,
            gearbox: None,
            range_in_meters: None,
            pricing: VehiclePricing::default(),
        }
    }

    pub fn with_range(mut self, meters: f64) -> Self {
        self.range_in_meters = Some(meters);
        self
    }

    pub fn with_pricing(mut self, pricing: VehiclePricing) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn traverse_mode(&self) -> TraverseMode {
        self.vehicle_type.traverse_mode()
    }
}
