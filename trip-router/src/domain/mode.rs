//! Travel modes and street permissions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A way of moving through the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraverseMode {
    Walk,
    Bicycle,
    Car,
    Transit,
}

impl fmt::Display for TraverseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TraverseMode::Walk => "walk",
            TraverseMode::Bicycle => "bicycle",
            TraverseMode::Car => "car",
            TraverseMode::Transit => "transit",
        };
        f.write_str(s)
    }
}

/// The set of modes a routing request may use.
///
/// `rent` enables picking up shared vehicles and bikes; the mode of a
/// rented vehicle is allowed even when it is not otherwise in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraverseModeSet {
    pub walk: bool,
    pub bicycle: bool,
    pub car: bool,
    pub transit: bool,
    pub rent: bool,
}

impl TraverseModeSet {
    /// Walking only.
    pub const fn walk_only() -> Self {
        Self {
            walk: true,
            bicycle: false,
            car: false,
            transit: false,
            rent: false,
        }
    }

    pub fn with_transit(mut self) -> Self {
        self.transit = true;
        self
    }

    pub fn with_rent(mut self) -> Self {
        self.rent = true;
        self
    }

    pub fn with_bicycle(mut self) -> Self {
        self.bicycle = true;
        self
    }

    pub fn with_car(mut self) -> Self {
        self.car = true;
        self
    }

    /// Whether a mode may be used under its own power (not rented).
    pub fn contains(&self, mode: TraverseMode) -> bool {
        match mode {
            TraverseMode::Walk => self.walk,
            TraverseMode::Bicycle => self.bicycle,
            TraverseMode::Car => self.car,
            TraverseMode::Transit => self.transit,
        }
    }

    /// The mode a search starts in: the fastest owned vehicle, otherwise walking.
    pub fn initial_mode(&self) -> TraverseMode {
        if self.car {
            TraverseMode::Car
        } else if self.bicycle {
            TraverseMode::Bicycle
        } else {
            TraverseMode::Walk
        }
    }
}

impl Default for TraverseModeSet {
    fn default() -> Self {
        Self::walk_only()
    }
}

/// Which modes may traverse a street segment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(from = "Vec<TraverseMode>")]
pub struct StreetTraversalPermission(u8);

impl StreetTraversalPermission {
    pub const NONE: Self = Self(0);
    pub const PEDESTRIAN: Self = Self(1);
    pub const BICYCLE: Self = Self(2);
    pub const CAR: Self = Self(4);
    pub const PEDESTRIAN_AND_BICYCLE: Self = Self(1 | 2);
    pub const ALL: Self = Self(1 | 2 | 4);

    /// Union of two permission sets.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether the given mode may use the street.
    pub fn allows(&self, mode: TraverseMode) -> bool {
        let bit = match mode {
            TraverseMode::Walk => Self::PEDESTRIAN.0,
            TraverseMode::Bicycle => Self::BICYCLE.0,
            TraverseMode::Car => Self::CAR.0,
            TraverseMode::Transit => return false,
        };
        self.0 & bit != 0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl From<Vec<TraverseMode>> for StreetTraversalPermission {
    fn from(modes: Vec<TraverseMode>) -> Self {
        modes.into_iter().fold(Self::NONE, |acc, mode| {
            let bit = match mode {
                TraverseMode::Walk => Self::PEDESTRIAN,
                TraverseMode::Bicycle => Self::BICYCLE,
                TraverseMode::Car => Self::CAR,
                TraverseMode::Transit => Self::NONE,
            };
            acc.union(bit)
        })
    }
}

impl fmt::Debug for StreetTraversalPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (Self::PEDESTRIAN, "pedestrian"),
            (Self::BICYCLE, "bicycle"),
            (Self::CAR, "car"),
        ]
        .into_iter()
        .filter(|(p, _)| self.0 & p.0 != 0)
        .map(|(_, n)| n)
        .collect();
        write!(f, "Permission({})", names.join("|"))
    }
}
