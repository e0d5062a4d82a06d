//! Directed edges and their variants.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use geo::LineString;

use crate::domain::{
    ParkingZoneInfo, StreetTraversalPermission, TraverseMode, VehicleDescription,
    polyline_length_m,
};

use super::vertex::{VertexId, VertexKind};

/// Graph-unique edge identifier, assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A piece of street between two street vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct StreetSegment {
    pub name: String,
    pub geometry: LineString<f64>,
    pub length_m: f64,
    pub permission: StreetTraversalPermission,
    /// Edges that may not be entered directly after this one.
    pub turn_restrictions: Vec<EdgeId>,
}

impl StreetSegment {
    /// Create a segment, deriving its length from the geometry.
    pub fn new(
        name: impl Into<String>,
        geometry: impl Into<LineString<f64>>,
        permission: StreetTraversalPermission,
    ) -> Self {
        let geometry = geometry.into();
        let length_m = polyline_length_m(&geometry);
        Self {
            name: name.into(),
            geometry,
            length_m,
            permission,
            turn_restrictions: Vec::new(),
        }
    }

    /// Override the derived length.
    pub fn with_length(mut self, length_m: f64) -> Self {
        self.length_m = length_m;
        self
    }

    pub fn with_turn_restriction(mut self, forbidden: EdgeId) -> Self {
        self.turn_restrictions.push(forbidden);
        self
    }

    pub fn can_traverse(&self, mode: TraverseMode) -> bool {
        self.permission.allows(mode)
    }
}

/// A ride on a transit route between two stops.
///
/// Transit is modelled by headway: boarding costs half a headway of
/// waiting on average, then `run_secs` of riding.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLeg {
    pub route: String,
    pub run_secs: i64,
    pub headway_secs: i64,
    pub fare: f64,
}

/// Variant-specific payload of an edge.
#[derive(Debug, Clone)]
pub enum EdgeKind {
    /// A street segment.
    Street(StreetSegment),
    /// Connector between a street vertex and a linked stop, station or park.
    StreetLink { length_m: f64 },
    /// Board at the origin stop, alight at the destination stop.
    BoardAlight(TransitLeg),
    /// A guaranteed transfer between two stops.
    TimedTransfer { transfer_secs: i64 },
    /// A walking transfer between two stops.
    SimpleTransfer { distance_m: f64 },
    /// A vehicle available for pickup at this point (loop edge).
    RentVehicle(Arc<VehicleDescription>),
    /// A point where any vehicle may be returned, subject to parking zones (loop edge).
    RentVehicleAnywhere(ParkingZoneInfo),
    /// Take a bike from a rental station (loop edge).
    RentBike { networks: BTreeSet<String> },
    /// Return a rented bike to a station (loop edge).
    ReturnBike { networks: BTreeSet<String> },
    /// Leave an owned bike (loop edge).
    ParkBike,
    /// Leave an owned car (loop edge).
    ParkCar,
}

/// Discriminant of [`EdgeKind`], used for capability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeTag {
    Street,
    StreetLink,
    BoardAlight,
    TimedTransfer,
    SimpleTransfer,
    RentVehicle,
    RentVehicleAnywhere,
    RentBike,
    ReturnBike,
    ParkBike,
    ParkCar,
}

impl EdgeTag {
    /// Loop edges start and end at the same vertex.
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            EdgeTag::RentVehicle
                | EdgeTag::RentVehicleAnywhere
                | EdgeTag::RentBike
                | EdgeTag::ReturnBike
                | EdgeTag::ParkBike
                | EdgeTag::ParkCar
        )
    }
}

impl EdgeKind {
    pub fn tag(&self) -> EdgeTag {
        match self {
            EdgeKind::Street(_) => EdgeTag::Street,
            EdgeKind::StreetLink { .. } => EdgeTag::StreetLink,
            EdgeKind::BoardAlight(_) => EdgeTag::BoardAlight,
            EdgeKind::TimedTransfer { .. } => EdgeTag::TimedTransfer,
            EdgeKind::SimpleTransfer { .. } => EdgeTag::SimpleTransfer,
            EdgeKind::RentVehicle(_) => EdgeTag::RentVehicle,
            EdgeKind::RentVehicleAnywhere(_) => EdgeTag::RentVehicleAnywhere,
            EdgeKind::RentBike { .. } => EdgeTag::RentBike,
            EdgeKind::ReturnBike { .. } => EdgeTag::ReturnBike,
            EdgeKind::ParkBike => EdgeTag::ParkBike,
            EdgeKind::ParkCar => EdgeTag::ParkCar,
        }
    }

    /// Whether an edge of this kind may join vertices of the given kinds.
    ///
    /// `same_vertex` is true when both endpoints are the same vertex.
    pub fn accepts_endpoints(&self, from: &VertexKind, to: &VertexKind, same_vertex: bool) -> bool {
        let tag = self.tag();
        if tag.is_loop() != same_vertex {
            return false;
        }
        if !from.accepts(tag) || !to.accepts(tag) {
            return false;
        }
        match tag {
            // A connector joins the street network to something off it
            EdgeTag::StreetLink => from.is_street() != to.is_street(),
            _ => true,
        }
    }
}

/// A directed edge.
///
/// Edges name their endpoints by [`VertexId`]; they do not keep vertices
/// alive. Identity is the allocation: two edges with equal payloads are
/// still different edges.
#[derive(Debug)]
pub struct Edge {
    id: EdgeId,
    from: VertexId,
    to: VertexId,
    kind: EdgeKind,
}

impl Edge {
    pub(crate) fn new(id: EdgeId, from: VertexId, to: VertexId, kind: EdgeKind) -> Self {
        Self { id, from, to, kind }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn from(&self) -> VertexId {
        self.from
    }

    pub fn to(&self) -> VertexId {
        self.to
    }

    pub fn kind(&self) -> &EdgeKind {
        &self.kind
    }

    pub fn tag(&self) -> EdgeTag {
        self.kind.tag()
    }

    pub fn as_street(&self) -> Option<&StreetSegment> {
        match &self.kind {
            EdgeKind::Street(s) => Some(s),
            _ => None,
        }
    }

    /// Turn restrictions that apply when leaving this edge.
    pub fn turn_restrictions(&self) -> &[EdgeId] {
        self.as_street()
            .map(|s| s.turn_restrictions.as_slice())
            .unwrap_or(&[])
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?} {} -> {})", self.id, self.tag(), self.from, self.to)
    }
}

/// Identity comparison of optional edges.
pub fn same_edge(a: Option<&Arc<Edge>>, b: Option<&Arc<Edge>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Arc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}
