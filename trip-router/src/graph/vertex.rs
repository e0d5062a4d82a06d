//! Vertices and their copy-on-write edge lists.
//!
//! Each vertex keeps its incoming and outgoing edges as immutable arrays
//! behind an [`ArcSwap`]. Readers load the current array and iterate it
//! without locking; writers take the vertex's own mutex, build a new array
//! and publish it with a single atomic store. A reader holding an older
//! array keeps seeing exactly that array until it drops it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::error;

use crate::domain::Coordinate;

use super::edge::{Edge, EdgeTag};
use super::error::GraphError;

/// Stable index of a vertex in the graph arena. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub usize);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// An immutable snapshot of one of a vertex's edge lists.
pub type EdgeList = Arc<Vec<Arc<Edge>>>;

/// Variant of a vertex.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VertexKind {
    /// A street intersection.
    Intersection,
    /// A street vertex created by splitting an edge during linking.
    Split,
    /// A street point designated for picking up and returning shared vehicles.
    RentAnywhere,
    TransitStop { stop_id: String },
    BikeRentalStation { networks: BTreeSet<String> },
    BikePark,
    CarPark,
}

impl VertexKind {
    /// Vertices that are part of the street network itself.
    pub fn is_street(&self) -> bool {
        matches!(
            self,
            VertexKind::Intersection | VertexKind::Split | VertexKind::RentAnywhere
        )
    }

    /// Vertices that must be connected to the street network by the linker.
    pub fn is_linkable(&self) -> bool {
        matches!(
            self,
            VertexKind::TransitStop { .. }
                | VertexKind::BikeRentalStation { .. }
                | VertexKind::BikePark
                | VertexKind::CarPark
        )
    }

    /// Whether an edge of this type may touch a vertex of this kind. The
    /// rules are the same at either end of the edge.
    pub fn accepts(&self, tag: EdgeTag) -> bool {
        match tag {
            EdgeTag::Street | EdgeTag::RentVehicle | EdgeTag::RentVehicleAnywhere => {
                self.is_street()
            }
            EdgeTag::StreetLink => self.is_street() || self.is_linkable(),
            EdgeTag::BoardAlight | EdgeTag::TimedTransfer | EdgeTag::SimpleTransfer => {
                matches!(self, VertexKind::TransitStop { .. })
            }
            EdgeTag::RentBike | EdgeTag::ReturnBike => {
                matches!(self, VertexKind::BikeRentalStation { .. })
            }
            EdgeTag::ParkBike => matches!(self, VertexKind::BikePark),
            EdgeTag::ParkCar => matches!(self, VertexKind::CarPark),
        }
    }
}

/// A vertex in the graph.
pub struct Vertex {
    id: VertexId,
    label: String,
    name: String,
    coordinate: Coordinate,
    kind: VertexKind,
    /// f64 bits; meters.
    distance_to_nearest_transit_stop: AtomicU64,
    outgoing: ArcSwap<Vec<Arc<Edge>>>,
    incoming: ArcSwap<Vec<Arc<Edge>>>,
    /// Serializes writers of this vertex's edge lists. Set once the vertex
    /// has been removed from the graph; no edge may be attached after that.
    write_lock: Mutex<bool>,
}

impl Vertex {
    pub(crate) fn new(
        id: VertexId,
        label: String,
        name: Option<String>,
        coordinate: Coordinate,
        kind: VertexKind,
    ) -> Self {
        Self {
            id,
            label,
            name: name.unwrap_or_else(|| "(no name provided)".to_string()),
            coordinate,
            kind,
            distance_to_nearest_transit_stop: AtomicU64::new(0f64.to_bits()),
            outgoing: ArcSwap::from_pointee(Vec::new()),
            incoming: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(false),
        }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Globally unique label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Human-readable name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn lon(&self) -> f64 {
        self.coordinate.x
    }

    pub fn lat(&self) -> f64 {
        self.coordinate.y
    }

    pub fn kind(&self) -> &VertexKind {
        &self.kind
    }

    /// Current outgoing edges. The snapshot never changes after it is taken.
    pub fn outgoing(&self) -> EdgeList {
        self.outgoing.load_full()
    }

    /// Current incoming edges. The snapshot never changes after it is taken.
    pub fn incoming(&self) -> EdgeList {
        self.incoming.load_full()
    }

    pub fn degree_out(&self) -> usize {
        self.outgoing.load().len()
    }

    pub fn degree_in(&self) -> usize {
        self.incoming.load().len()
    }

    /// Outgoing edges that are street segments.
    pub fn outgoing_street_edges(&self) -> Vec<Arc<Edge>> {
        self.outgoing
            .load()
            .iter()
            .filter(|e| e.tag() == EdgeTag::Street)
            .cloned()
            .collect()
    }

    /// Whether any outgoing edge has the given type.
    pub fn has_outgoing(&self, tag: EdgeTag) -> bool {
        self.outgoing.load().iter().any(|e| e.tag() == tag)
    }

    /// Bearing to another vertex, in degrees.
    pub fn azimuth_to(&self, other: &Vertex) -> f64 {
        self.coordinate.azimuth_to(&other.coordinate)
    }

    /// Distance to the closest transit stop, in meters.
    pub fn distance_to_nearest_transit_stop(&self) -> f64 {
        f64::from_bits(self.distance_to_nearest_transit_stop.load(Ordering::Relaxed))
    }

    pub fn set_distance_to_nearest_transit_stop(&self, meters: f64) {
        self.distance_to_nearest_transit_stop
            .store(meters.to_bits(), Ordering::Relaxed);
    }

    /// Append an outgoing edge.
    ///
    /// Fails if the edge is already present or the vertex has been removed.
    pub(crate) fn add_outgoing(&self, edge: Arc<Edge>) -> Result<(), GraphError> {
        let removed = self.write_lock.lock();
        if *removed {
            return Err(GraphError::UnknownVertex(self.id));
        }
        Self::install_added(&self.outgoing, edge, &self.label)
    }

    /// Append an incoming edge.
    ///
    /// Fails if the edge is already present or the vertex has been removed.
    pub(crate) fn add_incoming(&self, edge: Arc<Edge>) -> Result<(), GraphError> {
        let removed = self.write_lock.lock();
        if *removed {
            return Err(GraphError::UnknownVertex(self.id));
        }
        Self::install_added(&self.incoming, edge, &self.label)
    }

    /// Remove an outgoing edge. Returns whether it was found.
    pub(crate) fn remove_outgoing(&self, edge: &Arc<Edge>) -> bool {
        let found = self.discard_outgoing(edge);
        if !found {
            self.log_missing(edge);
        }
        found
    }

    /// Remove an incoming edge. Returns whether it was found.
    pub(crate) fn remove_incoming(&self, edge: &Arc<Edge>) -> bool {
        let found = self.discard_incoming(edge);
        if !found {
            self.log_missing(edge);
        }
        found
    }

    /// Like [`Vertex::remove_outgoing`], without complaining about a missing edge.
    pub(crate) fn discard_outgoing(&self, edge: &Arc<Edge>) -> bool {
        let _guard = self.write_lock.lock();
        Self::install_removed(&self.outgoing, edge)
    }

    /// Like [`Vertex::remove_incoming`], without complaining about a missing edge.
    pub(crate) fn discard_incoming(&self, edge: &Arc<Edge>) -> bool {
        let _guard = self.write_lock.lock();
        Self::install_removed(&self.incoming, edge)
    }

    /// Empty both edge lists, returning what they held.
    pub(crate) fn take_edges(&self) -> (EdgeList, EdgeList) {
        let _guard = self.write_lock.lock();
        self.swap_out()
    }

    /// Mark the vertex removed and empty both edge lists.
    ///
    /// Any later attempt to attach an edge fails with
    /// [`GraphError::UnknownVertex`].
    pub(crate) fn retire(&self) -> (EdgeList, EdgeList) {
        let mut removed = self.write_lock.lock();
        *removed = true;
        self.swap_out()
    }

    /// Whether the vertex has been removed from the graph.
    pub(crate) fn is_removed(&self) -> bool {
        *self.write_lock.lock()
    }

    // Callers hold `write_lock`.
    fn swap_out(&self) -> (EdgeList, EdgeList) {
        let outgoing = self.outgoing.swap(Arc::new(Vec::new()));
        let incoming = self.incoming.swap(Arc::new(Vec::new()));
        (outgoing, incoming)
    }

    fn log_missing(&self, edge: &Edge) {
        error!(
            vertex = %self.label,
            edge = %edge,
            "requested removal of an edge which isn't connected to this vertex"
        );
    }

    // Callers hold `write_lock`.
    fn install_added(
        list: &ArcSwap<Vec<Arc<Edge>>>,
        edge: Arc<Edge>,
        label: &str,
    ) -> Result<(), GraphError> {
        let current = list.load();
        match with_edge_added(&current, edge) {
            Ok(next) => {
                list.store(Arc::new(next));
                Ok(())
            }
            Err(edge) => {
                error!(vertex = %label, edge = %edge, "repeatedly added edge");
                Err(GraphError::DuplicateEdge(edge.id()))
            }
        }
    }

    // Callers hold `write_lock`.
    fn install_removed(list: &ArcSwap<Vec<Arc<Edge>>>, edge: &Arc<Edge>) -> bool {
        let current = list.load();
        match with_edge_removed(&current, edge) {
            Some(next) => {
                list.store(Arc::new(next));
                true
            }
            None => false,
        }
    }
}

/// Copy of `existing` with `edge` appended, or the edge back if already present.
fn with_edge_added(existing: &[Arc<Edge>], edge: Arc<Edge>) -> Result<Vec<Arc<Edge>>, Arc<Edge>> {
    if existing.iter().any(|e| Arc::ptr_eq(e, &edge)) {
        return Err(edge);
    }
    let mut copy = Vec::with_capacity(existing.len() + 1);
    copy.extend(existing.iter().cloned());
    copy.push(edge);
    Ok(copy)
}

/// Copy of `existing` without `edge`, or `None` if it is not present.
fn with_edge_removed(existing: &[Arc<Edge>], edge: &Arc<Edge>) -> Option<Vec<Arc<Edge>>> {
    let position = existing.iter().position(|e| Arc::ptr_eq(e, edge))?;
    let mut copy = Vec::with_capacity(existing.len() - 1);
    copy.extend_from_slice(&existing[..position]);
    copy.extend_from_slice(&existing[position + 1..]);
    Some(copy)
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{} lat,lng={},{}>",
            self.label, self.coordinate.y, self.coordinate.x
        )
    }
}

impl fmt::Debug for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vertex")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("degree_out", &self.degree_out())
            .field("degree_in", &self.degree_in())
            .finish()
    }
}
