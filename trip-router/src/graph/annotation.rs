//! Builder annotations recorded against the graph.

use std::fmt;

use super::vertex::{Vertex, VertexId, VertexKind};

/// A problem found while building or linking the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    StopUnlinked { vertex: VertexId, label: String },
    RentalStationUnlinked { vertex: VertexId, label: String },
    ParkUnlinked { vertex: VertexId, label: String },
}

impl Annotation {
    /// The annotation for a vertex that could not be linked to the streets.
    ///
    /// Returns `None` for vertex kinds that are never linked.
    pub fn unlinked(vertex: &Vertex) -> Option<Self> {
        let id = vertex.id();
        let label = vertex.label().to_string();
        match vertex.kind() {
            VertexKind::TransitStop { .. } => Some(Annotation::StopUnlinked { vertex: id, label }),
            VertexKind::BikeRentalStation { .. } => {
                Some(Annotation::RentalStationUnlinked { vertex: id, label })
            }
            VertexKind::BikePark | VertexKind::CarPark => {
                Some(Annotation::ParkUnlinked { vertex: id, label })
            }
            _ => None,
        }
    }

    pub fn vertex(&self) -> VertexId {
        match self {
            Annotation::StopUnlinked { vertex, .. }
            | Annotation::RentalStationUnlinked { vertex, .. }
            | Annotation::ParkUnlinked { vertex, .. } => *vertex,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::StopUnlinked { label, .. } => {
                write!(f, "Stop {label} not near any streets; it will not be usable")
            }
            Annotation::RentalStationUnlinked { label, .. } => write!(
                f,
                "Bike rental station {label} not near any streets; it will not be usable"
            ),
            Annotation::ParkUnlinked { label, .. } => {
                write!(f, "Park {label} not near any streets; it will not be usable")
            }
        }
    }
}
