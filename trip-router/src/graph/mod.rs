//! The live transportation graph.
//!
//! Vertices are owned by an arena inside [`Graph`] and addressed by stable
//! [`VertexId`]s. Edges are shared between the outgoing list of their
//! source and the incoming list of their target. Both lists are
//! copy-on-write snapshots, so path searches read them without locks while
//! updaters keep patching the graph.

mod annotation;
mod edge;
mod error;
mod fixture;
mod store;
mod vertex;

pub use annotation::Annotation;
pub use edge::{Edge, EdgeId, EdgeKind, EdgeTag, StreetSegment, TransitLeg, same_edge};
pub use error::GraphError;
pub use fixture::{NetworkDescription, StreetDescription, TransitDescription, VertexDescription};
pub use store::Graph;
pub use vertex::{EdgeList, Vertex, VertexId, VertexKind};
