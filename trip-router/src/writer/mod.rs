//! Serialized application of graph mutations.
//!
//! Updaters describe their changes as [`MutationUnit`]s and hand them to the
//! [`GraphWriter`], which applies one unit at a time in submission order.

mod error;
mod queue;
mod unit;

pub use error::WriterError;
pub use queue::{GraphWriter, PendingWrite};
pub use unit::{ApplyReport, GraphOp, MutationUnit};
