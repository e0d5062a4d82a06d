//! Attaching off-street vertices to the street network.

mod config;
mod index;
mod splitter;

pub use config::LinkerConfig;
pub use index::StreetIndex;
pub use splitter::{LinkOutcome, LinkReport, StreetSplitter};
