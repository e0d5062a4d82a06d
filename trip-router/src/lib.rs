//! Multi-modal trip router.
//!
//! Plans trips over a live graph of streets, transit and shared vehicles.
//! Path searches read the graph without locks while updaters attach and
//! detach rental vehicles and parking rules through a single writer thread.

pub mod config;
pub mod domain;
pub mod graph;
pub mod linking;
pub mod routing;
pub mod updater;
pub mod writer;
