//! Graph writer error types.

/// Errors from submitting work to the graph writer.
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    /// The writer thread could not be started
    #[error("failed to start graph writer thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The writer has shut down and accepts no more units
    #[error("graph writer is closed")]
    Closed,

    /// The writer stopped before reporting on a submitted unit
    #[error("graph writer stopped before applying unit from {source_name}")]
    Abandoned { source_name: String },
}
