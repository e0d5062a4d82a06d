//! Domain error types.
//!
//! These errors represent validation failures of raw values entering the
//! domain layer. They are distinct from graph integrity and I/O errors.

/// Domain-level errors for validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// Coordinate outside the WGS84 range
    #[error("invalid coordinate: lon {lon}, lat {lat}")]
    InvalidCoordinate { lon: f64, lat: f64 },

    /// A geometry needs at least two points
    #[error("geometry must have at least two points")]
    DegenerateGeometry,
}
