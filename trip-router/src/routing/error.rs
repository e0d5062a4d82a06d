//! Routing errors.

use crate::graph::VertexId;

/// Why a trip could not be planned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    /// Origin or destination is not in the graph
    #[error("vertex not found: {}", missing.join(", "))]
    VertexNotFound { missing: Vec<String> },

    /// The search finished without reaching the destination
    #[error("no path found")]
    PathNotFound,

    /// The origin has no way out
    #[error("location {0} is not accessible")]
    LocationNotAccessible(VertexId),

    /// Origin and destination are the same vertex
    #[error("origin and destination are the same")]
    TrivialPath,

    /// The request itself is invalid
    #[error("bogus parameter: {0}")]
    BogusParameter(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = RoutingError::VertexNotFound {
            missing: vec!["from".into(), "to".into()],
        };
        assert_eq!(err.to_string(), "vertex not found: from, to");

        let err = RoutingError::LocationNotAccessible(VertexId(4));
        assert_eq!(err.to_string(), "location v4 is not accessible");

        let err = RoutingError::BogusParameter("walk speed must be positive".into());
        assert_eq!(err.to_string(), "bogus parameter: walk speed must be positive");
    }
}
