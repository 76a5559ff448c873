//! Prediction errors.
//!
//! Every variant means the event stream contradicts what the tree already
//! recorded. None is retried; the caller must reconcile its history.

use thiserror::Error;

/// The result type used throughout the crate.
pub type Result<T> = std::result::Result<T, PredictError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// A legion would hold more creatures than the rules allow.
    #[error("legion {marker} holds {height} creatures, more than {max}")]
    CapacityViolation {
        marker: String,
        height: usize,
        max: usize,
    },

    /// A full-height legion was split other than into two legal halves.
    #[error("illegal initial split of {marker}: {reason}")]
    IllegalInitialSplit { marker: String, reason: String },

    /// Revealed or derived certainties cannot all hold at once.
    #[error("certainty violation in {marker}: {reason}")]
    CertaintyViolation { marker: String, reason: String },

    /// The event does not fit the shape of the tree.
    #[error("structural violation: {0}")]
    StructuralViolation(String),

    /// Two legions expected to be siblings are not.
    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    /// The event names a creature the catalog does not list.
    #[error("unknown creature type {0}")]
    UnknownCreature(String),
}

impl PredictError {
    pub(crate) fn certainty(marker: &str, reason: impl Into<String>) -> Self {
        Self::CertaintyViolation {
            marker: marker.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn structural(reason: impl Into<String>) -> Self {
        Self::StructuralViolation(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PredictError::CapacityViolation {
            marker: "Rd01".into(),
            height: 9,
            max: 8,
        };
        assert_eq!(err.to_string(), "legion Rd01 holds 9 creatures, more than 8");

        let err = PredictError::certainty("Rd02", "count 5 exceeds height 4");
        assert_eq!(
            err.to_string(),
            "certainty violation in Rd02: count 5 exceeds height 4"
        );

        let err = PredictError::NotAChild {
            parent: "Rd01(0)".into(),
            child: "Rd03(2)".into(),
        };
        assert!(err.to_string().contains("not a child"));
    }
}
