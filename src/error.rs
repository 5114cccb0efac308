//! Error types for recovery behaviors

use crate::lifecycle::BehaviorState;
use thiserror::Error;

/// Reasons a behavior phase ends in FAILED.
///
/// Every variant is terminal for the current goal; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    /// Costmap snapshot could not be fetched in time, or the host is shutting down.
    #[error("costmap service unavailable")]
    ServiceUnavailable,

    /// Localization lookup returned no pose.
    #[error("robot pose is not available")]
    PoseUnavailable,

    /// Deadline passed before the target distance was covered.
    #[error("exceeded time allowance before reaching the target distance")]
    TimeExceeded,

    /// The collision checker vetoed the next step.
    #[error("collision ahead")]
    CollisionImminent,

    /// Configure could not acquire a required collaborator.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Operation called in a state that does not accept it.
    #[error("cannot {operation} while {state:?}")]
    InvalidTransition {
        state: BehaviorState,
        operation: &'static str,
    },
}

/// Malformed occupancy grid
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid data has {actual} cells, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("resolution must be positive and finite, got {0}")]
    InvalidResolution(f64),
}
