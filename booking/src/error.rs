//! Error taxonomy for booking operations
//!
//! Every failure surfaced to callers is one of these four variants. Errors
//! are plain data (cloneable, serializable) so they can live in state and
//! cross the action broadcast.

use crate::types::{BookingId, BookingStatus, Role};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failed booking operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum BookingError {
    /// The request payload was rejected before any network call
    #[error("validation failed: {0}")]
    Validation(String),

    /// The requested status change is not a legal lifecycle edge
    #[error("invalid transition from {from} to {to} for {actor}")]
    InvalidTransition {
        /// Status the booking is currently in
        from: BookingStatus,
        /// Status the operation attempted to move to
        to: BookingStatus,
        /// Party that attempted the change
        actor: Role,
    },

    /// The server rejected the operation or the request never completed
    #[error("request failed: {0}")]
    RequestFailed(String),

    /// The referenced booking does not exist
    #[error("booking {0} not found")]
    NotFound(BookingId),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn errors_render_human_readable_messages() {
        let err = BookingError::InvalidTransition {
            from: BookingStatus::Completed,
            to: BookingStatus::Pending,
            actor: Role::Client,
        };
        assert_eq!(
            err.to_string(),
            "invalid transition from completed to pending for client"
        );

        let err = BookingError::Validation("amount must be positive".into());
        assert_eq!(err.to_string(), "validation failed: amount must be positive");
    }

    #[test]
    fn errors_survive_serialization() {
        let id = BookingId::new();
        let err = BookingError::NotFound(id);
        let json = serde_json::to_string(&err).unwrap();
        let back: BookingError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
