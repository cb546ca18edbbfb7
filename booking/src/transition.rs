//! Booking lifecycle transition rules
//!
//! The lifecycle is a fixed directed graph over [`BookingStatus`] with each
//! edge restricted to an actor. Any (from, to, actor) triple not listed in
//! [`is_allowed`] is rejected; there is no fallback path and terminal
//! statuses have no outgoing edges.

use crate::error::BookingError;
use crate::types::{BookingStatus, Role};

/// Whether `actor` may move a booking from `current` to `next`
///
/// Self-transitions are never allowed; the merge path handles same-status
/// snapshots separately and never consults this table.
#[must_use]
pub const fn is_allowed(current: BookingStatus, next: BookingStatus, actor: Role) -> bool {
    use crate::types::BookingStatus::{Cancelled, Completed, Confirmed, InProgress, Pending, Quoted};
    use crate::types::Role::{Client, Provider};

    matches!(
        (current, next, actor),
        (Pending, Quoted, Provider)
            | (Pending, Confirmed, Provider)
            | (Pending, Cancelled, Client | Provider)
            | (Quoted, Confirmed, Client)
            | (Quoted, Cancelled, Client)
            | (Confirmed, InProgress, Provider)
            | (Confirmed, Cancelled, Client | Provider)
            | (InProgress, Completed, Provider)
    )
}

/// Validate a transition, producing the error the caller should surface
///
/// # Errors
///
/// Returns [`BookingError::InvalidTransition`] when the edge is not in the
/// lifecycle graph for the given actor.
pub fn validate_transition(
    current: BookingStatus,
    next: BookingStatus,
    actor: Role,
) -> Result<(), BookingError> {
    if is_allowed(current, next, actor) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition {
            from: current,
            to: next,
            actor,
        })
    }
}

/// Statuses `actor` may move a booking to from `current`
///
/// Useful for rendering action menus without duplicating the edge table.
#[must_use]
pub fn successors(current: BookingStatus, actor: Role) -> Vec<BookingStatus> {
    ALL_STATUSES
        .iter()
        .copied()
        .filter(|next| is_allowed(current, *next, actor))
        .collect()
}

const ALL_STATUSES: [BookingStatus; 6] = [
    BookingStatus::Pending,
    BookingStatus::Quoted,
    BookingStatus::Confirmed,
    BookingStatus::InProgress,
    BookingStatus::Completed,
    BookingStatus::Cancelled,
];
