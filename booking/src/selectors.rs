//! Derived views over the booking collection
//!
//! Selectors are pure functions of [`BookingState`]. [`Memoized`] caches a
//! computed view keyed on the state's revision counter, so recomputation
//! happens exactly when an entry was added, replaced, or removed. Request
//! lifecycle churn (loading flips, errors) never invalidates a cache.

use crate::state::BookingState;
use crate::types::{Booking, BookingId, BookingStatus};
use std::collections::HashMap;

/// All bookings in display order (newest first)
#[must_use]
pub fn all_bookings(state: &BookingState) -> Vec<&Booking> {
    state.iter().collect()
}

/// A single booking by id
#[must_use]
pub fn by_id<'a>(state: &'a BookingState, id: &BookingId) -> Option<&'a Booking> {
    state.get(id)
}

/// Bookings currently in the given status, in display order
#[must_use]
pub fn by_status(state: &BookingState, status: BookingStatus) -> Vec<&Booking> {
    state.iter().filter(|b| b.status == status).collect()
}

/// Count of bookings per status
///
/// Statuses with no bookings are absent from the map.
#[must_use]
pub fn status_counts(state: &BookingState) -> HashMap<BookingStatus, usize> {
    let mut counts = HashMap::new();
    for booking in state.iter() {
        *counts.entry(booking.status).or_insert(0) += 1;
    }
    counts
}

/// Dashboard rollup of the collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookingCounts {
    /// All bookings held
    pub total: usize,
    /// Pending, quoted, confirmed, or in progress
    pub active: usize,
    /// Completed bookings
    pub completed: usize,
    /// Cancelled bookings
    pub cancelled: usize,
}

/// Compute the dashboard rollup
#[must_use]
pub fn counts(state: &BookingState) -> BookingCounts {
    let mut result = BookingCounts::default();
    for booking in state.iter() {
        result.total += 1;
        match booking.status {
            BookingStatus::Completed => result.completed += 1,
            BookingStatus::Cancelled => result.cancelled += 1,
            _ => result.active += 1,
        }
    }
    result
}

/// A derived view cached against the state revision
///
/// # Example
///
/// ```ignore
/// let mut active = Memoized::new();
/// let view = active.get_or_compute(&state, |s| {
///     selectors::by_status(s, BookingStatus::Confirmed)
///         .into_iter()
///         .cloned()
///         .collect::<Vec<_>>()
/// });
/// ```
#[derive(Debug, Clone, Default)]
pub struct Memoized<T> {
    cached: Option<(u64, T)>,
}

impl<T: Clone> Memoized<T> {
    /// Create an empty cache
    #[must_use]
    pub const fn new() -> Self {
        Self { cached: None }
    }

    /// Return the cached view, recomputing only when the revision moved
    pub fn get_or_compute<F>(&mut self, state: &BookingState, compute: F) -> T
    where
        F: FnOnce(&BookingState) -> T,
    {
        if let Some((revision, value)) = &self.cached {
            if *revision == state.revision() {
                return value.clone();
            }
        }
        let value = compute(state);
        self.cached = Some((state.revision(), value.clone()));
        value
    }

    /// Drop the cached view
    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}
