//! Normalized booking collection state
//!
//! [`BookingState`] is the single source of truth the reducer mutates. It
//! holds server-confirmed entries in a by-id map plus an explicit insertion
//! order, a request-lifecycle flag pair (`loading`, `last_error`), and a
//! monotonic revision counter that derived-view caches key on.
//!
//! Revision semantics: the counter advances exactly when an entry is added,
//! replaced, or removed. Flipping `loading` or recording an error does not
//! advance it, so memoized selectors stay valid across request lifecycle
//! noise.

use crate::error::BookingError;
use crate::types::{Booking, BookingId};
use std::collections::HashMap;

/// The synchronized booking collection plus request lifecycle flags
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BookingState {
    entries: HashMap<BookingId, Booking>,
    /// Display order, newest first. Every id here has an entry and vice versa.
    order: Vec<BookingId>,
    loading: bool,
    last_error: Option<BookingError>,
    revision: u64,
}

impl BookingState {
    /// Create an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bookings held
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the collection is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up a booking by id
    #[must_use]
    pub fn get(&self, id: &BookingId) -> Option<&Booking> {
        self.entries.get(id)
    }

    /// Iterate bookings in display order (newest first)
    pub fn iter(&self) -> impl Iterator<Item = &Booking> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Whether a request is currently in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// The most recent operation failure, if any
    #[must_use]
    pub const fn error(&self) -> Option<&BookingError> {
        self.last_error.as_ref()
    }

    /// Current revision of the entity collection
    ///
    /// Advances on every add, replace, or remove and on nothing else.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Mark a request as dispatched: loading on, previous error cleared
    pub(crate) fn begin_request(&mut self) {
        self.loading = true;
        self.last_error = None;
    }

    /// Settle a request with a single confirmed booking
    ///
    /// Unknown ids are inserted at the head of the display order; known ids
    /// are replaced in place. The entry is reconciled against any existing
    /// one so the local tracking log never shrinks.
    pub(crate) fn fulfill(&mut self, booking: Booking) {
        self.loading = false;
        self.last_error = None;
        self.upsert(booking);
    }

    /// Settle a request with the full collection, in server order
    pub(crate) fn fulfill_list(&mut self, bookings: Vec<Booking>) {
        self.loading = false;
        self.last_error = None;
        self.entries.clear();
        self.order.clear();
        for booking in bookings {
            self.order.push(booking.id);
            self.entries.insert(booking.id, booking);
        }
        self.revision += 1;
    }

    /// Settle a request with a failure
    ///
    /// The collection is untouched; only the lifecycle flags change.
    pub(crate) fn reject(&mut self, error: BookingError) {
        self.loading = false;
        self.last_error = Some(error);
    }

    /// Merge a pushed snapshot into the collection
    ///
    /// Last writer wins by arrival order: the incoming snapshot replaces any
    /// existing entry wholesale, except that a tracking log shorter than the
    /// local one is ignored in favor of the local log. Unknown ids are
    /// inserted at the head. Merging a snapshot identical to the existing
    /// entry is a no-op, revision included, so duplicate frames cannot
    /// invalidate derived-view caches.
    ///
    /// The request lifecycle flags are deliberately not touched here: a push
    /// arriving mid-request must not clear `loading` or `last_error`.
    pub fn merge_incoming(&mut self, booking: Booking) {
        let reconciled = reconcile_tracking(self.entries.get(&booking.id), booking);
        if self.entries.get(&reconciled.id) == Some(&reconciled) {
            return;
        }
        if !self.entries.contains_key(&reconciled.id) {
            self.order.insert(0, reconciled.id);
        }
        self.entries.insert(reconciled.id, reconciled);
        self.revision += 1;
    }

    fn upsert(&mut self, booking: Booking) {
        let reconciled = reconcile_tracking(self.entries.get(&booking.id), booking);
        if !self.entries.contains_key(&reconciled.id) {
            self.order.insert(0, reconciled.id);
        }
        self.entries.insert(reconciled.id, reconciled);
        self.revision += 1;
    }
}

/// Keep the longer of the local and incoming tracking logs
///
/// The tracking log is append-only on the server, so a shorter incoming log
/// means a stale or partial snapshot. Everything else in the incoming
/// snapshot still wins.
fn reconcile_tracking(existing: Option<&Booking>, mut incoming: Booking) -> Booking {
    if let Some(current) = existing {
        if current.tracking.len() > incoming.tracking.len() {
            incoming.tracking.clone_from(&current.tracking);
        }
    }
    incoming
}
