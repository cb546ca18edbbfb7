//! Actions flowing through the booking store
//!
//! Three classes, marked per variant: commands are user intents that may
//! dispatch a request, events are settled request outcomes fed back by
//! effects, and pushes are realtime frames from the server. The reducer is
//! the only consumer; the class markers drive [`is_command`]/[`is_event`]/
//! [`is_push`] used by logging and tests.
//!
//! [`is_command`]: BookingAction::is_command
//! [`is_event`]: BookingAction::is_event
//! [`is_push`]: BookingAction::is_push

use crate::error::BookingError;
use crate::types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, PaymentMethod, QuoteRequest, Role,
};
use booking_sync_macros::Action;

/// All actions understood by the booking reducer
///
/// Booking payloads are boxed to keep the enum small on the broadcast
/// channel.
#[derive(Debug, Clone, Action)]
pub enum BookingAction {
    // ========================================================================
    // Commands
    // ========================================================================

    /// Client requests a new booking
    #[command]
    CreateBooking {
        /// Validated-then-forwarded creation payload
        request: CreateBookingRequest,
    },

    /// Load the full collection for the session role
    #[command]
    LoadBookings {
        /// Which role's listing endpoint to hit
        role: Role,
    },

    /// Provider moves a booking along the lifecycle
    #[command]
    UpdateStatus {
        /// Target booking
        id: BookingId,
        /// Requested next status
        status: BookingStatus,
        /// Optional note recorded in the tracking log
        notes: Option<String>,
    },

    /// Client cancels a booking
    #[command]
    CancelBooking {
        /// Target booking
        id: BookingId,
    },

    /// Provider attaches a quote to a pending booking
    #[command]
    SubmitQuote {
        /// Target booking
        id: BookingId,
        /// Quote payload
        quote: QuoteRequest,
    },

    /// Client accepts or declines a quote
    #[command]
    RespondToQuote {
        /// Target booking
        id: BookingId,
        /// true confirms the booking, false cancels it
        approved: bool,
    },

    /// Client reviews a completed booking
    #[command]
    AddReview {
        /// Target booking
        id: BookingId,
        /// Score from 1 to 5
        score: u8,
        /// Free-text review
        review: String,
    },

    /// Client reports a processor-side payment for server verification
    #[command]
    ConfirmPayment {
        /// Target booking
        id: BookingId,
        /// Processor that handled the payment
        method: PaymentMethod,
        /// Processor transaction reference
        transaction_id: String,
    },

    // ========================================================================
    // Events
    // ========================================================================

    /// Server confirmed a creation request
    #[event]
    BookingCreated {
        /// The confirmed booking
        booking: Box<Booking>,
    },

    /// Server returned the full collection
    #[event]
    BookingsLoaded {
        /// Bookings in server order
        bookings: Vec<Booking>,
    },

    /// Server confirmed a mutation of an existing booking
    #[event]
    BookingUpdated {
        /// The updated booking snapshot
        booking: Box<Booking>,
    },

    /// A request settled with a failure, or a command was rejected locally
    #[event]
    OperationFailed {
        /// The booking the operation targeted, when it targeted one
        id: Option<BookingId>,
        /// What went wrong
        error: BookingError,
    },

    // ========================================================================
    // Pushes
    // ========================================================================

    /// Realtime frame: a booking was created elsewhere
    #[push]
    RemoteBookingCreated {
        /// The new booking snapshot
        booking: Box<Booking>,
    },

    /// Realtime frame: a booking changed elsewhere
    #[push]
    RemoteStatusChanged {
        /// The changed booking snapshot
        booking: Box<Booking>,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn action_classes_are_marked_correctly() {
        let command = BookingAction::CancelBooking {
            id: BookingId::new(),
        };
        assert!(command.is_command());
        assert!(!command.is_event());
        assert!(!command.is_push());

        let event = BookingAction::OperationFailed {
            id: None,
            error: BookingError::RequestFailed("x".into()),
        };
        assert!(event.is_event());
        assert_eq!(event.event_type(), "OperationFailed.v1");

        let push = BookingAction::RemoteStatusChanged {
            booking: Box::new(crate::state::test_support::sample_booking(
                BookingId::new(),
                BookingStatus::Pending,
            )),
        };
        assert!(push.is_push());
        assert_eq!(push.event_type(), "RemoteStatusChanged.v1");
    }
}
