//! The booking reducer
//!
//! All business logic lives here. Commands are validated against local
//! state, then either rejected on the spot or turned into exactly one
//! network effect; the effect settles by feeding a `BookingUpdated`-family
//! event or `OperationFailed` back through the store. Entries are never
//! mutated optimistically: the collection only changes when a server
//! response or push frame says so.
//!
//! Local rejections set the error synchronously and additionally echo an
//! `OperationFailed` through the action broadcast, so request-response
//! callers observe the failure the same way they observe a server one.

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::error::BookingError;
use crate::state::BookingState;
use crate::transition::validate_transition;
use crate::types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, PaymentMethod, QuoteRequest, Role,
};
use booking_sync_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::future::Future;
use std::sync::Arc;

type Effects = SmallVec<[Effect<BookingAction>; 4]>;

/// Reducer driving the booking collection
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Create the reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Reject a command before any network call
    ///
    /// Sets the error immediately and echoes it as an event for observers.
    fn reject_local(
        state: &mut BookingState,
        id: Option<BookingId>,
        error: BookingError,
    ) -> Effects {
        tracing::debug!(?id, %error, "command rejected locally");
        state.reject(error.clone());
        smallvec![Effect::future(async move {
            Some(BookingAction::OperationFailed { id, error })
        })]
    }

    /// Mark the request dispatched and return its network effect
    fn dispatch(state: &mut BookingState, effect: Effect<BookingAction>) -> Effects {
        state.begin_request();
        smallvec![effect]
    }

    /// Current status of the booking a command targets
    fn current_status(state: &BookingState, id: BookingId) -> Result<BookingStatus, BookingError> {
        state
            .get(&id)
            .map(|booking| booking.status)
            .ok_or(BookingError::NotFound(id))
    }

    fn validate_create(
        request: &CreateBookingRequest,
        env: &BookingEnvironment,
    ) -> Result<(), BookingError> {
        if !request.amount.is_positive() {
            return Err(BookingError::Validation("amount must be positive".into()));
        }
        if request.scheduled_date <= env.clock.now() {
            return Err(BookingError::Validation(
                "scheduled date must be in the future".into(),
            ));
        }
        Ok(())
    }

    fn validate_quote(quote: &QuoteRequest) -> Result<(), BookingError> {
        if !quote.price.is_positive() {
            return Err(BookingError::Validation(
                "quoted price must be positive".into(),
            ));
        }
        if quote.estimated_hours <= 0.0 {
            return Err(BookingError::Validation(
                "estimated hours must be positive".into(),
            ));
        }
        Ok(())
    }

    fn handle_create(
        state: &mut BookingState,
        request: CreateBookingRequest,
        env: &BookingEnvironment,
    ) -> Effects {
        if let Err(error) = Self::validate_create(&request, env) {
            return Self::reject_local(state, None, error);
        }
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Effect::future(async move {
                Some(match api.create(request).await {
                    Ok(booking) => BookingAction::BookingCreated {
                        booking: Box::new(booking),
                    },
                    Err(error) => BookingAction::OperationFailed {
                        id: None,
                        error: error.into_booking_error(None),
                    },
                })
            }),
        )
    }

    fn handle_load(state: &mut BookingState, role: Role, env: &BookingEnvironment) -> Effects {
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Effect::future(async move {
                Some(match api.list(role).await {
                    Ok(bookings) => BookingAction::BookingsLoaded { bookings },
                    Err(error) => BookingAction::OperationFailed {
                        id: None,
                        error: error.into_booking_error(None),
                    },
                })
            }),
        )
    }

    /// Shared tail for commands that settle with an updated booking
    fn updating_effect<F>(id: BookingId, call: F) -> Effect<BookingAction>
    where
        F: Future<Output = Result<Booking, crate::api::ApiError>> + Send + 'static,
    {
        Effect::future(async move {
            Some(match call.await {
                Ok(booking) => BookingAction::BookingUpdated {
                    booking: Box::new(booking),
                },
                Err(error) => BookingAction::OperationFailed {
                    id: Some(id),
                    error: error.into_booking_error(Some(id)),
                },
            })
        })
    }

    fn handle_update_status(
        state: &mut BookingState,
        id: BookingId,
        status: BookingStatus,
        notes: Option<String>,
        env: &BookingEnvironment,
    ) -> Effects {
        let current = match Self::current_status(state, id) {
            Ok(status) => status,
            Err(error) => return Self::reject_local(state, Some(id), error),
        };
        if let Err(error) = validate_transition(current, status, Role::Provider) {
            return Self::reject_local(state, Some(id), error);
        }
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Self::updating_effect(id, async move { api.update_status(id, status, notes).await }),
        )
    }

    fn handle_cancel(state: &mut BookingState, id: BookingId, env: &BookingEnvironment) -> Effects {
        let current = match Self::current_status(state, id) {
            Ok(status) => status,
            Err(error) => return Self::reject_local(state, Some(id), error),
        };
        if let Err(error) = validate_transition(current, BookingStatus::Cancelled, Role::Client) {
            return Self::reject_local(state, Some(id), error);
        }
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Self::updating_effect(id, async move { api.cancel(id).await }),
        )
    }

    fn handle_submit_quote(
        state: &mut BookingState,
        id: BookingId,
        quote: QuoteRequest,
        env: &BookingEnvironment,
    ) -> Effects {
        let current = match Self::current_status(state, id) {
            Ok(status) => status,
            Err(error) => return Self::reject_local(state, Some(id), error),
        };
        if !matches!(current, BookingStatus::Pending | BookingStatus::Quoted) {
            return Self::reject_local(
                state,
                Some(id),
                BookingError::Validation(format!("cannot quote a booking in status {current}")),
            );
        }
        if let Err(error) = Self::validate_quote(&quote) {
            return Self::reject_local(state, Some(id), error);
        }
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Self::updating_effect(id, async move { api.submit_quote(id, quote).await }),
        )
    }

    fn handle_respond_to_quote(
        state: &mut BookingState,
        id: BookingId,
        approved: bool,
        env: &BookingEnvironment,
    ) -> Effects {
        let current = match Self::current_status(state, id) {
            Ok(status) => status,
            Err(error) => return Self::reject_local(state, Some(id), error),
        };
        let target = if approved {
            BookingStatus::Confirmed
        } else {
            BookingStatus::Cancelled
        };
        if let Err(error) = validate_transition(current, target, Role::Client) {
            return Self::reject_local(state, Some(id), error);
        }
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Self::updating_effect(id, async move { api.respond_to_quote(id, approved).await }),
        )
    }

    fn handle_add_review(
        state: &mut BookingState,
        id: BookingId,
        score: u8,
        review: String,
        env: &BookingEnvironment,
    ) -> Effects {
        if let Err(error) = Self::current_status(state, id) {
            return Self::reject_local(state, Some(id), error);
        }
        if !(1..=5).contains(&score) {
            return Self::reject_local(
                state,
                Some(id),
                BookingError::Validation("score must be between 1 and 5".into()),
            );
        }
        // Completion is the server's call: a push may have completed the
        // booking before our snapshot caught up, so no local status check.
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Self::updating_effect(id, async move { api.add_review(id, score, review).await }),
        )
    }

    fn handle_confirm_payment(
        state: &mut BookingState,
        id: BookingId,
        method: PaymentMethod,
        transaction_id: String,
        env: &BookingEnvironment,
    ) -> Effects {
        if let Err(error) = Self::current_status(state, id) {
            return Self::reject_local(state, Some(id), error);
        }
        let api = Arc::clone(&env.api);
        Self::dispatch(
            state,
            Self::updating_effect(id, async move {
                api.verify_payment(id, method, transaction_id).await
            }),
        )
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Effects {
        match action {
            // Commands
            BookingAction::CreateBooking { request } => Self::handle_create(state, request, env),
            BookingAction::LoadBookings { role } => Self::handle_load(state, role, env),
            BookingAction::UpdateStatus { id, status, notes } => {
                Self::handle_update_status(state, id, status, notes, env)
            },
            BookingAction::CancelBooking { id } => Self::handle_cancel(state, id, env),
            BookingAction::SubmitQuote { id, quote } => {
                Self::handle_submit_quote(state, id, quote, env)
            },
            BookingAction::RespondToQuote { id, approved } => {
                Self::handle_respond_to_quote(state, id, approved, env)
            },
            BookingAction::AddReview { id, score, review } => {
                Self::handle_add_review(state, id, score, review, env)
            },
            BookingAction::ConfirmPayment {
                id,
                method,
                transaction_id,
            } => Self::handle_confirm_payment(state, id, method, transaction_id, env),

            // Events
            BookingAction::BookingCreated { booking } => {
                tracing::info!(id = %booking.id, "booking created");
                state.fulfill(*booking);
                smallvec![]
            },
            BookingAction::BookingsLoaded { bookings } => {
                tracing::info!(count = bookings.len(), "bookings loaded");
                state.fulfill_list(bookings);
                smallvec![]
            },
            BookingAction::BookingUpdated { booking } => {
                tracing::info!(id = %booking.id, status = %booking.status, "booking updated");
                state.fulfill(*booking);
                smallvec![]
            },
            BookingAction::OperationFailed { id, error } => {
                tracing::warn!(?id, %error, "operation failed");
                state.reject(error);
                smallvec![]
            },

            // Pushes: merge only, lifecycle flags untouched
            BookingAction::RemoteBookingCreated { booking }
            | BookingAction::RemoteStatusChanged { booking } => {
                tracing::debug!(id = %booking.id, status = %booking.status, "realtime merge");
                state.merge_incoming(*booking);
                smallvec![]
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::MockBookingApi;
    use crate::state::test_support::sample_booking;
    use crate::types::{Money, ProviderId, ServiceId};
    use booking_sync_testing::{FixedClock, ReducerTest, assertions};
    use chrono::{TimeZone, Utc};

    fn test_env() -> BookingEnvironment {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        BookingEnvironment::new(
            Arc::new(MockBookingApi::new()),
            Arc::new(FixedClock::new(now)),
        )
    }

    fn state_with(bookings: Vec<Booking>) -> BookingState {
        let mut state = BookingState::new();
        for booking in bookings {
            state.merge_incoming(booking);
        }
        state
    }

    fn create_request() -> CreateBookingRequest {
        CreateBookingRequest {
            service_id: ServiceId::new(),
            provider_id: ProviderId::new(),
            scheduled_date: Utc.with_ymd_and_hms(2025, 6, 3, 9, 0, 0).unwrap(),
            amount: Money::from_major(120),
            notes: None,
        }
    }

    #[test]
    fn valid_create_enters_loading_and_dispatches() {
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::new())
            .when_action(BookingAction::CreateBooking {
                request: create_request(),
            })
            .then_state(|state| {
                assert!(state.is_loading());
                assert!(state.error().is_none());
                // No optimistic entry.
                assert!(state.is_empty());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        let mut request = create_request();
        request.amount = Money::ZERO;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::new())
            .when_action(BookingAction::CreateBooking { request })
            .then_state(|state| {
                assert!(!state.is_loading());
                assert!(matches!(state.error(), Some(BookingError::Validation(_))));
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn create_rejects_past_scheduled_date() {
        let mut request = create_request();
        request.scheduled_date = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::new())
            .when_action(BookingAction::CreateBooking { request })
            .then_state(|state| {
                assert!(matches!(state.error(), Some(BookingError::Validation(_))));
            })
            .run();
    }

    #[test]
    fn illegal_transition_is_rejected_without_dispatch() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Completed);
        let id = booking.id;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![booking]))
            .when_action(BookingAction::UpdateStatus {
                id,
                status: BookingStatus::InProgress,
                notes: None,
            })
            .then_state(move |state| {
                assert!(!state.is_loading());
                assert_eq!(
                    state.error(),
                    Some(&BookingError::InvalidTransition {
                        from: BookingStatus::Completed,
                        to: BookingStatus::InProgress,
                        actor: Role::Provider,
                    })
                );
                // Entry untouched.
                assert_eq!(state.get(&id).unwrap().status, BookingStatus::Completed);
            })
            .run();
    }

    #[test]
    fn legal_transition_dispatches_request() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Confirmed);
        let id = booking.id;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![booking]))
            .when_action(BookingAction::UpdateStatus {
                id,
                status: BookingStatus::InProgress,
                notes: Some("on my way".into()),
            })
            .then_state(|state| {
                assert!(state.is_loading());
                // Status unchanged until the server confirms.
                assert!(
                    state
                        .iter()
                        .all(|b| b.status == BookingStatus::Confirmed)
                );
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn unknown_id_fails_with_not_found() {
        let id = BookingId::new();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::new())
            .when_action(BookingAction::CancelBooking { id })
            .then_state(move |state| {
                assert_eq!(state.error(), Some(&BookingError::NotFound(id)));
            })
            .run();
    }

    #[test]
    fn quote_submission_requires_pending_or_quoted() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Confirmed);
        let id = booking.id;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![booking]))
            .when_action(BookingAction::SubmitQuote {
                id,
                quote: QuoteRequest {
                    price: Money::from_major(90),
                    estimated_hours: 2.0,
                    notes: None,
                },
            })
            .then_state(|state| {
                assert!(matches!(state.error(), Some(BookingError::Validation(_))));
            })
            .run();
    }

    #[test]
    fn declining_a_quote_targets_cancellation() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Quoted);
        let id = booking.id;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![booking]))
            .when_action(BookingAction::RespondToQuote {
                id,
                approved: false,
            })
            .then_state(|state| {
                assert!(state.is_loading());
                assert!(state.error().is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn quote_response_from_pending_is_rejected() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Pending);
        let id = booking.id;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![booking]))
            .when_action(BookingAction::RespondToQuote { id, approved: true })
            .then_state(|state| {
                assert!(matches!(
                    state.error(),
                    Some(BookingError::InvalidTransition { .. })
                ));
            })
            .run();
    }

    #[test]
    fn review_score_must_be_in_range() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Completed);
        let id = booking.id;
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![booking]))
            .when_action(BookingAction::AddReview {
                id,
                score: 6,
                review: "great".into(),
            })
            .then_state(|state| {
                assert!(matches!(state.error(), Some(BookingError::Validation(_))));
            })
            .run();
    }

    #[test]
    fn created_event_inserts_at_head_and_settles_request() {
        let existing = sample_booking(BookingId::new(), BookingStatus::Pending);
        let created = sample_booking(BookingId::new(), BookingStatus::Pending);
        let (existing_id, created_id) = (existing.id, created.id);
        let mut state = state_with(vec![existing]);
        state.begin_request();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::BookingCreated {
                booking: Box::new(created),
            })
            .then_state(move |state| {
                assert!(!state.is_loading());
                assert!(state.error().is_none());
                let ids: Vec<_> = state.iter().map(|b| b.id).collect();
                assert_eq!(ids, vec![created_id, existing_id]);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn loaded_event_replaces_collection_in_server_order() {
        let stale = sample_booking(BookingId::new(), BookingStatus::Pending);
        let a = sample_booking(BookingId::new(), BookingStatus::Confirmed);
        let b = sample_booking(BookingId::new(), BookingStatus::Completed);
        let (a_id, b_id) = (a.id, b.id);
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state_with(vec![stale]))
            .when_action(BookingAction::BookingsLoaded {
                bookings: vec![a, b],
            })
            .then_state(move |state| {
                let ids: Vec<_> = state.iter().map(|booking| booking.id).collect();
                assert_eq!(ids, vec![a_id, b_id]);
            })
            .run();
    }

    #[test]
    fn failed_event_records_error_and_keeps_collection() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Pending);
        let id = booking.id;
        let mut state = state_with(vec![booking]);
        state.begin_request();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::OperationFailed {
                id: Some(id),
                error: BookingError::RequestFailed("server exploded".into()),
            })
            .then_state(|state| {
                assert!(!state.is_loading());
                assert!(matches!(
                    state.error(),
                    Some(BookingError::RequestFailed(_))
                ));
                assert_eq!(state.len(), 1);
            })
            .run();
    }

    #[test]
    fn pushes_merge_without_touching_lifecycle_flags() {
        let booking = sample_booking(BookingId::new(), BookingStatus::Pending);
        let id = booking.id;
        let mut pushed = booking.clone();
        pushed.status = BookingStatus::Confirmed;
        pushed.tracking.push(crate::types::TrackingEntry {
            status: BookingStatus::Confirmed,
            timestamp: pushed.updated_at,
            notes: None,
        });

        let mut state = state_with(vec![booking]);
        state.begin_request();
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(state)
            .when_action(BookingAction::RemoteStatusChanged {
                booking: Box::new(pushed),
            })
            .then_state(move |state| {
                // Mid-flight request flags survive the merge.
                assert!(state.is_loading());
                assert_eq!(state.get(&id).unwrap().status, BookingStatus::Confirmed);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn conflicting_pushes_resolve_by_arrival_order() {
        let id = BookingId::new();
        let confirmed = sample_booking(id, BookingStatus::Confirmed);
        let cancelled = sample_booking(id, BookingStatus::Cancelled);
        ReducerTest::new(BookingReducer::new())
            .with_env(test_env())
            .given_state(BookingState::new())
            .when_action(BookingAction::RemoteBookingCreated {
                booking: Box::new(confirmed),
            })
            .when_action(BookingAction::RemoteStatusChanged {
                booking: Box::new(cancelled),
            })
            .then_state(move |state| {
                assert_eq!(state.get(&id).unwrap().status, BookingStatus::Cancelled);
            })
            .run();
    }
}
