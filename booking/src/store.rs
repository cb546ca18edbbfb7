//! Session-scoped booking store facade
//!
//! [`BookingStore`] wraps the generic runtime store with typed operations
//! that resolve like requests: each dispatches a command and waits on the
//! action broadcast for the matching fulfilled or rejected outcome. Created
//! explicitly at session start and torn down with
//! [`shutdown`](BookingStore::shutdown) at session end.

use crate::actions::BookingAction;
use crate::api::ApiError;
use crate::config::Config;
use crate::environment::BookingEnvironment;
use crate::error::BookingError;
use crate::realtime::{PushConsumer, PushEvent};
use crate::reducer::BookingReducer;
use crate::state::BookingState;
use crate::types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, PaymentIntent, PaymentMethod,
    QuoteRequest, Role,
};
use booking_sync_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// Concrete runtime store for the booking domain
pub type SyncStore = Store<BookingState, BookingAction, BookingEnvironment, BookingReducer>;

const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PUSH_CAPACITY: usize = 64;

/// Typed facade over the booking store runtime
pub struct BookingStore {
    inner: SyncStore,
    environment: BookingEnvironment,
    operation_timeout: Duration,
    push_capacity: usize,
    consumer_shutdown: broadcast::Sender<()>,
}

impl BookingStore {
    /// Create a store with an explicit environment
    #[must_use]
    pub fn new(environment: BookingEnvironment) -> Self {
        Self::with_timeout(environment, DEFAULT_OPERATION_TIMEOUT)
    }

    /// Create a store with an explicit per-operation timeout
    #[must_use]
    pub fn with_timeout(environment: BookingEnvironment, operation_timeout: Duration) -> Self {
        let inner = Store::new(
            BookingState::new(),
            BookingReducer::new(),
            environment.clone(),
        );
        let (consumer_shutdown, _) = broadcast::channel(1);
        Self {
            inner,
            environment,
            operation_timeout,
            push_capacity: DEFAULT_PUSH_CAPACITY,
            consumer_shutdown,
        }
    }

    /// Create the production store from configuration
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        let environment = BookingEnvironment::from_config(&config.api)?;
        let mut store = Self::with_timeout(
            environment,
            config.api.request_timeout() + Duration::from_secs(5),
        );
        store.push_capacity = config.realtime.channel_capacity;
        Ok(store)
    }

    /// The underlying runtime store
    #[must_use]
    pub const fn store(&self) -> &SyncStore {
        &self.inner
    }

    /// Attach a realtime frame channel; returns the consumer task handle
    ///
    /// Frames received on the channel are merged through the reducer. The
    /// consumer stops when the channel closes or the store shuts down.
    #[must_use]
    pub fn attach_push_channel(&self, frames: mpsc::Receiver<PushEvent>) -> JoinHandle<()> {
        PushConsumer::new(
            "booking-push",
            frames,
            self.inner.clone(),
            self.consumer_shutdown.subscribe(),
        )
        .spawn()
    }

    /// Open a push frame channel sized from configuration and attach it
    ///
    /// Returns the sender half for the socket layer to feed and the consumer
    /// task handle. The channel capacity comes from
    /// `BOOKING_PUSH_CAPACITY` when the store was built from configuration.
    #[must_use]
    pub fn open_push_channel(&self) -> (mpsc::Sender<PushEvent>, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(self.push_capacity);
        (sender, self.attach_push_channel(receiver))
    }

    /// Load the collection for the session role, replacing local entries
    ///
    /// # Errors
    ///
    /// Returns the failure recorded for the request, including timeouts.
    pub async fn refresh(&self, role: Role) -> Result<Vec<Booking>, BookingError> {
        let action = self
            .send_and_wait(BookingAction::LoadBookings { role }, |action| {
                matches!(
                    action,
                    BookingAction::BookingsLoaded { .. }
                        | BookingAction::OperationFailed { id: None, .. }
                )
            })
            .await?;
        match action {
            BookingAction::BookingsLoaded { bookings } => Ok(bookings),
            BookingAction::OperationFailed { error, .. } => Err(error),
            _ => Err(unexpected()),
        }
    }

    /// Create a booking and wait for the server-confirmed entity
    ///
    /// # Errors
    ///
    /// Returns the validation or request failure recorded for the operation.
    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        // Creation carries no id to correlate on, so any id-less failure
        // (a concurrently rejected load, for example) settles this wait.
        // Callers should not run id-less operations concurrently on one
        // store, just as same-id operations are not serialized.
        let action = self
            .send_and_wait(BookingAction::CreateBooking { request }, |action| {
                matches!(
                    action,
                    BookingAction::BookingCreated { .. }
                        | BookingAction::OperationFailed { id: None, .. }
                )
            })
            .await?;
        match action {
            BookingAction::BookingCreated { booking } => Ok(*booking),
            BookingAction::OperationFailed { error, .. } => Err(error),
            _ => Err(unexpected()),
        }
    }

    /// Provider: move a booking along the lifecycle
    ///
    /// # Errors
    ///
    /// Returns the transition or request failure recorded for the operation.
    pub async fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> Result<Booking, BookingError> {
        self.updating(BookingAction::UpdateStatus { id, status, notes }, id)
            .await
    }

    /// Client: cancel a booking
    ///
    /// # Errors
    ///
    /// Returns the transition or request failure recorded for the operation.
    pub async fn cancel(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.updating(BookingAction::CancelBooking { id }, id).await
    }

    /// Provider: attach a quote
    ///
    /// # Errors
    ///
    /// Returns the validation or request failure recorded for the operation.
    pub async fn submit_quote(
        &self,
        id: BookingId,
        quote: QuoteRequest,
    ) -> Result<Booking, BookingError> {
        self.updating(BookingAction::SubmitQuote { id, quote }, id)
            .await
    }

    /// Client: accept or decline a quote
    ///
    /// # Errors
    ///
    /// Returns the transition or request failure recorded for the operation.
    pub async fn respond_to_quote(
        &self,
        id: BookingId,
        approved: bool,
    ) -> Result<Booking, BookingError> {
        self.updating(BookingAction::RespondToQuote { id, approved }, id)
            .await
    }

    /// Client: review a completed booking
    ///
    /// # Errors
    ///
    /// Returns the validation or request failure recorded for the operation.
    pub async fn add_review(
        &self,
        id: BookingId,
        score: u8,
        review: String,
    ) -> Result<Booking, BookingError> {
        self.updating(BookingAction::AddReview { id, score, review }, id)
            .await
    }

    /// Client: report a processor-side payment for verification
    ///
    /// # Errors
    ///
    /// Returns the request failure recorded for the operation.
    pub async fn confirm_payment(
        &self,
        id: BookingId,
        method: PaymentMethod,
        transaction_id: String,
    ) -> Result<Booking, BookingError> {
        self.updating(
            BookingAction::ConfirmPayment {
                id,
                method,
                transaction_id,
            },
            id,
        )
        .await
    }

    /// Create a processor-side payment intent for the booking
    ///
    /// Direct API pass-through: the intent is handed to the payment SDK and
    /// never becomes part of synchronized state. The processor picks the
    /// endpoint: Stripe intents, Razorpay orders.
    ///
    /// # Errors
    ///
    /// Returns the request failure, including unknown booking ids.
    pub async fn create_payment_intent(
        &self,
        id: BookingId,
        method: PaymentMethod,
    ) -> Result<PaymentIntent, BookingError> {
        let request = match method {
            PaymentMethod::Stripe => self.environment.api.create_payment_intent(id),
            PaymentMethod::Razorpay => self.environment.api.create_payment_order(id),
        };
        request
            .await
            .map_err(|error| error.into_booking_error(Some(id)))
    }

    /// Snapshot of all bookings in display order
    pub async fn bookings(&self) -> Vec<Booking> {
        self.inner
            .state(|state| state.iter().cloned().collect())
            .await
    }

    /// Snapshot of one booking
    pub async fn booking(&self, id: BookingId) -> Option<Booking> {
        self.inner.state(move |state| state.get(&id).cloned()).await
    }

    /// The most recent operation failure, if any
    pub async fn last_error(&self) -> Option<BookingError> {
        self.inner.state(|state| state.error().cloned()).await
    }

    /// Whether a request is currently in flight
    pub async fn is_loading(&self) -> bool {
        self.inner.state(BookingState::is_loading).await
    }

    /// Observe every action produced by effects on this store
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<BookingAction> {
        self.inner.subscribe_actions()
    }

    /// Tear the session down: stop push consumers, drain effects
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// when the timeout expires.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        let _ = self.consumer_shutdown.send(());
        self.inner.shutdown(timeout).await
    }

    /// Dispatch a command and wait for its matching terminal action
    async fn send_and_wait<F>(
        &self,
        action: BookingAction,
        predicate: F,
    ) -> Result<BookingAction, BookingError>
    where
        F: Fn(&BookingAction) -> bool,
    {
        self.inner
            .send_and_wait_for(action, predicate, self.operation_timeout)
            .await
            .map_err(|error| BookingError::RequestFailed(error.to_string()))
    }

    /// Shared tail for operations that settle with an updated booking
    async fn updating(
        &self,
        action: BookingAction,
        id: BookingId,
    ) -> Result<Booking, BookingError> {
        let action = self
            .send_and_wait(action, move |action| match action {
                BookingAction::BookingUpdated { booking } => booking.id == id,
                BookingAction::OperationFailed {
                    id: failed_id, ..
                } => *failed_id == Some(id),
                _ => false,
            })
            .await?;
        match action {
            BookingAction::BookingUpdated { booking } => Ok(*booking),
            BookingAction::OperationFailed { error, .. } => Err(error),
            _ => Err(unexpected()),
        }
    }
}

impl std::fmt::Debug for BookingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingStore")
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}

/// A terminal action the predicate matched but the mapper did not expect.
/// Unreachable as long as predicates and mappers agree.
fn unexpected() -> BookingError {
    BookingError::RequestFailed("unexpected terminal action".into())
}
