//! Booking REST API client
//!
//! [`BookingApi`] is the seam between the reducer's effects and the network.
//! [`HttpBookingApi`] is the production implementation over `reqwest`;
//! [`MockBookingApi`] is an in-memory server used by tests and demos.
//!
//! Every response is either the full updated booking snapshot (which the
//! reducer applies via an event) or an [`ApiError`] carrying the server's
//! message.

use crate::error::BookingError;
use crate::types::{
    Booking, BookingId, BookingStatus, CreateBookingRequest, PaymentIntent, PaymentMethod,
    QuoteRequest, Role,
};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// A failed API call
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never reached a response (connection, timeout, TLS)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{message}")]
    Status {
        /// HTTP status code
        code: u16,
        /// Server-provided message, or a fallback describing the status
        message: String,
    },

    /// The server answered 404 for the referenced booking
    #[error("booking not found")]
    NotFound,

    /// The response body could not be decoded
    #[error("malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Map into the domain error surfaced in state
    ///
    /// `id` is the booking the operation targeted, when it targeted one; a
    /// 404 without a target id degrades to a request failure.
    #[must_use]
    pub fn into_booking_error(self, id: Option<BookingId>) -> BookingError {
        match (self, id) {
            (Self::NotFound, Some(id)) => BookingError::NotFound(id),
            (error, _) => BookingError::RequestFailed(error.to_string()),
        }
    }
}

/// The operations the booking server exposes
///
/// Object-safe so the environment can hold `Arc<dyn BookingApi>`; methods
/// return boxed futures for the same reason.
pub trait BookingApi: Send + Sync {
    /// `POST /bookings`
    fn create(&self, request: CreateBookingRequest) -> BoxFuture<'_, ApiResult<Booking>>;

    /// `GET /client/bookings` or `GET /provider/bookings`
    fn list(&self, role: Role) -> BoxFuture<'_, ApiResult<Vec<Booking>>>;

    /// `PUT /provider/bookings/{id}/status`
    fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> BoxFuture<'_, ApiResult<Booking>>;

    /// `POST /client/bookings/{id}/cancel`
    fn cancel(&self, id: BookingId) -> BoxFuture<'_, ApiResult<Booking>>;

    /// `POST /provider/bookings/{id}/quote`
    fn submit_quote(&self, id: BookingId, quote: QuoteRequest)
    -> BoxFuture<'_, ApiResult<Booking>>;

    /// `POST /client/bookings/{id}/quote-response`
    fn respond_to_quote(&self, id: BookingId, approved: bool)
    -> BoxFuture<'_, ApiResult<Booking>>;

    /// `POST /client/bookings/{id}/review`
    fn add_review(&self, id: BookingId, score: u8, review: String)
    -> BoxFuture<'_, ApiResult<Booking>>;

    /// `POST /payments/create-intent` (Stripe)
    fn create_payment_intent(&self, id: BookingId) -> BoxFuture<'_, ApiResult<PaymentIntent>>;

    /// `POST /payments/create-order` (Razorpay)
    fn create_payment_order(&self, id: BookingId) -> BoxFuture<'_, ApiResult<PaymentIntent>>;

    /// `POST /payments/verify`
    fn verify_payment(
        &self,
        id: BookingId,
        method: PaymentMethod,
        transaction_id: String,
    ) -> BoxFuture<'_, ApiResult<Booking>>;
}

#[derive(Debug, Serialize)]
struct StatusUpdateBody {
    status: BookingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct QuoteResponseBody {
    approved: bool,
    status: BookingStatus,
}

#[derive(Debug, Serialize)]
struct ReviewBody {
    score: u8,
    comment: String,
}

#[derive(Debug, Serialize)]
struct PaymentIntentBody {
    booking_id: BookingId,
}

#[derive(Debug, Serialize)]
struct VerifyPaymentBody {
    booking_id: BookingId,
    method: PaymentMethod,
    transaction_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Production API client over HTTP
#[derive(Debug, Clone)]
pub struct HttpBookingApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBookingApi {
    /// Build a client against the given base URL (no trailing slash)
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, timeout: std::time::Duration) -> ApiResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn handle<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes)
                .map_err(|error| ApiError::Decode(error.to_string()));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => format!("server returned {status}"),
        };
        Err(ApiError::Status {
            code: status.as_u16(),
            message,
        })
    }
}

impl BookingApi for HttpBookingApi {
    fn create(&self, request: CreateBookingRequest) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("/bookings"))
                .json(&request)
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn list(&self, role: Role) -> BoxFuture<'_, ApiResult<Vec<Booking>>> {
        Box::pin(async move {
            let path = match role {
                Role::Client => "/client/bookings",
                Role::Provider => "/provider/bookings",
            };
            let response = self.client.get(self.url(path)).send().await?;
            Self::handle(response).await
        })
    }

    fn update_status(
        &self,
        id: BookingId,
        status: BookingStatus,
        notes: Option<String>,
    ) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            let response = self
                .client
                .put(self.url(&format!("/provider/bookings/{id}/status")))
                .json(&StatusUpdateBody { status, notes })
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn cancel(&self, id: BookingId) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url(&format!("/client/bookings/{id}/cancel")))
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn submit_quote(
        &self,
        id: BookingId,
        quote: QuoteRequest,
    ) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url(&format!("/provider/bookings/{id}/quote")))
                .json(&quote)
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn respond_to_quote(
        &self,
        id: BookingId,
        approved: bool,
    ) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            // The server expects the resulting status alongside the decision.
            let status = if approved {
                BookingStatus::Confirmed
            } else {
                BookingStatus::Cancelled
            };
            let response = self
                .client
                .post(self.url(&format!("/client/bookings/{id}/quote-response")))
                .json(&QuoteResponseBody { approved, status })
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn add_review(
        &self,
        id: BookingId,
        score: u8,
        review: String,
    ) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url(&format!("/client/bookings/{id}/review")))
                .json(&ReviewBody {
                    score,
                    comment: review,
                })
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn create_payment_intent(&self, id: BookingId) -> BoxFuture<'_, ApiResult<PaymentIntent>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("/payments/create-intent"))
                .json(&PaymentIntentBody { booking_id: id })
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn create_payment_order(&self, id: BookingId) -> BoxFuture<'_, ApiResult<PaymentIntent>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("/payments/create-order"))
                .json(&PaymentIntentBody { booking_id: id })
                .send()
                .await?;
            Self::handle(response).await
        })
    }

    fn verify_payment(
        &self,
        id: BookingId,
        method: PaymentMethod,
        transaction_id: String,
    ) -> BoxFuture<'_, ApiResult<Booking>> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.url("/payments/verify"))
                .json(&VerifyPaymentBody {
                    booking_id: id,
                    method,
                    transaction_id,
                })
                .send()
                .await?;
            Self::handle(response).await
        })
    }
}

pub use mock::MockBookingApi;

/// In-memory API implementation with server-side rules
pub mod mock {
    use super::{ApiError, ApiResult, BookingApi, BoxFuture};
    use crate::transition;
    use crate::types::{
        Booking, BookingId, BookingStatus, ClientId, ClientSummary, CreateBookingRequest, Payment,
        PaymentIntent, PaymentMethod, PaymentStatus, ProviderSummary, Quote, QuoteRequest, Rating,
        Role, ServiceSummary, TrackingEntry,
    };
    use chrono::Utc;
    use std::sync::{Mutex, PoisonError};

    /// An in-memory booking server
    ///
    /// Enforces the same lifecycle rules a real server would (transition
    /// validation, review-after-completion, single review) so tests exercise
    /// genuine rejection paths. Failures can also be scripted with
    /// [`fail_next`](Self::fail_next).
    #[derive(Debug, Default)]
    pub struct MockBookingApi {
        bookings: Mutex<Vec<Booking>>,
        fail_next: Mutex<Option<(u16, String)>>,
    }

    impl MockBookingApi {
        /// Create an empty mock server
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Script the next call to fail with the given status and message
        pub fn fail_next(&self, code: u16, message: impl Into<String>) {
            *lock(&self.fail_next) = Some((code, message.into()));
        }

        /// Insert a booking directly into the server state
        pub fn seed(&self, booking: Booking) {
            lock(&self.bookings).insert(0, booking);
        }

        /// Read a booking from the server state
        #[must_use]
        pub fn server_booking(&self, id: BookingId) -> Option<Booking> {
            lock(&self.bookings).iter().find(|b| b.id == id).cloned()
        }

        fn take_scripted_failure(&self) -> Option<ApiError> {
            lock(&self.fail_next)
                .take()
                .map(|(code, message)| ApiError::Status { code, message })
        }

        fn mutate<T>(
            &self,
            id: BookingId,
            apply: impl FnOnce(&mut Booking) -> ApiResult<T>,
        ) -> ApiResult<T> {
            if let Some(error) = self.take_scripted_failure() {
                return Err(error);
            }
            let mut bookings = lock(&self.bookings);
            let booking = bookings
                .iter_mut()
                .find(|b| b.id == id)
                .ok_or(ApiError::NotFound)?;
            let result = apply(booking)?;
            booking.updated_at = Utc::now();
            Ok(result)
        }

        fn apply_transition(
            booking: &mut Booking,
            next: BookingStatus,
            actor: Role,
            notes: Option<String>,
        ) -> ApiResult<()> {
            if !transition::is_allowed(booking.status, next, actor) {
                return Err(ApiError::Status {
                    code: 409,
                    message: format!(
                        "cannot move booking from {} to {next} as {actor}",
                        booking.status
                    ),
                });
            }
            booking.status = next;
            booking.tracking.push(TrackingEntry {
                status: next,
                timestamp: Utc::now(),
                notes,
            });
            Ok(())
        }
    }

    fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl BookingApi for MockBookingApi {
        fn create(&self, request: CreateBookingRequest) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                if let Some(error) = self.take_scripted_failure() {
                    return Err(error);
                }
                let now = Utc::now();
                let booking = Booking {
                    id: BookingId::new(),
                    status: BookingStatus::Pending,
                    client: ClientSummary {
                        id: ClientId::new(),
                        name: "Test Client".into(),
                        email: None,
                    },
                    provider: ProviderSummary {
                        id: request.provider_id,
                        name: "Test Provider".into(),
                        email: None,
                    },
                    service: ServiceSummary {
                        id: request.service_id,
                        name: "Test Service".into(),
                        category: None,
                    },
                    scheduled_date: request.scheduled_date,
                    amount: request.amount,
                    total_amount: request.amount,
                    quote: None,
                    payment: None,
                    rating: None,
                    tracking: vec![TrackingEntry {
                        status: BookingStatus::Pending,
                        timestamp: now,
                        notes: request.notes.clone(),
                    }],
                    notes: request.notes,
                    created_at: now,
                    updated_at: now,
                };
                lock(&self.bookings).insert(0, booking.clone());
                Ok(booking)
            })
        }

        fn list(&self, _role: Role) -> BoxFuture<'_, ApiResult<Vec<Booking>>> {
            Box::pin(async move {
                if let Some(error) = self.take_scripted_failure() {
                    return Err(error);
                }
                Ok(lock(&self.bookings).clone())
            })
        }

        fn update_status(
            &self,
            id: BookingId,
            status: BookingStatus,
            notes: Option<String>,
        ) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    Self::apply_transition(booking, status, Role::Provider, notes)?;
                    Ok(booking.clone())
                })
            })
        }

        fn cancel(&self, id: BookingId) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    Self::apply_transition(booking, BookingStatus::Cancelled, Role::Client, None)?;
                    Ok(booking.clone())
                })
            })
        }

        fn submit_quote(
            &self,
            id: BookingId,
            quote: QuoteRequest,
        ) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    match booking.status {
                        BookingStatus::Pending => {
                            Self::apply_transition(
                                booking,
                                BookingStatus::Quoted,
                                Role::Provider,
                                quote.notes.clone(),
                            )?;
                        },
                        // Re-quoting while quoted revises the quote in place.
                        BookingStatus::Quoted => {},
                        other => {
                            return Err(ApiError::Status {
                                code: 409,
                                message: format!("cannot quote a booking in status {other}"),
                            });
                        },
                    }
                    booking.quote = Some(Quote {
                        price: quote.price,
                        estimated_hours: quote.estimated_hours,
                        notes: quote.notes,
                        approved: false,
                    });
                    Ok(booking.clone())
                })
            })
        }

        fn respond_to_quote(
            &self,
            id: BookingId,
            approved: bool,
        ) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    let next = if approved {
                        BookingStatus::Confirmed
                    } else {
                        BookingStatus::Cancelled
                    };
                    Self::apply_transition(booking, next, Role::Client, None)?;
                    if let Some(quote) = booking.quote.as_mut() {
                        quote.approved = approved;
                        if approved {
                            booking.total_amount = quote.price;
                        }
                    }
                    Ok(booking.clone())
                })
            })
        }

        fn add_review(
            &self,
            id: BookingId,
            score: u8,
            review: String,
        ) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    if booking.status != BookingStatus::Completed {
                        return Err(ApiError::Status {
                            code: 409,
                            message: "reviews are only allowed after completion".into(),
                        });
                    }
                    if booking.rating.is_some() {
                        return Err(ApiError::Status {
                            code: 409,
                            message: "booking already reviewed".into(),
                        });
                    }
                    booking.rating = Some(Rating { score, review });
                    Ok(booking.clone())
                })
            })
        }

        fn create_payment_intent(&self, id: BookingId) -> BoxFuture<'_, ApiResult<PaymentIntent>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    booking.payment = Some(Payment {
                        status: PaymentStatus::Pending,
                        method: PaymentMethod::Stripe,
                        transaction_id: None,
                    });
                    Ok(PaymentIntent {
                        id: format!("intent_{id}"),
                        client_secret: Some(format!("secret_{id}")),
                        order_id: None,
                        amount: booking.total_amount,
                    })
                })
            })
        }

        fn create_payment_order(&self, id: BookingId) -> BoxFuture<'_, ApiResult<PaymentIntent>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    booking.payment = Some(Payment {
                        status: PaymentStatus::Pending,
                        method: PaymentMethod::Razorpay,
                        transaction_id: None,
                    });
                    Ok(PaymentIntent {
                        id: format!("order_{id}"),
                        client_secret: None,
                        order_id: Some(format!("order_{id}")),
                        amount: booking.total_amount,
                    })
                })
            })
        }

        fn verify_payment(
            &self,
            id: BookingId,
            method: PaymentMethod,
            transaction_id: String,
        ) -> BoxFuture<'_, ApiResult<Booking>> {
            Box::pin(async move {
                self.mutate(id, |booking| {
                    booking.payment = Some(Payment {
                        status: PaymentStatus::Paid,
                        method,
                        transaction_id: Some(transaction_id),
                    });
                    Ok(booking.clone())
                })
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Money;
    use chrono::Utc;

    fn create_request() -> CreateBookingRequest {
        CreateBookingRequest {
            service_id: crate::types::ServiceId::new(),
            provider_id: crate::types::ProviderId::new(),
            scheduled_date: Utc::now() + chrono::Duration::days(2),
            amount: Money::from_major(80),
            notes: Some("side gate".into()),
        }
    }

    #[tokio::test]
    async fn mock_server_walks_the_quote_lifecycle() {
        let api = MockBookingApi::new();
        let booking = api.create(create_request()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let quoted = api
            .submit_quote(
                booking.id,
                QuoteRequest {
                    price: Money::from_major(95),
                    estimated_hours: 3.0,
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(quoted.status, BookingStatus::Quoted);

        let confirmed = api.respond_to_quote(booking.id, true).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);
        assert_eq!(confirmed.total_amount, Money::from_major(95));
        assert_eq!(confirmed.tracking.len(), 3);
    }

    #[tokio::test]
    async fn mock_server_rejects_illegal_transitions() {
        let api = MockBookingApi::new();
        let booking = api.create(create_request()).await.unwrap();

        let error = api
            .update_status(booking.id, BookingStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Status { code: 409, .. }));
        // Server state untouched.
        assert_eq!(
            api.server_booking(booking.id).unwrap().status,
            BookingStatus::Pending
        );
    }

    #[tokio::test]
    async fn mock_server_rejects_review_before_completion() {
        let api = MockBookingApi::new();
        let booking = api.create(create_request()).await.unwrap();
        let error = api
            .add_review(booking.id, 5, "great".into())
            .await
            .unwrap_err();
        assert!(matches!(error, ApiError::Status { code: 409, .. }));
    }

    #[tokio::test]
    async fn scripted_failure_fires_once() {
        let api = MockBookingApi::new();
        api.fail_next(500, "database unavailable");
        assert!(api.list(Role::Client).await.is_err());
        assert!(api.list(Role::Client).await.is_ok());
    }

    #[test]
    fn not_found_maps_to_domain_not_found_when_targeted() {
        let id = BookingId::new();
        assert_eq!(
            ApiError::NotFound.into_booking_error(Some(id)),
            BookingError::NotFound(id)
        );
        assert!(matches!(
            ApiError::NotFound.into_booking_error(None),
            BookingError::RequestFailed(_)
        ));
    }

    #[test]
    fn unknown_booking_returns_not_found() {
        let api = MockBookingApi::new();
        let error = tokio_test::block_on(api.cancel(BookingId::new())).unwrap_err();
        assert!(matches!(error, ApiError::NotFound));
    }
}
