//! End-to-end request lifecycle tests against the in-memory server

#![allow(clippy::unwrap_used)]

use booking_sync::api::{BookingApi, MockBookingApi};
use booking_sync::environment::BookingEnvironment;
use booking_sync::error::BookingError;
use booking_sync::store::BookingStore;
use booking_sync::types::{
    BookingId, BookingStatus, CreateBookingRequest, Money, PaymentMethod, PaymentStatus,
    ProviderId, QuoteRequest, Role, ServiceId,
};
use booking_sync_core::environment::SystemClock;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

fn store_with_mock() -> (BookingStore, Arc<MockBookingApi>) {
    let api = Arc::new(MockBookingApi::new());
    let environment = BookingEnvironment::new(Arc::clone(&api) as Arc<dyn BookingApi>, Arc::new(SystemClock));
    (
        BookingStore::with_timeout(environment, Duration::from_secs(2)),
        api,
    )
}

fn create_request() -> CreateBookingRequest {
    CreateBookingRequest {
        service_id: ServiceId::new(),
        provider_id: ProviderId::new(),
        scheduled_date: Utc::now() + chrono::Duration::days(3),
        amount: Money::from_major(150),
        notes: Some("gate code 4411".into()),
    }
}

#[tokio::test]
async fn quote_flow_walks_the_full_lifecycle() {
    let (store, _api) = store_with_mock();

    let booking = store.create_booking(create_request()).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);

    let quoted = store
        .submit_quote(
            booking.id,
            QuoteRequest {
                price: Money::from_major(180),
                estimated_hours: 4.0,
                notes: Some("includes parts".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(quoted.status, BookingStatus::Quoted);
    assert!(!quoted.quote.as_ref().unwrap().approved);

    let confirmed = store.respond_to_quote(booking.id, true).await.unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.total_amount, Money::from_major(180));

    let started = store
        .update_status(booking.id, BookingStatus::InProgress, None)
        .await
        .unwrap();
    assert_eq!(started.status, BookingStatus::InProgress);

    let completed = store
        .update_status(booking.id, BookingStatus::Completed, Some("done".into()))
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    // One tracking entry per transition, plus creation.
    assert_eq!(completed.tracking.len(), 5);

    let reviewed = store
        .add_review(booking.id, 5, "quick and tidy".into())
        .await
        .unwrap();
    assert_eq!(reviewed.rating.as_ref().unwrap().score, 5);

    // Local snapshot matches the last confirmed entity.
    let local = store.booking(booking.id).await.unwrap();
    assert_eq!(local, reviewed);
    assert!(store.last_error().await.is_none());
}

#[tokio::test]
async fn declined_quote_cancels_the_booking() {
    let (store, _api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();
    store
        .submit_quote(
            booking.id,
            QuoteRequest {
                price: Money::from_major(500),
                estimated_hours: 10.0,
                notes: None,
            },
        )
        .await
        .unwrap();

    let cancelled = store.respond_to_quote(booking.id, false).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    // Declining never adopts the quoted price.
    assert_eq!(cancelled.total_amount, Money::from_major(150));
}

#[tokio::test]
async fn direct_confirmation_skips_the_quote_stage() {
    let (store, _api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();

    let confirmed = store
        .update_status(booking.id, BookingStatus::Confirmed, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn refresh_replaces_local_entries_in_server_order() {
    let (store, _api) = store_with_mock();
    let first = store.create_booking(create_request()).await.unwrap();
    let second = store.create_booking(create_request()).await.unwrap();

    let listed = store.refresh(Role::Client).await.unwrap();
    let ids: Vec<_> = listed.iter().map(|b| b.id).collect();
    // Mock server lists newest first.
    assert_eq!(ids, vec![second.id, first.id]);

    let local: Vec<_> = store.bookings().await.iter().map(|b| b.id).collect();
    assert_eq!(local, ids);
}

#[tokio::test]
async fn server_rejection_keeps_the_collection_intact() {
    let (store, api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();

    api.fail_next(503, "maintenance window");
    let error = store
        .update_status(booking.id, BookingStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(error, BookingError::RequestFailed(_)));
    assert_eq!(store.last_error().await, Some(error));
    assert_eq!(
        store.booking(booking.id).await.unwrap().status,
        BookingStatus::Pending
    );

    // The failure is isolated: the next operation succeeds and clears it.
    let confirmed = store
        .update_status(booking.id, BookingStatus::Confirmed, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert!(store.last_error().await.is_none());
}

#[tokio::test]
async fn illegal_transition_never_reaches_the_server() {
    let (store, api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();

    // pending -> in_progress is not an edge.
    let error = store
        .update_status(booking.id, BookingStatus::InProgress, None)
        .await
        .unwrap_err();
    assert_eq!(
        error,
        BookingError::InvalidTransition {
            from: BookingStatus::Pending,
            to: BookingStatus::InProgress,
            actor: Role::Provider,
        }
    );
    // Server state untouched, so the reducer rejected before dispatch.
    assert_eq!(
        api.server_booking(booking.id).unwrap().status,
        BookingStatus::Pending
    );
}

#[tokio::test]
async fn review_before_completion_is_rejected_by_the_server() {
    let (store, _api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();

    // Status gate lives on the server; the client forwards the request.
    let error = store
        .add_review(booking.id, 4, "premature".into())
        .await
        .unwrap_err();
    assert!(matches!(error, BookingError::RequestFailed(_)));
    assert!(store.booking(booking.id).await.unwrap().rating.is_none());
}

#[tokio::test]
async fn unknown_booking_resolves_not_found() {
    let (store, _api) = store_with_mock();
    let id = BookingId::new();
    let error = store.cancel(id).await.unwrap_err();
    assert_eq!(error, BookingError::NotFound(id));
}

#[tokio::test]
async fn payment_flow_attaches_a_verified_payment() {
    let (store, _api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();
    store
        .update_status(booking.id, BookingStatus::Confirmed, None)
        .await
        .unwrap();

    let intent = store
        .create_payment_intent(booking.id, PaymentMethod::Stripe)
        .await
        .unwrap();
    assert!(intent.client_secret.is_some());
    assert_eq!(intent.amount, Money::from_major(150));

    let paid = store
        .confirm_payment(booking.id, PaymentMethod::Stripe, "txn_123".into())
        .await
        .unwrap();
    let payment = paid.payment.unwrap();
    assert_eq!(payment.status, PaymentStatus::Paid);
    assert_eq!(payment.transaction_id.as_deref(), Some("txn_123"));
}

#[tokio::test]
async fn razorpay_payments_go_through_the_order_endpoint() {
    let (store, _api) = store_with_mock();
    let booking = store.create_booking(create_request()).await.unwrap();

    let intent = store
        .create_payment_intent(booking.id, PaymentMethod::Razorpay)
        .await
        .unwrap();
    assert!(intent.order_id.is_some());
    assert!(intent.client_secret.is_none());
}

#[tokio::test]
async fn shutdown_rejects_further_operations() {
    let (store, _api) = store_with_mock();
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    let error = store.create_booking(create_request()).await.unwrap_err();
    assert!(matches!(error, BookingError::RequestFailed(_)));
}
