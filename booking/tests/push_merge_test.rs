//! Realtime push merge behavior through the full store

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use booking_sync::api::MockBookingApi;
use booking_sync::environment::BookingEnvironment;
use booking_sync::realtime::PushEvent;
use booking_sync::store::BookingStore;
use booking_sync::types::{
    Booking, BookingId, BookingStatus, ClientId, ClientSummary, Money, ProviderId,
    ProviderSummary, ServiceId, ServiceSummary, TrackingEntry,
};
use booking_sync_core::environment::SystemClock;
use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn store_with_mock() -> BookingStore {
    let environment =
        BookingEnvironment::new(Arc::new(MockBookingApi::new()), Arc::new(SystemClock));
    BookingStore::with_timeout(environment, Duration::from_secs(2))
}

fn snapshot(id: BookingId, status: BookingStatus) -> Booking {
    let now = Utc.with_ymd_and_hms(2025, 7, 10, 9, 0, 0).unwrap();
    Booking {
        id,
        status,
        client: ClientSummary {
            id: ClientId::new(),
            name: "Ravi".into(),
            email: None,
        },
        provider: ProviderSummary {
            id: ProviderId::new(),
            name: "Sparks Electric".into(),
            email: None,
        },
        service: ServiceSummary {
            id: ServiceId::new(),
            name: "Rewiring".into(),
            category: Some("electrical".into()),
        },
        scheduled_date: now,
        amount: Money::from_major(200),
        total_amount: Money::from_major(200),
        quote: None,
        payment: None,
        rating: None,
        tracking: vec![TrackingEntry {
            status,
            timestamp: now,
            notes: None,
        }],
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

/// Wait until the consumer has drained the frames we sent.
async fn settle(store: &BookingStore, expected_revision: u64) {
    for _ in 0..100 {
        let revision = store.store().state(|s| s.revision()).await;
        if revision >= expected_revision {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("push frames were not merged in time");
}

#[tokio::test]
async fn pushed_bookings_appear_at_the_head() {
    let store = store_with_mock();
    let (tx, rx) = mpsc::channel(8);
    let _consumer = store.attach_push_channel(rx);

    let first = snapshot(BookingId::new(), BookingStatus::Pending);
    let second = snapshot(BookingId::new(), BookingStatus::Pending);
    tx.send(PushEvent::New(Box::new(first.clone())))
        .await
        .unwrap();
    tx.send(PushEvent::New(Box::new(second.clone())))
        .await
        .unwrap();
    settle(&store, 2).await;

    let ids: Vec<_> = store.bookings().await.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn conflicting_frames_resolve_by_arrival_order() {
    let store = store_with_mock();
    let (tx, rx) = mpsc::channel(8);
    let _consumer = store.attach_push_channel(rx);

    let id = BookingId::new();
    let mut in_progress = snapshot(id, BookingStatus::InProgress);
    in_progress.tracking.push(TrackingEntry {
        status: BookingStatus::InProgress,
        timestamp: in_progress.updated_at,
        notes: None,
    });
    let mut completed = snapshot(id, BookingStatus::Completed);
    completed.tracking = in_progress.tracking.clone();
    completed.tracking.push(TrackingEntry {
        status: BookingStatus::Completed,
        timestamp: completed.updated_at,
        notes: None,
    });

    tx.send(PushEvent::New(Box::new(snapshot(id, BookingStatus::Confirmed))))
        .await
        .unwrap();
    tx.send(PushEvent::StatusUpdate(Box::new(in_progress)))
        .await
        .unwrap();
    tx.send(PushEvent::StatusUpdate(Box::new(completed)))
        .await
        .unwrap();
    settle(&store, 3).await;

    let booking = store.booking(id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Completed);
    assert_eq!(booking.tracking.len(), 3);
}

#[tokio::test]
async fn duplicate_frames_do_not_advance_the_revision() {
    let store = store_with_mock();
    let (tx, rx) = mpsc::channel(8);
    let _consumer = store.attach_push_channel(rx);

    let booking = snapshot(BookingId::new(), BookingStatus::Quoted);
    tx.send(PushEvent::New(Box::new(booking.clone())))
        .await
        .unwrap();
    settle(&store, 1).await;
    let revision = store.store().state(|s| s.revision()).await;

    // Redelivered frame: merged entry is identical, so nothing moves.
    tx.send(PushEvent::StatusUpdate(Box::new(booking.clone())))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(store.store().state(|s| s.revision()).await, revision);
    assert_eq!(store.bookings().await.len(), 1);
}

#[tokio::test]
async fn stale_frame_cannot_shrink_the_tracking_log() {
    let store = store_with_mock();
    let (tx, rx) = mpsc::channel(8);
    let _consumer = store.attach_push_channel(rx);

    let id = BookingId::new();
    let mut rich = snapshot(id, BookingStatus::Confirmed);
    rich.tracking.push(TrackingEntry {
        status: BookingStatus::Confirmed,
        timestamp: rich.updated_at,
        notes: Some("auto-confirmed".into()),
    });
    tx.send(PushEvent::New(Box::new(rich.clone()))).await.unwrap();
    settle(&store, 1).await;

    let mut stale = snapshot(id, BookingStatus::InProgress);
    stale.tracking.truncate(1);
    tx.send(PushEvent::StatusUpdate(Box::new(stale)))
        .await
        .unwrap();
    settle(&store, 2).await;

    let booking = store.booking(id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::InProgress);
    assert_eq!(booking.tracking, rich.tracking);
}

#[tokio::test]
async fn opened_push_channel_feeds_the_store() {
    let store = store_with_mock();
    let (tx, _consumer) = store.open_push_channel();

    let booking = snapshot(BookingId::new(), BookingStatus::Pending);
    tx.send(PushEvent::New(Box::new(booking.clone())))
        .await
        .unwrap();
    settle(&store, 1).await;

    assert_eq!(store.booking(booking.id).await.unwrap().id, booking.id);
}

#[tokio::test]
async fn closing_the_channel_stops_the_consumer() {
    let store = store_with_mock();
    let (tx, rx) = mpsc::channel(8);
    let consumer = store.attach_push_channel(rx);

    drop(tx);
    tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer should stop when the channel closes")
        .unwrap();
}

#[tokio::test]
async fn shutdown_stops_the_consumer() {
    let store = store_with_mock();
    let (tx, rx) = mpsc::channel(8);
    let consumer = store.attach_push_channel(rx);

    store.shutdown(Duration::from_secs(1)).await.unwrap();
    tokio::time::timeout(Duration::from_secs(1), consumer)
        .await
        .expect("consumer should stop on shutdown")
        .unwrap();

    // The channel is still open but the session is over.
    drop(tx);
}
