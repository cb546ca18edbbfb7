//! # Booking Sync
//!
//! Client-side state synchronization engine for a service booking domain.
//! The crate keeps a normalized collection of server-confirmed bookings in
//! sync across three inputs:
//!
//! - **Commands**: user intents validated locally, then dispatched as REST
//!   requests with a `pending -> fulfilled | rejected` lifecycle and no
//!   optimistic mutation
//! - **Events**: settled request outcomes applied to the collection
//! - **Pushes**: realtime snapshots merged last-writer-wins, idempotently
//!
//! The [`BookingStore`](store::BookingStore) facade owns the runtime;
//! [`selectors`] derive memoized views for rendering.
//!
//! ## Example
//!
//! ```ignore
//! use booking_sync::{config::Config, store::BookingStore, types::Role};
//!
//! let store = BookingStore::from_config(&Config::from_env())?;
//! store.refresh(Role::Client).await?;
//! let bookings = store.bookings().await;
//! ```

pub mod actions;
pub mod api;
pub mod config;
pub mod environment;
pub mod error;
pub mod realtime;
pub mod reducer;
pub mod selectors;
pub mod state;
pub mod store;
pub mod transition;
pub mod types;

pub use actions::BookingAction;
pub use error::BookingError;
pub use state::BookingState;
pub use store::BookingStore;
pub use types::{Booking, BookingId, BookingStatus, Role};
