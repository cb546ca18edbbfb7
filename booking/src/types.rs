//! Domain types for the booking entity store
//!
//! A [`Booking`] is the unit of synchronization: a denormalized snapshot of a
//! service engagement between a client and a provider, as confirmed by the
//! server. The store never fabricates these locally; every entry originated
//! in a server response or a realtime push frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(Uuid);

/// Unique identifier for a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(Uuid);

/// Unique identifier for a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(Uuid);

/// Unique identifier for a service offering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(Uuid);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            /// Generate a new random identifier
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Access the underlying UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id!(BookingId);
impl_id!(ClientId);
impl_id!(ProviderId);
impl_id!(ServiceId);

/// Monetary amount in minor currency units (cents)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Money(i64);

impl Money {
    /// Zero amount
    pub const ZERO: Self = Self(0);

    /// Create from minor units (cents)
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create from major units (whole currency)
    #[must_use]
    pub const fn from_major(units: i64) -> Self {
        Self(units * 100)
    }

    /// Amount in minor units
    #[must_use]
    pub const fn as_cents(&self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly positive
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let cents = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

/// Lifecycle status of a booking
///
/// The legal movements between these values are defined by
/// [`crate::transition::validate_transition`]; nothing else in the crate is
/// allowed to invent an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Awaiting provider action (quote or direct confirmation)
    Pending,
    /// Provider has attached a quote; awaiting client response
    Quoted,
    /// Both parties committed; work not yet started
    Confirmed,
    /// Provider has started the work
    InProgress,
    /// Work finished; terminal
    Completed,
    /// Abandoned by either party; terminal
    Cancelled,
}

impl BookingStatus {
    /// Whether no further transitions are possible from this status
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Wire name, matching the serde representation
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Quoted => "quoted",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The party performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The customer who requested the service
    Client,
    /// The professional fulfilling the service
    Provider,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Provider => f.write_str("provider"),
        }
    }
}

/// Payment processor used for a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Card payment via Stripe
    Stripe,
    /// UPI/card payment via Razorpay
    Razorpay,
}

/// Settlement state of a booking's payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Intent created, not yet verified
    Pending,
    /// Verified by the server
    Paid,
}

/// Payment record attached to a booking once a payment flow has started
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Settlement state
    pub status: PaymentStatus,
    /// Processor that handled the payment
    pub method: PaymentMethod,
    /// Processor-side transaction reference, present once verified
    pub transaction_id: Option<String>,
}

/// Provider's price quote for a pending booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Quoted price, superseding the booking's initial amount once approved
    pub price: Money,
    /// Estimated effort in hours
    pub estimated_hours: f64,
    /// Free-text notes from the provider
    pub notes: Option<String>,
    /// Whether the client has accepted the quote
    pub approved: bool,
}

/// Client's post-completion review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Score from 1 to 5
    pub score: u8,
    /// Free-text review
    pub review: String,
}

/// One entry in a booking's status history
///
/// The tracking log is append-only: the server adds an entry for every status
/// change and never rewrites history. Merge logic relies on this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    /// Status the booking entered
    pub status: BookingStatus,
    /// When the change happened, server time
    pub timestamp: DateTime<Utc>,
    /// Optional operator note recorded with the change
    pub notes: Option<String>,
}

/// Denormalized client snapshot embedded in a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    /// Client identifier
    pub id: ClientId,
    /// Display name at snapshot time
    pub name: String,
    /// Contact email, if shared
    pub email: Option<String>,
}

/// Denormalized provider snapshot embedded in a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSummary {
    /// Provider identifier
    pub id: ProviderId,
    /// Display name at snapshot time
    pub name: String,
    /// Contact email, if shared
    pub email: Option<String>,
}

/// Denormalized service snapshot embedded in a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    /// Service identifier
    pub id: ServiceId,
    /// Service name at snapshot time
    pub name: String,
    /// Category label, if the catalog assigns one
    pub category: Option<String>,
}

/// A server-confirmed booking snapshot
///
/// Embedded summaries (client, provider, service) are opaque denormalized
/// data: the store carries them through merges without interpreting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Unique identifier
    pub id: BookingId,
    /// Current lifecycle status
    pub status: BookingStatus,
    /// Client party snapshot
    pub client: ClientSummary,
    /// Provider party snapshot
    pub provider: ProviderSummary,
    /// Service being booked
    pub service: ServiceSummary,
    /// When the service is scheduled to happen
    pub scheduled_date: DateTime<Utc>,
    /// Amount requested at creation time
    pub amount: Money,
    /// Effective amount; equals `amount` until a quote is approved
    pub total_amount: Money,
    /// Provider quote, if one was submitted
    pub quote: Option<Quote>,
    /// Payment record, if a payment flow has started
    pub payment: Option<Payment>,
    /// Client review, set at most once after completion
    pub rating: Option<Rating>,
    /// Append-only status history, oldest first
    pub tracking: Vec<TrackingEntry>,
    /// Client's free-text notes from the booking request
    pub notes: Option<String>,
    /// Server creation timestamp
    pub created_at: DateTime<Utc>,
    /// Server timestamp of the last mutation
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a new booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    /// Service to book
    pub service_id: ServiceId,
    /// Provider to book with
    pub provider_id: ProviderId,
    /// Requested date and time
    pub scheduled_date: DateTime<Utc>,
    /// Amount offered at creation
    pub amount: Money,
    /// Free-text notes for the provider
    pub notes: Option<String>,
}

/// Payload for a provider submitting a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Quoted price
    pub price: Money,
    /// Estimated effort in hours
    pub estimated_hours: f64,
    /// Free-text notes
    pub notes: Option<String>,
}

/// Opaque handle returned by the payment intent endpoint
///
/// Passed straight through to the payment SDK on the caller's side; the store
/// does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Processor-side intent or order identifier
    pub id: String,
    /// Stripe client secret, when the method is Stripe
    pub client_secret: Option<String>,
    /// Razorpay order id, when the method is Razorpay
    pub order_id: Option<String>,
    /// Amount the intent was created for
    pub amount: Money,
}
