//! Domain events
//!
//! Published on the event bus after a write commits. Subscribers must not
//! be able to fail the write that produced the event.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::user::UserProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Event {
    BookingConfirmed(BookingConfirmedEvent),
    BookingModified(BookingModifiedEvent),
    BookingCancelled(BookingCancelledEvent),
    BookingStarted(BookingLifecycleEvent),
    BookingCompleted(BookingLifecycleEvent),
    PaymentRecorded(PaymentRecordedEvent),
}

impl Event {
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::BookingConfirmed(_) => "booking_confirmed",
            Event::BookingModified(_) => "booking_modified",
            Event::BookingCancelled(_) => "booking_cancelled",
            Event::BookingStarted(_) => "booking_started",
            Event::BookingCompleted(_) => "booking_completed",
            Event::PaymentRecorded(_) => "payment_recorded",
        }
    }

    pub fn booking_id(&self) -> &str {
        match self {
            Event::BookingConfirmed(e) => &e.booking_id,
            Event::BookingModified(e) => &e.booking_id,
            Event::BookingCancelled(e) => &e.booking_id,
            Event::BookingStarted(e) => &e.booking_id,
            Event::BookingCompleted(e) => &e.booking_id,
            Event::PaymentRecorded(e) => &e.booking_id,
        }
    }
}

/// Checkout finished; carries the profile so the email can be addressed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmedEvent {
    pub booking_id: String,
    pub user: UserProfile,
    pub station_id: String,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingModifiedEvent {
    pub booking_id: String,
    pub user_id: String,
    pub total: Decimal,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingCancelledEvent {
    pub booking_id: String,
    pub user_id: String,
    /// A refund entry was appended to the ledger
    pub refunded: bool,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingLifecycleEvent {
    pub booking_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecordedEvent {
    pub transaction_id: String,
    pub booking_id: String,
    pub user_id: String,
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

/// Envelope delivered to subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub event: Event,
}

impl EventMessage {
    pub fn new(event: Event) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event,
        }
    }
}
