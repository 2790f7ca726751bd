//! Domain events
//!
//! Facts about what happened to bookings and payments.
//! The EventBus implementation lives in `application::events`.

pub mod types;

pub use types::{
    BookingCancelledEvent, BookingConfirmedEvent, BookingLifecycleEvent, BookingModifiedEvent,
    Event, EventMessage, PaymentRecordedEvent,
};
