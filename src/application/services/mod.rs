//! Application services

mod booking;
mod catalog;
mod checkout;
mod notification;
mod notification_worker;
mod payment;

pub use booking::{BookingService, BookingStats, CancelOutcome, Reschedule};
pub use catalog::{CatalogService, CatalogSource, NearbySearch, StationList};
pub use checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use notification::{Dispatch, NotificationService};
pub use notification_worker::{pending_reminders, NotificationWorker};
pub use payment::{PaymentOutcome, PaymentService};
