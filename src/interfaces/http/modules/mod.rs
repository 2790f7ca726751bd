pub mod bookings;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod pricing;
pub mod request_id;
pub mod stations;
pub mod transactions;
