//! Booking module: checkout, history, lifecycle and artifacts

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
