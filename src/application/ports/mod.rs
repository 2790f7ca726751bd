//! Application ports (hexagonal architecture boundaries)
//!
//! Repository and station-directory contracts live in `domain`.
//! Outbound delivery ports that depend on application-layer types live here.

pub mod outbound;

pub use outbound::{EmailMessage, EmailSender, SendReceipt};
