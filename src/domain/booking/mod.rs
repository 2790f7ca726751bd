//! Booking aggregate
//!
//! Lifecycle rules, schedule arithmetic and derived pricing for a slot
//! reservation, plus the repository interface.

pub mod model;
pub mod pricing;
pub mod repository;

pub use model::{
    Booking, BookingDraft, BookingStatus, ChargeDuration, Completion, Schedule, SlotRef,
    StationSnapshot,
};
pub use pricing::{round_money, PriceBreakdown, PriceInput, PricingPolicy, TaxPolicy};
pub use repository::BookingRepository;
