//! In-process storage

mod memory;

pub use memory::{
    InMemoryBookingRepository, InMemoryNotificationPreferenceRepository,
    InMemoryRepositoryProvider, InMemoryTransactionRepository,
};
