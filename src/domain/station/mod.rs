//! Station aggregate
//!
//! Stations and slots come from an external directory; they are read-only
//! to the rest of the system and never persisted.

pub mod directory;
pub mod model;

pub use directory::{BoundingBox, NearbyQuery, StationDirectory};
pub use model::{synthesize_slots, Slot, Station, StationStatus};
