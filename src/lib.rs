//! # TakeCharge
//!
//! EV charging station discovery and slot booking service.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Bookings, stations, payments, preferences and their rules
//! - **application**: Filter/sort engine, services, artifacts, event bus
//! - **infrastructure**: SeaORM and in-memory storage, Open Charge Map and
//!   email clients, JWT verification
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: Runtime wiring and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

// Re-export API router
pub use interfaces::http::create_api_router;

// Re-export the event bus
pub use application::events::{create_event_bus, Event, EventBus, SharedEventBus};
