//! Infrastructure layer - external concerns

pub mod catalog;
pub mod crypto;
pub mod database;
pub mod email;
pub mod storage;

pub use catalog::{sample_stations, OpenChargeMapClient};
pub use database::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};
pub use email::sender_from_config;
pub use storage::InMemoryRepositoryProvider;
