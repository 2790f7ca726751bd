//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider.

pub mod booking_repository;
pub mod notification_preference_repository;
pub mod repository_provider;
pub mod transaction_repository;

pub use repository_provider::SeaOrmRepositoryProvider;

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::DomainError;

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Persistence(format!("Database error: {}", e))
}

/// Parse a stored decimal column. A malformed value means the row is corrupt.
fn decimal_column(column: &'static str, raw: &str) -> Result<Decimal, DomainError> {
    Decimal::from_str(raw)
        .map_err(|e| DomainError::Persistence(format!("invalid decimal in {}: {}", column, e)))
}
