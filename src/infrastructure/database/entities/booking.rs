//! Booking entity
//!
//! Money columns are stored as decimal strings so no precision is lost on
//! SQLite. Schedule columns are station-local wall-clock values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,

    // Station snapshot
    pub station_id: String,
    pub station_name: String,
    pub station_address: String,
    #[sea_orm(nullable)]
    pub station_image: Option<String>,
    #[sea_orm(nullable, column_type = "Double")]
    pub station_latitude: Option<f64>,
    #[sea_orm(nullable, column_type = "Double")]
    pub station_longitude: Option<f64>,

    // Slot
    pub slot_id: String,
    pub connector_type: String,
    pub power_kw: String,

    // Schedule
    pub date: Date,
    pub start_time: DateTime,
    pub end_time: DateTime,
    pub duration_minutes: i32,

    // Pricing
    pub rate: String,
    pub energy_kwh: String,
    pub energy_cost: String,
    pub platform_fee: String,
    pub taxes: String,
    pub total: String,

    pub payment_method: String,

    /// pending, confirmed, active, completed, cancelled
    pub status: String,

    #[sea_orm(nullable, column_type = "Text")]
    pub qr_code: Option<String>,

    // Completion actuals
    #[sea_orm(nullable)]
    pub actual_duration_minutes: Option<i32>,
    #[sea_orm(nullable)]
    pub energy_delivered_kwh: Option<String>,
    #[sea_orm(nullable)]
    pub actual_cost: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    #[sea_orm(nullable)]
    pub completed_at: Option<DateTimeUtc>,

    /// Optimistic concurrency counter
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
