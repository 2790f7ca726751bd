//! Payment ledger entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub user_id: String,
    pub booking_id: String,

    /// payment, refund, adjustment
    pub kind: String,

    /// Decimal string, e.g. "46.18"
    pub amount: String,

    /// Currency code (ISO 4217)
    pub currency: String,

    pub payment_method: String,

    #[sea_orm(nullable)]
    pub provider_id: Option<String>,

    /// pending, completed, failed, refunded
    pub status: String,

    #[sea_orm(nullable)]
    pub description: Option<String>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::booking::Entity",
        from = "Column::BookingId",
        to = "super::booking::Column::Id"
    )]
    Booking,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Booking.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
