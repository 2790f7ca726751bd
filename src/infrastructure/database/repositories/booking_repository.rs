//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};

use super::{db_err, decimal_column};
use crate::domain::booking::{
    Booking, BookingRepository, BookingStatus, ChargeDuration, Completion, Schedule, SlotRef,
    StationSnapshot,
};
use crate::domain::{Coordinate, DomainError, DomainResult, PriceBreakdown};
use crate::infrastructure::database::entities::booking;

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn minutes_column(booking_id: &str, column: &str, value: i32) -> DomainResult<u32> {
    u32::try_from(value).map_err(|_| {
        DomainError::Persistence(format!(
            "booking {} has negative {} {}",
            booking_id, column, value
        ))
    })
}

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let location = match (m.station_latitude, m.station_longitude) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        _ => None,
    };
    let minutes = minutes_column(&m.id, "duration_minutes", m.duration_minutes)?;
    let duration = ChargeDuration::from_minutes(minutes)?;

    let completion = match (m.actual_duration_minutes, m.energy_delivered_kwh.as_deref()) {
        (Some(actual), Some(energy)) => Some(Completion {
            actual_duration_minutes: minutes_column(&m.id, "actual_duration_minutes", actual)?,
            energy_delivered_kwh: decimal_column("energy_delivered_kwh", energy)?,
            actual_cost: m
                .actual_cost
                .as_deref()
                .map(|c| decimal_column("actual_cost", c))
                .transpose()?,
        }),
        _ => None,
    };

    Ok(Booking {
        station: StationSnapshot {
            id: m.station_id,
            name: m.station_name,
            address: m.station_address,
            image: m.station_image,
            location,
        },
        slot: SlotRef {
            slot_id: m.slot_id,
            connector_type: m.connector_type,
            power_kw: decimal_column("power_kw", &m.power_kw)?,
        },
        schedule: Schedule {
            date: m.date,
            start_time: m.start_time,
            end_time: m.end_time,
            duration,
        },
        pricing: PriceBreakdown {
            rate: decimal_column("rate", &m.rate)?,
            energy_kwh: decimal_column("energy_kwh", &m.energy_kwh)?,
            energy_cost: decimal_column("energy_cost", &m.energy_cost)?,
            platform_fee: decimal_column("platform_fee", &m.platform_fee)?,
            taxes: decimal_column("taxes", &m.taxes)?,
            total: decimal_column("total", &m.total)?,
        },
        status: m.status.parse::<BookingStatus>()?,
        id: m.id,
        user_id: m.user_id,
        payment_method: m.payment_method,
        qr_code: m.qr_code,
        completion,
        created_at: m.created_at,
        updated_at: m.updated_at,
        completed_at: m.completed_at,
        version: m.version,
    })
}

fn domain_to_active(b: &Booking) -> booking::ActiveModel {
    booking::ActiveModel {
        id: Set(b.id.clone()),
        user_id: Set(b.user_id.clone()),
        station_id: Set(b.station.id.clone()),
        station_name: Set(b.station.name.clone()),
        station_address: Set(b.station.address.clone()),
        station_image: Set(b.station.image.clone()),
        station_latitude: Set(b.station.location.map(|c| c.lat)),
        station_longitude: Set(b.station.location.map(|c| c.lng)),
        slot_id: Set(b.slot.slot_id.clone()),
        connector_type: Set(b.slot.connector_type.clone()),
        power_kw: Set(b.slot.power_kw.to_string()),
        date: Set(b.schedule.date),
        start_time: Set(b.schedule.start_time),
        end_time: Set(b.schedule.end_time),
        duration_minutes: Set(b.schedule.duration.total_minutes() as i32),
        rate: Set(b.pricing.rate.to_string()),
        energy_kwh: Set(b.pricing.energy_kwh.to_string()),
        energy_cost: Set(b.pricing.energy_cost.to_string()),
        platform_fee: Set(b.pricing.platform_fee.to_string()),
        taxes: Set(b.pricing.taxes.to_string()),
        total: Set(b.pricing.total.to_string()),
        payment_method: Set(b.payment_method.clone()),
        status: Set(b.status.as_str().to_string()),
        qr_code: Set(b.qr_code.clone()),
        actual_duration_minutes: Set(b
            .completion
            .as_ref()
            .map(|c| c.actual_duration_minutes as i32)),
        energy_delivered_kwh: Set(b
            .completion
            .as_ref()
            .map(|c| c.energy_delivered_kwh.to_string())),
        actual_cost: Set(b
            .completion
            .as_ref()
            .and_then(|c| c.actual_cost)
            .map(|c| c.to_string())),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
        completed_at: Set(b.completed_at),
        version: Set(b.version),
    }
}

fn to_domain_list(models: Vec<booking::Model>) -> DomainResult<Vec<Booking>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn insert(&self, b: Booking) -> DomainResult<()> {
        debug!("Saving booking: {} for user {}", b.id, b.user_id);

        let existing = booking::Entity::find_by_id(b.id.clone())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        if existing.is_some() {
            return Err(DomainError::Conflict(format!(
                "booking {} already exists",
                b.id
            )));
        }

        domain_to_active(&b)
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_for_user(&self, user_id: &str, id: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find()
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn list_for_user(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        to_domain_list(models)
    }

    async fn list_for_user_by_status(
        &self,
        user_id: &str,
        status: BookingStatus,
    ) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .filter(booking::Column::Status.eq(status.as_str()))
            .order_by_desc(booking::Column::CreatedAt)
            .order_by_desc(booking::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        to_domain_list(models)
    }

    async fn update(&self, b: Booking) -> DomainResult<Booking> {
        debug!("Updating booking: {} (version {})", b.id, b.version);

        let expected = b.version;
        let mut stored = b;
        stored.version = expected + 1;

        let result = booking::Entity::update_many()
            .set(domain_to_active(&stored))
            .filter(booking::Column::Id.eq(stored.id.as_str()))
            .filter(booking::Column::Version.eq(expected))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            let current = booking::Entity::find_by_id(stored.id.clone())
                .one(&self.db)
                .await
                .map_err(db_err)?;
            return Err(match current {
                None => DomainError::not_found("Booking", "id", &stored.id),
                Some(row) => DomainError::Conflict(format!(
                    "booking {} was modified concurrently (version {} != {})",
                    stored.id, expected, row.version
                )),
            });
        }

        Ok(stored)
    }
}
