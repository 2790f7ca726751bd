//! Booking entity and lifecycle

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::pricing::PriceBreakdown;
use crate::domain::geo::Coordinate;
use crate::domain::station::Station;
use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

/// Booking lifecycle status.
///
/// `draft` never reaches storage: it only exists as a [`BookingDraft`]
/// on the client side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown booking status '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Charging duration as entered by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChargeDuration {
    pub hours: u32,
    pub minutes: u32,
}

impl ChargeDuration {
    pub fn new(hours: u32, minutes: u32) -> DomainResult<Self> {
        if minutes >= 60 {
            return Err(DomainError::Validation(format!(
                "minutes must be below 60, got {}",
                minutes
            )));
        }
        if hours == 0 && minutes == 0 {
            return Err(DomainError::Validation(
                "duration must be longer than zero".into(),
            ));
        }
        Ok(Self { hours, minutes })
    }

    /// Build from a minute count, e.g. `90` → 1h 30m.
    pub fn from_minutes(total: u32) -> DomainResult<Self> {
        Self::new(total / 60, total % 60)
    }

    pub fn total_minutes(&self) -> u32 {
        self.hours * 60 + self.minutes
    }

    /// Exact fractional hours (`total_minutes / 60`)
    pub fn hours_decimal(&self) -> Decimal {
        Decimal::from(self.total_minutes()) / Decimal::from(60)
    }

    pub fn as_chrono(&self) -> Duration {
        Duration::minutes(i64::from(self.total_minutes()))
    }
}

impl std::fmt::Display for ChargeDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.hours, self.minutes) {
            (0, m) => write!(f, "{}m", m),
            (h, 0) => write!(f, "{}h", h),
            (h, m) => write!(f, "{}h {}m", h, m),
        }
    }
}

/// Scheduled window in station-local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Schedule {
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub duration: ChargeDuration,
}

impl Schedule {
    /// `end_time = start + duration`; `date` is the start date.
    pub fn starting_at(start: NaiveDateTime, duration: ChargeDuration) -> Self {
        Self {
            date: start.date(),
            start_time: start,
            end_time: start + duration.as_chrono(),
            duration,
        }
    }

    pub fn on(date: NaiveDate, start: NaiveTime, duration: ChargeDuration) -> Self {
        Self::starting_at(date.and_time(start), duration)
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.end_time <= self.start_time {
            return Err(DomainError::Validation(
                "end time must be after start time".into(),
            ));
        }
        if self.end_time - self.start_time != self.duration.as_chrono() {
            return Err(DomainError::Validation(format!(
                "end time {} does not match start {} + {}",
                self.end_time, self.start_time, self.duration
            )));
        }
        Ok(())
    }
}

/// Station fields copied onto the booking at creation time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StationSnapshot {
    pub id: String,
    pub name: String,
    pub address: String,
    pub image: Option<String>,
    pub location: Option<Coordinate>,
}

impl From<&Station> for StationSnapshot {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.clone(),
            name: station.name.clone(),
            address: station.address.clone(),
            image: Some(station.image.clone()),
            location: station.location,
        }
    }
}

/// Reference to the reserved slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SlotRef {
    pub slot_id: String,
    pub connector_type: String,
    #[schema(value_type = String, example = "150")]
    pub power_kw: Decimal,
}

/// Actuals recorded when a session completes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Completion {
    pub actual_duration_minutes: u32,
    #[schema(value_type = String, example = "38.4")]
    pub energy_delivered_kwh: Decimal,
    #[schema(value_type = Option<String>)]
    pub actual_cost: Option<Decimal>,
}

/// Client-side booking state before checkout.
///
/// Passed whole from the client; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub station_id: String,
    pub slot_id: String,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub start_time: NaiveTime,
    pub duration: ChargeDuration,
    pub payment_method: String,
}

impl BookingDraft {
    pub fn schedule(&self) -> Schedule {
        Schedule::on(self.date, self.start_time, self.duration)
    }
}

/// Persisted booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub station: StationSnapshot,
    pub slot: SlotRef,
    pub schedule: Schedule,
    pub pricing: PriceBreakdown,
    pub payment_method: String,
    pub status: BookingStatus,
    pub qr_code: Option<String>,
    pub completion: Option<Completion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Incremented by the repository on every successful update
    pub version: i32,
}

impl Booking {
    /// New booking in `confirmed` status (payment accepted).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        station: StationSnapshot,
        slot: SlotRef,
        schedule: Schedule,
        pricing: PriceBreakdown,
        payment_method: impl Into<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        schedule.validate()?;
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(DomainError::Validation("user id is required".into()));
        }
        Ok(Self {
            id: id.into(),
            user_id,
            station,
            slot,
            schedule,
            pricing,
            payment_method: payment_method.into(),
            status: BookingStatus::Confirmed,
            qr_code: None,
            completion: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            version: 0,
        })
    }

    fn transition(&mut self, allowed: &[BookingStatus], to: BookingStatus) -> DomainResult<()> {
        if !allowed.contains(&self.status) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        Ok(())
    }

    fn ensure_mutable(&self, action: &str) -> DomainResult<()> {
        if self.status.is_terminal() {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: action.to_string(),
            });
        }
        Ok(())
    }

    /// pending → confirmed
    pub fn confirm(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[BookingStatus::Pending], BookingStatus::Confirmed)?;
        self.updated_at = now;
        Ok(())
    }

    /// confirmed → active, signalled when the session starts at the charger
    pub fn start(&mut self, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[BookingStatus::Confirmed], BookingStatus::Active)?;
        self.updated_at = now;
        Ok(())
    }

    /// active → completed
    pub fn complete(&mut self, completion: Completion, now: DateTime<Utc>) -> DomainResult<()> {
        self.transition(&[BookingStatus::Active], BookingStatus::Completed)?;
        self.completion = Some(completion);
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Cancel from any non-terminal state.
    ///
    /// Returns `Ok(false)` when the booking was already cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> DomainResult<bool> {
        if self.status == BookingStatus::Cancelled {
            return Ok(false);
        }
        self.transition(
            &[
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Active,
            ],
            BookingStatus::Cancelled,
        )?;
        self.updated_at = now;
        Ok(true)
    }

    /// Replace the schedule and add `surcharge` to the total.
    ///
    /// Energy cost is not recomputed from the new duration.
    pub fn modify(
        &mut self,
        schedule: Schedule,
        surcharge: Decimal,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.ensure_mutable("modified")?;
        schedule.validate()?;
        self.pricing = self.pricing.with_surcharge(surcharge)?;
        self.schedule = schedule;
        self.updated_at = now;
        Ok(())
    }

    pub fn attach_qr(&mut self, payload: String, now: DateTime<Utc>) -> DomainResult<()> {
        self.ensure_mutable("qr attached")?;
        self.qr_code = Some(payload);
        self.updated_at = now;
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }

    pub fn total(&self) -> Decimal {
        self.pricing.total
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0).unwrap()
    }

    pub fn pricing(total: Decimal) -> PriceBreakdown {
        PriceBreakdown {
            rate: dec!(0.35),
            energy_kwh: dec!(60),
            energy_cost: dec!(20.00),
            platform_fee: dec!(2.50),
            taxes: total - dec!(22.50),
            total,
        }
    }

    pub fn booking(id: &str, user_id: &str) -> Booking {
        Booking::new(
            id,
            user_id,
            StationSnapshot {
                id: "ST001".into(),
                name: "Phoenix Marketcity".into(),
                address: "142 Velachery Main Rd, Chennai".into(),
                image: None,
                location: Some(Coordinate::new(12.9915, 80.2167)),
            },
            SlotRef {
                slot_id: "S-ST001-1".into(),
                connector_type: "CCS".into(),
                power_kw: dec!(50),
            },
            Schedule::starting_at(
                at(2025, 9, 16, 14, 30),
                ChargeDuration::new(1, 30).unwrap(),
            ),
            pricing(dec!(22.68)),
            "credit-card",
            now(),
        )
        .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn end_time_is_start_plus_duration() {
        let schedule = Schedule::starting_at(
            at(2025, 9, 16, 14, 30),
            ChargeDuration::new(1, 30).unwrap(),
        );
        assert_eq!(schedule.end_time, at(2025, 9, 16, 16, 0));
        assert_eq!(schedule.date, NaiveDate::from_ymd_opt(2025, 9, 16).unwrap());
        assert_eq!(schedule.duration.total_minutes(), 90);
    }

    #[test]
    fn schedule_can_cross_midnight() {
        let schedule =
            Schedule::starting_at(at(2025, 9, 16, 23, 15), ChargeDuration::new(2, 0).unwrap());
        assert_eq!(schedule.end_time, at(2025, 9, 17, 1, 15));
        assert!(schedule.validate().is_ok());
    }

    #[test]
    fn total_minutes_matches_parts() {
        for (h, m) in [(0, 30), (1, 0), (1, 45), (12, 59)] {
            let d = ChargeDuration::new(h, m).unwrap();
            assert_eq!(d.total_minutes(), h * 60 + m);
        }
        assert_eq!(
            ChargeDuration::from_minutes(135).unwrap(),
            ChargeDuration::new(2, 15).unwrap()
        );
    }

    #[test]
    fn invalid_durations_rejected() {
        assert!(ChargeDuration::new(0, 0).is_err());
        assert!(ChargeDuration::new(1, 60).is_err());
    }

    #[test]
    fn inverted_range_rejected() {
        let mut schedule =
            Schedule::starting_at(at(2025, 9, 16, 14, 0), ChargeDuration::new(1, 0).unwrap());
        schedule.end_time = at(2025, 9, 16, 13, 0);
        assert!(matches!(
            schedule.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn new_booking_is_confirmed() {
        let b = booking("b-1", "user-1");
        assert_eq!(b.status, BookingStatus::Confirmed);
        assert_eq!(b.version, 0);
        assert!(b.qr_code.is_none());
    }

    #[test]
    fn modify_adds_surcharge_without_repricing() {
        let mut b = booking("b-1", "user-1");
        let energy_before = b.pricing.energy_cost;
        let longer =
            Schedule::starting_at(at(2025, 9, 17, 10, 0), ChargeDuration::new(3, 0).unwrap());

        b.modify(longer, dec!(2.50), now()).unwrap();

        assert_eq!(b.total(), dec!(25.18));
        assert_eq!(b.pricing.energy_cost, energy_before);
        assert_eq!(b.schedule.end_time, at(2025, 9, 17, 13, 0));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut b = booking("b-1", "user-1");
        assert!(b.cancel(now()).unwrap());
        assert!(!b.cancel(now()).unwrap());
        assert_eq!(b.status, BookingStatus::Cancelled);
    }

    #[test]
    fn completed_booking_cannot_be_cancelled() {
        let mut b = booking("b-1", "user-1");
        b.start(now()).unwrap();
        b.complete(
            Completion {
                actual_duration_minutes: 85,
                energy_delivered_kwh: dec!(56.7),
                actual_cost: None,
            },
            now(),
        )
        .unwrap();
        assert!(matches!(
            b.cancel(now()),
            Err(DomainError::InvalidTransition { .. })
        ));
        assert_eq!(b.status, BookingStatus::Completed);
    }

    #[test]
    fn complete_requires_active() {
        let mut b = booking("b-1", "user-1");
        let err = b
            .complete(
                Completion {
                    actual_duration_minutes: 10,
                    energy_delivered_kwh: dec!(5),
                    actual_cost: None,
                },
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
        assert!(b.completion.is_none());
    }

    #[test]
    fn terminal_bookings_are_frozen() {
        let mut b = booking("b-1", "user-1");
        b.cancel(now()).unwrap();
        let schedule =
            Schedule::starting_at(at(2025, 9, 18, 8, 0), ChargeDuration::new(1, 0).unwrap());
        assert!(b.modify(schedule, dec!(2.50), now()).is_err());
        assert!(b.attach_qr("payload".into(), now()).is_err());
        assert_eq!(b.total(), dec!(22.68));
    }

    #[test]
    fn start_only_from_confirmed() {
        let mut b = booking("b-1", "user-1");
        b.start(now()).unwrap();
        assert!(b.start(now()).is_err());
        assert!(b.confirm(now()).is_err());
    }

    #[test]
    fn status_parse_roundtrip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Active,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("draft".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn draft_builds_schedule() {
        let draft = BookingDraft {
            station_id: "ST001".into(),
            slot_id: "S-ST001-1".into(),
            date: NaiveDate::from_ymd_opt(2025, 9, 16).unwrap(),
            start_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            duration: ChargeDuration::new(1, 30).unwrap(),
            payment_method: "upi".into(),
        };
        assert_eq!(draft.schedule().end_time, at(2025, 9, 16, 16, 0));
    }
}
