//! Booking lifecycle service

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use log::{info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::payment::PaymentService;
use crate::application::artifacts::{self, QrImage};
use crate::application::events::{
    BookingCancelledEvent, BookingLifecycleEvent, BookingModifiedEvent, Event, SharedEventBus,
};
use crate::application::filters::{filter_bookings, BookingFilter, BookingSort};
use crate::domain::booking::{
    Booking, BookingStatus, ChargeDuration, Completion, PriceBreakdown, PriceInput, PricingPolicy,
    Schedule, SlotRef, StationSnapshot,
};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

/// New schedule for an existing booking
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Reschedule {
    pub date: NaiveDate,
    #[schema(value_type = String, example = "16:00:00")]
    pub start_time: NaiveTime,
    pub duration: ChargeDuration,
    /// Version the caller last read; a mismatch is a conflict
    pub expected_version: Option<i32>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelOutcome {
    pub booking: Booking,
    /// `false` when the booking was already cancelled
    pub changed: bool,
    pub refunded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingStats {
    pub total_bookings: usize,
    pub completed_bookings: usize,
    pub cancelled_bookings: usize,
    pub upcoming_bookings: usize,
    #[schema(value_type = String)]
    pub total_spent: Decimal,
    /// Completed sessions only
    #[schema(value_type = String)]
    pub total_energy_kwh: Decimal,
}

impl BookingStats {
    pub fn from_bookings(bookings: &[Booking]) -> Self {
        let mut stats = Self {
            total_bookings: bookings.len(),
            ..Self::default()
        };
        for booking in bookings {
            stats.total_spent += booking.total();
            match booking.status {
                BookingStatus::Completed => {
                    stats.completed_bookings += 1;
                    if let Some(done) = &booking.completion {
                        stats.total_energy_kwh += done.energy_delivered_kwh;
                    }
                }
                BookingStatus::Cancelled => stats.cancelled_bookings += 1,
                BookingStatus::Pending | BookingStatus::Confirmed => stats.upcoming_bookings += 1,
                BookingStatus::Active => {}
            }
        }
        stats
    }
}

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    payments: Arc<PaymentService>,
    events: SharedEventBus,
    pricing: PricingPolicy,
}

impl BookingService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        payments: Arc<PaymentService>,
        events: SharedEventBus,
        pricing: PricingPolicy,
    ) -> Self {
        Self {
            repos,
            payments,
            events,
            pricing,
        }
    }

    pub fn pricing_policy(&self) -> &PricingPolicy {
        &self.pricing
    }

    /// Pure price computation
    pub fn quote(&self, input: &PriceInput) -> DomainResult<PriceBreakdown> {
        self.pricing.price(input)
    }

    /// Persist a new booking in `confirmed` status
    pub async fn create(
        &self,
        user_id: &str,
        station: StationSnapshot,
        slot: SlotRef,
        schedule: Schedule,
        pricing: PriceBreakdown,
        payment_method: &str,
    ) -> DomainResult<Booking> {
        let booking = Booking::new(
            uuid::Uuid::new_v4().to_string(),
            user_id,
            station,
            slot,
            schedule,
            pricing,
            payment_method,
            Utc::now(),
        )?;
        self.repos.bookings().insert(booking.clone()).await?;
        metrics::counter!("bookings_created_total").increment(1);
        info!(
            "Booking {} created for user {} at station {} (total {})",
            booking.id, booking.user_id, booking.station.id, booking.total()
        );
        Ok(booking)
    }

    pub async fn get(&self, user_id: &str, booking_id: &str) -> DomainResult<Booking> {
        self.repos
            .bookings()
            .find_for_user(user_id, booking_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", "id", booking_id))
    }

    /// Newest first, optionally narrowed to one status
    pub async fn list(&self, user_id: &str, status: Option<BookingStatus>) -> DomainResult<Vec<Booking>> {
        match status {
            Some(status) => self.repos.bookings().list_for_user_by_status(user_id, status).await,
            None => self.repos.bookings().list_for_user(user_id).await,
        }
    }

    /// Booking history view with filters and sort applied
    pub async fn search(
        &self,
        user_id: &str,
        filter: &BookingFilter,
        sort: BookingSort,
        today: NaiveDate,
    ) -> DomainResult<Vec<Booking>> {
        let bookings = self.repos.bookings().list_for_user(user_id).await?;
        Ok(filter_bookings(&bookings, filter, sort, today))
    }

    pub async fn stats(&self, user_id: &str) -> DomainResult<BookingStats> {
        let bookings = self.repos.bookings().list_for_user(user_id).await?;
        Ok(BookingStats::from_bookings(&bookings))
    }

    pub async fn export_csv(
        &self,
        user_id: &str,
        filter: &BookingFilter,
        sort: BookingSort,
        today: NaiveDate,
    ) -> DomainResult<String> {
        let bookings = self.search(user_id, filter, sort, today).await?;
        Ok(artifacts::bookings_csv(&bookings)?)
    }

    /// Replace the schedule and add the modification surcharge
    pub async fn modify(&self, user_id: &str, booking_id: &str, change: Reschedule) -> DomainResult<Booking> {
        let mut booking = self.get(user_id, booking_id).await?;
        if let Some(expected) = change.expected_version {
            if expected != booking.version {
                return Err(DomainError::Conflict(format!(
                    "booking {} is at version {}, not {}",
                    booking_id, booking.version, expected
                )));
            }
        }

        let schedule = Schedule::on(change.date, change.start_time, change.duration);
        booking.modify(schedule, self.pricing.modification_surcharge, Utc::now())?;
        let booking = self.repos.bookings().update(booking).await?;

        metrics::counter!("bookings_modified_total").increment(1);
        info!("Booking {} rescheduled, total now {}", booking.id, booking.total());
        self.events.publish(Event::BookingModified(BookingModifiedEvent {
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            total: booking.total(),
            timestamp: booking.updated_at,
        }));
        Ok(booking)
    }

    /// Cancel; repeated calls are no-ops. A completed payment is refunded
    /// on a best-effort basis.
    pub async fn cancel(&self, user_id: &str, booking_id: &str) -> DomainResult<CancelOutcome> {
        let mut booking = self.get(user_id, booking_id).await?;
        if !booking.cancel(Utc::now())? {
            return Ok(CancelOutcome {
                booking,
                changed: false,
                refunded: false,
            });
        }
        let booking = self.repos.bookings().update(booking).await?;
        metrics::counter!("bookings_cancelled_total").increment(1);

        let refunded = match self.payments.refund_booking(user_id, booking_id).await {
            Ok(refund) => refund.is_some(),
            Err(e) => {
                warn!("Booking {} cancelled but refund failed: {}", booking_id, e);
                false
            }
        };

        info!("Booking {} cancelled (refunded: {})", booking.id, refunded);
        self.events.publish(Event::BookingCancelled(BookingCancelledEvent {
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            refunded,
            timestamp: booking.updated_at,
        }));
        Ok(CancelOutcome {
            booking,
            changed: true,
            refunded,
        })
    }

    /// confirmed → active
    pub async fn start(&self, user_id: &str, booking_id: &str) -> DomainResult<Booking> {
        let mut booking = self.get(user_id, booking_id).await?;
        booking.start(Utc::now())?;
        let booking = self.repos.bookings().update(booking).await?;
        info!("Booking {} session started", booking.id);
        self.events.publish(Event::BookingStarted(BookingLifecycleEvent {
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            timestamp: booking.updated_at,
        }));
        Ok(booking)
    }

    /// active → completed
    pub async fn complete(&self, user_id: &str, booking_id: &str, completion: Completion) -> DomainResult<Booking> {
        if completion.energy_delivered_kwh < Decimal::ZERO {
            return Err(DomainError::Validation("energy delivered must not be negative".into()));
        }
        if completion.actual_cost.is_some_and(|c| c < Decimal::ZERO) {
            return Err(DomainError::Validation("actual cost must not be negative".into()));
        }
        let mut booking = self.get(user_id, booking_id).await?;
        booking.complete(completion, Utc::now())?;
        let booking = self.repos.bookings().update(booking).await?;
        info!("Booking {} completed", booking.id);
        self.events.publish(Event::BookingCompleted(BookingLifecycleEvent {
            booking_id: booking.id.clone(),
            user_id: booking.user_id.clone(),
            timestamp: booking.updated_at,
        }));
        Ok(booking)
    }

    /// Generate the booking QR and store its payload on the booking
    pub async fn attach_qr(&self, booking: Booking) -> DomainResult<(Booking, QrImage)> {
        let now = Utc::now();
        let qr = artifacts::booking_qr(&booking, now)?;
        let mut booking = booking;
        booking.attach_qr(qr.payload.clone(), now)?;
        let booking = self.repos.bookings().update(booking).await?;
        Ok((booking, qr))
    }

    /// QR for display; the stored payload is reused when present
    pub async fn qr(&self, user_id: &str, booking_id: &str) -> DomainResult<QrImage> {
        let booking = self.get(user_id, booking_id).await?;
        match &booking.qr_code {
            Some(payload) => {
                let code = artifacts::qr::encode(payload)?;
                Ok(QrImage {
                    payload: payload.clone(),
                    data_url: artifacts::qr::to_data_url(&code),
                })
            }
            None => Ok(artifacts::booking_qr(&booking, Utc::now())?),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::events::create_event_bus;
    use crate::application::services::payment::PaymentOutcome;
    use crate::domain::booking::model::fixtures;
    use crate::domain::payment::TransactionType;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    struct Harness {
        bookings: BookingService,
        payments: Arc<PaymentService>,
        repos: Arc<InMemoryRepositoryProvider>,
    }

    fn harness() -> Harness {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let events = create_event_bus();
        let payments = Arc::new(PaymentService::new(repos.clone(), events.clone(), "USD"));
        let bookings = BookingService::new(
            repos.clone(),
            payments.clone(),
            events,
            PricingPolicy::default(),
        );
        Harness {
            bookings,
            payments,
            repos,
        }
    }

    async fn seeded(h: &Harness, id: &str) -> Booking {
        let booking = fixtures::booking(id, "user-1");
        h.repos.bookings().insert(booking.clone()).await.unwrap();
        booking
    }

    fn reschedule(expected_version: Option<i32>) -> Reschedule {
        Reschedule {
            date: NaiveDate::from_ymd_opt(2025, 9, 17).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration: ChargeDuration::new(3, 0).unwrap(),
            expected_version,
        }
    }

    #[tokio::test]
    async fn create_persists_confirmed_booking() {
        let h = harness();
        let template = fixtures::booking("ignored", "user-1");
        let booking = h
            .bookings
            .create(
                "user-1",
                template.station.clone(),
                template.slot.clone(),
                template.schedule.clone(),
                template.pricing.clone(),
                "upi",
            )
            .await
            .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        let stored = h.bookings.get("user-1", &booking.id).await.unwrap();
        assert_eq!(stored, booking);
    }

    #[tokio::test]
    async fn create_rejects_inverted_schedule_without_writing() {
        let h = harness();
        let template = fixtures::booking("ignored", "user-1");
        let mut schedule = template.schedule.clone();
        schedule.end_time = schedule.start_time - chrono::Duration::minutes(30);

        let err = h
            .bookings
            .create("user-1", template.station, template.slot, schedule, template.pricing, "upi")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert!(h.bookings.list("user-1", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn modify_adds_surcharge_without_repricing() {
        let h = harness();
        let original = seeded(&h, "b-1").await;

        let updated = h.bookings.modify("user-1", "b-1", reschedule(Some(0))).await.unwrap();

        assert_eq!(updated.total(), dec!(25.18));
        assert_eq!(updated.pricing.energy_cost, original.pricing.energy_cost);
        assert_eq!(updated.schedule.duration.total_minutes(), 180);
        assert_eq!(updated.schedule.end_time.format("%H:%M").to_string(), "12:00");
        assert_eq!(updated.version, 1);
    }

    #[tokio::test]
    async fn stale_version_is_a_conflict() {
        let h = harness();
        seeded(&h, "b-1").await;
        h.bookings.modify("user-1", "b-1", reschedule(Some(0))).await.unwrap();

        let err = h
            .bookings
            .modify("user-1", "b-1", reschedule(Some(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[tokio::test]
    async fn terminal_booking_cannot_be_modified() {
        let h = harness();
        seeded(&h, "b-1").await;
        h.bookings.cancel("user-1", "b-1").await.unwrap();
        let err = h.bookings.modify("user-1", "b-1", reschedule(None)).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_refunds_once() {
        let h = harness();
        let booking = seeded(&h, "b-1").await;
        h.payments
            .record_payment(&booking, PaymentOutcome::default())
            .await
            .unwrap();

        let first = h.bookings.cancel("user-1", "b-1").await.unwrap();
        assert!(first.changed);
        assert!(first.refunded);
        assert_eq!(first.booking.status, BookingStatus::Cancelled);

        let second = h.bookings.cancel("user-1", "b-1").await.unwrap();
        assert!(!second.changed);
        assert_eq!(second.booking.status, BookingStatus::Cancelled);

        let ledger = h.payments.for_booking("user-1", "b-1").await.unwrap();
        assert_eq!(
            ledger.iter().filter(|t| t.kind == TransactionType::Refund).count(),
            1
        );
    }

    #[tokio::test]
    async fn lifecycle_start_then_complete() {
        let h = harness();
        seeded(&h, "b-1").await;

        let err = h
            .bookings
            .complete(
                "user-1",
                "b-1",
                Completion {
                    actual_duration_minutes: 80,
                    energy_delivered_kwh: dec!(52.5),
                    actual_cost: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));

        let active = h.bookings.start("user-1", "b-1").await.unwrap();
        assert_eq!(active.status, BookingStatus::Active);

        let done = h
            .bookings
            .complete(
                "user-1",
                "b-1",
                Completion {
                    actual_duration_minutes: 80,
                    energy_delivered_kwh: dec!(52.5),
                    actual_cost: Some(dec!(21.10)),
                },
            )
            .await
            .unwrap();
        assert_eq!(done.status, BookingStatus::Completed);
        assert!(done.completed_at.is_some());

        let err = h.bookings.cancel("user-1", "b-1").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn other_users_get_not_found() {
        let h = harness();
        seeded(&h, "b-1").await;
        assert!(matches!(
            h.bookings.get("user-2", "b-1").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            h.bookings.cancel("user-2", "b-1").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn stats_count_energy_for_completed_only() {
        let h = harness();
        seeded(&h, "b-1").await;
        seeded(&h, "b-2").await;
        h.bookings.start("user-1", "b-1").await.unwrap();
        h.bookings
            .complete(
                "user-1",
                "b-1",
                Completion {
                    actual_duration_minutes: 90,
                    energy_delivered_kwh: dec!(60),
                    actual_cost: None,
                },
            )
            .await
            .unwrap();

        let stats = h.bookings.stats("user-1").await.unwrap();
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.completed_bookings, 1);
        assert_eq!(stats.upcoming_bookings, 1);
        assert_eq!(stats.total_spent, dec!(45.36));
        assert_eq!(stats.total_energy_kwh, dec!(60));
    }

    #[tokio::test]
    async fn attach_qr_stores_payload() {
        let h = harness();
        let booking = seeded(&h, "b-1").await;
        let (stored, qr) = h.bookings.attach_qr(booking).await.unwrap();
        assert_eq!(stored.qr_code.as_deref(), Some(qr.payload.as_str()));

        let again = h.bookings.qr("user-1", "b-1").await.unwrap();
        assert_eq!(again.payload, qr.payload);
    }

    #[tokio::test]
    async fn export_uses_filters() {
        let h = harness();
        seeded(&h, "b-1").await;
        seeded(&h, "b-2").await;
        let filter = BookingFilter {
            search: Some("b-2".into()),
            ..BookingFilter::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 9, 16).unwrap();
        let csv = h
            .bookings
            .export_csv("user-1", &filter, BookingSort::DateDesc, today)
            .await
            .unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.lines().nth(1).unwrap().starts_with("b-2,"));
    }
}
