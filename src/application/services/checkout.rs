//! Checkout: turn a booking draft into a confirmed booking
//!
//! Steps run in a fixed order: create the booking, log the payment, attach
//! the QR, publish `BookingConfirmed`. Only the first step can fail the
//! checkout; later failures become warnings on the outcome.

use std::sync::Arc;

use log::warn;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::booking::BookingService;
use super::catalog::CatalogService;
use super::payment::{PaymentOutcome, PaymentService};
use crate::application::artifacts::QrImage;
use crate::application::events::{BookingConfirmedEvent, Event, SharedEventBus};
use crate::domain::booking::{Booking, BookingDraft, PriceInput, SlotRef, StationSnapshot};
use crate::domain::payment::Transaction;
use crate::domain::station::synthesize_slots;
use crate::domain::user::UserProfile;
use crate::domain::{DomainError, DomainResult};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub draft: BookingDraft,
    /// Result of the client-side payment step
    #[serde(default)]
    pub payment: PaymentOutcome,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    pub booking: Booking,
    pub transaction: Option<Transaction>,
    pub qr: Option<QrImage>,
    /// Secondary steps that failed; the booking stands regardless
    pub warnings: Vec<String>,
}

pub struct CheckoutService {
    catalog: Arc<CatalogService>,
    bookings: Arc<BookingService>,
    payments: Arc<PaymentService>,
    events: SharedEventBus,
}

impl CheckoutService {
    pub fn new(
        catalog: Arc<CatalogService>,
        bookings: Arc<BookingService>,
        payments: Arc<PaymentService>,
        events: SharedEventBus,
    ) -> Self {
        Self {
            catalog,
            bookings,
            payments,
            events,
        }
    }

    pub async fn checkout(&self, user: &UserProfile, request: CheckoutRequest) -> DomainResult<CheckoutOutcome> {
        let draft = request.draft;
        if draft.payment_method.trim().is_empty() {
            return Err(DomainError::Validation("payment method is required".into()));
        }

        let station = self.catalog.station(&draft.station_id, None).await?;
        let slot = synthesize_slots(&station)
            .into_iter()
            .find(|s| s.id == draft.slot_id)
            .ok_or_else(|| DomainError::not_found("Slot", "id", &draft.slot_id))?;
        if !slot.available {
            return Err(DomainError::Conflict(format!("slot {} is not available", slot.id)));
        }

        let pricing = self.bookings.quote(&PriceInput {
            duration: draft.duration,
            power_kw: slot.power_kw,
            rate_per_kwh: slot.price_per_kwh,
        })?;
        let booking = self
            .bookings
            .create(
                &user.id,
                StationSnapshot::from(&station),
                SlotRef {
                    slot_id: slot.id.clone(),
                    connector_type: slot.connector_type.clone(),
                    power_kw: slot.power_kw,
                },
                draft.schedule(),
                pricing,
                &draft.payment_method,
            )
            .await?;

        let mut warnings = Vec::new();

        let transaction = match self.payments.record_payment(&booking, request.payment).await {
            Ok(tx) => Some(tx),
            Err(e) => {
                warn!("Booking {} confirmed but payment was not logged: {}", booking.id, e);
                warnings.push(format!("Payment record could not be saved: {}", e));
                None
            }
        };

        let (booking, qr) = match self.bookings.attach_qr(booking.clone()).await {
            Ok((stored, qr)) => (stored, Some(qr)),
            Err(e) => {
                warn!("Booking {} confirmed but QR was not attached: {}", booking.id, e);
                warnings.push(format!("QR code could not be attached: {}", e));
                (booking, None)
            }
        };

        self.events.publish(Event::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.id.clone(),
            user: user.clone(),
            station_id: booking.station.id.clone(),
            total: booking.total(),
            timestamp: booking.created_at,
        }));

        Ok(CheckoutOutcome {
            booking,
            transaction,
            qr,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::events::create_event_bus;
    use crate::config::CatalogConfig;
    use crate::domain::booking::{
        BookingRepository, BookingStatus, ChargeDuration, PricingPolicy, TaxPolicy,
    };
    use crate::domain::notification::NotificationPreferenceRepository;
    use crate::domain::payment::{TransactionRepository, TransactionStatus};
    use crate::domain::station::model::fixtures::station;
    use crate::domain::station::{BoundingBox, NearbyQuery, Station, StationDirectory, StationStatus};
    use crate::domain::RepositoryProvider;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    struct EmptyDirectory;

    #[async_trait]
    impl StationDirectory for EmptyDirectory {
        async fn near(&self, _q: &NearbyQuery) -> Vec<Station> {
            Vec::new()
        }
        async fn in_bounding_box(&self, _b: &BoundingBox, _m: u32) -> Vec<Station> {
            Vec::new()
        }
        async fn by_country(&self, _c: &str, _m: u32) -> Vec<Station> {
            Vec::new()
        }
        async fn by_id(&self, _id: &str) -> Option<Station> {
            None
        }
    }

    /// Transaction store that rejects every insert
    struct BrokenLedger;

    #[async_trait]
    impl TransactionRepository for BrokenLedger {
        async fn insert(&self, _t: Transaction) -> DomainResult<()> {
            Err(DomainError::Persistence("ledger offline".into()))
        }
        async fn find_for_user(&self, _u: &str, _id: &str) -> DomainResult<Option<Transaction>> {
            Ok(None)
        }
        async fn list_for_user(&self, _u: &str) -> DomainResult<Vec<Transaction>> {
            Ok(Vec::new())
        }
        async fn list_for_user_by_status(
            &self,
            _u: &str,
            _s: TransactionStatus,
        ) -> DomainResult<Vec<Transaction>> {
            Ok(Vec::new())
        }
        async fn list_for_booking(&self, _u: &str, _b: &str) -> DomainResult<Vec<Transaction>> {
            Ok(Vec::new())
        }
        async fn update_status(&self, _t: &Transaction) -> DomainResult<()> {
            Err(DomainError::Persistence("ledger offline".into()))
        }
    }

    struct LedgerDown {
        inner: InMemoryRepositoryProvider,
        ledger: BrokenLedger,
    }

    impl RepositoryProvider for LedgerDown {
        fn bookings(&self) -> &dyn BookingRepository {
            self.inner.bookings()
        }
        fn transactions(&self) -> &dyn TransactionRepository {
            &self.ledger
        }
        fn notification_preferences(&self) -> &dyn NotificationPreferenceRepository {
            self.inner.notification_preferences()
        }
    }

    fn checkout_with(repos: Arc<dyn RepositoryProvider>) -> (CheckoutService, SharedEventBus) {
        let events = create_event_bus();
        let mut sample = station("ST9", StationStatus::Available);
        sample.price_per_kwh = dec!(0.35);
        sample.max_power_kw = dec!(150);
        let catalog = Arc::new(CatalogService::new(
            Arc::new(EmptyDirectory),
            vec![sample],
            CatalogConfig::default(),
        ));
        let payments = Arc::new(PaymentService::new(repos.clone(), events.clone(), "USD"));
        let policy = PricingPolicy {
            tax: TaxPolicy::Fixed(dec!(1.68)),
            ..PricingPolicy::default()
        };
        let bookings = Arc::new(BookingService::new(repos, payments.clone(), events.clone(), policy));
        (
            CheckoutService::new(catalog, bookings, payments, events.clone()),
            events,
        )
    }

    fn request(slot_id: &str) -> CheckoutRequest {
        CheckoutRequest {
            draft: BookingDraft {
                station_id: "ST9".into(),
                slot_id: slot_id.into(),
                date: NaiveDate::from_ymd_opt(2025, 9, 16).unwrap(),
                start_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                duration: ChargeDuration::new(1, 0).unwrap(),
                payment_method: "credit-card".into(),
            },
            payment: PaymentOutcome::default(),
        }
    }

    fn user() -> UserProfile {
        UserProfile::new("user-1")
    }

    #[tokio::test]
    async fn happy_path_books_logs_payment_and_attaches_qr() {
        let (svc, events) = checkout_with(Arc::new(InMemoryRepositoryProvider::new()));
        let mut sub = events.subscribe();

        let outcome = svc.checkout(&user(), request("S-ST9-1")).await.unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert_eq!(outcome.booking.total(), dec!(46.18));
        assert!(outcome.booking.qr_code.is_some());
        assert_eq!(outcome.transaction.unwrap().amount, dec!(46.18));
        assert!(outcome.qr.is_some());

        // payment first, then confirmation
        let mut confirmed = None;
        while let Ok(Some(msg)) =
            tokio::time::timeout(std::time::Duration::from_millis(200), sub.recv()).await
        {
            if let Event::BookingConfirmed(e) = msg.event {
                confirmed = Some(e);
                break;
            }
        }
        assert_eq!(confirmed.unwrap().booking_id, outcome.booking.id);
    }

    #[tokio::test]
    async fn ledger_failure_is_only_a_warning() {
        let repos = Arc::new(LedgerDown {
            inner: InMemoryRepositoryProvider::new(),
            ledger: BrokenLedger,
        });
        let (svc, _) = checkout_with(repos.clone());

        let outcome = svc.checkout(&user(), request("S-ST9-1")).await.unwrap();

        assert_eq!(outcome.booking.status, BookingStatus::Confirmed);
        assert!(outcome.transaction.is_none());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("Payment record"));
        let stored = repos.bookings().find_by_id(&outcome.booking.id).await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn unavailable_slot_is_rejected_before_writing() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let (svc, _) = checkout_with(repos.clone());

        let err = svc.checkout(&user(), request("S-ST9-4")).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(repos.bookings().list_for_user("user-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_station_or_slot_is_not_found() {
        let (svc, _) = checkout_with(Arc::new(InMemoryRepositoryProvider::new()));
        let mut req = request("S-ST9-1");
        req.draft.station_id = "missing".into();
        assert!(matches!(
            svc.checkout(&user(), req).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            svc.checkout(&user(), request("S-ST9-99")).await,
            Err(DomainError::NotFound { .. })
        ));
    }
}
