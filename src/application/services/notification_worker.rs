//! Notification worker
//!
//! Consumes booking events from the bus and sends emails off the request
//! path. Delivery failures are logged and counted; nothing is reported
//! back to the booking flow.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info, warn};
use tokio::sync::Mutex;
use tokio::task::{JoinHandle, JoinSet};

use super::notification::NotificationService;
use crate::application::events::{
    BookingConfirmedEvent, BookingModifiedEvent, Event, EventSubscriber,
};
use crate::domain::booking::{Booking, BookingStatus};
use crate::domain::notification::{NotificationPreferences, ReminderOffset};
use crate::domain::user::UserProfile;
use crate::domain::RepositoryProvider;
use crate::shared::shutdown::ShutdownSignal;

/// Reminders still ahead of `now`, with the delay until each fires.
///
/// Schedule times are station-local and treated as UTC here.
pub fn pending_reminders(
    booking: &Booking,
    prefs: &NotificationPreferences,
    now: DateTime<Utc>,
) -> Vec<(ReminderOffset, Duration)> {
    let starts_at = booking.schedule.start_time.and_utc();
    prefs
        .reminders
        .before
        .iter()
        .copied()
        .filter(|offset| prefs.wants_reminder(*offset))
        .filter_map(|offset| {
            let fire_at = starts_at - offset.lead_time();
            (fire_at - now).to_std().ok().map(|delay| (offset, delay))
        })
        .collect()
}

pub struct NotificationWorker {
    notifications: Arc<NotificationService>,
    repos: Arc<dyn RepositoryProvider>,
    subscriber: Mutex<Option<EventSubscriber>>,
}

impl NotificationWorker {
    /// Subscribes immediately so no event published after this call is missed.
    pub fn new(
        notifications: Arc<NotificationService>,
        repos: Arc<dyn RepositoryProvider>,
        subscriber: EventSubscriber,
    ) -> Self {
        Self {
            notifications,
            repos,
            subscriber: Mutex::new(Some(subscriber)),
        }
    }

    /// Start the worker loop. Pending reminders are dropped on shutdown.
    pub async fn start(&self, shutdown: ShutdownSignal) -> Option<JoinHandle<()>> {
        let Some(mut subscriber) = self.subscriber.lock().await.take() else {
            warn!("Notification worker already started");
            return None;
        };
        let notifications = self.notifications.clone();
        let repos = self.repos.clone();

        Some(tokio::spawn(async move {
            info!("📨 Notification worker started");
            let mut reminders: JoinSet<()> = JoinSet::new();
            // Profiles of confirmed bookings, kept to re-address reminders after a reschedule
            let mut recipients: HashMap<String, UserProfile> = HashMap::new();

            loop {
                tokio::select! {
                    msg = subscriber.recv() => {
                        let Some(msg) = msg else { break };
                        match msg.event {
                            Event::BookingConfirmed(event) => {
                                recipients.insert(event.booking_id.clone(), event.user.clone());
                                on_confirmed(&notifications, &repos, &mut reminders, event).await;
                            }
                            Event::BookingModified(event) => {
                                if let Some(user) = recipients.get(&event.booking_id) {
                                    on_modified(&notifications, &repos, &mut reminders, event, user).await;
                                }
                            }
                            Event::BookingCancelled(event) => {
                                recipients.remove(&event.booking_id);
                            }
                            Event::BookingStarted(event) | Event::BookingCompleted(event) => {
                                recipients.remove(&event.booking_id);
                            }
                            Event::PaymentRecorded(_) => {}
                        }
                    }
                    Some(_) = reminders.join_next(), if !reminders.is_empty() => {}
                    _ = shutdown.wait() => {
                        info!("📨 Notification worker shutting down");
                        break;
                    }
                }
            }

            if !reminders.is_empty() {
                info!("Dropping {} scheduled reminders", reminders.len());
            }
            reminders.abort_all();
            info!("📨 Notification worker stopped");
        }))
    }
}

async fn on_confirmed(
    notifications: &Arc<NotificationService>,
    repos: &Arc<dyn RepositoryProvider>,
    reminders: &mut JoinSet<()>,
    event: BookingConfirmedEvent,
) {
    let booking = match repos.bookings().find_by_id(&event.booking_id).await {
        Ok(Some(booking)) => booking,
        Ok(None) => {
            warn!("Confirmed booking {} not found, no email sent", event.booking_id);
            return;
        }
        Err(e) => {
            warn!("Could not load booking {}: {}", event.booking_id, e);
            return;
        }
    };

    match notifications.send_confirmation(&booking, &event.user).await {
        Ok(outcome) => debug!("Confirmation for {}: {:?}", booking.id, outcome),
        Err(e) => warn!("Confirmation email for {} not delivered: {}", booking.id, e),
    }

    schedule_reminders(notifications, repos, reminders, &booking, &event.user).await;
}

async fn on_modified(
    notifications: &Arc<NotificationService>,
    repos: &Arc<dyn RepositoryProvider>,
    reminders: &mut JoinSet<()>,
    event: BookingModifiedEvent,
    user: &UserProfile,
) {
    match repos.bookings().find_by_id(&event.booking_id).await {
        Ok(Some(booking)) => schedule_reminders(notifications, repos, reminders, &booking, user).await,
        Ok(None) => debug!("Rescheduled booking {} not found", event.booking_id),
        Err(e) => warn!("Could not load booking {}: {}", event.booking_id, e),
    }
}

/// Reminders already scheduled for an earlier start time skip themselves on wake-up
async fn schedule_reminders(
    notifications: &Arc<NotificationService>,
    repos: &Arc<dyn RepositoryProvider>,
    reminders: &mut JoinSet<()>,
    booking: &Booking,
    user: &UserProfile,
) {
    let prefs = match notifications.preferences(&user.id).await {
        Ok(prefs) => prefs,
        Err(e) => {
            warn!("No reminders for {}: preferences unavailable: {}", booking.id, e);
            return;
        }
    };

    let starts_at = booking.schedule.start_time;
    for (offset, delay) in pending_reminders(booking, &prefs, Utc::now()) {
        debug!("Reminder {} for booking {} in {:?}", offset.code(), booking.id, delay);
        let notifications = notifications.clone();
        let repos = repos.clone();
        let user = user.clone();
        let booking_id = booking.id.clone();
        reminders.spawn(async move {
            tokio::time::sleep(delay).await;
            send_reminder(&notifications, &repos, &user, &booking_id, starts_at, offset).await;
        });
    }
}

/// Re-read the booking; only a still-confirmed booking starting at
/// `starts_at` is reminded
async fn send_reminder(
    notifications: &NotificationService,
    repos: &Arc<dyn RepositoryProvider>,
    user: &UserProfile,
    booking_id: &str,
    starts_at: NaiveDateTime,
    offset: ReminderOffset,
) {
    let booking = match repos.bookings().find_by_id(booking_id).await {
        Ok(Some(b))
            if b.status == BookingStatus::Confirmed && b.schedule.start_time == starts_at =>
        {
            b
        }
        Ok(Some(_)) => {
            debug!("Reminder {} for {} skipped: booking cancelled or rescheduled", offset.code(), booking_id);
            return;
        }
        Ok(None) => {
            debug!("Reminder {} for {} skipped: booking not found", offset.code(), booking_id);
            return;
        }
        Err(e) => {
            warn!("Reminder {} for {} skipped: {}", offset.code(), booking_id, e);
            return;
        }
    };
    if let Err(e) = notifications.send_reminder(&booking, user, offset).await {
        warn!("Reminder {} for {} not delivered: {}", offset.code(), booking_id, e);
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::application::events::{create_event_bus, SharedEventBus};
    use crate::domain::booking::{ChargeDuration, Schedule};
    use crate::application::services::notification::testing::RecordingSender;
    use crate::config::EmailConfig;
    use crate::domain::booking::model::fixtures;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    #[test]
    fn reminders_in_the_past_are_dropped() {
        let booking = fixtures::booking("b-1", "user-1");
        let prefs = NotificationPreferences::defaults_for("user-1");

        // session starts 2025-09-16 14:30
        let early = Utc.with_ymd_and_hms(2025, 9, 15, 9, 0, 0).unwrap();
        let due = pending_reminders(&booking, &prefs, early);
        assert_eq!(
            due,
            vec![
                (ReminderOffset::Hours24, Duration::from_secs(5 * 3600 + 30 * 60)),
                (ReminderOffset::Hours2, Duration::from_secs(27 * 3600 + 30 * 60)),
            ]
        );

        let late = Utc.with_ymd_and_hms(2025, 9, 16, 13, 0, 0).unwrap();
        assert!(pending_reminders(&booking, &prefs, late).is_empty());
    }

    #[test]
    fn disabled_reminders_schedule_nothing() {
        let booking = fixtures::booking("b-1", "user-1");
        let mut prefs = NotificationPreferences::defaults_for("user-1");
        prefs.email.reminders = false;
        let early = Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap();
        assert!(pending_reminders(&booking, &prefs, early).is_empty());
    }

    #[tokio::test]
    async fn confirmed_event_sends_email_and_stops_on_shutdown() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let sender = Arc::new(RecordingSender::default());
        let notifications = Arc::new(NotificationService::new(
            repos.clone(),
            sender.clone(),
            &EmailConfig::default(),
            "USD",
        ));
        let bus = create_event_bus();
        let worker = NotificationWorker::new(notifications, repos.clone(), bus.subscribe());
        let shutdown = ShutdownSignal::new();
        let handle = worker.start(shutdown.clone()).await.unwrap();
        assert!(worker.start(shutdown.clone()).await.is_none());

        let booking = fixtures::booking("b-1", "user-1");
        repos.bookings().insert(booking.clone()).await.unwrap();
        let mut user = UserProfile::new("user-1");
        user.email = Some("meera@example.com".into());
        bus.publish(Event::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.id.clone(),
            user,
            station_id: booking.station.id.clone(),
            total: booking.total(),
            timestamp: Utc::now(),
        }));

        tokio::time::timeout(Duration::from_secs(5), async {
            while sender.subjects().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("confirmation email should be sent");
        assert_eq!(sender.subjects(), vec!["Booking Confirmed - Phoenix Marketcity"]);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should stop")
            .unwrap();
    }

    fn confirm(bus: &SharedEventBus, booking: &Booking) {
        let mut user = UserProfile::new(booking.user_id.clone());
        user.email = Some("meera@example.com".into());
        bus.publish(Event::BookingConfirmed(BookingConfirmedEvent {
            booking_id: booking.id.clone(),
            user,
            station_id: booking.station.id.clone(),
            total: booking.total(),
            timestamp: Utc::now(),
        }));
    }

    #[tokio::test]
    async fn rescheduled_booking_is_not_reminded_at_the_old_time() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let sender = Arc::new(RecordingSender::default());
        let notifications = Arc::new(NotificationService::new(
            repos.clone(),
            sender.clone(),
            &EmailConfig::default(),
            "USD",
        ));
        let bus = create_event_bus();
        let worker = NotificationWorker::new(notifications, repos.clone(), bus.subscribe());
        let shutdown = ShutdownSignal::new();
        let handle = worker.start(shutdown.clone()).await.unwrap();

        // 24h reminder for both falls due about a second from now
        let start = (Utc::now() + chrono::Duration::hours(24) + chrono::Duration::seconds(1)).naive_utc();
        let duration = ChargeDuration::new(1, 0).unwrap();
        let mut kept = fixtures::booking("b-kept", "user-1");
        kept.schedule = Schedule::starting_at(start, duration);
        let mut moved = fixtures::booking("b-moved", "user-1");
        moved.schedule = Schedule::starting_at(start, duration);
        repos.bookings().insert(kept.clone()).await.unwrap();
        repos.bookings().insert(moved.clone()).await.unwrap();
        confirm(&bus, &kept);
        confirm(&bus, &moved);

        tokio::time::timeout(Duration::from_secs(5), async {
            while sender.subjects().len() < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("confirmation emails should be sent");

        let mut stored = repos.bookings().find_by_id("b-moved").await.unwrap().unwrap();
        let next_week = Schedule::starting_at(start + chrono::Duration::days(7), duration);
        stored.modify(next_week, rust_decimal_macros::dec!(2.50), Utc::now()).unwrap();
        let stored = repos.bookings().update(stored).await.unwrap();
        bus.publish(Event::BookingModified(BookingModifiedEvent {
            booking_id: stored.id.clone(),
            user_id: stored.user_id.clone(),
            total: stored.total(),
            timestamp: Utc::now(),
        }));

        tokio::time::sleep(Duration::from_millis(2500)).await;
        let reminders: Vec<String> = sender
            .subjects()
            .into_iter()
            .filter(|s| s.starts_with("Reminder"))
            .collect();
        assert_eq!(reminders.len(), 1, "only the unchanged booking is reminded: {:?}", reminders);

        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker should stop")
            .unwrap();
    }
}
