//! REST API tests driving the full router over the in-memory store

use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use takecharge::config::AppConfig;
use takecharge::domain::UserProfile;
use takecharge::infrastructure::crypto::jwt::{create_token, JwtConfig};
use takecharge::infrastructure::email::LoggingEmailSender;
use takecharge::infrastructure::{InMemoryRepositoryProvider, OpenChargeMapClient};
use takecharge::interfaces::http::create_api_router;
use takecharge::interfaces::http::modules::health::HealthState;
use takecharge::interfaces::http::modules::metrics::MetricsState;
use takecharge::server::AppServices;

struct TestApp {
    router: Router,
    jwt: JwtConfig,
}

fn app() -> TestApp {
    let config = AppConfig::default();
    // No API key: the directory returns nothing and the sample catalog is served
    let directory = Arc::new(OpenChargeMapClient::new(&config.catalog).unwrap());
    let services = AppServices::new(
        &config,
        Arc::new(InMemoryRepositoryProvider::new()),
        directory,
        Arc::new(LoggingEmailSender),
    );
    let state = services.api_state(
        &config,
        HealthState {
            db: None,
            started_at: Arc::new(Instant::now()),
        },
        MetricsState { handle: None },
    );
    TestApp {
        router: create_api_router(state),
        jwt: JwtConfig::from(&config.security),
    }
}

impl TestApp {
    fn token(&self, user_id: &str) -> String {
        let mut user = UserProfile::new(user_id);
        user.email = Some(format!("{}@example.com", user_id));
        create_token(&user, chrono::Duration::hours(1), &self.jwt).unwrap()
    }

    async fn send(&self, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Vec<u8>, Option<String>) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", self.token(user)));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec(), content_type)
    }

    async fn json(&self, method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes, _) = self.send(method, uri, user, body).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn checkout(&self, user: &str, slot_id: &str) -> (StatusCode, Value) {
        let station_id = slot_id.split('-').nth(1).unwrap_or_default().to_string();
        self.json(
            Method::POST,
            "/api/v1/bookings",
            Some(user),
            Some(json!({
                "stationId": station_id,
                "slotId": slot_id,
                "date": "2030-01-15",
                "startTime": "14:30:00",
                "durationHours": 1,
                "durationMinutes": 0,
                "paymentMethod": "credit-card"
            })),
        )
        .await
    }
}

#[tokio::test]
async fn health_reports_memory_store() {
    let app = app();
    let (status, body) = app.json(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["status"], "memory");
}

#[tokio::test]
async fn station_search_is_public_and_falls_back_to_sample() {
    let app = app();
    let (status, body) = app
        .json(Method::GET, "/api/v1/stations?lat=13.0827&lng=80.2707&sort=distance", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["source"], "sample");
    let stations = body["data"]["stations"].as_array().unwrap();
    assert_eq!(stations.len(), 6);
    let distances: Vec<f64> = stations
        .iter()
        .map(|s| s["distance_km"].as_f64().unwrap())
        .collect();
    assert!(distances.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn station_filters_apply() {
    let app = app();
    let (status, body) = app
        .json(Method::GET, "/api/v1/stations?availableOnly=true", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let stations = body["data"]["stations"].as_array().unwrap();
    assert!(!stations.is_empty());
    assert!(stations.iter().all(|s| s["status"] == "available"));
}

#[tokio::test]
async fn half_coordinate_is_bad_request() {
    let app = app();
    let (status, body) = app.json(Method::GET, "/api/v1/stations?lat=13.0", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn station_slots_and_unknown_station() {
    let app = app();
    let (status, body) = app.json(Method::GET, "/api/v1/stations/1/slots", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let slots = body["data"].as_array().unwrap();
    assert_eq!(slots.len(), 8);
    assert_eq!(slots[0]["id"], "S-1-1");
    assert_eq!(slots[0]["available"], true);

    let (status, _) = app.json(Method::GET, "/api/v1/stations/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = app();
    let (status, body) = app.json(Method::GET, "/api/v1/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("Missing"));
}

#[tokio::test]
async fn quote_prices_and_validates() {
    let app = app();
    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/pricing/quote",
            Some("user-1"),
            Some(json!({"hours": 1, "minutes": 0, "powerKw": "150", "ratePerKwh": "0.35"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], "46.18");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/v1/pricing/quote",
            Some("user-1"),
            Some(json!({"hours": 1, "minutes": 90, "powerKw": "150", "ratePerKwh": "0.35"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .json(
            Method::POST,
            "/api/v1/pricing/quote",
            Some("user-1"),
            Some(json!({
                "hours": 24,
                "minutes": 0,
                "powerKw": "79228162514264337593543950335",
                "ratePerKwh": "1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn checkout_creates_confirmed_booking_with_payment_and_qr() {
    let app = app();
    let (status, body) = app.checkout("user-1", "S-1-1").await;
    assert_eq!(status, StatusCode::CREATED);

    let outcome = &body["data"];
    assert_eq!(outcome["booking"]["status"], "confirmed");
    assert_eq!(outcome["booking"]["pricing"]["total"], "60.74");
    assert_eq!(outcome["transaction"]["status"], "completed");
    assert!(outcome["qr"]["dataUrl"]
        .as_str()
        .unwrap()
        .starts_with("data:image/svg+xml;base64,"));
    assert!(outcome["warnings"].as_array().unwrap().is_empty());

    let (status, body) = app.json(Method::GET, "/api/v1/bookings", Some("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = app.json(Method::GET, "/api/v1/bookings/stats", Some("user-1"), None).await;
    assert_eq!(body["data"]["totalBookings"], 1);
    assert_eq!(body["data"]["upcomingBookings"], 1);
}

#[tokio::test]
async fn unavailable_slot_is_a_conflict() {
    let app = app();
    let (status, body) = app.checkout("user-1", "S-2-1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn bookings_are_scoped_to_their_owner() {
    let app = app();
    let (_, body) = app.checkout("user-1", "S-1-1").await;
    let id = body["data"]["booking"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .json(Method::GET, &format!("/api/v1/bookings/{}", id), Some("user-2"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = app.json(Method::GET, "/api/v1/bookings", Some("user-2"), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn cancel_refunds_once_and_is_idempotent() {
    let app = app();
    let (_, body) = app.checkout("user-1", "S-1-1").await;
    let id = body["data"]["booking"]["id"].as_str().unwrap().to_string();
    let cancel_uri = format!("/api/v1/bookings/{}/cancel", id);

    let (status, body) = app.json(Method::POST, &cancel_uri, Some("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], true);
    assert_eq!(body["data"]["refunded"], true);
    assert_eq!(body["data"]["booking"]["status"], "cancelled");

    let (status, body) = app.json(Method::POST, &cancel_uri, Some("user-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["changed"], false);

    let (_, body) = app
        .json(Method::GET, &format!("/api/v1/bookings/{}/transactions", id), Some("user-1"), None)
        .await;
    let ledger = body["data"].as_array().unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[1]["kind"], "refund");
}

#[tokio::test]
async fn lifecycle_start_then_complete() {
    let app = app();
    let (_, body) = app.checkout("user-1", "S-1-1").await;
    let id = body["data"]["booking"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .json(
            Method::POST,
            &format!("/api/v1/bookings/{}/complete", id),
            Some("user-1"),
            Some(json!({"actualDurationMinutes": 55, "energyDeliveredKwh": "38.4"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .json(Method::POST, &format!("/api/v1/bookings/{}/start", id), Some("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "active");

    let (status, body) = app
        .json(
            Method::POST,
            &format!("/api/v1/bookings/{}/complete", id),
            Some("user-1"),
            Some(json!({"actualDurationMinutes": 55, "energyDeliveredKwh": "38.4"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");

    let (status, _) = app
        .json(Method::POST, &format!("/api/v1/bookings/{}/cancel", id), Some("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn reschedule_adds_surcharge_and_rejects_stale_version() {
    let app = app();
    let (_, body) = app.checkout("user-1", "S-1-1").await;
    let booking = &body["data"]["booking"];
    let id = booking["id"].as_str().unwrap().to_string();
    let version = booking["version"].as_i64().unwrap();
    let uri = format!("/api/v1/bookings/{}/schedule", id);

    let (status, _) = app
        .json(
            Method::PUT,
            &uri,
            Some("user-1"),
            Some(json!({
                "date": "2030-01-16",
                "startTime": "09:00:00",
                "durationHours": 2,
                "durationMinutes": 0,
                "expectedVersion": version + 10
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .json(
            Method::PUT,
            &uri,
            Some("user-1"),
            Some(json!({
                "date": "2030-01-16",
                "startTime": "09:00:00",
                "durationHours": 2,
                "durationMinutes": 0,
                "expectedVersion": version
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pricing"]["total"], "63.24");
    assert_eq!(body["data"]["version"].as_i64().unwrap(), version + 1);
}

#[tokio::test]
async fn export_and_invoice_downloads() {
    let app = app();
    let (_, body) = app.checkout("user-1", "S-1-1").await;
    let id = body["data"]["booking"]["id"].as_str().unwrap().to_string();

    let (status, bytes, content_type) = app
        .send(Method::GET, "/api/v1/bookings/export", Some("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/csv"));
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("Booking ID,Station Name,Location"));
    assert!(csv.contains(&id));

    let (status, bytes, content_type) = app
        .send(Method::GET, &format!("/api/v1/bookings/{}/invoice", id), Some("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn transactions_list_summary_and_status_rules() {
    let app = app();
    app.checkout("user-1", "S-1-1").await;

    let (status, body) = app
        .json(Method::GET, "/api/v1/transactions?status=completed", Some("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let ledger = body["data"].as_array().unwrap();
    assert_eq!(ledger.len(), 1);
    let tx_id = ledger[0]["id"].as_str().unwrap().to_string();

    let (_, body) = app
        .json(Method::GET, "/api/v1/transactions/summary", Some("user-1"), None)
        .await;
    assert_eq!(body["data"]["count"], 1);
    assert_eq!(body["data"]["completed"], 1);

    // completed → pending is not a valid move
    let (status, _) = app
        .json(
            Method::PUT,
            &format!("/api/v1/transactions/{}/status", tx_id),
            Some("user-1"),
            Some(json!({"status": "pending"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(Method::GET, &format!("/api/v1/transactions/{}", tx_id), Some("user-2"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notification_preferences_default_then_save() {
    let app = app();
    let (status, body) = app
        .json(Method::GET, "/api/v1/notifications/preferences", Some("user-1"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"]["promotions"], false);
    assert_eq!(body["data"]["sms"]["reminders"], true);

    let mut email = body["data"]["email"].clone();
    email["promotions"] = json!(true);
    let (status, body) = app
        .json(
            Method::PUT,
            "/api/v1/notifications/preferences",
            Some("user-1"),
            Some(json!({
                "email": email,
                "push": body["data"]["push"],
                "sms": body["data"]["sms"],
                "reminders": {"before": ["30m"], "after": []}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"]["promotions"], true);
    assert_eq!(body["data"]["user_id"], "user-1");

    let (_, body) = app
        .json(Method::GET, "/api/v1/notifications/preferences", Some("user-1"), None)
        .await;
    assert_eq!(body["data"]["reminders"]["before"], json!(["30m"]));
}
