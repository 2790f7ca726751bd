//! API Router with Swagger UI

use std::sync::Arc;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::artifacts::QrImage;
use crate::application::services::{
    BookingService, BookingStats, CancelOutcome, CatalogService, CatalogSource, CheckoutOutcome,
    CheckoutService, NotificationService, PaymentOutcome, PaymentService, StationList,
};
use crate::domain::booking::{Completion, PriceBreakdown, Schedule, SlotRef, StationSnapshot};
use crate::domain::notification::{ChannelPreferences, FollowUp, ReminderOffset, ReminderSchedule};
use crate::domain::payment::TransactionSummary;
use crate::domain::{
    Booking, BookingStatus, ChargeDuration, Coordinate, NotificationPreferences, Slot, Station,
    StationStatus, Transaction, TransactionStatus, TransactionType,
};
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::{auth_middleware, AuthState};
use crate::interfaces::http::modules::bookings::{
    self, BookingState, CompleteRequest, CreateBookingRequest, RescheduleRequest,
};
use crate::interfaces::http::modules::health::{self, ComponentHealth, HealthResponse, HealthState};
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::notifications::{
    self, NotificationState, PreferencesRequest,
};
use crate::interfaces::http::modules::pricing::{self, PricingState, QuoteRequest};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::stations::{self, StationState};
use crate::interfaces::http::modules::transactions::{
    self, TransactionState, UpdateStatusRequest,
};

/// Everything the routes need. Handlers extract their own slice via `FromRef`.
#[derive(Clone)]
pub struct ApiState {
    pub catalog: Arc<CatalogService>,
    pub bookings: Arc<BookingService>,
    pub checkout: Arc<CheckoutService>,
    pub payments: Arc<PaymentService>,
    pub notifications: Arc<NotificationService>,
    /// Currency printed on invoices
    pub currency: String,
    pub auth: AuthState,
    pub health: HealthState,
    pub metrics: MetricsState,
}

// -- FromRef implementations so each handler keeps its own State<T> extractor --

impl FromRef<ApiState> for StationState {
    fn from_ref(s: &ApiState) -> Self {
        StationState {
            catalog: Arc::clone(&s.catalog),
        }
    }
}

impl FromRef<ApiState> for PricingState {
    fn from_ref(s: &ApiState) -> Self {
        PricingState {
            bookings: Arc::clone(&s.bookings),
        }
    }
}

impl FromRef<ApiState> for BookingState {
    fn from_ref(s: &ApiState) -> Self {
        BookingState {
            bookings: Arc::clone(&s.bookings),
            checkout: Arc::clone(&s.checkout),
            payments: Arc::clone(&s.payments),
            currency: s.currency.clone(),
        }
    }
}

impl FromRef<ApiState> for TransactionState {
    fn from_ref(s: &ApiState) -> Self {
        TransactionState {
            payments: Arc::clone(&s.payments),
        }
    }
}

impl FromRef<ApiState> for NotificationState {
    fn from_ref(s: &ApiState) -> Self {
        NotificationState {
            notifications: Arc::clone(&s.notifications),
        }
    }
}

impl FromRef<ApiState> for AuthState {
    fn from_ref(s: &ApiState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<ApiState> for HealthState {
    fn from_ref(s: &ApiState) -> Self {
        s.health.clone()
    }
}

impl FromRef<ApiState> for MetricsState {
    fn from_ref(s: &ApiState) -> Self {
        s.metrics.clone()
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token issued by the auth provider"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Stations
        stations::search_stations,
        stations::stations_in_bounds,
        stations::stations_by_country,
        stations::get_station,
        stations::list_slots,
        // Pricing
        pricing::quote,
        // Bookings
        bookings::create_booking,
        bookings::list_bookings,
        bookings::booking_stats,
        bookings::export_bookings,
        bookings::get_booking,
        bookings::reschedule_booking,
        bookings::cancel_booking,
        bookings::start_booking,
        bookings::complete_booking,
        bookings::booking_qr,
        bookings::booking_invoice,
        bookings::booking_transactions,
        // Transactions
        transactions::list_transactions,
        transactions::transaction_summary,
        transactions::get_transaction,
        transactions::update_transaction_status,
        // Notifications
        notifications::get_preferences,
        notifications::save_preferences,
    ),
    components(
        schemas(
            // Common
            ApiResponse<String>,
            HealthResponse,
            ComponentHealth,
            // Stations
            Coordinate,
            Station,
            StationStatus,
            StationList,
            CatalogSource,
            Slot,
            // Pricing
            QuoteRequest,
            PriceBreakdown,
            ChargeDuration,
            // Bookings
            Booking,
            BookingStatus,
            Schedule,
            StationSnapshot,
            SlotRef,
            Completion,
            CreateBookingRequest,
            RescheduleRequest,
            CompleteRequest,
            PaymentOutcome,
            CheckoutOutcome,
            CancelOutcome,
            BookingStats,
            QrImage,
            // Transactions
            Transaction,
            TransactionStatus,
            TransactionType,
            TransactionSummary,
            UpdateStatusRequest,
            // Notifications
            NotificationPreferences,
            ChannelPreferences,
            ReminderSchedule,
            ReminderOffset,
            FollowUp,
            PreferencesRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Stations", description = "Charging station search, lookup and slots"),
        (name = "Pricing", description = "Price quotes"),
        (name = "Bookings", description = "Checkout, booking history and lifecycle"),
        (name = "Transactions", description = "Payment and refund ledger"),
        (name = "Notifications", description = "Notification preferences"),
    ),
    info(
        title = "TakeCharge Booking API",
        version = "1.0.0",
        description = "REST API for finding EV charging stations and booking charging slots",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(state: ApiState) -> Router {
    let auth_layer = || middleware::from_fn_with_state(state.auth.clone(), auth_middleware);

    // Station routes (public)
    let station_routes = Router::new()
        .route("/", get(stations::search_stations))
        .route("/within", get(stations::stations_in_bounds))
        .route("/country/{code}", get(stations::stations_by_country))
        .route("/{id}", get(stations::get_station))
        .route("/{id}/slots", get(stations::list_slots));

    // Pricing routes (protected)
    let pricing_routes = Router::new()
        .route("/quote", post(pricing::quote))
        .layer(auth_layer());

    // Booking routes (protected)
    let booking_routes = Router::new()
        .route(
            "/",
            get(bookings::list_bookings).post(bookings::create_booking),
        )
        .route("/stats", get(bookings::booking_stats))
        .route("/export", get(bookings::export_bookings))
        .route("/{id}", get(bookings::get_booking))
        .route("/{id}/schedule", put(bookings::reschedule_booking))
        .route("/{id}/cancel", post(bookings::cancel_booking))
        .route("/{id}/start", post(bookings::start_booking))
        .route("/{id}/complete", post(bookings::complete_booking))
        .route("/{id}/qr", get(bookings::booking_qr))
        .route("/{id}/invoice", get(bookings::booking_invoice))
        .route("/{id}/transactions", get(bookings::booking_transactions))
        .layer(auth_layer());

    // Transaction routes (protected)
    let tx_routes = Router::new()
        .route("/", get(transactions::list_transactions))
        .route("/summary", get(transactions::transaction_summary))
        .route("/{id}", get(transactions::get_transaction))
        .route("/{id}/status", put(transactions::update_transaction_status))
        .layer(auth_layer());

    // Notification routes (protected)
    let notification_routes = Router::new()
        .route(
            "/preferences",
            get(notifications::get_preferences).put(notifications::save_preferences),
        )
        .layer(auth_layer());

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(prometheus_metrics))
        .nest("/api/v1/stations", station_routes)
        .nest("/api/v1/pricing", pricing_routes)
        .nest("/api/v1/bookings", booking_routes)
        .nest("/api/v1/transactions", tx_routes)
        .nest("/api/v1/notifications", notification_routes)
        .with_state(state)
        // Swagger UI
        .merge(swagger_routes)
        // Middleware
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
