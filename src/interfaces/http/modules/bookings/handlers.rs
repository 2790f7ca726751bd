//! Booking REST handlers
//!
//! Every route is scoped to the authenticated user; another user's booking
//! is reported as not found.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;

use super::dto::{BookingSortParams, CompleteRequest, CreateBookingRequest, RescheduleRequest};
use crate::application::artifacts::{render_invoice_pdf, Invoice, QrImage};
use crate::application::filters::BookingFilter;
use crate::application::services::{
    BookingService, BookingStats, CancelOutcome, CheckoutOutcome, CheckoutRequest, CheckoutService,
    PaymentService, Reschedule,
};
use crate::domain::{Booking, DomainError, Transaction, UserProfile};
use crate::interfaces::http::common::{ok, ApiError, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct BookingState {
    pub bookings: Arc<BookingService>,
    pub checkout: Arc<CheckoutService>,
    pub payments: Arc<PaymentService>,
    /// Currency printed on invoices
    pub currency: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking confirmed; failed secondary steps are listed as warnings", body = ApiResponse<CheckoutOutcome>),
        (status = 400, description = "Invalid draft"),
        (status = 404, description = "Unknown station or slot"),
        (status = 409, description = "Slot not available")
    )
)]
pub async fn create_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    ValidatedJson(req): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutOutcome>>), ApiError> {
    let request = CheckoutRequest::try_from(req)?;
    let outcome = state.checkout.checkout(&user, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(outcome))))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(BookingFilter, BookingSortParams),
    responses(
        (status = 200, description = "Booking history", body = ApiResponse<Vec<Booking>>)
    )
)]
pub async fn list_bookings(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Query(filter): Query<BookingFilter>,
    Query(sort): Query<BookingSortParams>,
) -> ApiResult<Vec<Booking>> {
    let today = Utc::now().date_naive();
    ok(state
        .bookings
        .search(&user.id, &filter, sort.sort.unwrap_or_default(), today)
        .await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/stats",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Booking statistics", body = ApiResponse<BookingStats>)
    )
)]
pub async fn booking_stats(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
) -> ApiResult<BookingStats> {
    ok(state.bookings.stats(&user.id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/export",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(BookingFilter, BookingSortParams),
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv", body = String)
    )
)]
pub async fn export_bookings(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Query(filter): Query<BookingFilter>,
    Query(sort): Query<BookingSortParams>,
) -> Result<Response, ApiError> {
    let today = Utc::now().date_naive();
    let csv = state
        .bookings
        .export_csv(&user.id, &filter, sort.sort.unwrap_or_default(), today)
        .await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"bookings-{}.csv\"", today),
            ),
        ],
        csv,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking", body = ApiResponse<Booking>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    ok(state.bookings.get(&user.id, &id).await?)
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}/schedule",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Rescheduled, surcharge applied", body = ApiResponse<Booking>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Not modifiable or stale version")
    )
)]
pub async fn reschedule_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RescheduleRequest>,
) -> ApiResult<Booking> {
    let change = Reschedule::try_from(req)?;
    ok(state.bookings.modify(&user.id, &id, change).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Cancelled (or already cancelled)", body = ApiResponse<CancelOutcome>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Booking already completed")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<CancelOutcome> {
    ok(state.bookings.cancel(&user.id, &id).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/start",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Session started", body = ApiResponse<Booking>),
        (status = 409, description = "Booking is not confirmed")
    )
)]
pub async fn start_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<Booking> {
    ok(state.bookings.start(&user.id, &id).await?)
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/complete",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    request_body = CompleteRequest,
    responses(
        (status = 200, description = "Session completed", body = ApiResponse<Booking>),
        (status = 409, description = "Booking is not active")
    )
)]
pub async fn complete_booking(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<CompleteRequest>,
) -> ApiResult<Booking> {
    ok(state.bookings.complete(&user.id, &id, req.into()).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}/qr",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "QR payload and SVG data URL", body = ApiResponse<QrImage>),
        (status = 404, description = "Not found")
    )
)]
pub async fn booking_qr(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<QrImage> {
    ok(state.bookings.qr(&user.id, &id).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}/invoice",
    tag = "Bookings",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Invoice PDF", content_type = "application/pdf", body = Vec<u8>),
        (status = 404, description = "Not found")
    )
)]
pub async fn booking_invoice(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let booking = state.bookings.get(&user.id, &id).await?;
    let invoice = Invoice::for_booking(&booking, Some(&user), &state.currency, Utc::now().date_naive());
    let pdf = render_invoice_pdf(&invoice).map_err(DomainError::from)?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}.pdf\"", invoice.number),
            ),
        ],
        pdf,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Ledger entries for the booking, oldest first", body = ApiResponse<Vec<Transaction>>),
        (status = 404, description = "Not found")
    )
)]
pub async fn booking_transactions(
    State(state): State<BookingState>,
    Extension(user): Extension<UserProfile>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Transaction>> {
    let booking = state.bookings.get(&user.id, &id).await?;
    ok(state.payments.for_booking(&user.id, &booking.id).await?)
}
