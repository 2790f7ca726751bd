//! Price quote endpoint

use std::sync::Arc;

use axum::extract::State;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::application::services::BookingService;
use crate::domain::booking::{ChargeDuration, PriceBreakdown, PriceInput};
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct PricingState {
    pub bookings: Arc<BookingService>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    #[validate(range(max = 24, message = "hours must be at most 24"))]
    pub hours: u32,
    #[validate(range(max = 59, message = "minutes must be below 60"))]
    pub minutes: u32,
    #[schema(value_type = String, example = "150")]
    pub power_kw: Decimal,
    #[schema(value_type = String, example = "0.35")]
    pub rate_per_kwh: Decimal,
}

#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    tag = "Pricing",
    security(("bearer_auth" = [])),
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Price breakdown", body = ApiResponse<PriceBreakdown>),
        (status = 400, description = "Zero duration, negative inputs or a price out of range"),
        (status = 422, description = "Field out of range")
    )
)]
pub async fn quote(
    State(state): State<PricingState>,
    ValidatedJson(req): ValidatedJson<QuoteRequest>,
) -> ApiResult<PriceBreakdown> {
    let duration = ChargeDuration::new(req.hours, req.minutes)?;
    ok(state.bookings.quote(&PriceInput {
        duration,
        power_kw: req.power_kw,
        rate_per_kwh: req.rate_per_kwh,
    })?)
}
