//! Booking request DTOs

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::filters::BookingSort;
use crate::application::services::{CheckoutRequest, PaymentOutcome, Reschedule};
use crate::domain::booking::{BookingDraft, ChargeDuration, Completion};
use crate::domain::DomainError;

/// Checkout payload: the client's booking draft plus the payment result
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, message = "station is required"))]
    pub station_id: String,
    #[validate(length(min = 1, message = "slot is required"))]
    pub slot_id: String,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "14:30:00")]
    pub start_time: NaiveTime,
    #[validate(range(max = 24, message = "hours must be at most 24"))]
    pub duration_hours: u32,
    #[validate(range(max = 59, message = "minutes must be below 60"))]
    pub duration_minutes: u32,
    #[validate(length(min = 1, message = "payment method is required"))]
    pub payment_method: String,
    /// Defaults to a completed payment
    #[serde(default)]
    pub payment: Option<PaymentOutcome>,
}

impl TryFrom<CreateBookingRequest> for CheckoutRequest {
    type Error = DomainError;

    fn try_from(req: CreateBookingRequest) -> Result<Self, Self::Error> {
        Ok(CheckoutRequest {
            draft: BookingDraft {
                station_id: req.station_id,
                slot_id: req.slot_id,
                date: req.date,
                start_time: req.start_time,
                duration: ChargeDuration::new(req.duration_hours, req.duration_minutes)?,
                payment_method: req.payment_method,
            },
            payment: req.payment.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    #[schema(value_type = String, example = "16:00:00")]
    pub start_time: NaiveTime,
    #[validate(range(max = 24, message = "hours must be at most 24"))]
    pub duration_hours: u32,
    #[validate(range(max = 59, message = "minutes must be below 60"))]
    pub duration_minutes: u32,
    /// Version last read by the client; stale versions are rejected with 409
    pub expected_version: Option<i32>,
}

impl TryFrom<RescheduleRequest> for Reschedule {
    type Error = DomainError;

    fn try_from(req: RescheduleRequest) -> Result<Self, Self::Error> {
        Ok(Reschedule {
            date: req.date,
            start_time: req.start_time,
            duration: ChargeDuration::new(req.duration_hours, req.duration_minutes)?,
            expected_version: req.expected_version,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    #[validate(range(min = 1, max = 1440, message = "actual duration must be 1-1440 minutes"))]
    pub actual_duration_minutes: u32,
    #[schema(value_type = String, example = "38.4")]
    pub energy_delivered_kwh: Decimal,
    #[schema(value_type = Option<String>)]
    pub actual_cost: Option<Decimal>,
}

impl From<CompleteRequest> for Completion {
    fn from(req: CompleteRequest) -> Self {
        Completion {
            actual_duration_minutes: req.actual_duration_minutes,
            energy_delivered_kwh: req.energy_delivered_kwh,
            actual_cost: req.actual_cost,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct BookingSortParams {
    /// `date-desc` (default), `date-asc`, `cost-desc`, `cost-asc`, `station-name`
    #[param(value_type = Option<String>)]
    pub sort: Option<BookingSort>,
}
