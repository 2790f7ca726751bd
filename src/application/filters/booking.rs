//! Booking history filters and sorts

use std::cmp::Ordering;

use chrono::{Duration, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::{contains_ci, search_term};
use crate::domain::booking::{Booking, BookingStatus};

/// Relative date windows, anchored on the start of "today"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    Today,
    Week,
    Month,
    Quarter,
    Year,
    /// Explicit `startDate..=endDate`
    Custom,
}

impl DateWindow {
    /// First date inside the window; open-ended towards the future.
    /// `None` for `Custom`.
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Today => Some(today),
            Self::Week => Some(today - Duration::days(7)),
            Self::Month => today.checked_sub_months(Months::new(1)),
            Self::Quarter => today.checked_sub_months(Months::new(3)),
            Self::Year => today.checked_sub_months(Months::new(12)),
            Self::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum BookingSort {
    #[default]
    DateDesc,
    DateAsc,
    CostDesc,
    CostAsc,
    StationName,
}

/// Optional booking filters, all AND-combined
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    /// Case-insensitive match on station name, address or booking id
    pub search: Option<String>,
    pub status: Option<BookingStatus>,
    /// Compared after lowercasing and replacing whitespace with `-`
    pub payment_method: Option<String>,
    pub date_range: Option<DateWindow>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[param(value_type = Option<String>)]
    pub min_cost: Option<Decimal>,
    #[param(value_type = Option<String>)]
    pub max_cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookingPredicate {
    Search(String),
    Status(BookingStatus),
    PaymentMethod(String),
    OnOrAfter(NaiveDate),
    Between(NaiveDate, NaiveDate),
    MinCost(Decimal),
    MaxCost(Decimal),
}

/// `"Credit Card"` → `"credit-card"`
pub fn normalize_payment_method(raw: &str) -> String {
    raw.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

impl BookingPredicate {
    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            Self::Search(term) => {
                contains_ci(&booking.station.name, term)
                    || contains_ci(&booking.station.address, term)
                    || contains_ci(&booking.id, term)
            }
            Self::Status(status) => booking.status == *status,
            Self::PaymentMethod(method) => {
                normalize_payment_method(&booking.payment_method) == *method
            }
            Self::OnOrAfter(from) => booking.schedule.date >= *from,
            Self::Between(from, to) => {
                booking.schedule.date >= *from && booking.schedule.date <= *to
            }
            Self::MinCost(min) => booking.pricing.total >= *min,
            Self::MaxCost(max) => booking.pricing.total <= *max,
        }
    }
}

impl BookingFilter {
    pub fn predicates(&self, today: NaiveDate) -> Vec<BookingPredicate> {
        let mut out = Vec::new();
        if let Some(term) = search_term(self.search.as_deref()) {
            out.push(BookingPredicate::Search(term));
        }
        if let Some(status) = self.status {
            out.push(BookingPredicate::Status(status));
        }
        if let Some(method) = self.payment_method.as_deref().filter(|m| !m.trim().is_empty()) {
            out.push(BookingPredicate::PaymentMethod(normalize_payment_method(method)));
        }
        match self.date_range {
            Some(DateWindow::Custom) => {
                // Both ends required, otherwise the window is ignored
                if let (Some(from), Some(to)) = (self.start_date, self.end_date) {
                    out.push(BookingPredicate::Between(from, to));
                }
            }
            Some(window) => {
                if let Some(from) = window.start(today) {
                    out.push(BookingPredicate::OnOrAfter(from));
                }
            }
            None => {}
        }
        if let Some(min) = self.min_cost {
            out.push(BookingPredicate::MinCost(min));
        }
        if let Some(max) = self.max_cost {
            out.push(BookingPredicate::MaxCost(max));
        }
        out
    }
}

fn compare(sort: BookingSort, a: &Booking, b: &Booking) -> Ordering {
    match sort {
        BookingSort::DateDesc => b.schedule.start_time.cmp(&a.schedule.start_time),
        BookingSort::DateAsc => a.schedule.start_time.cmp(&b.schedule.start_time),
        BookingSort::CostDesc => b.pricing.total.cmp(&a.pricing.total),
        BookingSort::CostAsc => a.pricing.total.cmp(&b.pricing.total),
        BookingSort::StationName => a
            .station
            .name
            .to_lowercase()
            .cmp(&b.station.name.to_lowercase()),
    }
}

pub fn apply(bookings: &[Booking], predicates: &[BookingPredicate], sort: BookingSort) -> Vec<Booking> {
    let mut out: Vec<Booking> = bookings
        .iter()
        .filter(|b| predicates.iter().all(|p| p.matches(b)))
        .cloned()
        .collect();
    out.sort_by(|a, b| compare(sort, a, b));
    out
}

/// Filter and sort a booking list. `today` anchors the relative windows.
pub fn filter_bookings(
    bookings: &[Booking],
    filter: &BookingFilter,
    sort: BookingSort,
    today: NaiveDate,
) -> Vec<Booking> {
    apply(bookings, &filter.predicates(today), sort)
}
