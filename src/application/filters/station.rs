//! Station list filters and sorts

use std::cmp::Ordering;

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use super::{contains_ci, search_term};
use crate::domain::station::{Station, StationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StationSort {
    /// Nearest first; stations without a distance go last
    Distance,
    /// Cheapest first
    Price,
    /// Most free slots first
    Availability,
    /// Best rated first
    Rating,
}

/// Optional station filters, all AND-combined
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct StationFilter {
    /// Case-insensitive match on name or address
    pub search: Option<String>,
    /// Station must offer this connector type
    pub connector_type: Option<String>,
    /// Minimum charging speed (kW)
    #[param(value_type = Option<String>)]
    pub min_power_kw: Option<Decimal>,
    /// Maximum price per kWh
    #[param(value_type = Option<String>)]
    pub max_price: Option<Decimal>,
    pub max_distance_km: Option<f64>,
    pub available_only: bool,
}

/// One station predicate
#[derive(Debug, Clone, PartialEq)]
pub enum StationPredicate {
    Search(String),
    Connector(String),
    MinPower(Decimal),
    MaxPrice(Decimal),
    MaxDistance(f64),
    AvailableOnly,
}

impl StationPredicate {
    pub fn matches(&self, station: &Station) -> bool {
        match self {
            Self::Search(term) => {
                contains_ci(&station.name, term) || contains_ci(&station.address, term)
            }
            Self::Connector(kind) => station
                .connectors
                .iter()
                .any(|c| c.eq_ignore_ascii_case(kind)),
            Self::MinPower(kw) => station.max_power_kw >= *kw,
            Self::MaxPrice(rate) => station.price_per_kwh <= *rate,
            // Unknown distance cannot be shown to be within range
            Self::MaxDistance(km) => station.distance_km.is_some_and(|d| d <= *km),
            Self::AvailableOnly => station.status == StationStatus::Available,
        }
    }
}

impl StationFilter {
    pub fn predicates(&self) -> Vec<StationPredicate> {
        let mut out = Vec::new();
        if let Some(term) = search_term(self.search.as_deref()) {
            out.push(StationPredicate::Search(term));
        }
        if let Some(kind) = self.connector_type.as_deref().filter(|k| !k.trim().is_empty()) {
            out.push(StationPredicate::Connector(kind.trim().to_string()));
        }
        if let Some(kw) = self.min_power_kw {
            out.push(StationPredicate::MinPower(kw));
        }
        if let Some(rate) = self.max_price {
            out.push(StationPredicate::MaxPrice(rate));
        }
        if let Some(km) = self.max_distance_km {
            out.push(StationPredicate::MaxDistance(km));
        }
        if self.available_only {
            out.push(StationPredicate::AvailableOnly);
        }
        out
    }
}

fn compare(sort: StationSort, a: &Station, b: &Station) -> Ordering {
    match sort {
        StationSort::Distance => match (a.distance_km, b.distance_km) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        StationSort::Price => a.price_per_kwh.cmp(&b.price_per_kwh),
        StationSort::Availability => b.available_slots.cmp(&a.available_slots),
        StationSort::Rating => b.rating.total_cmp(&a.rating),
    }
}

/// Apply predicates in the given order, then an optional stable sort.
pub fn apply(
    stations: &[Station],
    predicates: &[StationPredicate],
    sort: Option<StationSort>,
) -> Vec<Station> {
    let mut out: Vec<Station> = stations
        .iter()
        .filter(|s| predicates.iter().all(|p| p.matches(s)))
        .cloned()
        .collect();
    if let Some(sort) = sort {
        out.sort_by(|a, b| compare(sort, a, b));
    }
    out
}

pub fn filter_stations(
    stations: &[Station],
    filter: &StationFilter,
    sort: Option<StationSort>,
) -> Vec<Station> {
    apply(stations, &filter.predicates(), sort)
}
