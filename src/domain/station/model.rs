//! Station and slot records

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::geo::{round_km, Coordinate};

/// Operational status of a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Available,
    Occupied,
    Reserved,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical station record produced by the catalog adapter.
///
/// Connector lists, price estimates and amenity tags may be heuristic
/// (keyword matching over free text) when the directory does not supply
/// structured values. Treat them as best-effort hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub address: String,
    pub image: String,
    pub location: Option<Coordinate>,
    /// Kilometres from the caller's center, one decimal; `None` without coordinates
    pub distance_km: Option<f64>,
    #[schema(value_type = String, example = "0.30")]
    pub price_per_kwh: Decimal,
    #[schema(value_type = String, example = "150")]
    pub max_power_kw: Decimal,
    pub total_slots: u32,
    pub available_slots: u32,
    pub status: StationStatus,
    pub connectors: Vec<String>,
    pub rating: f64,
    pub amenities: Vec<String>,
    pub operator: Option<String>,
    pub usage_type: Option<String>,
}

impl Station {
    /// Recompute `distance_km` from `center`.
    pub fn with_distance_from(mut self, center: &Coordinate) -> Self {
        self.distance_km = self.location.map(|loc| round_km(center.distance_km(&loc)));
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == StationStatus::Available
    }
}

/// One chargeable connector within a station
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Slot {
    pub id: String,
    pub station_id: String,
    pub connector_type: String,
    #[schema(value_type = String)]
    pub power_kw: Decimal,
    #[schema(value_type = String)]
    pub price_per_kwh: Decimal,
    pub available: bool,
}

/// Build the slot list from a station's aggregate counts.
///
/// There is no per-slot feed, so slots are placeholders: at least two are
/// produced, connector types cycle through the station's list and the first
/// `available_slots` of them are marked available.
pub fn synthesize_slots(station: &Station) -> Vec<Slot> {
    let count = station.total_slots.max(2) as usize;
    (0..count)
        .map(|idx| Slot {
            id: format!("S-{}-{}", station.id, idx + 1),
            station_id: station.id.clone(),
            connector_type: station
                .connectors
                .get(idx % station.connectors.len().max(1))
                .cloned()
                .unwrap_or_else(|| "CCS".to_string()),
            power_kw: station.max_power_kw,
            price_per_kwh: station.price_per_kwh,
            available: idx < station.available_slots as usize,
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal_macros::dec;

    use super::*;

    pub fn station(id: &str, status: StationStatus) -> Station {
        Station {
            id: id.to_string(),
            name: format!("Station {id}"),
            address: "Anna Salai, Chennai".to_string(),
            image: "/assets/images/ev_station.svg".to_string(),
            location: Some(Coordinate::new(13.0623, 80.2492)),
            distance_km: Some(1.0),
            price_per_kwh: dec!(0.30),
            max_power_kw: dec!(150),
            total_slots: 4,
            available_slots: 2,
            status,
            connectors: vec!["CCS".to_string(), "Type2".to_string()],
            rating: 4.0,
            amenities: vec!["parking".to_string()],
            operator: None,
            usage_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::station;
    use super::*;

    #[test]
    fn distance_from_same_point_is_zero() {
        let mut s = station("1", StationStatus::Available);
        s.location = Some(Coordinate::new(13.0827, 80.2707));
        let s = s.with_distance_from(&Coordinate::new(13.0827, 80.2707));
        assert_eq!(s.distance_km, Some(0.0));
    }

    #[test]
    fn no_location_means_no_distance() {
        let mut s = station("1", StationStatus::Available);
        s.location = None;
        let s = s.with_distance_from(&Coordinate::new(13.0827, 80.2707));
        assert_eq!(s.distance_km, None);
    }

    #[test]
    fn slots_cycle_connectors_and_mark_first_available() {
        let s = station("7", StationStatus::Available);
        let slots = synthesize_slots(&s);
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0].id, "S-7-1");
        assert_eq!(slots[0].connector_type, "CCS");
        assert_eq!(slots[1].connector_type, "Type2");
        assert_eq!(slots[2].connector_type, "CCS");
        assert_eq!(
            slots.iter().filter(|s| s.available).count(),
            2,
            "first two slots available"
        );
        assert!(slots[0].available && slots[1].available && !slots[2].available);
    }

    #[test]
    fn at_least_two_slots() {
        let mut s = station("9", StationStatus::Occupied);
        s.total_slots = 1;
        s.available_slots = 0;
        s.connectors.clear();
        let slots = synthesize_slots(&s);
        assert_eq!(slots.len(), 2);
        assert!(slots.iter().all(|s| s.connector_type == "CCS" && !s.available));
    }
}
