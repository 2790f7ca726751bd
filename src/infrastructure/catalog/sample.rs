//! Bundled Chennai stations served when the live directory is empty

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::geo::Coordinate;
use crate::domain::station::{Station, StationStatus};

struct Seed {
    id: &'static str,
    name: &'static str,
    address: &'static str,
    lat: f64,
    lng: f64,
    price: Decimal,
    power: Decimal,
    total: u32,
    available: u32,
    status: StationStatus,
    connectors: &'static [&'static str],
    rating: f64,
    amenities: &'static [&'static str],
    image: &'static str,
}

const SEEDS: &[Seed] = &[
    Seed {
        id: "1",
        name: "Tesla Supercharger - Anna Salai",
        address: "Anna Salai, Chennai, TN",
        lat: 13.0623,
        lng: 80.2492,
        price: dec!(0.28),
        power: dec!(250),
        total: 8,
        available: 3,
        status: StationStatus::Available,
        connectors: &["Tesla", "CCS"],
        rating: 4.8,
        amenities: &["parking", "restroom", "food", "wifi"],
        image: "https://images.unsplash.com/photo-1593941707882-a5bac6861d75?w=400",
    },
    Seed {
        id: "2",
        name: "ChargePoint Station - T. Nagar",
        address: "Ranganathan St, T. Nagar, Chennai",
        lat: 13.0416,
        lng: 80.2376,
        price: dec!(0.32),
        power: dec!(150),
        total: 6,
        available: 0,
        status: StationStatus::Occupied,
        connectors: &["CCS", "CHAdeMO", "Type2"],
        rating: 4.5,
        amenities: &["parking", "shopping", "wifi"],
        image: "https://images.unsplash.com/photo-1617788138017-80ad40651399?w=400",
    },
    Seed {
        id: "3",
        name: "EVgo Fast Charging - Marina",
        address: "Marina Beach Rd, Chennai",
        lat: 13.0480,
        lng: 80.2820,
        price: dec!(0.35),
        power: dec!(100),
        total: 4,
        available: 2,
        status: StationStatus::Available,
        connectors: &["CCS", "CHAdeMO"],
        rating: 4.2,
        amenities: &["parking", "food", "restroom", "24hours"],
        image: "https://images.unsplash.com/photo-1647500666254-3e8ed1d4e3b0?w=400",
    },
    Seed {
        id: "4",
        name: "Electrify - Velachery",
        address: "Velachery Main Rd, Chennai",
        lat: 13.0166,
        lng: 80.2250,
        price: dec!(0.31),
        power: dec!(350),
        total: 10,
        available: 1,
        status: StationStatus::Reserved,
        connectors: &["CCS", "CHAdeMO"],
        rating: 4.6,
        amenities: &["parking", "restroom", "wifi", "24hours"],
        image: "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=400",
    },
    Seed {
        id: "5",
        name: "Shell Recharge - Guindy",
        address: "Guindy Industrial Estate, Chennai",
        lat: 13.0233,
        lng: 80.2210,
        price: dec!(0.29),
        power: dec!(175),
        total: 6,
        available: 4,
        status: StationStatus::Available,
        connectors: &["CCS", "Type2"],
        rating: 4.4,
        amenities: &["parking", "food", "wifi"],
        image: "https://images.unsplash.com/photo-1593941707874-ef25b8b4a92b?w=400",
    },
    Seed {
        id: "6",
        name: "Blink Charging - Mylapore",
        address: "Mylapore High Rd, Chennai",
        lat: 13.0340,
        lng: 80.2730,
        price: dec!(0.33),
        power: dec!(50),
        total: 4,
        available: 2,
        status: StationStatus::Available,
        connectors: &["Type1", "Type2"],
        rating: 4.0,
        amenities: &["parking", "food"],
        image: "https://images.unsplash.com/photo-1609592806596-4d8b5b1c0e0e?w=400",
    },
];

/// Sample catalog with distances left unset.
pub fn sample_stations() -> Vec<Station> {
    SEEDS
        .iter()
        .map(|s| Station {
            id: s.id.to_string(),
            name: s.name.to_string(),
            address: s.address.to_string(),
            image: s.image.to_string(),
            location: Some(Coordinate::new(s.lat, s.lng)),
            distance_km: None,
            price_per_kwh: s.price,
            max_power_kw: s.power,
            total_slots: s.total,
            available_slots: s.available,
            status: s.status,
            connectors: s.connectors.iter().map(|c| c.to_string()).collect(),
            rating: s.rating,
            amenities: s.amenities.iter().map(|a| a.to_string()).collect(),
            operator: s.name.split(" - ").next().map(str::to_string),
            usage_type: Some("Public".to_string()),
        })
        .collect()
}
