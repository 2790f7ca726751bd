//! Open Charge Map client
//!
//! Talks to `GET {base_url}/poi/` and normalizes each point of interest
//! into one canonical [`Station`]. Every lookup degrades to an empty
//! result when no API key is configured or the request fails.

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::domain::geo::Coordinate;
use crate::domain::station::{BoundingBox, NearbyQuery, Station, StationDirectory, StationStatus};
use crate::shared::errors::InfraError;

pub const USER_AGENT: &str = "TakeCharge/1.0";
pub const DEFAULT_IMAGE: &str = "/assets/images/ev_station.svg";
const DEFAULT_MAX_POWER_KW: Decimal = dec!(50);
const DEFAULT_RATING: f64 = 4.0;

// ── Wire format ────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Poi {
    #[serde(rename = "ID")]
    pub id: i64,
    pub address_info: Option<AddressInfo>,
    pub connections: Vec<Connection>,
    pub usage_type: Option<UsageType>,
    pub operator_info: Option<OperatorInfo>,
    pub general_comments: Option<String>,
    pub media_items: Vec<MediaItem>,
    pub user_comments: Vec<UserComment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AddressInfo {
    pub title: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub town: Option<String>,
    pub state_or_province: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<Country>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Country {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Connection {
    pub connection_type: Option<ConnectionType>,
    #[serde(rename = "PowerKW")]
    pub power_kw: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ConnectionType {
    pub title: Option<String>,
    pub formal_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UsageType {
    #[serde(rename = "ID")]
    pub id: Option<i64>,
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct OperatorInfo {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MediaItem {
    #[serde(rename = "ItemURL")]
    pub item_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserComment {
    pub rating: Option<f64>,
}

// ── Normalization ──────────────────────────────────────────────────

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Amenity tags from keyword matching over free-text comments
pub fn amenities_from_comments(comments: &str) -> Vec<String> {
    const RULES: &[(&str, &[&str])] = &[
        ("parking", &["parking", "park"]),
        ("restroom", &["restroom", "toilet", "bathroom"]),
        ("food", &["food", "restaurant", "cafe"]),
        ("wifi", &["wifi", "wi-fi"]),
        ("24hours", &["24"]),
        ("shopping", &["shop", "shopping"]),
    ];
    let lower = comments.to_lowercase();
    let tags: Vec<String> = RULES
        .iter()
        .filter(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(tag, _)| tag.to_string())
        .collect();
    if tags.is_empty() {
        vec!["parking".to_string()]
    } else {
        tags
    }
}

fn status_for_usage(usage_type_id: Option<i64>) -> StationStatus {
    match usage_type_id {
        // private or restricted access
        Some(1) | Some(2) => StationStatus::Reserved,
        Some(3) => StationStatus::Occupied,
        _ => StationStatus::Available,
    }
}

/// Map one POI onto the canonical station shape.
///
/// `center`, when given, fills `distance_km`.
pub fn normalize(poi: Poi, center: Option<&Coordinate>) -> Station {
    let address = poi.address_info.unwrap_or_default();

    let mut connectors: Vec<String> = Vec::new();
    for conn in &poi.connections {
        let label = conn
            .connection_type
            .as_ref()
            .and_then(|t| non_empty(&t.title).or(non_empty(&t.formal_name)))
            .unwrap_or("Unknown")
            .to_string();
        if !connectors.contains(&label) {
            connectors.push(label);
        }
    }
    if connectors.is_empty() {
        connectors.push("Type2".to_string());
    }

    let raw_max_kw = poi
        .connections
        .iter()
        .filter_map(|c| c.power_kw)
        .fold(0.0_f64, f64::max);
    let price_per_kwh = if raw_max_kw > 50.0 { dec!(0.30) } else { dec!(0.25) };
    let max_power_kw = Decimal::from_f64(raw_max_kw)
        .filter(|kw| *kw > Decimal::ZERO)
        .unwrap_or(DEFAULT_MAX_POWER_KW);

    let status = status_for_usage(poi.usage_type.as_ref().and_then(|u| u.id));
    let total_slots = poi.connections.len().max(1) as u32;
    // No real-time feed: an available station is assumed entirely free
    let available_slots = if status == StationStatus::Available {
        total_slots
    } else {
        0
    };

    let operator = poi
        .operator_info
        .as_ref()
        .and_then(|o| non_empty(&o.title))
        .unwrap_or("Unknown Operator")
        .to_string();

    let name = non_empty(&address.title)
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "{} - {}",
                operator,
                non_empty(&address.address_line1).unwrap_or("Charging Station")
            )
        });

    let country = address.country.as_ref().and_then(|c| non_empty(&c.title));
    let parts: Vec<&str> = [
        non_empty(&address.address_line1),
        non_empty(&address.address_line2),
        non_empty(&address.town),
        non_empty(&address.state_or_province),
        non_empty(&address.postcode),
        country,
    ]
    .into_iter()
    .flatten()
    .collect();
    let full_address = if parts.is_empty() {
        "Address not available".to_string()
    } else {
        parts.join(", ")
    };

    let rating = if poi.user_comments.is_empty() {
        DEFAULT_RATING
    } else {
        let sum: f64 = poi.user_comments.iter().map(|c| c.rating.unwrap_or(0.0)).sum();
        let mean = sum / poi.user_comments.len() as f64;
        if mean > 0.0 {
            mean
        } else {
            DEFAULT_RATING
        }
    };

    let location = match (address.latitude, address.longitude) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        _ => None,
    };

    let station = Station {
        id: poi.id.to_string(),
        name,
        address: full_address,
        image: poi
            .media_items
            .first()
            .and_then(|m| non_empty(&m.item_url))
            .unwrap_or(DEFAULT_IMAGE)
            .to_string(),
        location,
        distance_km: None,
        price_per_kwh,
        max_power_kw,
        total_slots,
        available_slots,
        status,
        connectors,
        rating,
        amenities: amenities_from_comments(poi.general_comments.as_deref().unwrap_or_default()),
        operator: Some(operator),
        usage_type: Some(
            poi.usage_type
                .as_ref()
                .and_then(|u| non_empty(&u.title))
                .unwrap_or("Public")
                .to_string(),
        ),
    };

    match center {
        Some(center) => station.with_distance_from(center),
        None => station,
    }
}

// ── Client ─────────────────────────────────────────────────────────

pub struct OpenChargeMapClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenChargeMapClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, InfraError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
        })
    }

    async fn fetch(&self, key: &str, params: &[(&str, String)]) -> Result<Vec<Poi>, InfraError> {
        let response = self
            .http
            .get(format!("{}/poi/", self.base_url))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("output", "json"), ("key", key)])
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Vec<Poi>>().await?)
    }

    async fn lookup(&self, params: &[(&str, String)], center: Option<&Coordinate>) -> Vec<Station> {
        let Some(key) = self.api_key.as_deref() else {
            debug!("Open Charge Map API key not configured, returning no stations");
            return Vec::new();
        };
        match self.fetch(key, params).await {
            Ok(pois) => {
                debug!(count = pois.len(), "Fetched stations from Open Charge Map");
                pois.into_iter().map(|p| normalize(p, center)).collect()
            }
            Err(e) => {
                warn!(error = %e, "Open Charge Map lookup failed, returning no stations");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl StationDirectory for OpenChargeMapClient {
    async fn near(&self, query: &NearbyQuery) -> Vec<Station> {
        let params = [
            ("latitude", query.center.lat.to_string()),
            ("longitude", query.center.lng.to_string()),
            ("distance", query.radius_km.to_string()),
            ("distanceunit", "km".to_string()),
            ("maxresults", query.max_results.to_string()),
        ];
        self.lookup(&params, Some(&query.center)).await
    }

    async fn in_bounding_box(&self, bbox: &BoundingBox, max_results: u32) -> Vec<Station> {
        let params = [
            (
                "boundingbox",
                format!("({},{}),({},{})", bbox.south, bbox.west, bbox.north, bbox.east),
            ),
            ("maxresults", max_results.to_string()),
        ];
        self.lookup(&params, None).await
    }

    async fn by_country(&self, country_code: &str, max_results: u32) -> Vec<Station> {
        let params = [
            ("countrycode", country_code.to_uppercase()),
            ("maxresults", max_results.to_string()),
        ];
        self.lookup(&params, None).await
    }

    async fn by_id(&self, id: &str) -> Option<Station> {
        let params = [("poiid", id.to_string())];
        self.lookup(&params, None).await.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(json: serde_json::Value) -> Poi {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn full_record_is_normalized() {
        let station = normalize(
            poi(serde_json::json!({
                "ID": 101,
                "AddressInfo": {
                    "Title": "Express Avenue Mall",
                    "AddressLine1": "49 Whites Rd",
                    "Town": "Chennai",
                    "Postcode": "600002",
                    "Country": { "Title": "India" },
                    "Latitude": 13.0588,
                    "Longitude": 80.2641
                },
                "Connections": [
                    { "ConnectionType": { "Title": "CCS (Type 2)" }, "PowerKW": 60.0 },
                    { "ConnectionType": { "FormalName": "IEC 62196-2 Type 2" }, "PowerKW": 22.0 },
                    { "ConnectionType": { "Title": "CCS (Type 2)" }, "PowerKW": 60.0 }
                ],
                "UsageType": { "ID": 4, "Title": "Public - Membership Required" },
                "OperatorInfo": { "Title": "Tata Power" },
                "GeneralComments": "Basement parking, food court and free WiFi. Open 24/7",
                "MediaItems": [{ "ItemURL": "https://img.example/ea.jpg" }],
                "UserComments": [{ "Rating": 5 }, { "Rating": 4 }]
            })),
            Some(&Coordinate::new(13.0588, 80.2641)),
        );

        assert_eq!(station.id, "101");
        assert_eq!(station.name, "Express Avenue Mall");
        assert_eq!(station.address, "49 Whites Rd, Chennai, 600002, India");
        assert_eq!(station.connectors, vec!["CCS (Type 2)", "IEC 62196-2 Type 2"]);
        assert_eq!(station.max_power_kw, dec!(60));
        assert_eq!(station.price_per_kwh, dec!(0.30));
        assert_eq!(station.status, StationStatus::Available);
        assert_eq!(station.total_slots, 3);
        assert_eq!(station.available_slots, 3);
        assert_eq!(station.rating, 4.5);
        assert_eq!(station.amenities, vec!["parking", "food", "wifi", "24hours"]);
        assert_eq!(station.image, "https://img.example/ea.jpg");
        assert_eq!(station.operator.as_deref(), Some("Tata Power"));
        assert_eq!(station.distance_km, Some(0.0));
    }

    #[test]
    fn sparse_record_gets_defaults() {
        let station = normalize(
            poi(serde_json::json!({
                "ID": 7,
                "AddressInfo": { "AddressLine1": "OMR Service Rd" },
                "UsageType": { "ID": 2 }
            })),
            Some(&Coordinate::new(13.0, 80.0)),
        );

        assert_eq!(station.name, "Unknown Operator - OMR Service Rd");
        assert_eq!(station.address, "OMR Service Rd");
        assert_eq!(station.connectors, vec!["Type2"]);
        assert_eq!(station.max_power_kw, dec!(50));
        assert_eq!(station.price_per_kwh, dec!(0.25));
        assert_eq!(station.status, StationStatus::Reserved);
        assert_eq!(station.total_slots, 1);
        assert_eq!(station.available_slots, 0);
        assert_eq!(station.rating, 4.0);
        assert_eq!(station.amenities, vec!["parking"]);
        assert_eq!(station.image, DEFAULT_IMAGE);
        assert_eq!(station.usage_type.as_deref(), Some("Public"));
        assert_eq!(station.location, None);
        assert_eq!(station.distance_km, None);
    }

    #[test]
    fn empty_address_falls_back() {
        let station = normalize(poi(serde_json::json!({ "ID": 1 })), None);
        assert_eq!(station.address, "Address not available");
        assert_eq!(station.name, "Unknown Operator - Charging Station");
    }

    #[test]
    fn usage_type_three_is_occupied() {
        assert_eq!(status_for_usage(Some(3)), StationStatus::Occupied);
        assert_eq!(status_for_usage(Some(1)), StationStatus::Reserved);
        assert_eq!(status_for_usage(None), StationStatus::Available);
    }

    #[test]
    fn amenity_keywords() {
        assert_eq!(
            amenities_from_comments("Restroom inside, near the shopping arcade"),
            vec!["restroom", "shopping"]
        );
        assert_eq!(amenities_from_comments(""), vec!["parking"]);
    }

    #[tokio::test]
    async fn no_key_returns_empty_without_calling_out() {
        let client = OpenChargeMapClient::new(&CatalogConfig {
            api_key: None,
            base_url: "http://127.0.0.1:9".into(),
            ..CatalogConfig::default()
        })
        .unwrap();
        let query = NearbyQuery {
            center: Coordinate::new(13.0827, 80.2707),
            radius_km: 10.0,
            max_results: 50,
        };
        assert!(client.near(&query).await.is_empty());
        assert!(client.by_id("1").await.is_none());
    }
}
