//! Outbound port to the charging-station directory

use async_trait::async_trait;
use serde::Deserialize;
use utoipa::IntoParams;

use super::model::Station;
use crate::domain::geo::Coordinate;

/// Search around a point
#[derive(Debug, Clone)]
pub struct NearbyQuery {
    pub center: Coordinate,
    pub radius_km: f64,
    pub max_results: u32,
}

/// Search inside a lat/lng rectangle
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Station directory lookups.
///
/// Implementations degrade gracefully: an unconfigured or unreachable
/// directory yields an empty list (or `None`), never an error, so callers
/// can substitute fallback data without special-casing failures.
#[async_trait]
pub trait StationDirectory: Send + Sync {
    async fn near(&self, query: &NearbyQuery) -> Vec<Station>;

    async fn in_bounding_box(&self, bbox: &BoundingBox, max_results: u32) -> Vec<Station>;

    async fn by_country(&self, country_code: &str, max_results: u32) -> Vec<Station>;

    async fn by_id(&self, id: &str) -> Option<Station>;
}
