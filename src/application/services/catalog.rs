//! Station catalog service
//!
//! Wraps a [`StationDirectory`] and substitutes the bundled sample catalog
//! when a nearby search comes back empty.

use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;
use utoipa::ToSchema;

use crate::application::filters::{filter_stations, StationFilter, StationSort};
use crate::config::CatalogConfig;
use crate::domain::geo::Coordinate;
use crate::domain::station::{
    synthesize_slots, BoundingBox, NearbyQuery, Slot, Station, StationDirectory,
};
use crate::domain::{DomainError, DomainResult};

/// Where a station list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Directory,
    Sample,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationList {
    pub center: Coordinate,
    pub source: CatalogSource,
    pub stations: Vec<Station>,
}

/// Nearby search parameters; unset fields take the configured defaults
#[derive(Debug, Clone, Copy, Default)]
pub struct NearbySearch {
    pub center: Option<Coordinate>,
    pub radius_km: Option<f64>,
    pub max_results: Option<u32>,
}

pub struct CatalogService {
    directory: Arc<dyn StationDirectory>,
    sample: Vec<Station>,
    config: CatalogConfig,
}

impl CatalogService {
    /// `sample` is served when the directory has nothing and
    /// `use_sample_fallback` is on.
    pub fn new(directory: Arc<dyn StationDirectory>, sample: Vec<Station>, config: CatalogConfig) -> Self {
        Self {
            directory,
            sample,
            config,
        }
    }

    fn sample_around(&self, center: &Coordinate) -> Vec<Station> {
        self.sample
            .iter()
            .cloned()
            .map(|s| s.with_distance_from(center))
            .collect()
    }

    /// Stations around a point, falling back to the sample catalog
    pub async fn nearby(&self, search: NearbySearch) -> StationList {
        let center = search.center.unwrap_or(self.config.fallback_center);
        let query = NearbyQuery {
            center,
            radius_km: search.radius_km.unwrap_or(self.config.default_radius_km),
            max_results: search.max_results.unwrap_or(self.config.default_max_results),
        };

        let stations = self.directory.near(&query).await;
        if !stations.is_empty() || !self.config.use_sample_fallback {
            debug!("Directory returned {} stations", stations.len());
            return StationList {
                center,
                source: CatalogSource::Directory,
                stations,
            };
        }

        metrics::counter!("catalog_fallback_total").increment(1);
        info!(
            "Directory returned no stations near ({}, {}), serving sample catalog",
            center.lat, center.lng
        );
        StationList {
            center,
            source: CatalogSource::Sample,
            stations: self.sample_around(&center),
        }
    }

    /// Nearby search followed by filters and an optional sort
    pub async fn search(
        &self,
        search: NearbySearch,
        filter: &StationFilter,
        sort: Option<StationSort>,
    ) -> StationList {
        let mut list = self.nearby(search).await;
        list.stations = filter_stations(&list.stations, filter, sort);
        list
    }

    pub async fn in_bounding_box(&self, bbox: &BoundingBox, max_results: Option<u32>) -> DomainResult<Vec<Station>> {
        if bbox.north < bbox.south {
            return Err(DomainError::Validation(
                "north must not be below south".into(),
            ));
        }
        Ok(self
            .directory
            .in_bounding_box(bbox, max_results.unwrap_or(self.config.default_max_results))
            .await)
    }

    pub async fn by_country(&self, country_code: &str, max_results: Option<u32>) -> DomainResult<Vec<Station>> {
        let code = country_code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DomainError::Validation(format!(
                "country code must be two letters, got '{}'",
                country_code
            )));
        }
        Ok(self
            .directory
            .by_country(code, max_results.unwrap_or(self.config.default_max_results))
            .await)
    }

    /// Station by id; sample stations are found when the directory has no match
    pub async fn station(&self, id: &str, center: Option<Coordinate>) -> DomainResult<Station> {
        let found = match self.directory.by_id(id).await {
            Some(station) => Some(station),
            None if self.config.use_sample_fallback => {
                self.sample.iter().find(|s| s.id == id).cloned()
            }
            None => None,
        };
        let station = found.ok_or_else(|| DomainError::not_found("Station", "id", id))?;
        Ok(match center {
            Some(center) => station.with_distance_from(&center),
            None => station,
        })
    }

    pub async fn slots(&self, station_id: &str) -> DomainResult<Vec<Slot>> {
        let station = self.station(station_id, None).await?;
        Ok(synthesize_slots(&station))
    }
}
