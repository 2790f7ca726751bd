//! Station query parameters

use serde::Deserialize;
use utoipa::IntoParams;

use crate::application::filters::StationSort;
use crate::application::services::NearbySearch;
use crate::domain::{Coordinate, DomainError};

/// Optional caller position; both halves or neither
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(default)]
#[into_params(parameter_in = Query)]
pub struct LocationParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationParams {
    pub fn center(&self) -> Result<Option<Coordinate>, DomainError> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
                    return Err(DomainError::Validation(format!(
                        "coordinates out of range: {}, {}",
                        lat, lng
                    )));
                }
                Ok(Some(Coordinate::new(lat, lng)))
            }
            (None, None) => Ok(None),
            _ => Err(DomainError::Validation(
                "lat and lng must be given together".into(),
            )),
        }
    }
}

/// Nearby search around `lat`/`lng` (configured center when omitted)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct NearbyParams {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius_km: Option<f64>,
    pub max_results: Option<u32>,
    #[param(value_type = Option<String>, example = "distance")]
    pub sort: Option<StationSort>,
}

impl NearbyParams {
    pub fn to_search(&self) -> Result<NearbySearch, DomainError> {
        if self.radius_km.is_some_and(|r| r.is_nan() || r <= 0.0) {
            return Err(DomainError::Validation("radiusKm must be positive".into()));
        }
        let center = LocationParams {
            lat: self.lat,
            lng: self.lng,
        }
        .center()?;
        Ok(NearbySearch {
            center,
            radius_km: self.radius_km,
            max_results: self.max_results,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(default, rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LimitParams {
    pub max_results: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_a_coordinate_is_rejected() {
        let params = LocationParams {
            lat: Some(13.0),
            lng: None,
        };
        assert!(matches!(params.center(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn nearby_params_build_search() {
        let params = NearbyParams {
            lat: Some(13.05),
            lng: Some(80.25),
            radius_km: Some(5.0),
            max_results: Some(10),
            sort: None,
        };
        let search = params.to_search().unwrap();
        assert_eq!(search.center, Some(Coordinate::new(13.05, 80.25)));
        assert_eq!(search.radius_km, Some(5.0));

        let bad = NearbyParams {
            radius_km: Some(0.0),
            ..NearbyParams::default()
        };
        assert!(bad.to_search().is_err());
    }
}
