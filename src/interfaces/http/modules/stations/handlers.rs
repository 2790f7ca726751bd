//! Station catalog REST handlers (public)

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use super::dto::{LimitParams, LocationParams, NearbyParams};
use crate::application::filters::StationFilter;
use crate::application::services::{CatalogService, StationList};
use crate::domain::station::BoundingBox;
use crate::domain::{Slot, Station};
use crate::interfaces::http::common::{ok, ApiResponse, ApiResult};

#[derive(Clone)]
pub struct StationState {
    pub catalog: Arc<CatalogService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/stations",
    tag = "Stations",
    params(NearbyParams, StationFilter),
    responses(
        (status = 200, description = "Stations near the point, filtered and sorted", body = ApiResponse<StationList>),
        (status = 400, description = "Invalid coordinates or radius")
    )
)]
pub async fn search_stations(
    State(state): State<StationState>,
    Query(params): Query<NearbyParams>,
    Query(filter): Query<StationFilter>,
) -> ApiResult<StationList> {
    let search = params.to_search()?;
    ok(state.catalog.search(search, &filter, params.sort).await)
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/within",
    tag = "Stations",
    params(BoundingBox, LimitParams),
    responses(
        (status = 200, description = "Stations inside the rectangle", body = ApiResponse<Vec<Station>>),
        (status = 400, description = "Inverted bounds")
    )
)]
pub async fn stations_in_bounds(
    State(state): State<StationState>,
    Query(bbox): Query<BoundingBox>,
    Query(limit): Query<LimitParams>,
) -> ApiResult<Vec<Station>> {
    ok(state.catalog.in_bounding_box(&bbox, limit.max_results).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/country/{code}",
    tag = "Stations",
    params(("code" = String, Path, description = "ISO 3166-1 alpha-2 country code"), LimitParams),
    responses(
        (status = 200, description = "Stations in the country", body = ApiResponse<Vec<Station>>),
        (status = 400, description = "Malformed country code")
    )
)]
pub async fn stations_by_country(
    State(state): State<StationState>,
    Path(code): Path<String>,
    Query(limit): Query<LimitParams>,
) -> ApiResult<Vec<Station>> {
    ok(state.catalog.by_country(&code, limit.max_results).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{id}",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID"), LocationParams),
    responses(
        (status = 200, description = "Station details", body = ApiResponse<Station>),
        (status = 404, description = "Unknown station")
    )
)]
pub async fn get_station(
    State(state): State<StationState>,
    Path(id): Path<String>,
    Query(location): Query<LocationParams>,
) -> ApiResult<Station> {
    let center = location.center()?;
    ok(state.catalog.station(&id, center).await?)
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{id}/slots",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Bookable slots", body = ApiResponse<Vec<Slot>>),
        (status = 404, description = "Unknown station")
    )
)]
pub async fn list_slots(State(state): State<StationState>, Path(id): Path<String>) -> ApiResult<Vec<Slot>> {
    ok(state.catalog.slots(&id).await?)
}
