use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::addresses::LocationList, error::AppResult, response::ApiResponse,
    services::address_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/regions", get(list_regions))
        .route("/regions/{id}/provinces", get(list_provinces))
        .route("/provinces/{id}/municipalities", get(list_municipalities))
        .route("/municipalities/{id}/barangays", get(list_barangays))
}

#[utoipa::path(
    get,
    path = "/api/locations/regions",
    responses((status = 200, description = "Regions", body = ApiResponse<LocationList>)),
    tag = "Locations"
)]
pub async fn list_regions(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<LocationList>>> {
    Ok(Json(address_service::list_regions(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/locations/regions/{id}/provinces",
    params(("id" = i32, Path, description = "Region ID")),
    responses(
        (status = 200, description = "Provinces of the region", body = ApiResponse<LocationList>),
        (status = 404, description = "Region not found"),
    ),
    tag = "Locations"
)]
pub async fn list_provinces(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<LocationList>>> {
    Ok(Json(address_service::list_provinces(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/locations/provinces/{id}/municipalities",
    params(("id" = i32, Path, description = "Province ID")),
    responses(
        (status = 200, description = "Municipalities of the province", body = ApiResponse<LocationList>),
        (status = 404, description = "Province not found"),
    ),
    tag = "Locations"
)]
pub async fn list_municipalities(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<LocationList>>> {
    Ok(Json(address_service::list_municipalities(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/locations/municipalities/{id}/barangays",
    params(("id" = i32, Path, description = "Municipality ID")),
    responses(
        (status = 200, description = "Barangays of the municipality", body = ApiResponse<LocationList>),
        (status = 404, description = "Municipality not found"),
    ),
    tag = "Locations"
)]
pub async fn list_barangays(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<LocationList>>> {
    Ok(Json(address_service::list_barangays(&state, id).await?))
}
