use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, put},
};
use uuid::Uuid;

use crate::{
    dto::addresses::{
        AddressList, ApprovedAddressList, CreateAddressRequest, CreateApprovedAddressRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Address, ApprovedAddress},
    response::ApiResponse,
    services::address_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_addresses).post(create_address))
        .route("/{id}", delete(delete_address))
        .route("/{id}/default", put(set_default_address))
}

pub fn approved_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_approved).post(create_approved))
        .route("/{id}/deactivate", patch(deactivate_approved))
}

#[utoipa::path(
    get,
    path = "/api/addresses",
    responses((status = 200, description = "Caller's addresses, default first", body = ApiResponse<AddressList>)),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn list_my_addresses(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<AddressList>>> {
    Ok(Json(address_service::list_my_addresses(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = CreateAddressRequest,
    responses(
        (status = 200, description = "Address saved", body = ApiResponse<Address>),
        (status = 400, description = "Missing fields or unknown barangay"),
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn create_address(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAddressRequest>,
) -> AppResult<Json<ApiResponse<Address>>> {
    Ok(Json(address_service::create_address(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/addresses/{id}/default",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address is now the default", body = ApiResponse<Address>),
        (status = 404, description = "Address not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn set_default_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Address>>> {
    Ok(Json(address_service::set_default_address(&state, &user, id).await?))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(("id" = Uuid, Path, description = "Address ID")),
    responses(
        (status = 200, description = "Address deleted"),
        (status = 404, description = "Address not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn delete_address(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(address_service::delete_my_address(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/approved-addresses",
    responses((status = 200, description = "Pickup and branch addresses", body = ApiResponse<ApprovedAddressList>)),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn list_approved(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ApprovedAddressList>>> {
    Ok(Json(address_service::list_approved_addresses(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/approved-addresses",
    request_body = CreateApprovedAddressRequest,
    responses(
        (status = 200, description = "Approved address created", body = ApiResponse<ApprovedAddress>),
        (status = 403, description = "Staff only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn create_approved(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateApprovedAddressRequest>,
) -> AppResult<Json<ApiResponse<ApprovedAddress>>> {
    Ok(Json(address_service::create_approved_address(&state, &user, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/approved-addresses/{id}/deactivate",
    params(("id" = i32, Path, description = "Approved address ID")),
    responses(
        (status = 200, description = "Approved address deactivated", body = ApiResponse<ApprovedAddress>),
        (status = 404, description = "Not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Addresses"
)]
pub async fn deactivate_approved(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<ApprovedAddress>>> {
    Ok(Json(address_service::deactivate_approved_address(&state, &user, id).await?))
}
