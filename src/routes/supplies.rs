use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::supplies::{
        CreateSupplierRequest, CreateSupplyRequest, SupplierList, SupplyDetail, SupplyList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Supplier,
    response::ApiResponse,
    routes::params::SupplyListQuery,
    services::supply_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/supplies", get(list_supplies).post(create_supply))
        .route("/supplies/{id}", get(get_supply))
}

#[utoipa::path(
    get,
    path = "/api/admin/suppliers",
    responses((status = 200, description = "Suppliers", body = ApiResponse<SupplierList>)),
    security(("bearer_auth" = [])),
    tag = "Supplies"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SupplierList>>> {
    Ok(Json(supply_service::list_suppliers(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/suppliers",
    request_body = CreateSupplierRequest,
    responses(
        (status = 200, description = "Supplier created", body = ApiResponse<Supplier>),
        (status = 409, description = "Supplier name taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Supplies"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSupplierRequest>,
) -> AppResult<Json<ApiResponse<Supplier>>> {
    Ok(Json(supply_service::create_supplier(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/supplies",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("supplier_id" = Option<i32>, Query, description = "Filter by supplier"),
        ("from" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("to" = Option<String>, Query, description = "Last day, YYYY-MM-DD")
    ),
    responses((status = 200, description = "Supply receipts", body = ApiResponse<SupplyList>)),
    security(("bearer_auth" = [])),
    tag = "Supplies"
)]
pub async fn list_supplies(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<SupplyListQuery>,
) -> AppResult<Json<ApiResponse<SupplyList>>> {
    Ok(Json(supply_service::list_supplies(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/supplies",
    request_body = CreateSupplyRequest,
    responses(
        (status = 200, description = "Receipt recorded and stock added", body = ApiResponse<SupplyDetail>),
        (status = 400, description = "Invalid lines or unknown supplier"),
        (status = 409, description = "Receipt number already recorded"),
    ),
    security(("bearer_auth" = [])),
    tag = "Supplies"
)]
pub async fn create_supply(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateSupplyRequest>,
) -> AppResult<Json<ApiResponse<SupplyDetail>>> {
    Ok(Json(supply_service::create_supply(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/supplies/{id}",
    params(("id" = Uuid, Path, description = "Supply ID")),
    responses(
        (status = 200, description = "Receipt with lines", body = ApiResponse<SupplyDetail>),
        (status = 404, description = "Supply not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Supplies"
)]
pub async fn get_supply(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SupplyDetail>>> {
    Ok(Json(supply_service::get_supply(&state, &user, id).await?))
}
