use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};

use crate::{
    dto::products::{BrandList, CategoryList, NameRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Brand, Category},
    response::ApiResponse,
    services::product_service,
    state::AppState,
};

pub fn brands_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_brands).post(create_brand))
        .route("/{id}", put(rename_brand).delete(delete_brand))
}

pub fn categories_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", put(rename_category).delete(delete_category))
}

#[utoipa::path(
    get,
    path = "/api/brands",
    responses((status = 200, description = "All brands", body = ApiResponse<BrandList>)),
    tag = "Catalog"
)]
pub async fn list_brands(State(state): State<AppState>) -> AppResult<Json<ApiResponse<BrandList>>> {
    Ok(Json(product_service::list_brands(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/brands",
    request_body = NameRequest,
    responses(
        (status = 200, description = "Brand created", body = ApiResponse<Brand>),
        (status = 409, description = "Brand name taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<NameRequest>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    Ok(Json(product_service::create_brand(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/brands/{id}",
    params(("id" = i32, Path, description = "Brand ID")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Brand renamed", body = ApiResponse<Brand>),
        (status = 404, description = "Brand not found"),
        (status = 409, description = "Brand name taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn rename_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<NameRequest>,
) -> AppResult<Json<ApiResponse<Brand>>> {
    Ok(Json(product_service::rename_brand(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/brands/{id}",
    params(("id" = i32, Path, description = "Brand ID")),
    responses(
        (status = 200, description = "Brand deleted"),
        (status = 404, description = "Brand not found"),
        (status = 409, description = "Brand still used by products"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn delete_brand(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(product_service::delete_brand(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses((status = 200, description = "All categories", body = ApiResponse<CategoryList>)),
    tag = "Catalog"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(product_service::list_categories(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = NameRequest,
    responses(
        (status = 200, description = "Category created", body = ApiResponse<Category>),
        (status = 409, description = "Category name taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<NameRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    Ok(Json(product_service::create_category(&state, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = NameRequest,
    responses(
        (status = 200, description = "Category renamed", body = ApiResponse<Category>),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category name taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn rename_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<NameRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    Ok(Json(product_service::rename_category(&state, &user, id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Category still used by products"),
    ),
    security(("bearer_auth" = [])),
    tag = "Catalog"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(product_service::delete_category(&state, &user, id).await?))
}
