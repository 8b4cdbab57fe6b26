use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::{
        compatibility::{CreateMakeRequest, CreateModelRequest, MakeList, ModelList},
        products::ProductList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{CarMake, CarModel},
    response::ApiResponse,
    routes::params::YearQuery,
    services::compatibility_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/makes", get(list_makes).post(create_make))
        .route("/makes/{id}/models", get(list_models).post(create_model))
        .route("/models/{id}/products", get(products_for_model))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/makes",
    responses((status = 200, description = "Car makes", body = ApiResponse<MakeList>)),
    tag = "Vehicles"
)]
pub async fn list_makes(State(state): State<AppState>) -> AppResult<Json<ApiResponse<MakeList>>> {
    Ok(Json(compatibility_service::list_makes(&state).await?))
}

#[utoipa::path(
    post,
    path = "/api/vehicles/makes",
    request_body = CreateMakeRequest,
    responses(
        (status = 200, description = "Make created", body = ApiResponse<CarMake>),
        (status = 409, description = "Make already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
pub async fn create_make(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateMakeRequest>,
) -> AppResult<Json<ApiResponse<CarMake>>> {
    Ok(Json(compatibility_service::create_make(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/makes/{id}/models",
    params(("id" = i32, Path, description = "Make ID")),
    responses(
        (status = 200, description = "Models of the make", body = ApiResponse<ModelList>),
        (status = 404, description = "Make not found"),
    ),
    tag = "Vehicles"
)]
pub async fn list_models(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<ModelList>>> {
    Ok(Json(compatibility_service::list_models(&state, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/vehicles/makes/{id}/models",
    params(("id" = i32, Path, description = "Make ID")),
    request_body = CreateModelRequest,
    responses(
        (status = 200, description = "Model created", body = ApiResponse<CarModel>),
        (status = 400, description = "Neither base_model nor name given"),
        (status = 404, description = "Make not found"),
        (status = 409, description = "Model already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Vehicles"
)]
pub async fn create_model(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateModelRequest>,
) -> AppResult<Json<ApiResponse<CarModel>>> {
    Ok(Json(compatibility_service::create_model(&state, &user, id, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/vehicles/models/{id}/products",
    params(
        ("id" = i32, Path, description = "Car model ID"),
        ("year" = Option<i32>, Query, description = "Model year"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Parts that fit", body = ApiResponse<ProductList>),
        (status = 404, description = "Model not found"),
    ),
    tag = "Vehicles"
)]
pub async fn products_for_model(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<YearQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(compatibility_service::products_for_model(&state, id, query).await?))
}
