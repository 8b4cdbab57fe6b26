use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};

use crate::{
    dto::couriers::{CourierList, CreateCourierRequest, ShippingQuote, UpdateCourierRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Courier,
    response::ApiResponse,
    services::courier_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_couriers).post(create_courier))
        .route("/quote", get(shipping_quote))
        .route("/{id}", patch(update_courier))
}

#[utoipa::path(
    get,
    path = "/api/couriers",
    responses((status = 200, description = "Active couriers", body = ApiResponse<CourierList>)),
    tag = "Shipping"
)]
pub async fn list_couriers(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CourierList>>> {
    Ok(Json(courier_service::list_couriers(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/couriers/quote",
    responses(
        (status = 200, description = "Fee per courier for the current cart", body = ApiResponse<ShippingQuote>),
        (status = 400, description = "Cart is empty"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shipping"
)]
pub async fn shipping_quote(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ShippingQuote>>> {
    Ok(Json(courier_service::shipping_quote(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/couriers",
    request_body = CreateCourierRequest,
    responses(
        (status = 200, description = "Courier created", body = ApiResponse<Courier>),
        (status = 400, description = "Invalid rates"),
        (status = 409, description = "Courier name taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shipping"
)]
pub async fn create_courier(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCourierRequest>,
) -> AppResult<Json<ApiResponse<Courier>>> {
    Ok(Json(courier_service::create_courier(&state, &user, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/couriers/{id}",
    params(("id" = i32, Path, description = "Courier ID")),
    request_body = UpdateCourierRequest,
    responses(
        (status = 200, description = "Courier updated", body = ApiResponse<Courier>),
        (status = 404, description = "Courier not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Shipping"
)]
pub async fn update_courier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCourierRequest>,
) -> AppResult<Json<ApiResponse<Courier>>> {
    Ok(Json(courier_service::update_courier(&state, &user, id, payload).await?))
}
