use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CancelOrderRequest, CheckoutRequest, DeliveryStatusList, OrderDetail, OrderList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{admin_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(checkout))
        .route("/statuses", get(list_statuses))
        .route("/{id}", get(get_order))
        .route("/{id}/cancel", post(cancel_order))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status_id" = Option<i32>, Query, description = "Delivery status filter"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by date")
    ),
    responses((status = 200, description = "Caller's orders", body = ApiResponse<OrderList>)),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(order_service::list_my_orders(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Order placed from the cart", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Empty cart, stock shortfall or courier cannot carry the weight"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(order_service::checkout(&state, &user, payload).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/statuses",
    responses((status = 200, description = "Delivery status catalog", body = ApiResponse<DeliveryStatusList>)),
    tag = "Orders"
)]
pub async fn list_statuses(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<DeliveryStatusList>>> {
    Ok(Json(admin_service::list_delivery_statuses(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items, delivery and history", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(order_service::get_my_order(&state, &user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/cancel",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = CancelOrderRequest,
    responses(
        (status = 200, description = "Order cancelled and stock returned", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Order is past pending"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(order_service::cancel_my_order(&state, &user, id, payload).await?))
}
