use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use uuid::Uuid;

use crate::{
    dto::cart::{
        AddToCartRequest, CartSummary, MergeCartRequest, MergeResult, UpdateCartItemRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_list).post(add_to_cart).delete(clear_cart))
        .route("/merge", post(merge_cart))
        .route(
            "/{product_id}",
            put(update_cart_item).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Cart lines with subtotal and weight", body = ApiResponse<CartSummary>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    Ok(Json(cart_service::list_cart(&state.pool, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Added or incremented", body = ApiResponse<CartSummary>),
        (status = 400, description = "Out of stock, inactive product or cart full"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    Ok(Json(cart_service::add_to_cart(&state.pool, &user, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/cart/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Quantity set", body = ApiResponse<CartSummary>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Not in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    Ok(Json(
        cart_service::update_cart_item(&state.pool, &user, product_id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Removed from cart"),
        (status = 404, description = "Not in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(
        cart_service::remove_from_cart(&state.pool, &user, product_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    responses((status = 200, description = "Cart emptied")),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(cart_service::clear_cart(&state.pool, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/cart/merge",
    request_body = MergeCartRequest,
    responses(
        (status = 200, description = "Guest cart merged; rejected lines listed", body = ApiResponse<MergeResult>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn merge_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<MergeCartRequest>,
) -> AppResult<Json<ApiResponse<MergeResult>>> {
    Ok(Json(
        cart_service::merge_guest_cart(&state.pool, &user, payload).await?,
    ))
}
