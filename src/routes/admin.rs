use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderDetail, OrderList, UpdateOrderStatusRequest},
        products::{InventoryAdjustRequest, ProductDetail, ProductList},
        users::{ChangeRoleRequest, CreateStaffRequest, SetActiveRequest, UserList},
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    models::{Product, User},
    response::ApiResponse,
    routes::params::{LowStockQuery, OrderListQuery, ProductQuery, UserListQuery},
    services::{admin_service, product_service, user_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/inventory/low-stock", get(list_low_stock))
        .route("/inventory/{id}", patch(adjust_inventory))
        .route("/products", get(list_products_admin))
        .route("/products/{id}", get(get_product_admin))
        .route("/users", get(list_users).post(create_staff))
        .route("/users/{id}/role", patch(change_role))
        .route("/users/{id}/active", patch(set_active))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status_id" = Option<i32>, Query, description = "Delivery status filter"),
        ("q" = Option<String>, Query, description = "Customer email contains"),
        ("sort_order" = Option<String>, Query, description = "asc or desc by date")
    ),
    responses((status = 200, description = "All orders", body = ApiResponse<OrderList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    Ok(Json(admin_service::list_orders(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order detail", body = ApiResponse<OrderDetail>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(admin_service::get_order(&state, &user, id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed and history appended", body = ApiResponse<OrderDetail>),
        (status = 400, description = "Unknown status, missing tracking number or closed order"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<OrderDetail>>> {
    Ok(Json(
        admin_service::update_order_status(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/inventory/low-stock",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("threshold" = Option<i32>, Query, description = "Stock at or below, default 5")
    ),
    responses((status = 200, description = "Products running low", body = ApiResponse<ProductList>)),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(admin_service::list_low_stock(&state, &user, query).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/inventory/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = InventoryAdjustRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<Product>),
        (status = 400, description = "Zero delta or stock would go negative"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<InventoryAdjustRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(
        admin_service::adjust_inventory(&state, &user, id, payload).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name and description"),
        ("brand_id" = Option<i32>, Query, description = "Filter by brand"),
        ("category_id" = Option<i32>, Query, description = "Filter by category"),
        ("in_stock" = Option<bool>, Query, description = "Only products with stock"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, name, quantity"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "All products including inactive, with cost price", body = ApiResponse<ProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_products_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    ensure_staff(&user)?;
    Ok(Json(product_service::list_products(&state, query, true).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/products/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product with cost price", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_product_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    ensure_staff(&user)?;
    Ok(Json(product_service::get_product(&state, id, true).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/users",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("role" = Option<String>, Query, description = "admin, employee or customer"),
        ("q" = Option<String>, Query, description = "Email contains")
    ),
    responses(
        (status = 200, description = "Accounts", body = ApiResponse<UserList>),
        (status = 403, description = "Admin only"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    Ok(Json(user_service::list_users(&state, &user, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateStaffRequest,
    responses(
        (status = 200, description = "Staff account created", body = ApiResponse<User>),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn create_staff(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateStaffRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(user_service::create_staff(&state, &user, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ChangeRoleRequest,
    responses(
        (status = 200, description = "Role changed", body = ApiResponse<User>),
        (status = 400, description = "Unknown role or self-demotion"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn change_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChangeRoleRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(user_service::change_role(&state, &user, id, payload).await?))
}

#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}/active",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Account enabled or disabled", body = ApiResponse<User>),
        (status = 400, description = "Cannot deactivate yourself"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn set_active(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetActiveRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    Ok(Json(user_service::set_active(&state, &user, id, payload).await?))
}
