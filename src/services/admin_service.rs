use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::Set;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        orders::{DeliveryStatusList, OrderDetail, OrderList, UpdateOrderStatusRequest},
        products::{InventoryAdjustRequest, ProductList},
    },
    entity::{
        delivery_statuses::{Column as StatusCol, Entity as DeliveryStatuses},
        product::{ActiveModel as ProductActive, Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{DeliveryStatus, Product},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, OrderListQuery, Paged},
    services::{order_service, product_service},
    state::AppState,
};

/// Stock at or below this level counts as low.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    order_service::list_orders_for(&state.pool, None, &query).await
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_staff(user)?;
    let detail = order_service::load_order_detail(&state.pool, id, None).await?;
    Ok(ApiResponse::success(
        "Order found",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    ensure_staff(user)?;
    order_service::change_status(
        state,
        user,
        id,
        None,
        payload.status_id,
        payload.tracking_number.as_deref(),
        payload.note,
    )
    .await?;

    let detail = order_service::load_order_detail(&state.pool, id, None).await?;
    Ok(ApiResponse::success(
        "Order updated",
        detail,
        Some(Meta::empty()),
    ))
}

pub async fn list_delivery_statuses(
    state: &AppState,
) -> AppResult<ApiResponse<DeliveryStatusList>> {
    let items: Vec<DeliveryStatus> = DeliveryStatuses::find()
        .order_by_asc(StatusCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|s| DeliveryStatus {
            id: s.id,
            name: s.name,
        })
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success(
        "Delivery statuses",
        DeliveryStatusList { items },
        Some(meta),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<ProductList>> {
    ensure_staff(user)?;
    let threshold = query.threshold.unwrap_or(LOW_STOCK_THRESHOLD);
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Products::find()
        .filter(ProdCol::Quantity.lte(threshold))
        .filter(ProdCol::IsActive.eq(true));
    finder = finder
        .order_by_asc(ProdCol::Quantity)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| product_service::product_from_entity(p, true))
        .collect();

    let data = ProductList { items };
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", data, Some(meta)))
}

pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: InventoryAdjustRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let product = Products::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let new_stock = product
        .quantity
        .checked_add(payload.delta)
        .filter(|q| *q >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: ProductActive = product.into();
    active.quantity = Set(new_stock);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "inventory_adjust",
        "product",
        serde_json::json!({
            "product_id": updated.id,
            "delta": payload.delta,
            "reason": payload.reason,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        product_service::product_from_entity(updated, true),
        Some(Meta::empty()),
    ))
}
