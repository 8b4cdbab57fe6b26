use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    delivery_status::{self, CurrentDelivery},
    dto::orders::{CancelOrderRequest, CheckoutRequest, OrderDetail, OrderList, PaymentMethod},
    entity::{
        address::{Column as AddressCol, Entity as Addresses},
        approved_address::Entity as ApprovedAddresses,
        courier::Entity as Couriers,
        delivery::{ActiveModel as DeliveryActive, Column as DeliveryCol, Entity as Deliveries},
        delivery_history::ActiveModel as HistoryActive,
        delivery_statuses::Entity as DeliveryStatuses,
        product::{Column as ProdCol, Entity as Products},
        sale::{ActiveModel as SaleActive, Column as SaleCol, Entity as Sales},
        sale_details::{ActiveModel as SaleDetailActive, Column as SaleDetailCol, Entity as SaleDetails},
        user_cart::{Column as CartCol, Entity as CartItems},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Delivery, DeliveryHistoryEntry, Order, SaleItem},
    money,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, Paged, SortOrder},
    services::{address_service, courier_service},
    shipping::{self, ShippingFee},
    state::AppState,
};

const ORDER_FROM: &str = r#"
    FROM sale s
    JOIN user_employee u ON u.id = s.user_id
    JOIN delivery d ON d.sale_id = s.id
    JOIN delivery_statuses ds ON ds.id = d.status_id
"#;

const ORDER_COLUMNS: &str = r#"
    SELECT s.id, s.user_id, u.email AS customer_email, s.subtotal, s.shipping_fee,
           s.total_amount, s.payment_method, d.status_id, ds.name AS status,
           d.tracking_number, s.created_at
"#;

const ORDER_FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR s.user_id = $1)
      AND ($2::int IS NULL OR d.status_id = $2)
      AND ($3::text IS NULL OR u.email ILIKE $3)
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    Own(Uuid),
    Approved(i32),
}

pub fn address_source(
    address_id: Option<Uuid>,
    approved_address_id: Option<i32>,
) -> AppResult<AddressSource> {
    match (address_id, approved_address_id) {
        (Some(id), None) => Ok(AddressSource::Own(id)),
        (None, Some(id)) => Ok(AddressSource::Approved(id)),
        _ => Err(AppError::BadRequest(
            "provide exactly one of address_id and approved_address_id".into(),
        )),
    }
}

/// A cart line joined with the locked product row.
#[derive(Debug, Clone)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub stock: i32,
    pub weight_kg: f64,
    pub is_active: bool,
}

/// Returns the subtotal and the parcel weight in kg.
pub fn price_lines(lines: &[CheckoutLine]) -> AppResult<(i64, f64)> {
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    let mut subtotal: i64 = 0;
    for line in lines {
        if !line.is_active {
            return Err(AppError::BadRequest(format!(
                "{} is no longer available",
                line.name
            )));
        }
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if line.stock < line.quantity {
            return Err(AppError::BadRequest(format!(
                "Insufficient stock for {}",
                line.name
            )));
        }
        subtotal = money::add(subtotal, money::line_total(line.unit_price, line.quantity)?)?;
    }
    let weight = shipping::total_weight_kg(lines.iter().map(|l| (l.weight_kg, l.quantity)));
    Ok((subtotal, weight))
}

pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let payment_method = PaymentMethod::parse(&payload.payment_method).ok_or_else(|| {
        AppError::BadRequest("payment_method must be one of cod, gcash, bank_transfer".into())
    })?;
    let source = address_source(payload.address_id, payload.approved_address_id)?;

    let txn = state.orm.begin().await?;

    let courier = Couriers::find_by_id(payload.courier_id)
        .one(&txn)
        .await?
        .filter(|c| c.is_active)
        .ok_or_else(|| AppError::BadRequest("courier is not available".into()))?;

    let (shipping_address, address_id, approved_address_id) = match source {
        AddressSource::Own(id) => {
            let address = Addresses::find_by_id(id)
                .filter(AddressCol::UserId.eq(user.user_id))
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::BadRequest("address not found".into()))?;
            let full =
                address_service::full_address(&txn, &address.street, address.barangay_id).await?;
            let text = format!("{} ({}), {}", address.recipient_name, address.phone, full);
            (text, Some(id), None)
        }
        AddressSource::Approved(id) => {
            let approved = ApprovedAddresses::find_by_id(id)
                .one(&txn)
                .await?
                .filter(|a| a.is_active)
                .ok_or_else(|| AppError::BadRequest("approved address not found".into()))?;
            let full =
                address_service::full_address(&txn, &approved.street, approved.barangay_id)
                    .await?;
            (format!("{}, {}", approved.label, full), None, Some(id))
        }
    };

    let cart = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock(LockType::Update)
        .all(&txn)
        .await?;
    let product_ids: Vec<Uuid> = cart.iter().map(|c| c.product_id).collect();
    let products: HashMap<Uuid, _> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .order_by_asc(ProdCol::Id)
        .lock(LockType::Update)
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let mut lines = Vec::with_capacity(cart.len());
    for item in &cart {
        let product = products
            .get(&item.product_id)
            .ok_or_else(|| AppError::BadRequest("cart references a missing product".into()))?;
        lines.push(CheckoutLine {
            product_id: product.id,
            name: product.name.clone(),
            unit_price: product.price,
            quantity: item.quantity,
            stock: product.quantity,
            weight_kg: product.weight_kg,
            is_active: product.is_active,
        });
    }

    let (subtotal, weight) = price_lines(&lines)?;
    let fee = match shipping::shipping_fee(weight, &courier_service::rates_of(&courier)) {
        ShippingFee::Fee(fee) => fee,
        ShippingFee::Incapable => {
            return Err(AppError::BadRequest(format!(
                "{} cannot carry a {weight:.2} kg parcel",
                courier.name
            )));
        }
    };

    let total_amount = money::add(subtotal, fee)?;

    let sale = SaleActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        subtotal: Set(subtotal),
        shipping_fee: Set(fee),
        total_amount: Set(total_amount),
        payment_method: Set(payment_method.as_str().to_string()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &lines {
        SaleDetailActive {
            id: Set(Uuid::new_v4()),
            sale_id: Set(sale.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
        }
        .insert(&txn)
        .await?;

        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).sub(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(&txn)
            .await?;
    }

    let delivery = DeliveryActive {
        id: Set(Uuid::new_v4()),
        sale_id: Set(sale.id),
        courier_id: Set(courier.id),
        address_id: Set(address_id),
        approved_address_id: Set(approved_address_id),
        shipping_address: Set(shipping_address),
        fee: Set(fee),
        status_id: Set(delivery_status::PENDING),
        tracking_number: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    append_history(
        &txn,
        delivery.id,
        delivery_status::PENDING,
        None,
        Some("Order placed".into()),
        user.user_id,
    )
    .await?;

    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(sale_id = %sale.id, user_id = %user.user_id, total = sale.total_amount, "checkout completed");
    audit::record(
        &state.pool,
        user.user_id,
        "checkout",
        "sale",
        serde_json::json!({ "sale_id": sale.id, "total_amount": sale.total_amount }),
    )
    .await;

    let detail = load_order_detail(&state.pool, sale.id, Some(user.user_id)).await?;
    Ok(ApiResponse::success("Checkout success", detail, Some(Meta::empty())))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
    mut query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    query.q = None;
    list_orders_for(&state.pool, Some(user.user_id), &query).await
}

pub async fn get_my_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDetail>> {
    let detail = load_order_detail(&state.pool, id, Some(user.user_id)).await?;
    Ok(ApiResponse::success("OK", detail, Some(Meta::empty())))
}

/// Customers may cancel only while the delivery is still Pending.
pub async fn cancel_my_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CancelOrderRequest,
) -> AppResult<ApiResponse<OrderDetail>> {
    let note = payload.note.or_else(|| Some("Cancelled by customer".into()));
    change_status(
        state,
        user,
        id,
        Some(user.user_id),
        delivery_status::CANCELLED,
        None,
        note,
    )
    .await?;
    let detail = load_order_detail(&state.pool, id, Some(user.user_id)).await?;
    Ok(ApiResponse::success("Order cancelled", detail, Some(Meta::empty())))
}

/// Move a delivery to `status_id` in one transaction, appending exactly one
/// history row. `owner` restricts the sale to a customer, who may only cancel
/// a Pending delivery.
pub(crate) async fn change_status(
    state: &AppState,
    actor: &AuthUser,
    sale_id: Uuid,
    owner: Option<Uuid>,
    status_id: i32,
    tracking_number: Option<&str>,
    note: Option<String>,
) -> AppResult<()> {
    let txn = state.orm.begin().await?;

    let mut sale_query = Sales::find_by_id(sale_id);
    if let Some(owner) = owner {
        sale_query = sale_query.filter(SaleCol::UserId.eq(owner));
    }
    if sale_query.one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    if DeliveryStatuses::find_by_id(status_id).one(&txn).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "unknown delivery status {status_id}"
        )));
    }

    let delivery = Deliveries::find()
        .filter(DeliveryCol::SaleId.eq(sale_id))
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if owner.is_some() && delivery.status_id != delivery_status::PENDING {
        return Err(AppError::BadRequest(
            "only pending orders can be cancelled".into(),
        ));
    }

    let change = delivery_status::plan_status_change(
        &CurrentDelivery {
            status_id: delivery.status_id,
            tracking_number: delivery.tracking_number.as_deref(),
        },
        status_id,
        tracking_number,
    )?;

    if change.restock {
        restock(&txn, sale_id).await?;
    }

    let previous_status = delivery.status_id;
    let delivery_id = delivery.id;
    let mut active: DeliveryActive = delivery.into();
    active.status_id = Set(change.status_id);
    active.tracking_number = Set(change.tracking_number.clone());
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    append_history(
        &txn,
        delivery_id,
        change.status_id,
        change.tracking_number.clone(),
        note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        actor.user_id,
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        %sale_id,
        from = previous_status,
        to = change.status_id,
        restocked = change.restock,
        "delivery status changed"
    );
    audit::record(
        &state.pool,
        actor.user_id,
        "delivery_status_update",
        "delivery",
        serde_json::json!({
            "sale_id": sale_id,
            "from": previous_status,
            "to": change.status_id,
        }),
    )
    .await;

    Ok(())
}

async fn append_history<C: ConnectionTrait>(
    conn: &C,
    delivery_id: Uuid,
    status_id: i32,
    tracking_number: Option<String>,
    note: Option<String>,
    changed_by: Uuid,
) -> AppResult<()> {
    HistoryActive {
        id: Set(Uuid::new_v4()),
        delivery_id: Set(delivery_id),
        status_id: Set(status_id),
        tracking_number: Set(tracking_number),
        note: Set(note),
        changed_by: Set(Some(changed_by)),
        created_at: NotSet,
    }
    .insert(conn)
    .await?;
    Ok(())
}

async fn restock<C: ConnectionTrait>(conn: &C, sale_id: Uuid) -> AppResult<()> {
    let lines = SaleDetails::find()
        .filter(SaleDetailCol::SaleId.eq(sale_id))
        .all(conn)
        .await?;
    for line in lines {
        Products::update_many()
            .col_expr(ProdCol::Quantity, Expr::col(ProdCol::Quantity).add(line.quantity))
            .col_expr(ProdCol::UpdatedAt, Expr::current_timestamp().into())
            .filter(ProdCol::Id.eq(line.product_id))
            .exec(conn)
            .await?;
    }
    Ok(())
}

pub(crate) async fn list_orders_for(
    pool: &DbPool,
    owner: Option<Uuid>,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let email = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{q}%"));

    let sql = format!(
        "{ORDER_COLUMNS} {ORDER_FROM} {ORDER_FILTER} ORDER BY s.created_at {} LIMIT $4 OFFSET $5",
        sort_order.as_sql()
    );
    let items = sqlx::query_as::<_, Order>(&sql)
        .bind(owner)
        .bind(query.status_id)
        .bind(email.clone())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) {ORDER_FROM} {ORDER_FILTER}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(owner)
        .bind(query.status_id)
        .bind(email)
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub(crate) async fn load_order_detail(
    pool: &DbPool,
    sale_id: Uuid,
    owner: Option<Uuid>,
) -> AppResult<OrderDetail> {
    let sql = format!("{ORDER_COLUMNS} {ORDER_FROM} WHERE s.id = $1 AND ($2::uuid IS NULL OR s.user_id = $2)");
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(sale_id)
        .bind(owner)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound)?;

    let items = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT sd.id, sd.product_id, p.name AS product_name, sd.quantity, sd.unit_price,
               sd.unit_price * sd.quantity AS line_total
        FROM sale_details sd
        JOIN product p ON p.id = sd.product_id
        WHERE sd.sale_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(sale_id)
    .fetch_all(pool)
    .await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        r#"
        SELECT d.id, d.sale_id, d.courier_id, d.shipping_address, d.fee, d.status_id,
               ds.name AS status, d.tracking_number, d.created_at, d.updated_at
        FROM delivery d
        JOIN delivery_statuses ds ON ds.id = d.status_id
        WHERE d.sale_id = $1
        "#,
    )
    .bind(sale_id)
    .fetch_one(pool)
    .await?;

    let history = sqlx::query_as::<_, DeliveryHistoryEntry>(
        r#"
        SELECT h.id, h.status_id, ds.name AS status, h.tracking_number, h.note,
               h.changed_by, h.created_at
        FROM delivery_history h
        JOIN delivery_statuses ds ON ds.id = h.status_id
        WHERE h.delivery_id = $1
        ORDER BY h.created_at, h.id
        "#,
    )
    .bind(delivery.id)
    .fetch_all(pool)
    .await?;

    Ok(OrderDetail {
        order,
        items,
        delivery,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i32, stock: i32) -> CheckoutLine {
        CheckoutLine {
            product_id: Uuid::new_v4(),
            name: "Brake pad set".into(),
            unit_price: 125_000,
            quantity,
            stock,
            weight_kg: 0.75,
            is_active: true,
        }
    }

    #[test]
    fn exactly_one_address_source() {
        let id = Uuid::new_v4();
        assert_eq!(address_source(Some(id), None).unwrap(), AddressSource::Own(id));
        assert_eq!(address_source(None, Some(4)).unwrap(), AddressSource::Approved(4));
        assert!(address_source(None, None).is_err());
        assert!(address_source(Some(id), Some(4)).is_err());
    }

    #[test]
    fn lines_are_priced_and_weighed() {
        let (subtotal, weight) = price_lines(&[line(2, 5), line(1, 1)]).unwrap();
        assert_eq!(subtotal, 375_000);
        assert_eq!(weight, 2.25);
    }

    #[test]
    fn empty_cart_and_short_stock_are_rejected() {
        assert!(price_lines(&[]).is_err());
        assert!(price_lines(&[line(3, 2)]).is_err());
        let mut inactive = line(1, 5);
        inactive.is_active = false;
        assert!(price_lines(&[inactive]).is_err());
    }

    #[test]
    fn overpriced_cart_is_rejected_instead_of_wrapping() {
        let mut pricey = line(4, 10);
        pricey.unit_price = i64::MAX / 3;
        assert!(matches!(
            price_lines(&[pricey]),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn payment_methods_are_parsed() {
        assert_eq!(PaymentMethod::parse("COD"), Some(PaymentMethod::Cod));
        assert_eq!(
            PaymentMethod::parse(" bank_transfer "),
            Some(PaymentMethod::BankTransfer)
        );
        assert_eq!(PaymentMethod::parse("card"), None);
    }
}
