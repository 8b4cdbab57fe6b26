use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use uuid::Uuid;

use crate::{
    audit,
    dto::supplies::{
        CreateSupplierRequest, CreateSupplyRequest, SupplierList, SupplyDetail, SupplyLineRequest,
        SupplyList,
    },
    entity::{
        product::{ActiveModel as ProductActive, Entity as Products},
        supplier::{ActiveModel as SupplierActive, Column as SupplierCol, Entity as Suppliers, Model as SupplierModel},
        supply::{ActiveModel as SupplyActive, Column as SupplyCol, Entity as Supplies, Model as SupplyModel},
        supply_details::ActiveModel as SupplyDetailActive,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Supplier, Supply, SupplyLine},
    money,
    response::{ApiResponse, Meta},
    routes::params::{Paged, SupplyListQuery, day_end, day_start},
    services::product_service,
    state::AppState,
};

pub async fn list_suppliers(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SupplierList>> {
    ensure_staff(user)?;
    let items: Vec<Supplier> = Suppliers::find()
        .order_by_asc(SupplierCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(supplier_from_entity)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Suppliers", SupplierList { items }, Some(meta)))
}

pub async fn create_supplier(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSupplierRequest,
) -> AppResult<ApiResponse<Supplier>> {
    ensure_staff(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("supplier name is required".into()));
    }
    let exists = Suppliers::find()
        .filter(SupplierCol::Name.eq(name.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(format!("supplier '{name}' already exists")));
    }

    let blank_to_none = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let supplier = SupplierActive {
        id: NotSet,
        name: Set(name),
        contact_person: Set(blank_to_none(payload.contact_person)),
        phone: Set(blank_to_none(payload.phone)),
        email: Set(blank_to_none(payload.email)),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "supplier_create",
        "supplier",
        serde_json::json!({ "supplier_id": supplier.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Supplier created",
        supplier_from_entity(supplier),
        None,
    ))
}

/// Check a delivery before anything is written. Returns the trimmed
/// receipt number and the total cost.
pub fn validate_supply(payload: &CreateSupplyRequest) -> AppResult<(String, i64)> {
    let receipt = payload.receipt_number.trim().to_string();
    if receipt.is_empty() {
        return Err(AppError::BadRequest("receipt number is required".into()));
    }
    if payload.lines.is_empty() {
        return Err(AppError::BadRequest("a supply needs at least one line".into()));
    }

    let mut total: i64 = 0;
    for line in &payload.lines {
        validate_line(line)?;
        total = money::add(total, money::line_total(line.unit_cost, line.quantity)?)?;
    }
    Ok((receipt, total))
}

fn validate_line(line: &SupplyLineRequest) -> AppResult<()> {
    if line.quantity <= 0 {
        return Err(AppError::BadRequest("quantity must be greater than 0".into()));
    }
    if line.unit_cost < 0 {
        return Err(AppError::BadRequest("unit cost must not be negative".into()));
    }
    match (&line.product_id, &line.new_product) {
        (Some(_), None) => Ok(()),
        (None, Some(product)) => {
            if product.name.trim().is_empty() {
                return Err(AppError::BadRequest("new product name is required".into()));
            }
            product_service::validate_amounts(
                Some(product.price),
                Some(line.unit_cost),
                None,
                Some(product.weight_kg),
            )
        }
        _ => Err(AppError::BadRequest(
            "each line needs exactly one of product_id and new_product".into(),
        )),
    }
}

pub async fn create_supply(
    state: &AppState,
    user: &AuthUser,
    payload: CreateSupplyRequest,
) -> AppResult<ApiResponse<SupplyDetail>> {
    ensure_staff(user)?;
    let (receipt_number, total_cost) = validate_supply(&payload)?;

    let txn = state.orm.begin().await?;

    if Suppliers::find_by_id(payload.supplier_id).one(&txn).await?.is_none() {
        return Err(AppError::BadRequest(format!(
            "supplier {} does not exist",
            payload.supplier_id
        )));
    }
    let duplicate = Supplies::find()
        .filter(SupplyCol::ReceiptNumber.eq(receipt_number.as_str()))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(AppError::Conflict(format!(
            "receipt '{receipt_number}' was already recorded"
        )));
    }

    let supply = SupplyActive {
        id: Set(Uuid::new_v4()),
        receipt_number: Set(receipt_number),
        supplier_id: Set(payload.supplier_id),
        total_cost: Set(total_cost),
        received_at: Set(payload.received_at.unwrap_or_else(Utc::now).into()),
        created_by: Set(Some(user.user_id)),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for line in &payload.lines {
        let product_id = match (&line.product_id, &line.new_product) {
            (Some(product_id), _) => {
                let product = Products::find_by_id(*product_id)
                    .lock(LockType::Update)
                    .one(&txn)
                    .await?
                    .ok_or_else(|| {
                        AppError::BadRequest(format!("product {product_id} does not exist"))
                    })?;
                let new_quantity = money::restock(product.quantity, line.quantity)?;
                let mut active: ProductActive = product.into();
                active.quantity = Set(new_quantity);
                active.cost_price = Set(line.unit_cost);
                active.updated_at = Set(Utc::now().into());
                active.update(&txn).await?.id
            }
            (None, Some(new_product)) => {
                let brand_id = match new_product.brand_name.as_deref() {
                    Some(name) if !name.trim().is_empty() => {
                        Some(product_service::upsert_brand(&txn, name).await?)
                    }
                    _ => None,
                };
                let category_id = match new_product.category_name.as_deref() {
                    Some(name) if !name.trim().is_empty() => {
                        Some(product_service::upsert_category(&txn, name).await?)
                    }
                    _ => None,
                };
                ProductActive {
                    id: Set(Uuid::new_v4()),
                    name: Set(new_product.name.trim().to_string()),
                    description: Set(new_product.description.clone()),
                    price: Set(new_product.price),
                    cost_price: Set(line.unit_cost),
                    quantity: Set(line.quantity),
                    weight_kg: Set(new_product.weight_kg),
                    brand_id: Set(brand_id),
                    category_id: Set(category_id),
                    images: Set(serde_json::json!([])),
                    is_active: Set(true),
                    created_at: NotSet,
                    updated_at: NotSet,
                }
                .insert(&txn)
                .await?
                .id
            }
            (None, None) => {
                return Err(AppError::BadRequest(
                    "each line needs exactly one of product_id and new_product".into(),
                ));
            }
        };

        SupplyDetailActive {
            id: Set(Uuid::new_v4()),
            supply_id: Set(supply.id),
            product_id: Set(product_id),
            quantity: Set(line.quantity),
            unit_cost: Set(line.unit_cost),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    tracing::info!(supply_id = %supply.id, lines = payload.lines.len(), total_cost, "supply recorded");
    audit::record(
        &state.pool,
        user.user_id,
        "supply_create",
        "supply",
        serde_json::json!({ "supply_id": supply.id, "total_cost": total_cost }),
    )
    .await;

    let detail = load_supply(state, supply.id).await?;
    Ok(ApiResponse::success("Supply recorded", detail, None))
}

pub async fn list_supplies(
    state: &AppState,
    user: &AuthUser,
    query: SupplyListQuery,
) -> AppResult<ApiResponse<SupplyList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(supplier_id) = query.supplier_id {
        condition = condition.add(SupplyCol::SupplierId.eq(supplier_id));
    }
    if let Some(from) = query.from {
        condition = condition.add(SupplyCol::ReceivedAt.gte(day_start(from)?));
    }
    if let Some(to) = query.to {
        condition = condition.add(SupplyCol::ReceivedAt.lt(day_end(to)?));
    }

    let finder = Supplies::find()
        .filter(condition)
        .order_by_desc(SupplyCol::ReceivedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(supply_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Supplies", SupplyList { items }, Some(meta)))
}

pub async fn get_supply(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SupplyDetail>> {
    ensure_staff(user)?;
    let detail = load_supply(state, id).await?;
    Ok(ApiResponse::success("Supply", detail, None))
}

async fn load_supply(state: &AppState, id: Uuid) -> AppResult<SupplyDetail> {
    let supply = Supplies::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let supplier = Suppliers::find_by_id(supply.supplier_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let lines = sqlx::query_as::<_, SupplyLine>(
        r#"
        SELECT sd.id, sd.product_id, p.name AS product_name, sd.quantity, sd.unit_cost
        FROM supply_details sd
        JOIN product p ON p.id = sd.product_id
        WHERE sd.supply_id = $1
        ORDER BY p.name
        "#,
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(SupplyDetail {
        supply: supply_from_entity(supply),
        supplier: supplier_from_entity(supplier),
        lines,
    })
}

fn supplier_from_entity(model: SupplierModel) -> Supplier {
    Supplier {
        id: model.id,
        name: model.name,
        contact_person: model.contact_person,
        phone: model.phone,
        email: model.email,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn supply_from_entity(model: SupplyModel) -> Supply {
    Supply {
        id: model.id,
        receipt_number: model.receipt_number,
        supplier_id: model.supplier_id,
        total_cost: model.total_cost,
        received_at: model.received_at.with_timezone(&Utc),
        created_by: model.created_by,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::supplies::NewSupplyProduct;

    fn existing_line(quantity: i32, unit_cost: i64) -> SupplyLineRequest {
        SupplyLineRequest {
            product_id: Some(Uuid::new_v4()),
            new_product: None,
            quantity,
            unit_cost,
        }
    }

    fn request(receipt: &str, lines: Vec<SupplyLineRequest>) -> CreateSupplyRequest {
        CreateSupplyRequest {
            receipt_number: receipt.into(),
            supplier_id: 1,
            received_at: None,
            lines,
        }
    }

    #[test]
    fn total_cost_sums_lines() {
        let payload = request(" OR-1001 ", vec![existing_line(10, 4_500), existing_line(2, 12_000)]);
        let (receipt, total) = validate_supply(&payload).unwrap();
        assert_eq!(receipt, "OR-1001");
        assert_eq!(total, 69_000);
    }

    #[test]
    fn blank_receipt_and_bad_lines_are_rejected() {
        assert!(validate_supply(&request("  ", vec![existing_line(1, 1)])).is_err());
        assert!(validate_supply(&request("OR-1", vec![])).is_err());
        assert!(validate_supply(&request("OR-1", vec![existing_line(0, 1)])).is_err());
        assert!(validate_supply(&request("OR-1", vec![existing_line(1, -1)])).is_err());
    }

    #[test]
    fn oversized_cost_is_rejected_instead_of_wrapping() {
        let one_line = request("OR-2", vec![existing_line(3, i64::MAX / 2)]);
        assert!(matches!(
            validate_supply(&one_line),
            Err(AppError::BadRequest(_))
        ));
        let two_lines = request(
            "OR-3",
            vec![existing_line(1, i64::MAX), existing_line(1, 1)],
        );
        assert!(matches!(
            validate_supply(&two_lines),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn line_needs_exactly_one_product_source() {
        let new_product = NewSupplyProduct {
            name: "Spark plug".into(),
            description: None,
            brand_name: Some("NGK".into()),
            category_name: Some("Ignition".into()),
            price: 35_000,
            weight_kg: 0.05,
        };
        let both = SupplyLineRequest {
            new_product: Some(new_product.clone()),
            ..existing_line(1, 100)
        };
        assert!(validate_supply(&request("OR-2", vec![both])).is_err());

        let neither = SupplyLineRequest {
            product_id: None,
            ..existing_line(1, 100)
        };
        assert!(validate_supply(&request("OR-2", vec![neither])).is_err());

        let fresh = SupplyLineRequest {
            product_id: None,
            new_product: Some(new_product),
            quantity: 4,
            unit_cost: 20_000,
        };
        assert!(validate_supply(&request("OR-2", vec![fresh])).is_ok());
    }
}
