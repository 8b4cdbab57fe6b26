use std::time::Duration;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, Func, Query};
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    db::retry_transient,
    dto::products::{
        BrandList, CategoryList, CreateProductRequest, NameRequest, ProductDetail, ProductList,
        UpdateProductRequest,
    },
    entity::{
        brand::{ActiveModel as BrandActive, Column as BrandCol, Entity as Brands, Model as BrandModel},
        category::{
            ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories,
            Model as CategoryModel,
        },
        product::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        product_car_compatibility::{Column as CompatCol, Entity as Compat},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Brand, Category, Compatibility, Product},
    response::{ApiResponse, Meta},
    routes::params::{Paged, ProductQuery, ProductSortBy, SortOrder},
    services::compatibility_service,
    state::AppState,
};

/// Storefront listing hides inactive products and cost prices; the staff
/// listing shows both.
pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
    staff_view: bool,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if !staff_view {
        condition = condition.add(Column::IsActive.eq(true));
    }

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(brand_id) = query.brand_id {
        condition = condition.add(Column::BrandId.eq(brand_id));
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if query.in_stock.unwrap_or(false) {
        condition = condition.add(Column::Quantity.gt(0));
    }

    if let Some(car_model_id) = query.car_model_id {
        let mut fits = Query::select();
        fits.column(CompatCol::ProductId)
            .from(Compat)
            .and_where(CompatCol::CarModelId.eq(car_model_id));
        if let Some(year) = query.year {
            fits.and_where(CompatCol::YearFrom.lte(year))
                .and_where(CompatCol::YearTo.gte(year));
        }
        condition = condition.add(Column::Id.in_subquery(fits.to_owned()));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
        ProductSortBy::Quantity => Column::Quantity,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let delay = Duration::from_millis(state.config.db_retry_delay_ms);
    let total = retry_transient(delay, || finder.clone().count(&state.orm)).await? as i64;

    let items = retry_transient(delay, || {
        finder
            .clone()
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&state.orm)
    })
    .await?
    .into_iter()
    .map(|p| product_from_entity(p, staff_view))
    .collect();

    let meta = Meta::new(page, limit, total);
    let data = ProductList { items };
    Ok(ApiResponse::success("Products", data, Some(meta)))
}

pub async fn get_product(
    state: &AppState,
    id: Uuid,
    staff_view: bool,
) -> AppResult<ApiResponse<ProductDetail>> {
    let delay = Duration::from_millis(state.config.db_retry_delay_ms);
    let result = retry_transient(delay, || Products::find_by_id(id).one(&state.orm)).await?;
    let product = match result {
        Some(p) if p.is_active || staff_view => p,
        _ => return Err(AppError::NotFound),
    };

    let brand = match product.brand_id {
        Some(brand_id) => Brands::find_by_id(brand_id)
            .one(&state.orm)
            .await?
            .map(brand_from_entity),
        None => None,
    };
    let category = match product.category_id {
        Some(category_id) => Categories::find_by_id(category_id)
            .one(&state.orm)
            .await?
            .map(category_from_entity),
        None => None,
    };
    let compatibility: Vec<Compatibility> =
        compatibility_service::compatibility_for_product(&state.pool, product.id).await?;

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product_from_entity(product, staff_view),
            brand,
            category,
            compatibility,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("product name is required".into()));
    }
    validate_amounts(
        Some(payload.price),
        Some(payload.cost_price),
        Some(payload.quantity),
        Some(payload.weight_kg),
    )?;
    ensure_refs_exist(&state.orm, payload.brand_id, payload.category_id).await?;

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price),
        cost_price: Set(payload.cost_price),
        quantity: Set(payload.quantity),
        weight_kg: Set(payload.weight_kg),
        brand_id: Set(payload.brand_id),
        category_id: Set(payload.category_id),
        images: Set(serde_json::json!(payload.images)),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "product",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product, true),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_staff(user)?;
    validate_amounts(
        payload.price,
        payload.cost_price,
        payload.quantity,
        payload.weight_kg,
    )?;
    ensure_refs_exist(&state.orm, payload.brand_id, payload.category_id).await?;

    let existing = Products::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::BadRequest("product name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(cost_price) = payload.cost_price {
        active.cost_price = Set(cost_price);
    }
    if let Some(quantity) = payload.quantity {
        active.quantity = Set(quantity);
    }
    if let Some(weight_kg) = payload.weight_kg {
        active.weight_kg = Set(weight_kg);
    }
    if let Some(brand_id) = payload.brand_id {
        active.brand_id = Set(Some(brand_id));
    }
    if let Some(category_id) = payload.category_id {
        active.category_id = Set(Some(category_id));
    }
    if let Some(images) = payload.images {
        active.images = Set(serde_json::json!(images));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "product",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product, true),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = Products::delete_by_id(id)
        .exec(&state.orm)
        .await
        .map_err(|err| match err.sql_err() {
            Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(
                "product has sales or supply records; deactivate it instead".into(),
            ),
            _ => err.into(),
        })?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "product",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_brands(state: &AppState) -> AppResult<ApiResponse<BrandList>> {
    let items: Vec<Brand> = Brands::find()
        .order_by_asc(BrandCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(brand_from_entity)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Brands", BrandList { items }, Some(meta)))
}

pub async fn create_brand(
    state: &AppState,
    user: &AuthUser,
    payload: NameRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_staff(user)?;
    let name = required_name(&payload.name)?;
    if find_brand_by_name(&state.orm, &name).await?.is_some() {
        return Err(AppError::Conflict(format!("brand '{name}' already exists")));
    }
    let brand = BrandActive {
        id: NotSet,
        name: Set(name),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "brand_create",
        "brand",
        serde_json::json!({ "brand_id": brand.id }),
    )
    .await;
    Ok(ApiResponse::success("Brand created", brand_from_entity(brand), None))
}

pub async fn rename_brand(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: NameRequest,
) -> AppResult<ApiResponse<Brand>> {
    ensure_staff(user)?;
    let name = required_name(&payload.name)?;
    let existing = match Brands::find_by_id(id).one(&state.orm).await? {
        Some(b) => b,
        None => return Err(AppError::NotFound),
    };
    let mut active: BrandActive = existing.into();
    active.name = Set(name);
    let brand = active.update(&state.orm).await?;
    Ok(ApiResponse::success("Brand updated", brand_from_entity(brand), None))
}

pub async fn delete_brand(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = Brands::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    audit::record(
        &state.pool,
        user.user_id,
        "brand_delete",
        "brand",
        serde_json::json!({ "brand_id": id }),
    )
    .await;
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<Category> = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(meta),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: NameRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_staff(user)?;
    let name = required_name(&payload.name)?;
    if find_category_by_name(&state.orm, &name).await?.is_some() {
        return Err(AppError::Conflict(format!("category '{name}' already exists")));
    }
    let category = CategoryActive {
        id: NotSet,
        name: Set(name),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "category_create",
        "category",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;
    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        None,
    ))
}

pub async fn rename_category(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: NameRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_staff(user)?;
    let name = required_name(&payload.name)?;
    let existing = match Categories::find_by_id(id).one(&state.orm).await? {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };
    let mut active: CategoryActive = existing.into();
    active.name = Set(name);
    let category = active.update(&state.orm).await?;
    Ok(ApiResponse::success(
        "Category updated",
        category_from_entity(category),
        None,
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_staff(user)?;
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    audit::record(
        &state.pool,
        user.user_id,
        "category_delete",
        "category",
        serde_json::json!({ "category_id": id }),
    )
    .await;
    Ok(ApiResponse::success("Deleted", serde_json::json!({}), None))
}

/// Look a brand up by case-insensitive name, inserting it when missing.
pub(crate) async fn upsert_brand<C: ConnectionTrait>(conn: &C, name: &str) -> AppResult<i32> {
    let name = required_name(name)?;
    if let Some(existing) = find_brand_by_name(conn, &name).await? {
        return Ok(existing.id);
    }
    let brand = BrandActive {
        id: NotSet,
        name: Set(name),
    }
    .insert(conn)
    .await?;
    Ok(brand.id)
}

pub(crate) async fn upsert_category<C: ConnectionTrait>(conn: &C, name: &str) -> AppResult<i32> {
    let name = required_name(name)?;
    if let Some(existing) = find_category_by_name(conn, &name).await? {
        return Ok(existing.id);
    }
    let category = CategoryActive {
        id: NotSet,
        name: Set(name),
    }
    .insert(conn)
    .await?;
    Ok(category.id)
}

async fn find_brand_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> AppResult<Option<BrandModel>> {
    Ok(Brands::find()
        .filter(Expr::expr(Func::lower(Expr::col(BrandCol::Name))).eq(name.to_lowercase()))
        .one(conn)
        .await?)
}

async fn find_category_by_name<C: ConnectionTrait>(
    conn: &C,
    name: &str,
) -> AppResult<Option<CategoryModel>> {
    Ok(Categories::find()
        .filter(Expr::expr(Func::lower(Expr::col(CategoryCol::Name))).eq(name.to_lowercase()))
        .one(conn)
        .await?)
}

async fn ensure_refs_exist<C: ConnectionTrait>(
    conn: &C,
    brand_id: Option<i32>,
    category_id: Option<i32>,
) -> AppResult<()> {
    if let Some(brand_id) = brand_id {
        if Brands::find_by_id(brand_id).one(conn).await?.is_none() {
            return Err(AppError::BadRequest(format!("brand {brand_id} does not exist")));
        }
    }
    if let Some(category_id) = category_id {
        if Categories::find_by_id(category_id).one(conn).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "category {category_id} does not exist"
            )));
        }
    }
    Ok(())
}

fn required_name(name: &str) -> AppResult<String> {
    let name = crate::car_model_name::normalize_whitespace(name);
    if name.is_empty() {
        return Err(AppError::BadRequest("name is required".into()));
    }
    Ok(name)
}

pub fn validate_amounts(
    price: Option<i64>,
    cost_price: Option<i64>,
    quantity: Option<i32>,
    weight_kg: Option<f64>,
) -> AppResult<()> {
    if price.is_some_and(|p| p < 0) || cost_price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("prices must not be negative".into()));
    }
    if quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }
    if weight_kg.is_some_and(|w| !w.is_finite() || w <= 0.0) {
        return Err(AppError::BadRequest("weight must be greater than 0".into()));
    }
    Ok(())
}

pub(crate) fn product_from_entity(model: ProductModel, staff_view: bool) -> Product {
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        cost_price: staff_view.then_some(model.cost_price),
        quantity: model.quantity,
        weight_kg: model.weight_kg,
        brand_id: model.brand_id,
        category_id: model.category_id,
        images: serde_json::from_value(model.images).unwrap_or_default(),
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn brand_from_entity(model: BrandModel) -> Brand {
    Brand {
        id: model.id,
        name: model.name,
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_are_validated() {
        assert!(validate_amounts(Some(0), Some(0), Some(0), Some(0.2)).is_ok());
        assert!(validate_amounts(Some(-1), None, None, None).is_err());
        assert!(validate_amounts(None, None, Some(-3), None).is_err());
        assert!(validate_amounts(None, None, None, Some(0.0)).is_err());
        assert!(validate_amounts(None, None, None, Some(f64::NAN)).is_err());
        assert!(validate_amounts(None, None, None, None).is_ok());
    }

    #[test]
    fn names_are_trimmed_and_required() {
        assert_eq!(required_name("  Denso   Spark ").unwrap(), "Denso Spark");
        assert!(required_name("   ").is_err());
    }
}
