use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sea_orm::ActiveValue::NotSet;

use crate::{
    audit,
    dto::couriers::{
        CourierList, CourierQuote, CreateCourierRequest, ShippingQuote, UpdateCourierRequest,
    },
    entity::courier::{ActiveModel, Column, Entity as Couriers, Model as CourierModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::Courier,
    money,
    response::{ApiResponse, Meta},
    services::cart_service,
    shipping::{self, CourierRates},
    state::AppState,
};

pub async fn list_couriers(state: &AppState) -> AppResult<ApiResponse<CourierList>> {
    let items: Vec<Courier> = Couriers::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(courier_from_entity)
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Couriers", CourierList { items }, Some(meta)))
}

/// Price the caller's cart with every active courier.
pub async fn shipping_quote(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ShippingQuote>> {
    let cart = cart_service::load_cart(&state.pool, user.user_id).await?;
    if cart.items.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let couriers = Couriers::find()
        .filter(Column::IsActive.eq(true))
        .order_by_asc(Column::BaseRate)
        .all(&state.orm)
        .await?;

    let quotes = couriers
        .into_iter()
        .map(|c| {
            let fee = shipping::shipping_fee(cart.total_weight_kg, &rates_of(&c)).amount();
            let total = fee.map(|f| money::add(f, cart.subtotal)).transpose()?;
            Ok(CourierQuote {
                capable: fee.is_some(),
                total,
                fee,
                courier: courier_from_entity(c),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Shipping quote",
        ShippingQuote {
            total_weight_kg: cart.total_weight_kg,
            subtotal: cart.subtotal,
            quotes,
        },
        None,
    ))
}

pub fn validate_rates(
    base_rate: Option<i64>,
    rate_per_kg: Option<i64>,
    max_weight_kg: Option<f64>,
) -> AppResult<()> {
    if base_rate.is_some_and(|r| r < 0) || rate_per_kg.is_some_and(|r| r < 0) {
        return Err(AppError::BadRequest("rates must not be negative".into()));
    }
    if max_weight_kg.is_some_and(|w| !w.is_finite() || w <= 0.0) {
        return Err(AppError::BadRequest(
            "max_weight_kg must be greater than 0".into(),
        ));
    }
    Ok(())
}

pub async fn create_courier(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCourierRequest,
) -> AppResult<ApiResponse<Courier>> {
    ensure_staff(user)?;
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("courier name is required".into()));
    }
    validate_rates(
        Some(payload.base_rate),
        Some(payload.rate_per_kg),
        Some(payload.max_weight_kg),
    )?;

    let courier = ActiveModel {
        id: NotSet,
        name: Set(name),
        base_rate: Set(payload.base_rate),
        rate_per_kg: Set(payload.rate_per_kg),
        max_weight_kg: Set(payload.max_weight_kg),
        is_active: Set(true),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "courier_create",
        "courier",
        serde_json::json!({ "courier_id": courier.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Courier created",
        courier_from_entity(courier),
        None,
    ))
}

pub async fn update_courier(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateCourierRequest,
) -> AppResult<ApiResponse<Courier>> {
    ensure_staff(user)?;
    validate_rates(payload.base_rate, payload.rate_per_kg, payload.max_weight_kg)?;

    let existing = match Couriers::find_by_id(id).one(&state.orm).await? {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::BadRequest("courier name is required".into()));
        }
        active.name = Set(name);
    }
    if let Some(base_rate) = payload.base_rate {
        active.base_rate = Set(base_rate);
    }
    if let Some(rate_per_kg) = payload.rate_per_kg {
        active.rate_per_kg = Set(rate_per_kg);
    }
    if let Some(max_weight_kg) = payload.max_weight_kg {
        active.max_weight_kg = Set(max_weight_kg);
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    let courier = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "courier_update",
        "courier",
        serde_json::json!({ "courier_id": courier.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Courier updated",
        courier_from_entity(courier),
        None,
    ))
}

pub(crate) fn rates_of(model: &CourierModel) -> CourierRates {
    CourierRates {
        base_rate: model.base_rate,
        rate_per_kg: model.rate_per_kg,
        max_weight_kg: model.max_weight_kg,
    }
}

fn courier_from_entity(model: CourierModel) -> Courier {
    Courier {
        id: model.id,
        name: model.name,
        base_rate: model.base_rate,
        rate_per_kg: model.rate_per_kg,
        max_weight_kg: model.max_weight_kg,
        is_active: model.is_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_must_be_sane() {
        assert!(validate_rates(Some(0), Some(0), Some(0.5)).is_ok());
        assert!(validate_rates(Some(-1), None, None).is_err());
        assert!(validate_rates(None, Some(-5), None).is_err());
        assert!(validate_rates(None, None, Some(0.0)).is_err());
        assert!(validate_rates(None, None, None).is_ok());
    }
}
