use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use std::collections::HashSet;
use uuid::Uuid;

use crate::{
    audit,
    car_model_name::{ModelName, normalize_whitespace, parse_model_name},
    db::{DbPool, OrmConn},
    dto::{
        compatibility::{
            CompatibilityEntry, CompatibilityList, CreateMakeRequest, CreateModelRequest,
            MakeList, ModelList, SetCompatibilityRequest,
        },
        products::ProductList,
    },
    entity::{
        car_models::{
            ActiveModel as ModelActive, Column as ModelCol, Entity as CarModels,
            Model as CarModelModel,
        },
        cars::{ActiveModel as MakeActive, Column as MakeCol, Entity as Cars, Model as MakeModel},
        product::Entity as Products,
        product_car_compatibility::{
            ActiveModel as CompatActive, Column as CompatCol, Entity as Compat,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{CarMake, CarModel, Compatibility},
    response::ApiResponse,
    routes::params::{ProductQuery, YearQuery},
    services::product_service,
    state::AppState,
};

pub const MIN_MODEL_YEAR: i32 = 1950;
pub const MAX_MODEL_YEAR: i32 = 2100;

pub async fn list_makes(state: &AppState) -> AppResult<ApiResponse<MakeList>> {
    let items = Cars::find()
        .order_by_asc(MakeCol::Make)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(make_from_entity)
        .collect();
    Ok(ApiResponse::success("Makes", MakeList { items }, None))
}

pub async fn create_make(
    state: &AppState,
    user: &AuthUser,
    payload: CreateMakeRequest,
) -> AppResult<ApiResponse<CarMake>> {
    ensure_staff(user)?;
    let make = normalize_whitespace(&payload.make);
    if make.is_empty() {
        return Err(AppError::BadRequest("make is required".into()));
    }
    let exists = Cars::find()
        .filter(MakeCol::Make.eq(make.as_str()))
        .one(&state.orm)
        .await?;
    if exists.is_some() {
        return Err(AppError::Conflict(format!("make '{make}' already exists")));
    }

    let created = MakeActive {
        id: NotSet,
        make: Set(make),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "car_make_create",
        "cars",
        serde_json::json!({ "car_id": created.id }),
    )
    .await;
    Ok(ApiResponse::success("Make created", make_from_entity(created), None))
}

pub async fn list_models(state: &AppState, car_id: i32) -> AppResult<ApiResponse<ModelList>> {
    if Cars::find_by_id(car_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let items = CarModels::find()
        .filter(ModelCol::CarId.eq(car_id))
        .order_by_asc(ModelCol::BaseModel)
        .order_by_asc(ModelCol::Variant)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(model_from_entity)
        .collect();
    Ok(ApiResponse::success("Models", ModelList { items }, None))
}

/// Resolve the request into base model and variant. A free-text name is
/// split using the names of the make's existing models.
pub fn resolve_model_name(
    payload: &CreateModelRequest,
    siblings: &[String],
) -> AppResult<ModelName> {
    let explicit = payload
        .base_model
        .as_deref()
        .map(normalize_whitespace)
        .filter(|b| !b.is_empty());

    let parsed = match (explicit, payload.name.as_deref()) {
        (Some(base_model), _) => ModelName {
            base_model,
            variant: payload
                .variant
                .as_deref()
                .map(normalize_whitespace)
                .filter(|v| !v.is_empty()),
        },
        (None, Some(name)) if !name.trim().is_empty() => parse_model_name(name, siblings),
        _ => {
            return Err(AppError::BadRequest(
                "either base_model or name is required".into(),
            ));
        }
    };
    Ok(parsed)
}

pub async fn create_model(
    state: &AppState,
    user: &AuthUser,
    car_id: i32,
    payload: CreateModelRequest,
) -> AppResult<ApiResponse<CarModel>> {
    ensure_staff(user)?;
    if Cars::find_by_id(car_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = CarModels::find()
        .filter(ModelCol::CarId.eq(car_id))
        .all(&state.orm)
        .await?;
    let siblings: Vec<String> = existing.iter().map(CarModelModel::display_name).collect();
    let name = resolve_model_name(&payload, &siblings)?;

    let duplicate = existing
        .iter()
        .any(|m| m.base_model.eq_ignore_ascii_case(&name.base_model) && m.variant == name.variant);
    if duplicate {
        return Err(AppError::Conflict("model already exists for this make".into()));
    }

    let created = ModelActive {
        id: NotSet,
        car_id: Set(car_id),
        base_model: Set(name.base_model),
        variant: Set(name.variant),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "car_model_create",
        "car_models",
        serde_json::json!({ "car_model_id": created.id, "car_id": car_id }),
    )
    .await;
    tracing::info!(car_model_id = created.id, name = %created.display_name(), "car model created");

    Ok(ApiResponse::success("Model created", model_from_entity(created), None))
}

pub async fn products_for_model(
    state: &AppState,
    car_model_id: i32,
    query: YearQuery,
) -> AppResult<ApiResponse<ProductList>> {
    if CarModels::find_by_id(car_model_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let product_query = ProductQuery {
        page: query.page,
        per_page: query.per_page,
        car_model_id: Some(car_model_id),
        year: query.year,
        ..Default::default()
    };
    product_service::list_products(state, product_query, false).await
}

pub async fn compatibility_for_product(
    pool: &DbPool,
    product_id: Uuid,
) -> AppResult<Vec<Compatibility>> {
    let rows = sqlx::query_as::<_, Compatibility>(
        r#"
        SELECT pc.id, pc.car_model_id, c.make, cm.base_model, cm.variant,
               pc.year_from, pc.year_to
        FROM product_car_compatibility pc
        JOIN car_models cm ON cm.id = pc.car_model_id
        JOIN cars c ON c.id = cm.car_id
        WHERE pc.product_id = $1
        ORDER BY c.make, cm.base_model, cm.variant NULLS FIRST, pc.year_from
        "#,
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn get_product_compatibility(
    state: &AppState,
    product_id: Uuid,
) -> AppResult<ApiResponse<CompatibilityList>> {
    if Products::find_by_id(product_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let items = compatibility_for_product(&state.pool, product_id).await?;
    Ok(ApiResponse::success(
        "Compatibility",
        CompatibilityList { items },
        None,
    ))
}

pub fn validate_entries(entries: &[CompatibilityEntry]) -> AppResult<()> {
    for entry in entries {
        let years = MIN_MODEL_YEAR..=MAX_MODEL_YEAR;
        if !years.contains(&entry.year_from) || !years.contains(&entry.year_to) {
            return Err(AppError::BadRequest(format!(
                "years must be between {MIN_MODEL_YEAR} and {MAX_MODEL_YEAR}"
            )));
        }
        if entry.year_from > entry.year_to {
            return Err(AppError::BadRequest(
                "year_from must not be after year_to".into(),
            ));
        }
    }
    Ok(())
}

/// Replace the whole compatibility set of a product in one transaction.
pub async fn set_product_compatibility(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: SetCompatibilityRequest,
) -> AppResult<ApiResponse<CompatibilityList>> {
    ensure_staff(user)?;
    validate_entries(&payload.entries)?;

    let txn = state.orm.begin().await?;
    if Products::find_by_id(product_id).one(&txn).await?.is_none() {
        return Err(AppError::NotFound);
    }

    for entry in &payload.entries {
        if CarModels::find_by_id(entry.car_model_id).one(&txn).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "car model {} does not exist",
                entry.car_model_id
            )));
        }
    }

    Compat::delete_many()
        .filter(CompatCol::ProductId.eq(product_id))
        .exec(&txn)
        .await?;

    for entry in &payload.entries {
        CompatActive {
            id: NotSet,
            product_id: Set(product_id),
            car_model_id: Set(entry.car_model_id),
            year_from: Set(entry.year_from),
            year_to: Set(entry.year_to),
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_compatibility_set",
        "product_car_compatibility",
        serde_json::json!({ "product_id": product_id, "entries": payload.entries.len() }),
    )
    .await;

    let items = compatibility_for_product(&state.pool, product_id).await?;
    Ok(ApiResponse::success(
        "Compatibility updated",
        CompatibilityList { items },
        None,
    ))
}

/// Pick the rows that still hold a whole name in `base_model` and split
/// them the way a newly entered name would be. A split that would collide
/// with a model already on the make is skipped.
pub fn plan_model_backfill(models: &[CarModelModel]) -> Vec<(i32, ModelName)> {
    let mut taken: HashSet<(i32, String, Option<String>)> = models
        .iter()
        .map(|m| (m.car_id, m.base_model.to_lowercase(), m.variant.clone()))
        .collect();

    let mut plan = Vec::new();
    for model in models.iter().filter(|m| m.variant.is_none()) {
        let siblings: Vec<String> = models
            .iter()
            .filter(|m| m.car_id == model.car_id && m.id != model.id)
            .map(CarModelModel::display_name)
            .collect();
        let parsed = parse_model_name(&model.base_model, &siblings);
        if parsed.variant.is_none() {
            continue;
        }
        let key = (
            model.car_id,
            parsed.base_model.to_lowercase(),
            parsed.variant.clone(),
        );
        if taken.insert(key) {
            plan.push((model.id, parsed));
        }
    }
    plan
}

/// Rewrite legacy combined model names into base model and variant.
/// Returns how many rows were split.
pub async fn backfill_model_names(conn: &OrmConn) -> AppResult<usize> {
    let txn = conn.begin().await?;
    let models = CarModels::find()
        .order_by_asc(ModelCol::Id)
        .all(&txn)
        .await?;
    let plan = plan_model_backfill(&models);

    for (id, name) in &plan {
        ModelActive {
            id: Set(*id),
            car_id: NotSet,
            base_model: Set(name.base_model.clone()),
            variant: Set(name.variant.clone()),
        }
        .update(&txn)
        .await?;
        tracing::debug!(car_model_id = *id, base_model = %name.base_model, "model name split");
    }
    txn.commit().await?;

    tracing::info!(split = plan.len(), scanned = models.len(), "model name backfill done");
    Ok(plan.len())
}

fn make_from_entity(model: MakeModel) -> CarMake {
    CarMake {
        id: model.id,
        make: model.make,
    }
}

fn model_from_entity(model: CarModelModel) -> CarModel {
    let name = model.display_name();
    CarModel {
        id: model.id,
        car_id: model.car_id,
        base_model: model.base_model,
        variant: model.variant,
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_fields_take_precedence_over_name() {
        let payload = CreateModelRequest {
            name: Some("ignored name".into()),
            base_model: Some(" Hilux ".into()),
            variant: Some("  ".into()),
        };
        let name = resolve_model_name(&payload, &[]).unwrap();
        assert_eq!(name.base_model, "Hilux");
        assert_eq!(name.variant, None);
    }

    #[test]
    fn free_text_name_uses_siblings() {
        let payload = CreateModelRequest {
            name: Some("Land Cruiser Prado".into()),
            ..Default::default()
        };
        let siblings = vec!["Land Cruiser 200".to_string()];
        let name = resolve_model_name(&payload, &siblings).unwrap();
        assert_eq!(name.base_model, "Land Cruiser");
        assert_eq!(name.variant.as_deref(), Some("Prado"));
    }

    fn row(id: i32, car_id: i32, base_model: &str, variant: Option<&str>) -> CarModelModel {
        CarModelModel {
            id,
            car_id,
            base_model: base_model.into(),
            variant: variant.map(Into::into),
        }
    }

    #[test]
    fn backfill_splits_only_combined_names() {
        let models = vec![
            row(1, 1, "Vios - 1.3 XLE", None),
            row(2, 1, "Innova", None),
            row(3, 1, "Hilux", Some("Conquest")),
            row(4, 2, "Civic (FD) 2006", None),
        ];
        let plan = plan_model_backfill(&models);
        let ids: Vec<i32> = plan.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![1, 4]);
        assert_eq!(plan[0].1.base_model, "Vios");
        assert_eq!(plan[0].1.variant.as_deref(), Some("1.3 XLE"));
        assert_eq!(plan[1].1.variant.as_deref(), Some("FD 2006"));
    }

    #[test]
    fn backfill_skips_splits_that_would_collide() {
        let models = vec![
            row(1, 1, "Vios", Some("1.3 XLE")),
            row(2, 1, "Vios - 1.3 XLE", None),
            row(3, 2, "Vios - 1.3 XLE", None),
        ];
        let plan = plan_model_backfill(&models);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].0, 3);
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(resolve_model_name(&CreateModelRequest::default(), &[]).is_err());
    }

    #[test]
    fn year_ranges_are_checked() {
        let ok = CompatibilityEntry {
            car_model_id: 1,
            year_from: 2005,
            year_to: 2015,
        };
        assert!(validate_entries(&[ok.clone()]).is_ok());
        let inverted = CompatibilityEntry {
            year_from: 2016,
            ..ok.clone()
        };
        assert!(validate_entries(&[inverted]).is_err());
        let ancient = CompatibilityEntry {
            year_from: 1900,
            ..ok
        };
        assert!(validate_entries(&[ancient]).is_err());
    }
}
