use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use uuid::Uuid;

use crate::{
    audit,
    dto::users::{ChangeRoleRequest, CreateStaffRequest, SetActiveRequest, UserList},
    entity::user_employee::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Role, User},
    response::{ApiResponse, Meta},
    routes::params::{Paged, UserListQuery},
    services::auth_service::{self, normalize_email, user_from_entity, validate_credentials},
    state::AppState,
};

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: UserListQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(role) = query.role.as_deref().filter(|r| !r.is_empty()) {
        let role = parse_role(role)?;
        condition = condition.add(UserCol::RoleId.eq(role.id()));
    }
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(UserCol::Email).ilike(format!("%{search}%")));
    }

    let finder = Users::find()
        .filter(condition)
        .order_by_desc(UserCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(user_from_entity)
        .collect::<AppResult<Vec<User>>>()?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Users", UserList { items }, Some(meta)))
}

pub async fn create_staff(
    state: &AppState,
    user: &AuthUser,
    payload: CreateStaffRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let role = match payload.role.as_deref() {
        Some(role) => parse_role(role)?,
        None => Role::Employee,
    };
    if !role.is_staff() {
        return Err(AppError::BadRequest(
            "staff accounts must be admin or employee".into(),
        ));
    }

    let email = normalize_email(&payload.email);
    validate_credentials(&email, &payload.password)?;
    let created = auth_service::create_account(
        state,
        email,
        &payload.password,
        payload.first_name,
        payload.last_name,
        payload.phone,
        role,
    )
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "staff_create",
        "user_employee",
        serde_json::json!({ "user_id": created.id, "role": role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Account created",
        user_from_entity(created)?,
        None,
    ))
}

pub async fn change_role(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ChangeRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let role = parse_role(&payload.role)?;
    if id == user.user_id && role != Role::Admin {
        return Err(AppError::BadRequest("you cannot demote yourself".into()));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: UserActive = existing.into();
    active.role_id = Set(role.id());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "role_change",
        "user_employee",
        serde_json::json!({ "user_id": id, "role": role.as_str() }),
    )
    .await;

    Ok(ApiResponse::success("Role updated", user_from_entity(updated)?, None))
}

pub async fn set_active(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: SetActiveRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    if id == user.user_id && !payload.is_active {
        return Err(AppError::BadRequest(
            "you cannot deactivate your own account".into(),
        ));
    }

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: UserActive = existing.into();
    active.is_active = Set(payload.is_active);
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        if payload.is_active { "user_activate" } else { "user_deactivate" },
        "user_employee",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success("Account updated", user_from_entity(updated)?, None))
}

fn parse_role(value: &str) -> AppResult<Role> {
    Role::parse(value.trim())
        .ok_or_else(|| AppError::BadRequest(format!("unknown role '{value}'")))
}
