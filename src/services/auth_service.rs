use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    db::retry_transient,
    dto::auth::{Claims, LoginRequest, LoginResponse, RegisterRequest},
    entity::user_employee::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Role, User},
    password::{HashFormat, hash_password, verify_password},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Insert an account after the caller has validated input. Shared by
/// self-registration and staff account creation.
pub(crate) async fn create_account(
    state: &AppState,
    email: String,
    password: &str,
    first_name: String,
    last_name: String,
    phone: Option<String>,
    role: Role,
) -> AppResult<UserModel> {
    let exist = Users::find()
        .filter(UserCol::Email.eq(email.as_str()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::Conflict("Email is already taken".to_string()));
    }
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(AppError::BadRequest("first and last name are required".into()));
    }

    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(password)?),
        first_name: Set(first_name.trim().to_string()),
        last_name: Set(last_name.trim().to_string()),
        phone: Set(phone.filter(|p| !p.trim().is_empty())),
        role_id: Set(role.id()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user)
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    let RegisterRequest {
        email,
        password,
        first_name,
        last_name,
        phone,
    } = payload;
    let email = normalize_email(&email);
    validate_credentials(&email, &password)?;

    let user = create_account(
        state,
        email,
        &password,
        first_name,
        last_name,
        phone,
        Role::Customer,
    )
    .await?;

    audit::record(
        &state.pool,
        user.id,
        "user_register",
        "user_employee",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "customer registered");

    Ok(ApiResponse::success("User created", user_from_entity(user)?, None))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let email = normalize_email(&email);
    let delay = StdDuration::from_millis(state.config.db_retry_delay_ms);

    let user = retry_transient(delay, || {
        Users::find()
            .filter(UserCol::Email.eq(email.as_str()))
            .one(&state.orm)
    })
    .await?;

    let user = match user {
        Some(u) if u.is_active => u,
        _ => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let user = if HashFormat::detect(&user.password_hash).is_legacy() {
        upgrade_password_hash(state, user, &password).await?
    } else {
        user
    };

    let role = Role::from_id(user.role_id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown role id {}", user.role_id)))?;
    let token = issue_token(&state.config.jwt_secret, state.config.jwt_ttl_hours, user.id, role)?;

    audit::record(
        &state.pool,
        user.id,
        "user_login",
        "user_employee",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {}", token),
            user: user_from_entity(user)?,
        },
        Some(Meta::empty()),
    ))
}

pub async fn me(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let account = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let account = match account {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Current user", user_from_entity(account)?, None))
}

pub fn issue_token(secret: &str, ttl_hours: i64, user_id: Uuid, role: Role) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

async fn upgrade_password_hash(
    state: &AppState,
    user: UserModel,
    password: &str,
) -> AppResult<UserModel> {
    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(password)?);
    let user = active.update(&state.orm).await?;
    tracing::info!(user_id = %user_id, "legacy password hash upgraded");
    Ok(user)
}

pub(crate) fn user_from_entity(model: UserModel) -> AppResult<User> {
    let role = Role::from_id(model.role_id)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("unknown role id {}", model.role_id)))?;
    Ok(User {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        phone: model.phone,
        role,
        is_active: model.is_active,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    #[test]
    fn emails_are_case_insensitive() {
        assert_eq!(normalize_email("  Juan@Example.COM "), "juan@example.com");
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_credentials("a@b.ph", "short").is_err());
        assert!(validate_credentials("not-an-email", "longenough").is_err());
        assert!(validate_credentials("a@b.ph", "longenough").is_ok());
    }

    #[test]
    fn issued_token_decodes_to_same_user() {
        let id = Uuid::new_v4();
        let token = issue_token("k", 1, id, Role::Customer).unwrap();
        let user = decode_token(&token, "k").unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.role, Role::Customer);
    }
}
