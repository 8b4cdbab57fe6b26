use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, models::Role, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

/// Back-office access: admins and employees.
pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.role.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn decode_token(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
    let role = Role::parse(&decoded.claims.role)
        .ok_or_else(|| AppError::Unauthorized("Invalid role in token".into()))?;

    Ok(AuthUser { user_id, role })
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?
            .trim();

        let claimed = decode_token(token, &state.config.jwt_secret)?;
        refresh_from_store(state, claimed).await
    }
}

/// Tokens outlive role changes and deactivation, so the account row decides.
async fn refresh_from_store(state: &AppState, claimed: AuthUser) -> Result<AuthUser, AppError> {
    let row: Option<(i32, bool)> =
        sqlx::query_as("SELECT role_id, is_active FROM user_employee WHERE id = $1")
            .bind(claimed.user_id)
            .fetch_optional(&state.pool)
            .await?;
    match row {
        Some((role_id, true)) => {
            let role = Role::from_id(role_id)
                .ok_or_else(|| AppError::Unauthorized("Unknown role".into()))?;
            Ok(AuthUser {
                user_id: claimed.user_id,
                role,
            })
        }
        _ => Err(AppError::Unauthorized("Account is not active".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn token(role: &str, exp: usize) -> String {
        let claims = Claims {
            sub: Uuid::nil().to_string(),
            role: role.into(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        (chrono::Utc::now().timestamp() + 3600) as usize
    }

    #[test]
    fn valid_token_yields_user() {
        let user = decode_token(&token("employee", far_future()), "test-secret").unwrap();
        assert_eq!(user.role, Role::Employee);
        assert!(ensure_staff(&user).is_ok());
        assert!(matches!(ensure_admin(&user), Err(AppError::Forbidden)));
    }

    #[test]
    fn wrong_secret_or_expired_token_is_unauthorized() {
        assert!(matches!(
            decode_token(&token("admin", far_future()), "other-secret"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            decode_token(&token("admin", 1), "test-secret"),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(decode_token(&token("root", far_future()), "test-secret").is_err());
    }
}
