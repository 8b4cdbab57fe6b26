use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::{is_transient, is_transient_sqlx};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Service Unavailable")]
    ServiceUnavailable,

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

/// JSON body of every non-2xx response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    pub message: String,
    pub error: String,
}

impl AppError {
    /// Status and client-facing detail. Database failures are reclassified by
    /// SQLSTATE so constraint violations surface as conflicts.
    pub fn classify(&self) -> (StatusCode, String) {
        match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "resource not found".into()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "insufficient role".into()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "database temporarily unavailable, please retry".into(),
            ),
            AppError::DbError(err) => classify_sqlx(err),
            AppError::OrmError(err) => classify_orm(err),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected server error".into(),
            ),
        }
    }
}

fn classify_sqlx(err: &sqlx::Error) -> (StatusCode, String) {
    if is_transient_sqlx(err) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "database temporarily unavailable, please retry".into(),
        );
    }
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "resource not found".into()),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => (StatusCode::CONFLICT, "record already exists".into()),
            Some(FOREIGN_KEY_VIOLATION) => (
                StatusCode::CONFLICT,
                "record is referenced by other data".into(),
            ),
            _ => internal(),
        },
        _ => internal(),
    }
}

fn classify_orm(err: &DbErr) -> (StatusCode, String) {
    if is_transient(err) {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            "database temporarily unavailable, please retry".into(),
        );
    }
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            (StatusCode::CONFLICT, "record already exists".into())
        }
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => (
            StatusCode::CONFLICT,
            "record is referenced by other data".into(),
        ),
        _ => match err {
            DbErr::RecordNotFound(_) => (StatusCode::NOT_FOUND, "resource not found".into()),
            _ => internal(),
        },
    }
}

fn internal() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "unexpected server error".into(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.classify();
        if status.is_server_error() {
            tracing::error!(error = ?self, status = %status, "request failed");
        }

        let body = ErrorBody {
            message: status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            error,
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{RuntimeErr, error::ConnAcquireErr};

    #[test]
    fn validation_and_conflict_statuses() {
        assert_eq!(
            AppError::BadRequest("quantity must be greater than 0".into())
                .classify()
                .0,
            StatusCode::BAD_REQUEST
        );
        let (status, msg) = AppError::Conflict("receipt number already used".into()).classify();
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(msg, "receipt number already used");
        assert_eq!(AppError::NotFound.classify().0, StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.classify().0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn transient_database_errors_map_to_503() {
        let err = AppError::OrmError(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout));
        assert_eq!(err.classify().0, StatusCode::SERVICE_UNAVAILABLE);
        let err = AppError::DbError(sqlx::Error::PoolClosed);
        assert_eq!(err.classify().0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = AppError::OrmError(DbErr::Query(RuntimeErr::Internal(
            "relation \"product\" does not exist".into(),
        )));
        let (status, msg) = err.classify();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!msg.contains("relation"));
    }
}
