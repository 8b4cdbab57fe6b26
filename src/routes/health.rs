use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthData {
    pub status: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Process is up", body = ApiResponse<HealthData>),
    ),
    tag = "Health"
)]
pub async fn health_check() -> Json<ApiResponse<HealthData>> {
    let data = HealthData {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Json(ApiResponse::success(
        "Health check",
        data,
        Some(Meta::empty()),
    ))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    responses(
        (status = 200, description = "Database reachable", body = ApiResponse<HealthData>),
        (status = 503, description = "Database unavailable", body = crate::error::ErrorBody),
    ),
    tag = "Health"
)]
pub async fn readiness(State(state): State<AppState>) -> AppResult<Json<ApiResponse<HealthData>>> {
    sqlx::query("SELECT 1")
        .execute(&state.pool)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "readiness probe failed");
            AppError::ServiceUnavailable
        })?;

    Ok(Json(ApiResponse::success(
        "Ready",
        HealthData {
            status: "ready".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        Some(Meta::empty()),
    )))
}
