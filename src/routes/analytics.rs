use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::analytics::{DashboardCounts, SalesSummary, SupplySummary},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::DateRangeQuery,
    services::analytics_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics/sales", get(sales_summary))
        .route("/analytics/supplies", get(supply_summary))
        .route("/analytics/dashboard", get(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/sales",
    params(
        ("from" = Option<String>, Query, description = "First day, YYYY-MM-DD; default 29 days before 'to'"),
        ("to" = Option<String>, Query, description = "Last day, YYYY-MM-DD; default today")
    ),
    responses(
        (status = 200, description = "Totals, daily series and top products", body = ApiResponse<SalesSummary>),
        (status = 400, description = "'from' after 'to'"),
    ),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<ApiResponse<SalesSummary>>> {
    Ok(Json(analytics_service::sales_summary(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/supplies",
    params(
        ("from" = Option<String>, Query, description = "First day, YYYY-MM-DD"),
        ("to" = Option<String>, Query, description = "Last day, YYYY-MM-DD")
    ),
    responses((status = 200, description = "Supply spend by supplier", body = ApiResponse<SupplySummary>)),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn supply_summary(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> AppResult<Json<ApiResponse<SupplySummary>>> {
    Ok(Json(analytics_service::supply_summary(&state, &user, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/admin/analytics/dashboard",
    responses((status = 200, description = "Headline counts", body = ApiResponse<DashboardCounts>)),
    security(("bearer_auth" = [])),
    tag = "Analytics"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<DashboardCounts>>> {
    Ok(Json(analytics_service::dashboard(&state, &user).await?))
}
