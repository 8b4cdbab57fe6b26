use autoparts_api::{
    config::AppConfig,
    routes::{build_app, health::health_check},
    state::AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

fn lazy_state() -> AppState {
    let config = AppConfig {
        database_url: "postgres://localhost/autoparts_unused".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        db_max_connections: 1,
        db_retry_delay_ms: 0,
        cors_origins: Vec::new(),
    };
    // Never connects unless a handler touches the database.
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .expect("valid url");
    AppState::new(pool, config)
}

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
}

#[tokio::test]
async fn health_route_answers_without_database() {
    let app = build_app(lazy_state());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn unknown_route_is_a_json_404() {
    let app = build_app(lazy_state());
    let response = app
        .oneshot(Request::get("/no/such/route").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body.get("message").is_some());
}

#[tokio::test]
async fn protected_route_without_token_is_401() {
    let app = build_app(lazy_state());
    let response = app
        .oneshot(Request::get("/api/cart").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
