#![allow(dead_code)]

use autoparts_api::{
    config::AppConfig,
    db::{create_pool, run_migrations},
    entity::{product::ActiveModel as ProductActive, user_employee::ActiveModel as UserActive},
    middleware::auth::AuthUser,
    models::Role,
    state::AppState,
};
use sea_orm::ActiveModelTrait;
use sea_orm::ActiveValue::{NotSet, Set};
use uuid::Uuid;

/// `None` when no database is configured; callers skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests.");
            return Ok(None);
        }
    };

    let config = AppConfig {
        database_url: database_url.clone(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        db_max_connections: 5,
        db_retry_delay_ms: 0,
        cors_origins: Vec::new(),
    };
    let pool = create_pool(&database_url, config.db_max_connections).await?;
    let state = AppState::new(pool, config);
    run_migrations(&state.orm).await?;
    Ok(Some(state))
}

pub async fn create_account(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("{}-{id}@example.com", role.as_str())),
        password_hash: Set("unused".into()),
        first_name: Set("Test".into()),
        last_name: Set(role.as_str().into()),
        phone: Set(None),
        role_id: Set(role.id()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser { user_id: id, role })
}

pub async fn create_product(
    state: &AppState,
    price: i64,
    quantity: i32,
    weight_kg: f64,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    ProductActive {
        id: Set(id),
        name: Set(format!("Test part {id}")),
        description: Set(None),
        price: Set(price),
        cost_price: Set(price / 2),
        quantity: Set(quantity),
        weight_kg: Set(weight_kg),
        brand_id: Set(None),
        category_id: Set(None),
        images: Set(serde_json::json!([])),
        is_active: Set(true),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

pub async fn product_stock(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let (quantity,): (i32,) = sqlx::query_as("SELECT quantity FROM product WHERE id = $1")
        .bind(id)
        .fetch_one(&state.pool)
        .await?;
    Ok(quantity)
}

/// Courier with a generous weight limit.
pub async fn create_courier(state: &AppState) -> anyhow::Result<i32> {
    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO courier (name, base_rate, rate_per_kg, max_weight_kg)
        VALUES ($1, 5000, 1000, 100)
        RETURNING id
        "#,
    )
    .bind(format!("Courier {}", Uuid::new_v4()))
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}

/// Pickup address with its own region, province, municipality and barangay.
pub async fn create_approved_address(state: &AppState) -> anyhow::Result<i32> {
    let tag = Uuid::new_v4();
    let (region_id,): (i32,) =
        sqlx::query_as("INSERT INTO region (name) VALUES ($1) RETURNING id")
            .bind(format!("Region {tag}"))
            .fetch_one(&state.pool)
            .await?;
    let (province_id,): (i32,) = sqlx::query_as(
        "INSERT INTO province (region_id, name) VALUES ($1, 'Province') RETURNING id",
    )
    .bind(region_id)
    .fetch_one(&state.pool)
    .await?;
    let (municipality_id,): (i32,) = sqlx::query_as(
        "INSERT INTO municipality (province_id, name) VALUES ($1, 'Town') RETURNING id",
    )
    .bind(province_id)
    .fetch_one(&state.pool)
    .await?;
    let (barangay_id,): (i32,) = sqlx::query_as(
        "INSERT INTO barangay (municipality_id, name) VALUES ($1, 'Poblacion') RETURNING id",
    )
    .bind(municipality_id)
    .fetch_one(&state.pool)
    .await?;
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO approved_address (label, street, barangay_id) VALUES ('Main branch', '1 Rizal St', $1) RETURNING id",
    )
    .bind(barangay_id)
    .fetch_one(&state.pool)
    .await?;
    Ok(id)
}
