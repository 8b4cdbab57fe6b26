use autoparts_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    models::Role,
    password::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url, 2).await?;
    // Ensure migrations are applied.
    run_migrations(&orm_from_pool(&pool)).await?;

    let admin_id = ensure_account(&pool, "admin@example.com", "admin12345", Role::Admin).await?;
    let customer_id =
        ensure_account(&pool, "customer@example.com", "customer123", Role::Customer).await?;
    seed_couriers(&pool).await?;
    seed_locations(&pool).await?;
    seed_catalog(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, Customer ID: {customer_id}");
    Ok(())
}

async fn ensure_account(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO user_employee (id, email, password_hash, first_name, last_name, role_id)
        VALUES ($1, $2, $3, $4, 'Seed', $5)
        ON CONFLICT (email) DO UPDATE SET role_id = EXCLUDED.role_id
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role.as_str())
    .bind(role.id())
    .fetch_one(pool)
    .await?;

    println!("Ensured account {email} (role={})", role.as_str());
    Ok(id)
}

async fn seed_couriers(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    // base rate and per-kg rate in centavos
    let couriers = [
        ("LBC", 12_000_i64, 4_000_i64, 50.0_f64),
        ("J&T Express", 9_000, 3_500, 30.0),
        ("Store Truck", 50_000, 1_000, 500.0),
    ];

    for (name, base_rate, rate_per_kg, max_weight_kg) in couriers {
        sqlx::query(
            r#"
            INSERT INTO courier (name, base_rate, rate_per_kg, max_weight_kg)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(base_rate)
        .bind(rate_per_kg)
        .bind(max_weight_kg)
        .execute(pool)
        .await?;
    }

    println!("Seeded couriers");
    Ok(())
}

async fn seed_locations(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let (region_id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO region (name) VALUES ('NCR')
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .fetch_one(pool)
    .await?;

    let province_id = find_or_insert(pool, "province", "region_id", region_id, "Metro Manila").await?;
    let municipality_id =
        find_or_insert(pool, "municipality", "province_id", province_id, "Quezon City").await?;
    for barangay in ["Bagong Pag-asa", "Commonwealth", "Cubao"] {
        find_or_insert(pool, "barangay", "municipality_id", municipality_id, barangay).await?;
    }

    println!("Seeded locations");
    Ok(())
}

/// Child location tables have no unique name, so look before inserting.
async fn find_or_insert(
    pool: &sqlx::PgPool,
    table: &str,
    parent_col: &str,
    parent_id: i32,
    name: &str,
) -> anyhow::Result<i32> {
    let select = format!("SELECT id FROM {table} WHERE {parent_col} = $1 AND name = $2");
    let existing: Option<(i32,)> = sqlx::query_as(&select)
        .bind(parent_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }

    let insert = format!("INSERT INTO {table} ({parent_col}, name) VALUES ($1, $2) RETURNING id");
    let (id,): (i32,) = sqlx::query_as(&insert)
        .bind(parent_id)
        .bind(name)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

async fn seed_catalog(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    for make in ["Toyota", "Mitsubishi", "Honda"] {
        sqlx::query("INSERT INTO cars (make) VALUES ($1) ON CONFLICT (make) DO NOTHING")
            .bind(make)
            .execute(pool)
            .await?;
    }

    // (name, description, brand, category, price, cost, stock, weight)
    let products = [
        ("Oil Filter 90915-YZZE1", "Spin-on oil filter", "Toyota Genuine", "Filters", 45_000_i64, 28_000_i64, 60, 0.3_f64),
        ("Brake Pad Set Front", "Ceramic front pads", "Bendix", "Brakes", 280_000, 190_000, 25, 1.8),
        ("Spark Plug Iridium", "Iridium tip, single", "NGK", "Ignition", 65_000, 40_000, 120, 0.1),
        ("Car Battery 2SM", "Maintenance-free 12V", "Motolite", "Electrical", 520_000, 410_000, 8, 14.5),
    ];

    for (name, description, brand, category, price, cost_price, quantity, weight_kg) in products {
        let (brand_id,): (i32,) = sqlx::query_as(
            "INSERT INTO brand (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(brand)
        .fetch_one(pool)
        .await?;
        let (category_id,): (i32,) = sqlx::query_as(
            "INSERT INTO category (name) VALUES ($1) ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
        )
        .bind(category)
        .fetch_one(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO product
                (id, name, description, price, cost_price, quantity, weight_kg, brand_id, category_id)
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE NOT EXISTS (SELECT 1 FROM product WHERE name = $2)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(cost_price)
        .bind(quantity)
        .bind(weight_kg)
        .bind(brand_id)
        .bind(category_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
