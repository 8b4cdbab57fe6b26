use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::cart::{
        AddToCartRequest, CartLine, CartSummary, MergeCartRequest, MergeResult, SkippedLine,
        UpdateCartItemRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    money,
    response::{ApiResponse, Meta},
    shipping,
};

/// Distinct products a single cart may hold.
pub const MAX_CART_LINES: i64 = 30;

#[derive(FromRow)]
struct CartRow {
    id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    price: i64,
    available: i32,
    weight_kg: f64,
    image: Option<String>,
}

#[derive(FromRow)]
struct ProductStock {
    quantity: i32,
    is_active: bool,
}

/// Outcome of checking one add request against the cart and the product.
#[derive(Debug, PartialEq, Eq)]
pub enum AddCheck {
    /// Quantity the line holds after the add.
    Accept(i32),
    CartFull,
    Rejected(String),
}

/// `existing` is the quantity already in the cart for this product.
pub fn check_add(
    existing: Option<i32>,
    line_count: i64,
    quantity: i32,
    stock: i32,
    active: bool,
) -> AddCheck {
    if quantity <= 0 {
        return AddCheck::Rejected("quantity must be greater than 0".into());
    }
    if !active {
        return AddCheck::Rejected("product is not available".into());
    }
    if existing.is_none() && line_count >= MAX_CART_LINES {
        return AddCheck::CartFull;
    }
    let wanted = existing.unwrap_or(0).saturating_add(quantity);
    if wanted > stock {
        return AddCheck::Rejected(format!("only {stock} left in stock"));
    }
    AddCheck::Accept(wanted)
}

pub async fn list_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<CartSummary>> {
    let summary = load_cart(pool, user.user_id).await?;
    let meta = Meta::all(summary.items.len());
    Ok(ApiResponse::success("OK", summary, Some(meta)))
}

pub(crate) async fn load_cart(pool: &DbPool, user_id: Uuid) -> AppResult<CartSummary> {
    let rows = sqlx::query_as::<_, CartRow>(
        r#"
        SELECT uc.id, uc.quantity,
               p.id AS product_id, p.name, p.price, p.quantity AS available,
               p.weight_kg, p.images->>0 AS image
        FROM user_cart uc
        JOIN product p ON p.id = uc.product_id
        WHERE uc.user_id = $1
        ORDER BY uc.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let total_weight_kg = shipping::total_weight_kg(rows.iter().map(|r| (r.weight_kg, r.quantity)));
    let items = rows
        .into_iter()
        .map(|row| {
            Ok(CartLine {
                id: row.id,
                product_id: row.product_id,
                name: row.name,
                unit_price: row.price,
                quantity: row.quantity,
                available: row.available,
                weight_kg: row.weight_kg,
                line_total: money::line_total(row.price, row.quantity)?,
                image: row.image,
            })
        })
        .collect::<AppResult<Vec<CartLine>>>()?;
    let subtotal = money::sum(items.iter().map(|line| line.line_total))?;

    Ok(CartSummary {
        items,
        subtotal,
        total_weight_kg,
    })
}

pub async fn add_to_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    let mut tx = pool.begin().await?;
    match add_line(&mut tx, user.user_id, payload.product_id, payload.quantity).await? {
        AddCheck::Accept(_) => {}
        AddCheck::CartFull => {
            return Err(AppError::BadRequest(format!(
                "cart already holds {MAX_CART_LINES} different products"
            )));
        }
        AddCheck::Rejected(reason) => return Err(AppError::BadRequest(reason)),
    }
    tx.commit().await?;

    audit::record(
        pool,
        user.user_id,
        "cart_add",
        "user_cart",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    let summary = load_cart(pool, user.user_id).await?;
    Ok(ApiResponse::success("Added to cart", summary, None))
}

/// Apply one add inside the caller's transaction. Nothing is written
/// unless the check accepts.
async fn add_line(
    conn: &mut PgConnection,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> AppResult<AddCheck> {
    // Holding the account row serialises cart writers for this user, so the
    // line count below cannot go stale before the insert.
    sqlx::query("SELECT 1 FROM user_employee WHERE id = $1 FOR NO KEY UPDATE")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let product: Option<ProductStock> =
        sqlx::query_as("SELECT quantity, is_active FROM product WHERE id = $1 FOR SHARE")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;
    let Some(product) = product else {
        return Ok(AddCheck::Rejected("product not found".into()));
    };

    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT quantity FROM user_cart WHERE user_id = $1 AND product_id = $2 FOR UPDATE",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (line_count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_cart WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    let check = check_add(
        existing.map(|(q,)| q),
        line_count,
        quantity,
        product.quantity,
        product.is_active,
    );
    if let AddCheck::Accept(new_quantity) = check {
        sqlx::query(
            r#"
            INSERT INTO user_cart (id, user_id, product_id, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = EXCLUDED.quantity
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(product_id)
        .bind(new_quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(check)
}

pub async fn update_cart_item(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartSummary>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let stock: Option<(i32,)> = sqlx::query_as("SELECT quantity FROM product WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    let Some((stock,)) = stock else {
        return Err(AppError::NotFound);
    };
    if payload.quantity > stock {
        return Err(AppError::BadRequest(format!("only {stock} left in stock")));
    }

    let result = sqlx::query(
        "UPDATE user_cart SET quantity = $3 WHERE user_id = $1 AND product_id = $2",
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.quantity)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    let summary = load_cart(pool, user.user_id).await?;
    Ok(ApiResponse::success("Cart updated", summary, None))
}

pub async fn remove_from_cart(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM user_cart WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        pool,
        user.user_id,
        "cart_remove",
        "user_cart",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(pool: &DbPool, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM user_cart WHERE user_id = $1")
        .bind(user.user_id)
        .execute(pool)
        .await?;
    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}

/// Fold a guest cart into the account cart. Lines that break a rule are
/// skipped and reported; the rest are kept.
pub async fn merge_guest_cart(
    pool: &DbPool,
    user: &AuthUser,
    payload: MergeCartRequest,
) -> AppResult<ApiResponse<MergeResult>> {
    let mut tx = pool.begin().await?;
    let mut skipped = Vec::new();
    for item in &payload.items {
        let reason = match add_line(&mut tx, user.user_id, item.product_id, item.quantity).await? {
            AddCheck::Accept(_) => continue,
            AddCheck::CartFull => format!("cart already holds {MAX_CART_LINES} different products"),
            AddCheck::Rejected(reason) => reason,
        };
        skipped.push(SkippedLine {
            product_id: item.product_id,
            reason,
        });
    }
    tx.commit().await?;

    tracing::debug!(
        user_id = %user.user_id,
        merged = payload.items.len() - skipped.len(),
        skipped = skipped.len(),
        "guest cart merged"
    );

    let cart = load_cart(pool, user.user_id).await?;
    Ok(ApiResponse::success(
        "Cart merged",
        MergeResult { cart, skipped },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_line_is_rejected_when_cart_is_full() {
        assert_eq!(check_add(None, MAX_CART_LINES, 1, 10, true), AddCheck::CartFull);
        assert_eq!(check_add(None, MAX_CART_LINES - 1, 1, 10, true), AddCheck::Accept(1));
    }

    #[test]
    fn existing_line_grows_even_when_cart_is_full() {
        assert_eq!(
            check_add(Some(2), MAX_CART_LINES, 3, 10, true),
            AddCheck::Accept(5)
        );
    }

    #[test]
    fn stock_limits_the_resulting_quantity() {
        assert!(matches!(
            check_add(Some(4), 1, 2, 5, true),
            AddCheck::Rejected(_)
        ));
        assert_eq!(check_add(Some(4), 1, 1, 5, true), AddCheck::Accept(5));
    }

    #[test]
    fn inactive_products_and_bad_quantities_are_rejected() {
        assert!(matches!(check_add(None, 0, 1, 5, false), AddCheck::Rejected(_)));
        assert!(matches!(check_add(None, 0, 0, 5, true), AddCheck::Rejected(_)));
        assert!(matches!(check_add(None, 0, -2, 5, true), AddCheck::Rejected(_)));
    }
}
