use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

use crate::{
    delivery_status,
    dto::analytics::{
        DailySales, DashboardCounts, SalesSummary, SupplierTotal, SupplySummary, TopProduct,
    },
    error::AppResult,
    middleware::auth::{AuthUser, ensure_staff},
    models::Role,
    response::ApiResponse,
    routes::params::{DateRangeQuery, resolve_range},
    services::admin_service::LOW_STOCK_THRESHOLD,
    state::AppState,
};

const TOP_PRODUCTS: i64 = 10;

#[derive(FromRow)]
struct SalesTotals {
    orders: i64,
    subtotal: i64,
    shipping: i64,
    total: i64,
}

#[derive(FromRow)]
struct SupplyTotals {
    receipts: i64,
    total_cost: i64,
}

/// One entry per day in `[first, last]`, zero where nothing sold.
pub fn fill_daily_series(first: NaiveDate, last: NaiveDate, rows: Vec<DailySales>) -> Vec<DailySales> {
    let mut rows = rows.into_iter().peekable();
    let mut series = Vec::new();
    let mut day = first;
    while day <= last {
        match rows.peek() {
            Some(row) if row.day == day => {
                if let Some(row) = rows.next() {
                    series.push(row);
                }
            }
            _ => series.push(DailySales {
                day,
                orders: 0,
                revenue: 0,
            }),
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    series
}

/// Cancelled orders are left out of every figure.
pub async fn sales_summary(
    state: &AppState,
    user: &AuthUser,
    query: DateRangeQuery,
) -> AppResult<ApiResponse<SalesSummary>> {
    ensure_staff(user)?;
    let (from, to) = resolve_range(query.from, query.to)?;

    let totals = sqlx::query_as::<_, SalesTotals>(
        r#"
        SELECT COUNT(*)::BIGINT AS orders,
               COALESCE(SUM(s.subtotal), 0)::BIGINT AS subtotal,
               COALESCE(SUM(s.shipping_fee), 0)::BIGINT AS shipping,
               COALESCE(SUM(s.total_amount), 0)::BIGINT AS total
        FROM sale s
        JOIN delivery d ON d.sale_id = s.id
        WHERE d.status_id <> $1 AND s.created_at >= $2 AND s.created_at < $3
        "#,
    )
    .bind(delivery_status::CANCELLED)
    .bind(from)
    .bind(to)
    .fetch_one(&state.pool)
    .await?;

    let (units_sold,): (i64,) = sqlx::query_as(
        r#"
        SELECT COALESCE(SUM(sd.quantity), 0)::BIGINT
        FROM sale_details sd
        JOIN sale s ON s.id = sd.sale_id
        JOIN delivery d ON d.sale_id = s.id
        WHERE d.status_id <> $1 AND s.created_at >= $2 AND s.created_at < $3
        "#,
    )
    .bind(delivery_status::CANCELLED)
    .bind(from)
    .bind(to)
    .fetch_one(&state.pool)
    .await?;

    let daily_rows = sqlx::query_as::<_, DailySales>(
        r#"
        SELECT (s.created_at AT TIME ZONE 'UTC')::date AS day,
               COUNT(*)::BIGINT AS orders,
               COALESCE(SUM(s.total_amount), 0)::BIGINT AS revenue
        FROM sale s
        JOIN delivery d ON d.sale_id = s.id
        WHERE d.status_id <> $1 AND s.created_at >= $2 AND s.created_at < $3
        GROUP BY 1
        ORDER BY 1
        "#,
    )
    .bind(delivery_status::CANCELLED)
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    let top_products = sqlx::query_as::<_, TopProduct>(
        r#"
        SELECT p.id AS product_id, p.name,
               SUM(sd.quantity)::BIGINT AS units,
               SUM(sd.quantity * sd.unit_price)::BIGINT AS revenue
        FROM sale_details sd
        JOIN sale s ON s.id = sd.sale_id
        JOIN delivery d ON d.sale_id = s.id
        JOIN product p ON p.id = sd.product_id
        WHERE d.status_id <> $1 AND s.created_at >= $2 AND s.created_at < $3
        GROUP BY p.id, p.name
        ORDER BY units DESC, revenue DESC
        LIMIT $4
        "#,
    )
    .bind(delivery_status::CANCELLED)
    .bind(from)
    .bind(to)
    .bind(TOP_PRODUCTS)
    .fetch_all(&state.pool)
    .await?;

    let daily = fill_daily_series(day_of(from, 0), day_of(to, 1), daily_rows);

    Ok(ApiResponse::success(
        "Sales summary",
        SalesSummary {
            from,
            to,
            orders: totals.orders,
            units_sold,
            subtotal: totals.subtotal,
            shipping: totals.shipping,
            total: totals.total,
            daily,
            top_products,
        },
        None,
    ))
}

/// Calendar day of `instant` shifted back by `days_back`. Range ends are
/// exclusive, so the last covered day is one back from the end.
fn day_of(instant: DateTime<Utc>, days_back: i64) -> NaiveDate {
    (instant - chrono::Duration::days(days_back)).date_naive()
}

pub async fn supply_summary(
    state: &AppState,
    user: &AuthUser,
    query: DateRangeQuery,
) -> AppResult<ApiResponse<SupplySummary>> {
    ensure_staff(user)?;
    let (from, to) = resolve_range(query.from, query.to)?;

    let totals = sqlx::query_as::<_, SupplyTotals>(
        r#"
        SELECT COUNT(*)::BIGINT AS receipts,
               COALESCE(SUM(total_cost), 0)::BIGINT AS total_cost
        FROM supply
        WHERE received_at >= $1 AND received_at < $2
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_one(&state.pool)
    .await?;

    let by_supplier = sqlx::query_as::<_, SupplierTotal>(
        r#"
        SELECT sp.id AS supplier_id, sp.name,
               COUNT(s.id)::BIGINT AS receipts,
               COALESCE(SUM(s.total_cost), 0)::BIGINT AS total_cost
        FROM supply s
        JOIN supplier sp ON sp.id = s.supplier_id
        WHERE s.received_at >= $1 AND s.received_at < $2
        GROUP BY sp.id, sp.name
        ORDER BY total_cost DESC, sp.name
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Supply summary",
        SupplySummary {
            from,
            to,
            receipts: totals.receipts,
            total_cost: totals.total_cost,
            by_supplier,
        },
        None,
    ))
}

pub async fn dashboard(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<DashboardCounts>> {
    ensure_staff(user)?;
    let counts = sqlx::query_as::<_, DashboardCounts>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM product WHERE is_active) AS products,
            (SELECT COUNT(*) FROM product WHERE is_active AND quantity <= $1) AS low_stock,
            (SELECT COUNT(*) FROM delivery WHERE status_id = $2) AS pending_deliveries,
            (SELECT COUNT(*) FROM user_employee WHERE role_id = $3) AS customers
        "#,
    )
    .bind(LOW_STOCK_THRESHOLD)
    .bind(delivery_status::PENDING)
    .bind(Role::Customer.id())
    .fetch_one(&state.pool)
    .await?;
    Ok(ApiResponse::success("Dashboard", counts, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn missing_days_are_zero_filled() {
        let rows = vec![
            DailySales {
                day: day(2),
                orders: 3,
                revenue: 90_000,
            },
            DailySales {
                day: day(4),
                orders: 1,
                revenue: 15_000,
            },
        ];
        let series = fill_daily_series(day(1), day(5), rows);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0].orders, 0);
        assert_eq!(series[1].revenue, 90_000);
        assert_eq!(series[2].day, day(3));
        assert_eq!(series[3].orders, 1);
        assert_eq!(series[4].revenue, 0);
    }

    #[test]
    fn exclusive_end_maps_to_previous_day() {
        let (from, to) = resolve_range(Some(day(1)), Some(day(7))).unwrap();
        assert_eq!(day_of(from, 0), day(1));
        assert_eq!(day_of(to, 1), day(7));
    }
}
