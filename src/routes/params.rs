use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
    Quantity,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub brand_id: Option<i32>,
    pub category_id: Option<i32>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Only products that fit this car model...
    pub car_model_id: Option<i32>,
    /// ...in this model year.
    pub year: Option<i32>,
    pub in_stock: Option<bool>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status_id: Option<i32>,
    /// Customer email contains (staff listing only).
    pub q: Option<String>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub role: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct SupplyListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub supplier_id: Option<i32>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LowStockQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub threshold: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DateRangeQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct YearQuery {
    pub year: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Query strings carry paging fields inline: `serde(flatten)` breaks
/// numeric parsing under urlencoded deserialisation.
pub trait Paged {
    fn page_fields(&self) -> (Option<i64>, Option<i64>);

    fn pagination(&self) -> Pagination {
        let (page, per_page) = self.page_fields();
        Pagination { page, per_page }
    }
}

macro_rules! impl_paged {
    ($($ty:ty),* $(,)?) => {
        $(impl Paged for $ty {
            fn page_fields(&self) -> (Option<i64>, Option<i64>) {
                (self.page, self.per_page)
            }
        })*
    };
}

impl_paged!(
    ProductQuery,
    OrderListQuery,
    UserListQuery,
    SupplyListQuery,
    LowStockQuery,
    YearQuery,
);

/// Midnight UTC at the start of `date`.
pub fn day_start(date: NaiveDate) -> AppResult<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("invalid date {date}")))
}

/// Midnight UTC after `date`, the exclusive end of that day.
pub fn day_end(date: NaiveDate) -> AppResult<DateTime<Utc>> {
    day_start(date + chrono::Duration::days(1))
}

/// Inclusive day range turned into a half-open `[start, end)` instant range.
/// Defaults to the last 30 days.
pub fn resolve_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let today = Utc::now().date_naive();
    let to = to.unwrap_or(today);
    let from = from.unwrap_or_else(|| to - chrono::Duration::days(29));
    if from > to {
        return Err(AppError::BadRequest("'from' must not be after 'to'".into()));
    }
    Ok((day_start(from)?, day_end(to)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));
        let p = Pagination {
            page: Some(3),
            per_page: None,
        };
        assert_eq!(p.normalize(), (3, 20, 40));
        let p = Pagination {
            page: Some(i64::MAX),
            per_page: Some(100),
        };
        assert_eq!(p.normalize(), (i64::MAX, 100, i64::MAX));
    }

    #[test]
    fn range_covers_whole_days() {
        let from = NaiveDate::from_ymd_opt(2026, 1, 1);
        let to = NaiveDate::from_ymd_opt(2026, 1, 31);
        let (start, end) = resolve_range(from, to).unwrap();
        assert_eq!(start.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2026-02-01T00:00:00+00:00");
    }

    #[test]
    fn inverted_range_is_rejected() {
        let from = NaiveDate::from_ymd_opt(2026, 2, 1);
        let to = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert!(resolve_range(from, to).is_err());
    }
}
