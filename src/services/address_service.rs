use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::addresses::{
        AddressList, ApprovedAddressList, CreateAddressRequest, CreateApprovedAddressRequest,
        LocationList,
    },
    entity::{
        address::{ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses},
        approved_address::{ActiveModel as ApprovedActive, Entity as ApprovedAddresses},
        barangay::{Column as BarangayCol, Entity as Barangays},
        municipality::{Column as MunicipalityCol, Entity as Municipalities},
        province::{Column as ProvinceCol, Entity as Provinces},
        region::{Column as RegionCol, Entity as Regions},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Address, ApprovedAddress, Location},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// `street, barangay, municipality, province, region`, skipping blank parts.
pub fn format_full_address(parts: [&str; 5]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Walk the location tree up from a barangay.
pub(crate) async fn full_address<C: ConnectionTrait>(
    conn: &C,
    street: &str,
    barangay_id: i32,
) -> AppResult<String> {
    let missing = || AppError::BadRequest(format!("barangay {barangay_id} does not exist"));
    let barangay = Barangays::find_by_id(barangay_id)
        .one(conn)
        .await?
        .ok_or_else(missing)?;
    let municipality = Municipalities::find_by_id(barangay.municipality_id)
        .one(conn)
        .await?
        .ok_or_else(missing)?;
    let province = Provinces::find_by_id(municipality.province_id)
        .one(conn)
        .await?
        .ok_or_else(missing)?;
    let region = Regions::find_by_id(province.region_id)
        .one(conn)
        .await?
        .ok_or_else(missing)?;
    Ok(format_full_address([
        street,
        &barangay.name,
        &municipality.name,
        &province.name,
        &region.name,
    ]))
}

pub async fn list_regions(state: &AppState) -> AppResult<ApiResponse<LocationList>> {
    let items: Vec<Location> = Regions::find()
        .order_by_asc(RegionCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|r| Location {
            id: r.id,
            parent_id: None,
            name: r.name,
        })
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Regions", LocationList { items }, Some(meta)))
}

pub async fn list_provinces(
    state: &AppState,
    region_id: i32,
) -> AppResult<ApiResponse<LocationList>> {
    if Regions::find_by_id(region_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let items: Vec<Location> = Provinces::find()
        .filter(ProvinceCol::RegionId.eq(region_id))
        .order_by_asc(ProvinceCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| Location {
            id: p.id,
            parent_id: Some(p.region_id),
            name: p.name,
        })
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Provinces", LocationList { items }, Some(meta)))
}

pub async fn list_municipalities(
    state: &AppState,
    province_id: i32,
) -> AppResult<ApiResponse<LocationList>> {
    if Provinces::find_by_id(province_id).one(&state.orm).await?.is_none() {
        return Err(AppError::NotFound);
    }
    let items: Vec<Location> = Municipalities::find()
        .filter(MunicipalityCol::ProvinceId.eq(province_id))
        .order_by_asc(MunicipalityCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| Location {
            id: m.id,
            parent_id: Some(m.province_id),
            name: m.name,
        })
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success(
        "Municipalities",
        LocationList { items },
        Some(meta),
    ))
}

pub async fn list_barangays(
    state: &AppState,
    municipality_id: i32,
) -> AppResult<ApiResponse<LocationList>> {
    if Municipalities::find_by_id(municipality_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }
    let items: Vec<Location> = Barangays::find()
        .filter(BarangayCol::MunicipalityId.eq(municipality_id))
        .order_by_asc(BarangayCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|b| Location {
            id: b.id,
            parent_id: Some(b.municipality_id),
            name: b.name,
        })
        .collect();
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Barangays", LocationList { items }, Some(meta)))
}

#[derive(FromRow)]
struct AddressRow {
    id: Uuid,
    recipient_name: String,
    phone: String,
    street: String,
    barangay_id: i32,
    is_default: bool,
    created_at: DateTime<Utc>,
    barangay: String,
    municipality: String,
    province: String,
    region: String,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        let full_address = format_full_address([
            &row.street,
            &row.barangay,
            &row.municipality,
            &row.province,
            &row.region,
        ]);
        Address {
            id: row.id,
            recipient_name: row.recipient_name,
            phone: row.phone,
            street: row.street,
            barangay_id: row.barangay_id,
            is_default: row.is_default,
            full_address,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ApprovedRow {
    id: i32,
    label: String,
    street: String,
    barangay_id: i32,
    is_active: bool,
    barangay: String,
    municipality: String,
    province: String,
    region: String,
}

impl From<ApprovedRow> for ApprovedAddress {
    fn from(row: ApprovedRow) -> Self {
        let full_address = format_full_address([
            &row.street,
            &row.barangay,
            &row.municipality,
            &row.province,
            &row.region,
        ]);
        ApprovedAddress {
            id: row.id,
            label: row.label,
            street: row.street,
            barangay_id: row.barangay_id,
            is_active: row.is_active,
            full_address,
        }
    }
}

async fn fetch_addresses(
    state: &AppState,
    user_id: Uuid,
    id: Option<Uuid>,
) -> AppResult<Vec<Address>> {
    let rows = sqlx::query_as::<_, AddressRow>(
        r#"
        SELECT a.id, a.recipient_name, a.phone, a.street, a.barangay_id, a.is_default,
               a.created_at, b.name AS barangay, m.name AS municipality,
               p.name AS province, r.name AS region
        FROM address a
        JOIN barangay b ON b.id = a.barangay_id
        JOIN municipality m ON m.id = b.municipality_id
        JOIN province p ON p.id = m.province_id
        JOIN region r ON r.id = p.region_id
        WHERE a.user_id = $1 AND ($2::uuid IS NULL OR a.id = $2)
        ORDER BY a.is_default DESC, a.created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(id)
    .fetch_all(&state.pool)
    .await?;
    Ok(rows.into_iter().map(Address::from).collect())
}

pub async fn list_my_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = fetch_addresses(state, user.user_id, None).await?;
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success("Addresses", AddressList { items }, Some(meta)))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let recipient_name = required(&payload.recipient_name, "recipient_name")?;
    let phone = required(&payload.phone, "phone")?;
    let street = required(&payload.street, "street")?;
    if Barangays::find_by_id(payload.barangay_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "barangay {} does not exist",
            payload.barangay_id
        )));
    }

    let txn = state.orm.begin().await?;
    let has_any = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .is_some();
    let is_default = payload.is_default || !has_any;
    if is_default {
        clear_default(&txn, user.user_id).await?;
    }

    let created = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        recipient_name: Set(recipient_name),
        phone: Set(phone),
        street: Set(street),
        barangay_id: Set(payload.barangay_id),
        is_default: Set(is_default),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    let address = fetch_addresses(state, user.user_id, Some(created.id))
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Address created", address, None))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = Addresses::find_by_id(id)
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    clear_default(&txn, user.user_id).await?;
    let mut active: AddressActive = existing.into();
    active.is_default = Set(true);
    active.update(&txn).await?;
    txn.commit().await?;

    let address = fetch_addresses(state, user.user_id, Some(id))
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Default address set", address, None))
}

/// Deleting the default address promotes the newest remaining one.
pub async fn delete_my_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let existing = Addresses::find_by_id(id)
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    Addresses::delete_by_id(existing.id).exec(&txn).await?;

    if existing.is_default {
        let next = Addresses::find()
            .filter(AddressCol::UserId.eq(user.user_id))
            .order_by_desc(AddressCol::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(next) = next {
            let mut active: AddressActive = next.into();
            active.is_default = Set(true);
            active.update(&txn).await?;
        }
    }
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(AddressCol::IsDefault, Expr::value(false))
        .filter(AddressCol::UserId.eq(user_id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn fetch_approved(
    state: &AppState,
    include_inactive: bool,
    id: Option<i32>,
) -> AppResult<Vec<ApprovedAddress>> {
    let rows = sqlx::query_as::<_, ApprovedRow>(
        r#"
        SELECT aa.id, aa.label, aa.street, aa.barangay_id, aa.is_active,
               b.name AS barangay, m.name AS municipality,
               p.name AS province, r.name AS region
        FROM approved_address aa
        JOIN barangay b ON b.id = aa.barangay_id
        JOIN municipality m ON m.id = b.municipality_id
        JOIN province p ON p.id = m.province_id
        JOIN region r ON r.id = p.region_id
        WHERE ($1 OR aa.is_active) AND ($2::int IS NULL OR aa.id = $2)
        ORDER BY aa.label
        "#,
    )
    .bind(include_inactive)
    .bind(id)
    .fetch_all(&state.pool)
    .await?;
    Ok(rows.into_iter().map(ApprovedAddress::from).collect())
}

/// Customers see active entries only; staff also see deactivated ones.
pub async fn list_approved_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ApprovedAddressList>> {
    let items = fetch_approved(state, user.role.is_staff(), None).await?;
    let meta = Meta::all(items.len());
    Ok(ApiResponse::success(
        "Approved addresses",
        ApprovedAddressList { items },
        Some(meta),
    ))
}

pub async fn create_approved_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateApprovedAddressRequest,
) -> AppResult<ApiResponse<ApprovedAddress>> {
    ensure_staff(user)?;
    let label = required(&payload.label, "label")?;
    let street = required(&payload.street, "street")?;
    if Barangays::find_by_id(payload.barangay_id)
        .one(&state.orm)
        .await?
        .is_none()
    {
        return Err(AppError::BadRequest(format!(
            "barangay {} does not exist",
            payload.barangay_id
        )));
    }

    let created = ApprovedActive {
        id: NotSet,
        label: Set(label),
        street: Set(street),
        barangay_id: Set(payload.barangay_id),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "approved_address_create",
        "approved_address",
        serde_json::json!({ "approved_address_id": created.id }),
    )
    .await;

    let address = fetch_approved(state, true, Some(created.id))
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Approved address created", address, None))
}

pub async fn deactivate_approved_address(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<ApprovedAddress>> {
    ensure_staff(user)?;
    let existing = ApprovedAddresses::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: ApprovedActive = existing.into();
    active.is_active = Set(false);
    active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "approved_address_deactivate",
        "approved_address",
        serde_json::json!({ "approved_address_id": id }),
    )
    .await;

    let address = fetch_approved(state, true, Some(id))
        .await?
        .pop()
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Approved address deactivated", address, None))
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_address_joins_levels_in_order() {
        assert_eq!(
            format_full_address([
                "12 Rizal St.",
                "San Roque",
                "Marikina",
                "Metro Manila",
                "NCR"
            ]),
            "12 Rizal St., San Roque, Marikina, Metro Manila, NCR"
        );
    }

    #[test]
    fn blank_parts_are_skipped() {
        assert_eq!(
            format_full_address(["  ", "Poblacion", "Tagum", "Davao del Norte", "Region XI"]),
            "Poblacion, Tagum, Davao del Norte, Region XI"
        );
    }
}
