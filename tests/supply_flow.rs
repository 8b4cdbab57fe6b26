mod common;

use autoparts_api::{
    dto::supplies::{
        CreateSupplierRequest, CreateSupplyRequest, NewSupplyProduct, SupplyLineRequest,
    },
    error::AppError,
    models::Role,
    routes::params::DateRangeQuery,
    services::{analytics_service, supply_service},
};
use uuid::Uuid;

use common::{create_account, create_product, product_stock, setup_state};

// Receiving stock: existing products grow, new ones enter the catalog, receipts are unique.
#[tokio::test]
async fn supply_receipt_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let staff = create_account(&state, Role::Employee).await?;
    let customer = create_account(&state, Role::Customer).await?;
    let part = create_product(&state, 20_000, 2, 1.5).await?;

    let supplier = supply_service::create_supplier(
        &state,
        &staff,
        CreateSupplierRequest {
            name: format!("Supplier {}", Uuid::new_v4()),
            contact_person: Some("Ana Cruz".into()),
            phone: None,
            email: None,
        },
    )
    .await?
    .data
    .expect("supplier");

    let receipt = format!("OR-{}", Uuid::new_v4());
    let request = || CreateSupplyRequest {
        receipt_number: receipt.clone(),
        supplier_id: supplier.id,
        received_at: None,
        lines: vec![
            SupplyLineRequest {
                product_id: Some(part),
                new_product: None,
                quantity: 4,
                unit_cost: 7_000,
            },
            SupplyLineRequest {
                product_id: None,
                new_product: Some(NewSupplyProduct {
                    name: "Radiator Cap 0.9 bar".into(),
                    description: None,
                    brand_name: Some(format!("Brand {}", Uuid::new_v4())),
                    category_name: Some("Cooling".into()),
                    price: 35_000,
                    weight_kg: 0.2,
                }),
                quantity: 10,
                unit_cost: 15_000,
            },
        ],
    };

    let err = supply_service::create_supply(&state, &customer, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let detail = supply_service::create_supply(&state, &staff, request())
        .await?
        .data
        .expect("supply detail");
    assert_eq!(detail.supply.total_cost, 4 * 7_000 + 10 * 15_000);
    assert_eq!(detail.lines.len(), 2);
    assert_eq!(product_stock(&state, part).await?, 6);

    let (cost_price,): (i64,) = sqlx::query_as("SELECT cost_price FROM product WHERE id = $1")
        .bind(part)
        .fetch_one(&state.pool)
        .await?;
    assert_eq!(cost_price, 7_000);

    let new_line = detail
        .lines
        .iter()
        .find(|line| line.product_id != part)
        .expect("new product line");
    assert_eq!(product_stock(&state, new_line.product_id).await?, 10);

    // the same receipt cannot be recorded twice, and nothing is applied
    let err = supply_service::create_supply(&state, &staff, request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert_eq!(product_stock(&state, part).await?, 6);

    let summary = analytics_service::supply_summary(&state, &staff, DateRangeQuery::default())
        .await?
        .data
        .expect("supply summary");
    assert!(summary.receipts >= 1);
    assert!(summary.by_supplier.iter().any(|row| row.supplier_id == supplier.id));

    Ok(())
}
