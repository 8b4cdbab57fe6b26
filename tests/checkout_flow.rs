mod common;

use autoparts_api::{
    delivery_status,
    dto::{
        cart::{AddToCartRequest, MergeCartRequest},
        orders::{CancelOrderRequest, CheckoutRequest, UpdateOrderStatusRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    models::Role,
    services::{admin_service, cart_service, order_service},
    state::AppState,
};
use uuid::Uuid;

use common::{
    create_account, create_approved_address, create_courier, create_product, product_stock,
    setup_state,
};

// Cart rules -> checkout -> staff status changes -> customer cancel with restock.
#[tokio::test]
async fn cart_checkout_status_and_cancel_flow() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let customer = create_account(&state, Role::Customer).await?;
    let staff = create_account(&state, Role::Employee).await?;
    let courier_id = create_courier(&state).await?;
    let approved_address_id = create_approved_address(&state).await?;
    let part = create_product(&state, 10_000, 10, 1.0).await?;

    // adding the same product twice grows one line
    add(&state, &customer, part, 2).await?;
    let cart = add(&state, &customer, part, 3).await?;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.subtotal, 50_000);

    // the line may not exceed stock
    let err = add(&state, &customer, part, 6).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let checkout = |address: i32| CheckoutRequest {
        courier_id,
        address_id: None,
        approved_address_id: Some(address),
        payment_method: "cod".into(),
    };

    let placed = order_service::checkout(&state, &customer, checkout(approved_address_id))
        .await?
        .data
        .expect("order detail");
    assert_eq!(placed.order.subtotal, 50_000);
    assert_eq!(
        placed.order.total_amount,
        placed.order.subtotal + placed.order.shipping_fee
    );
    assert_eq!(placed.delivery.status_id, delivery_status::PENDING);
    assert_eq!(placed.history.len(), 1);
    assert_eq!(product_stock(&state, part).await?, 5);

    let cart = cart_service::list_cart(&state.pool, &customer).await?.data.unwrap();
    assert!(cart.items.is_empty());

    // an empty cart cannot be checked out
    let err = order_service::checkout(&state, &customer, checkout(approved_address_id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let order_id = placed.order.id;

    // posting a tracking status needs a tracking number
    let err = admin_service::update_order_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status_id: delivery_status::TRACKING_NUMBER_POSTED,
            tracking_number: None,
            note: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let tracked = admin_service::update_order_status(
        &state,
        &staff,
        order_id,
        UpdateOrderStatusRequest {
            status_id: delivery_status::TRACKING_NUMBER_POSTED,
            tracking_number: Some("LBC-0001".into()),
            note: Some("handed to courier".into()),
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(tracked.delivery.tracking_number.as_deref(), Some("LBC-0001"));
    assert_eq!(tracked.history.len(), 2);

    // the staff order listing is closed to customers
    let err = admin_service::list_orders(&state, &customer, Default::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // past pending, the customer may no longer cancel
    let err = order_service::cancel_my_order(&state, &customer, order_id, CancelOrderRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // a second order is cancelled while pending and its stock comes back
    add(&state, &customer, part, 2).await?;
    let second = order_service::checkout(&state, &customer, checkout(approved_address_id))
        .await?
        .data
        .unwrap();
    assert_eq!(product_stock(&state, part).await?, 3);

    let cancelled = order_service::cancel_my_order(
        &state,
        &customer,
        second.order.id,
        CancelOrderRequest::default(),
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cancelled.delivery.status_id, delivery_status::CANCELLED);
    assert_eq!(cancelled.history.len(), 2);
    assert_eq!(product_stock(&state, part).await?, 5);

    // cancelling twice neither restocks nor adds history
    let err = order_service::cancel_my_order(
        &state,
        &customer,
        second.order.id,
        CancelOrderRequest::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(product_stock(&state, part).await?, 5);

    // another customer does not see the order
    let stranger = create_account(&state, Role::Customer).await?;
    let err = order_service::get_my_order(&state, &stranger, order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    cart_cap(&state).await?;
    Ok(())
}

async fn cart_cap(state: &AppState) -> anyhow::Result<()> {
    let customer = create_account(state, Role::Customer).await?;
    let mut first = None;
    for _ in 0..cart_service::MAX_CART_LINES {
        let id = create_product(state, 1_000, 5, 0.5).await?;
        add(state, &customer, id, 1).await?;
        first.get_or_insert(id);
    }

    let extra = create_product(state, 1_000, 5, 0.5).await?;
    let err = add(state, &customer, extra, 1).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // a product already in the full cart can still grow
    let first = first.expect("at least one line");
    let cart = add(state, &customer, first, 1).await?;
    assert_eq!(cart.items.len() as i64, cart_service::MAX_CART_LINES);

    let merged = cart_service::merge_guest_cart(
        &state.pool,
        &customer,
        MergeCartRequest {
            items: vec![
                AddToCartRequest {
                    product_id: extra,
                    quantity: 1,
                },
                AddToCartRequest {
                    product_id: first,
                    quantity: 1,
                },
            ],
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(merged.skipped.len(), 1);
    assert_eq!(merged.skipped[0].product_id, extra);

    concurrent_adds_share_the_last_slot(state).await
}

async fn concurrent_adds_share_the_last_slot(state: &AppState) -> anyhow::Result<()> {
    let customer = create_account(state, Role::Customer).await?;
    for _ in 0..cart_service::MAX_CART_LINES - 1 {
        let id = create_product(state, 1_000, 5, 0.5).await?;
        add(state, &customer, id, 1).await?;
    }

    let left = create_product(state, 1_000, 5, 0.5).await?;
    let right = create_product(state, 1_000, 5, 0.5).await?;
    let (a, b) = tokio::join!(
        add(state, &customer, left, 1),
        add(state, &customer, right, 1)
    );
    assert_eq!(
        usize::from(a.is_ok()) + usize::from(b.is_ok()),
        1,
        "exactly one add takes the last slot"
    );

    let cart = cart_service::list_cart(&state.pool, &customer)
        .await?
        .data
        .unwrap();
    assert_eq!(cart.items.len() as i64, cart_service::MAX_CART_LINES);
    Ok(())
}

async fn add(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    quantity: i32,
) -> Result<autoparts_api::dto::cart::CartSummary, AppError> {
    let response = cart_service::add_to_cart(
        &state.pool,
        user,
        AddToCartRequest {
            product_id,
            quantity,
        },
    )
    .await?;
    Ok(response.data.expect("cart summary"))
}
