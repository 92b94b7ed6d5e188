mod common;

use storefront_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CreateOrderRequest, UpdateOrderRequest},
    },
    entity::enums::{OrderStatus, PaymentStatus, ShippingStatus},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::OrderListQuery,
    services::{cart_service, order_service},
    state::AppState,
};
use uuid::Uuid;

async fn fill_cart(state: &AppState, user: &AuthUser, product_id: Uuid) -> anyhow::Result<()> {
    cart_service::add_product(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity: 1,
        },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn order_without_payment_stays_pending_until_completed() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "buyer@example.com").await?;
    let category = common::create_category(&state, &admin, "Stickers").await?;
    let product = common::create_product(&state, &admin, category, "Star", 250, 5).await?;
    fill_cart(&state, &buyer, product).await?;

    let created = order_service::create_order(
        &state,
        &buyer,
        CreateOrderRequest {
            shipping_address: Some("8 avenue Foch".into()),
            payment_method: None,
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(created.order.order_status, OrderStatus::Pending);
    assert_eq!(created.order.payment_status, PaymentStatus::Pending);
    assert_eq!(created.order.shipping_status, ShippingStatus::Preparation);
    assert_eq!(created.order.total_amount, 250);

    let updated = order_service::update_order(
        &state,
        &buyer,
        created.order.id,
        UpdateOrderRequest {
            shipping_address: Some("9 avenue Foch".into()),
            payment_method: Some("card".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(updated.order.order_status, OrderStatus::Validated);
    assert_eq!(updated.order.shipping_address.as_deref(), Some("9 avenue Foch"));
    assert_eq!(updated.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn fulfilment_fields_are_admin_only() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "buyer@example.com").await?;
    let category = common::create_category(&state, &admin, "Prints").await?;
    let product = common::create_product(&state, &admin, category, "Map", 3_000, 5).await?;
    fill_cart(&state, &buyer, product).await?;
    let order_id = order_service::create_order(&state, &buyer, CreateOrderRequest::default())
        .await?
        .data
        .expect("order")
        .order
        .id;

    let denied = order_service::update_order(
        &state,
        &buyer,
        order_id,
        UpdateOrderRequest {
            order_status: Some(OrderStatus::Livree),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let shipped = order_service::update_order(
        &state,
        &admin,
        order_id,
        UpdateOrderRequest {
            order_status: Some(OrderStatus::Expediee),
            shipping_status: Some(ShippingStatus::Expediee),
            shipping_cost: Some(490),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("order");
    assert_eq!(shipped.order.order_status, OrderStatus::Expediee);
    assert_eq!(shipped.order.shipping_status, ShippingStatus::Expediee);
    assert_eq!(shipped.order.shipping_cost, Some(490));
    Ok(())
}

#[tokio::test]
async fn orders_are_private_to_their_owner() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let alice = common::customer(&state, "alice@example.com").await?;
    let bob = common::customer(&state, "bob@example.com").await?;
    let category = common::create_category(&state, &admin, "Mugs").await?;
    let product = common::create_product(&state, &admin, category, "Mug", 1_100, 10).await?;

    fill_cart(&state, &alice, product).await?;
    let alice_order = order_service::create_order(&state, &alice, CreateOrderRequest::default())
        .await?
        .data
        .expect("order")
        .order
        .id;
    fill_cart(&state, &bob, product).await?;
    order_service::create_order(&state, &bob, CreateOrderRequest::default()).await?;

    let hidden = order_service::get_order(&state, &bob, alice_order).await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));

    let bobs = order_service::list_orders(&state, &bob, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(bobs.items.len(), 1);
    assert!(bobs.items.iter().all(|order| order.user_id == bob.user_id));

    let all = order_service::list_orders(&state, &admin, OrderListQuery::default())
        .await?
        .data
        .expect("orders");
    assert_eq!(all.items.len(), 2);

    let validated = order_service::list_orders(
        &state,
        &admin,
        OrderListQuery {
            status: Some(OrderStatus::Validated),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("orders");
    assert!(validated.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn only_admins_delete_orders() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "buyer@example.com").await?;
    let category = common::create_category(&state, &admin, "Pins").await?;
    let product = common::create_product(&state, &admin, category, "Pin", 200, 10).await?;
    fill_cart(&state, &buyer, product).await?;
    let order_id = order_service::create_order(&state, &buyer, CreateOrderRequest::default())
        .await?
        .data
        .expect("order")
        .order
        .id;

    let denied = order_service::remove_order(&state, &buyer, order_id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    order_service::remove_order(&state, &admin, order_id).await?;
    let gone = order_service::get_order(&state, &admin, order_id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));

    let again = order_service::remove_order(&state, &admin, order_id).await;
    assert!(matches!(again, Err(AppError::NotFound(_))));
    Ok(())
}
