mod common;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use storefront_api::{
    dto::{
        cart::{AddToCartRequest, UpdateQuantityRequest, ValidateCartRequest},
        products::{UpdateProductRequest, UpdateStockRequest},
    },
    entity::{cart_items, enums::OrderStatus, orders},
    error::AppError,
    routes::params::Pagination,
    services::{cart_service, inventory_service, product_service},
};
use uuid::Uuid;

fn validate_request() -> ValidateCartRequest {
    ValidateCartRequest {
        shipping_address: "12 rue des Lilas, Paris".into(),
        payment_method: "card".into(),
    }
}

#[tokio::test]
async fn checkout_turns_cart_into_validated_order() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "buyer@example.com").await?;
    let category = common::create_category(&state, &admin, "Stickers").await?;
    let product = common::create_product(&state, &admin, category, "Holo cat", 1_500, 10).await?;

    cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 2,
        },
    )
    .await?;
    let cart = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 3,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.total, 7_500);

    let line_id = cart.items[0].id;
    let too_many = cart_service::update_quantity(
        &state,
        &buyer,
        line_id,
        UpdateQuantityRequest { quantity: 12 },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let placed = cart_service::validate_cart(&state, &buyer, validate_request())
        .await?
        .data
        .expect("order");
    assert_eq!(placed.order.order_status, OrderStatus::Validated);
    assert_eq!(placed.order.total_amount, 7_500);
    assert_eq!(placed.items.len(), 1);
    assert_eq!(placed.items[0].quantity, 5);
    assert_eq!(placed.items[0].unit_price, 1_500);
    assert_eq!(placed.items[0].product_name, "Holo cat");

    let cart = cart_service::get_cart(&state, &buyer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    assert_eq!(cart.total, 0);

    let stored = product_service::get_product(&state, product).await?.data.expect("product");
    assert_eq!(stored.stock, 5);

    let history = inventory_service::stock_history(&state, &admin, product, Pagination::default())
        .await?
        .data
        .expect("history");
    let last = history.items.first().expect("latest entry");
    assert_eq!(last.reason, inventory_service::REASON_CHECKOUT);
    assert_eq!(last.quantity_before, 10);
    assert_eq!(last.quantity_after, 5);
    assert_eq!(last.changed_by, Some(buyer.user_id));
    Ok(())
}

#[tokio::test]
async fn oversized_quantity_on_repeat_add_is_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "greedy@example.com").await?;
    let category = common::create_category(&state, &admin, "Stickers").await?;
    let product = common::create_product(&state, &admin, category, "Holo dog", 1_000, 10).await?;

    cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 5,
        },
    )
    .await?;
    let overflow = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: i32::MAX,
        },
    )
    .await;
    assert!(matches!(overflow, Err(AppError::BadRequest(_))));

    let cart = cart_service::get_cart(&state, &buyer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    Ok(())
}

#[tokio::test]
async fn cart_lines_are_unique_per_product_and_positive() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "rows@example.com").await?;
    let category = common::create_category(&state, &admin, "Pins").await?;
    let product = common::create_product(&state, &admin, category, "Pin", 300, 10).await?;

    let cart = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 1,
        },
    )
    .await?
    .data
    .expect("cart");

    let line = |quantity: i32| cart_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        cart_id: Set(cart.id),
        product_id: Set(product),
        quantity: Set(quantity),
        created_at: Set(Utc::now().into()),
    };
    assert!(line(2).insert(&state.orm).await.is_err());

    cart_service::empty_cart(&state, &buyer).await?;
    assert!(line(0).insert(&state.orm).await.is_err());
    assert!(line(1).insert(&state.orm).await.is_ok());
    Ok(())
}

#[tokio::test]
async fn validating_an_empty_cart_creates_nothing() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let buyer = common::customer(&state, "empty@example.com").await?;

    let result = cart_service::validate_cart(&state, &buyer, validate_request()).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let orders = orders::Entity::find()
        .filter(orders::Column::UserId.eq(buyer.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(orders, 0);
    Ok(())
}

#[tokio::test]
async fn stock_is_rechecked_at_checkout() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "late@example.com").await?;
    let category = common::create_category(&state, &admin, "Prints").await?;
    let product = common::create_product(&state, &admin, category, "Poster", 2_000, 4).await?;

    cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 3,
        },
    )
    .await?;
    inventory_service::update_stock(&state, &admin, product, UpdateStockRequest { stock: 2 })
        .await?;

    let result = cart_service::validate_cart(&state, &buyer, validate_request()).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))));

    let cart = cart_service::get_cart(&state, &buyer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    let stored = product_service::get_product(&state, product).await?.data.expect("product");
    assert_eq!(stored.stock, 2);
    Ok(())
}

#[tokio::test]
async fn cart_rejects_unknown_and_withdrawn_products() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "picky@example.com").await?;
    let category = common::create_category(&state, &admin, "Mugs").await?;
    let product = common::create_product(&state, &admin, category, "Mug", 900, 5).await?;

    let missing = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    product_service::update_product(
        &state,
        &admin,
        product,
        UpdateProductRequest {
            active: Some(false),
            ..Default::default()
        },
    )
    .await?;
    let withdrawn = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 1,
        },
    )
    .await;
    assert!(matches!(withdrawn, Err(AppError::BadRequest(_))));

    let zero = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 0,
        },
    )
    .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));

    let absent_line = cart_service::remove_article(&state, &buyer, Uuid::new_v4()).await;
    assert!(matches!(absent_line, Err(AppError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn lines_can_be_removed_and_cart_emptied() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "tidy@example.com").await?;
    let category = common::create_category(&state, &admin, "Pins").await?;
    let pin = common::create_product(&state, &admin, category, "Pin", 300, 10).await?;
    let patch = common::create_product(&state, &admin, category, "Patch", 450, 10).await?;

    for product_id in [pin, patch] {
        cart_service::add_product(
            &state,
            &buyer,
            AddToCartRequest {
                product_id,
                quantity: 2,
            },
        )
        .await?;
    }

    let cart = cart_service::get_cart(&state, &buyer).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total, 1_500);

    let pin_line = cart
        .items
        .iter()
        .find(|line| line.product_id == pin)
        .expect("pin line")
        .id;
    let cart = cart_service::remove_article(&state, &buyer, pin_line)
        .await?
        .data
        .expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, patch);

    let cart = cart_service::empty_cart(&state, &buyer).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn promotion_price_is_snapshotted_on_order_lines() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "deal@example.com").await?;
    let category = common::create_category(&state, &admin, "Drawings").await?;
    let product = common::create_product(&state, &admin, category, "Sketch", 1_000, 3).await?;
    let promo = common::create_running_promotion(&state, &admin, "spring", 20).await?;
    product_service::update_product(
        &state,
        &admin,
        product,
        UpdateProductRequest {
            promotion_ids: Some(vec![promo]),
            ..Default::default()
        },
    )
    .await?;

    let cart = cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 2,
        },
    )
    .await?
    .data
    .expect("cart");
    assert_eq!(cart.items[0].unit_price, 800);

    let placed = cart_service::validate_cart(&state, &buyer, validate_request())
        .await?
        .data
        .expect("order");
    assert_eq!(placed.items[0].unit_price, 800);
    assert_eq!(placed.order.total_amount, 1_600);
    Ok(())
}
