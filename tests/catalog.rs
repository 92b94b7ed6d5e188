mod common;

use storefront_api::{
    catalog::ProductStatus,
    dto::{
        cart::{AddToCartRequest, ValidateCartRequest},
        orders::CreateOrderRequest,
        products::{AdjustStockRequest, ApplyPromotionRequest, SearchQuery, UpdateProductRequest},
    },
    error::AppError,
    models::ProductDetails,
    routes::params::{LowStockQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{cart_service, inventory_service, order_service, product_service},
};

#[tokio::test]
async fn promotion_apply_and_remove_drive_status() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Stickers").await?;
    let product = common::create_product(&state, &admin, category, "Fox sticker", 500, 8).await?;
    let promo = common::create_running_promotion(&state, &admin, "FOX10", 10).await?;

    let before = product_service::get_product(&state, product).await?.data.expect("product");
    assert_eq!(before.status, ProductStatus::Disponible);
    assert_eq!(before.discounted_price, None);

    let applied = product_service::apply_promotion(
        &state,
        &admin,
        product,
        ApplyPromotionRequest {
            promotion_id: Some(promo),
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(applied.status, ProductStatus::EnPromotion);
    assert_eq!(applied.discounted_price, Some(450));
    assert_eq!(applied.promotions.len(), 1);

    // attaching twice keeps a single link
    let again = product_service::apply_promotion(
        &state,
        &admin,
        product,
        ApplyPromotionRequest {
            promotion_id: Some(promo),
        },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(again.promotions.len(), 1);

    let on_sale = product_service::active_promotions(&state).await?.data.expect("list");
    assert_eq!(on_sale.items.len(), 1);
    assert_eq!(on_sale.items[0].id, product);

    let removed = product_service::remove_promotion(&state, &admin, product, promo)
        .await?
        .data
        .expect("product");
    assert_eq!(removed.status, ProductStatus::Disponible);
    assert!(removed.promotions.is_empty());

    let on_sale = product_service::active_promotions(&state).await?.data.expect("list");
    assert!(on_sale.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn status_follows_stock_and_activity() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Prints").await?;
    let product = common::create_product(&state, &admin, category, "Print", 2_500, 0).await?;

    let empty = product_service::get_product(&state, product).await?.data.expect("product");
    assert_eq!(empty.status, ProductStatus::EnRupture);

    let restocked = inventory_service::adjust_stock(
        &state,
        &admin,
        product,
        AdjustStockRequest { delta: 3 },
    )
    .await?
    .data
    .expect("product");
    assert_eq!(restocked.stock, 3);
    assert_eq!(restocked.status, ProductStatus::Disponible);

    let below_zero = inventory_service::adjust_stock(
        &state,
        &admin,
        product,
        AdjustStockRequest { delta: -4 },
    )
    .await;
    assert!(matches!(below_zero, Err(AppError::BadRequest(_))));
    let unchanged = product_service::get_product(&state, product).await?.data.expect("product");
    assert_eq!(unchanged.stock, 3);
    Ok(())
}

#[tokio::test]
async fn stock_adjustment_out_of_range_is_rejected() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Prints").await?;
    let product = common::create_product(&state, &admin, category, "Print", 2_500, 10).await?;

    let huge = inventory_service::adjust_stock(
        &state,
        &admin,
        product,
        AdjustStockRequest { delta: i32::MAX },
    )
    .await;
    assert!(matches!(huge, Err(AppError::BadRequest(_))));

    let unchanged = product_service::get_product(&state, product).await?.data.expect("product");
    assert_eq!(unchanged.stock, 10);
    Ok(())
}

#[tokio::test]
async fn withdrawn_products_are_not_listed_as_on_sale() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Stickers").await?;
    let live = common::create_product(&state, &admin, category, "Live", 500, 3).await?;
    let withdrawn = common::create_product(&state, &admin, category, "Withdrawn", 500, 3).await?;
    let promo = common::create_running_promotion(&state, &admin, "BOTH", 15).await?;

    for id in [live, withdrawn] {
        product_service::apply_promotion(
            &state,
            &admin,
            id,
            ApplyPromotionRequest {
                promotion_id: Some(promo),
            },
        )
        .await?;
    }
    product_service::update_product(
        &state,
        &admin,
        withdrawn,
        UpdateProductRequest {
            active: Some(false),
            ..Default::default()
        },
    )
    .await?;

    let on_sale = product_service::active_promotions(&state).await?.data.expect("list");
    let ids: Vec<_> = on_sale.items.iter().map(|p| p.id).collect();
    assert_eq!(ids, [live]);
    Ok(())
}

#[tokio::test]
async fn search_treats_wildcards_literally() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Mugs").await?;
    common::create_product(&state, &admin, category, "50% off mug", 800, 2).await?;
    common::create_product(&state, &admin, category, "500 ml mug", 900, 2).await?;
    common::create_product(&state, &admin, category, "Tea_cup", 700, 2).await?;
    common::create_product(&state, &admin, category, "Teacup", 700, 2).await?;

    let percent = product_service::search_products(
        &state,
        SearchQuery {
            name: Some("50%".into()),
        },
    )
    .await?
    .data
    .expect("results");
    let names: Vec<_> = percent.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["50% off mug"]);

    let underscore = product_service::search_products(
        &state,
        SearchQuery {
            name: Some("tea_".into()),
        },
    )
    .await?
    .data
    .expect("results");
    let names: Vec<_> = underscore.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Tea_cup"]);

    let listed = product_service::list_products(
        &state,
        ProductQuery {
            q: Some("50%".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(listed.items.len(), 1);
    Ok(())
}

#[tokio::test]
async fn search_is_case_insensitive_and_requires_a_term() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Drawings").await?;
    common::create_product(&state, &admin, category, "Blue Whale", 1_200, 2).await?;
    common::create_product(&state, &admin, category, "Red Panda", 1_300, 2).await?;

    let found = product_service::search_products(
        &state,
        SearchQuery {
            name: Some("WHALE".into()),
        },
    )
    .await?
    .data
    .expect("results");
    assert_eq!(found.items.len(), 1);
    assert_eq!(found.items[0].name, "Blue Whale");

    let blank = product_service::search_products(&state, SearchQuery { name: Some("  ".into()) }).await;
    assert!(matches!(blank, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn listing_filters_and_sorts() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let stickers = common::create_category(&state, &admin, "Stickers").await?;
    let prints = common::create_category(&state, &admin, "Prints").await?;
    common::create_product(&state, &admin, stickers, "Cheap", 100, 1).await?;
    common::create_product(&state, &admin, stickers, "Mid", 1_000, 1).await?;
    common::create_product(&state, &admin, prints, "Pricey", 9_000, 1).await?;

    let listed = product_service::list_products(
        &state,
        ProductQuery {
            category_id: Some(stickers),
            sort_by: Some(ProductSortBy::Price),
            sort_order: Some(SortOrder::Asc),
            ..Default::default()
        },
    )
    .await?;
    let names: Vec<_> = listed
        .data
        .expect("list")
        .items
        .into_iter()
        .map(|p| p.name)
        .collect();
    assert_eq!(names, ["Cheap", "Mid"]);
    assert_eq!(listed.meta.and_then(|m| m.total), Some(2));

    let ranged = product_service::list_products(
        &state,
        ProductQuery {
            min_price: Some(500),
            max_price: Some(5_000),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("list");
    assert_eq!(ranged.items.len(), 1);
    assert_eq!(ranged.items[0].name, "Mid");

    let by_category = product_service::products_by_category(&state, prints)
        .await?
        .data
        .expect("list");
    assert_eq!(by_category.items.len(), 1);

    let arrivals = product_service::new_arrivals(&state).await?.data.expect("list");
    assert_eq!(arrivals.items.len(), 3);
    Ok(())
}

#[tokio::test]
async fn recommendations_put_same_category_first() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let stickers = common::create_category(&state, &admin, "Stickers").await?;
    let prints = common::create_category(&state, &admin, "Prints").await?;
    let seed = common::create_product(&state, &admin, stickers, "Seed", 100, 1).await?;
    let sibling_a = common::create_product(&state, &admin, stickers, "Sibling A", 100, 1).await?;
    let sibling_b = common::create_product(&state, &admin, stickers, "Sibling B", 100, 1).await?;
    let other = common::create_product(&state, &admin, prints, "Other", 100, 1).await?;

    let recommended = product_service::recommendations(&state, seed)
        .await?
        .data
        .expect("list");
    let ids: Vec<_> = recommended.items.iter().map(|p| p.id).collect();
    assert_eq!(ids.len(), 3);
    assert!(!ids.contains(&seed));
    assert!(ids[..2].contains(&sibling_a));
    assert!(ids[..2].contains(&sibling_b));
    assert_eq!(ids[2], other);
    Ok(())
}

#[tokio::test]
async fn low_stock_report_uses_threshold() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let category = common::create_category(&state, &admin, "Mugs").await?;
    common::create_product(&state, &admin, category, "Almost gone", 500, 1).await?;
    common::create_product(&state, &admin, category, "At threshold", 500, 5).await?;
    common::create_product(&state, &admin, category, "Plenty", 500, 50).await?;

    let report = inventory_service::list_low_stock(&state, &admin, LowStockQuery::default())
        .await?
        .data
        .expect("report");
    let names: Vec<_> = report.items.iter().map(|row| row.product_name.as_str()).collect();
    assert_eq!(names, ["Almost gone", "At threshold"]);

    let strict = inventory_service::list_low_stock(
        &state,
        &admin,
        LowStockQuery {
            threshold: Some(2),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("report");
    assert_eq!(strict.items.len(), 1);

    let customer = common::customer(&state, "curious@example.com").await?;
    let denied = inventory_service::list_low_stock(&state, &customer, LowStockQuery::default()).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn catalog_writes_require_admin() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let customer = common::customer(&state, "shopper@example.com").await?;
    let category = common::create_category(&state, &admin, "Stickers").await?;

    let denied = product_service::create_product(
        &state,
        &customer,
        common::product_request(category, "Sneaky", 100, 1),
    )
    .await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    let mut incomplete = common::product_request(category, "Sticker", 100, 1);
    incomplete.details = ProductDetails::Sticker {
        format: "round".into(),
        dimensions: "".into(),
        material: "vinyl".into(),
    };
    let rejected = product_service::create_product(&state, &admin, incomplete).await;
    assert!(matches!(rejected, Err(AppError::BadRequest(_))));

    let mut sticker = common::product_request(category, "Sticker", 100, 1);
    sticker.details = ProductDetails::Sticker {
        format: "round".into(),
        dimensions: "5x5cm".into(),
        material: "vinyl".into(),
    };
    let created = product_service::create_product(&state, &admin, sticker)
        .await?
        .data
        .expect("product");
    assert!(matches!(created.details, ProductDetails::Sticker { ref material, .. } if material == "vinyl"));
    Ok(())
}

#[tokio::test]
async fn deleting_a_product_keeps_order_snapshots() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let buyer = common::customer(&state, "keeper@example.com").await?;
    let category = common::create_category(&state, &admin, "Prints").await?;
    let product = common::create_product(&state, &admin, category, "Limited", 4_000, 2).await?;

    cart_service::add_product(
        &state,
        &buyer,
        AddToCartRequest {
            product_id: product,
            quantity: 1,
        },
    )
    .await?;
    let placed = cart_service::validate_cart(
        &state,
        &buyer,
        ValidateCartRequest {
            shipping_address: "3 quai Voltaire".into(),
            payment_method: "paypal".into(),
        },
    )
    .await?
    .data
    .expect("order");

    product_service::delete_product(&state, &admin, product).await?;
    let missing = product_service::get_product(&state, product).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let kept = order_service::get_order(&state, &buyer, placed.order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(kept.items.len(), 1);
    assert_eq!(kept.items[0].product_id, None);
    assert_eq!(kept.items[0].product_name, "Limited");
    assert_eq!(kept.items[0].unit_price, 4_000);

    let nothing_to_order = order_service::create_order(&state, &buyer, CreateOrderRequest::default()).await;
    assert!(matches!(nothing_to_order, Err(AppError::BadRequest(_))));
    Ok(())
}
