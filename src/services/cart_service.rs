use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::{
        cart::{AddToCartRequest, UpdateQuantityRequest, ValidateCartRequest},
        orders::OrderWithItems,
    },
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartLine},
    response::{ApiResponse, Meta},
    services::{
        inventory_service::stock_of,
        order_service::{ensure_sufficient_stock, place_order},
        product_service::{find_product, load_products},
    },
    state::AppState,
};

/// Every user has at most one cart; it is created on first access.
pub(crate) async fn get_or_create_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<CartModel> {
    if let Some(cart) = find_cart(conn, user_id).await? {
        return Ok(cart);
    }

    let now = Utc::now();
    let created = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await;

    match created {
        Ok(cart) => Ok(cart),
        // A concurrent request won the unique `user_id` race.
        Err(err) => find_cart(conn, user_id).await?.ok_or(AppError::OrmError(err)),
    }
}

async fn find_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<Option<CartModel>> {
    Ok(Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(conn)
        .await?)
}

/// Lines priced at the current effective price of each product.
async fn render_cart<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<Cart> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .all(conn)
        .await?;

    let product_ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let models = if product_ids.is_empty() {
        Vec::new()
    } else {
        Products::find()
            .filter(ProdCol::Id.is_in(product_ids))
            .all(conn)
            .await?
    };
    let products: HashMap<Uuid, _> = load_products(conn, models)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let items: Vec<CartLine> = lines
        .into_iter()
        .filter_map(|line| {
            let product = products.get(&line.product_id)?;
            let unit_price = product.discounted_price.unwrap_or(product.price);
            Some(CartLine {
                id: line.id,
                product_id: line.product_id,
                product_name: product.name.clone(),
                unit_price,
                quantity: line.quantity,
                line_total: unit_price * i64::from(line.quantity),
            })
        })
        .collect();
    let total = items.iter().map(|line| line.line_total).sum();

    Ok(Cart {
        id: cart.id,
        user_id: cart.user_id,
        items,
        total,
        created_at: cart.created_at.with_timezone(&Utc),
        updated_at: cart.updated_at.with_timezone(&Utc),
    })
}

async fn touch_cart<C: ConnectionTrait>(conn: &C, cart: CartModel) -> AppResult<CartModel> {
    let mut active: CartActive = cart.into();
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(conn).await?)
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let cart = render_cart(&state.orm, cart).await?;
    let meta = Meta::total(cart.items.len());
    Ok(ApiResponse::success("Cart", cart, Some(meta)))
}

/// Adding a product already in the cart increments its line; the cumulative
/// quantity must stay within available stock.
pub async fn add_product(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    payload.validate()?;
    let product = find_product(&state.orm, payload.product_id).await?;
    if !product.active {
        return Err(AppError::BadRequest(format!(
            "Product {} is not available",
            product.name
        )));
    }

    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?;

    let available = stock_of(&state.orm, product.id).await?;
    let requested = payload
        .quantity
        .checked_add(existing.as_ref().map(|line| line.quantity).unwrap_or(0))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Insufficient stock for {}: {available} available",
                product.name
            ))
        })?;
    ensure_sufficient_stock(&product.name, available, requested)?;

    match existing {
        Some(line) => {
            let mut active: CartItemActive = line.into();
            active.quantity = Set(requested);
            active.update(&state.orm).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(requested),
                created_at: Set(Utc::now().into()),
            }
            .insert(&state.orm)
            .await?;
        }
    }
    let cart = touch_cart(&state.orm, cart).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": requested }),
    )
    .await;

    let cart = render_cart(&state.orm, cart).await?;
    Ok(ApiResponse::success("Product added to cart", cart, Some(Meta::empty())))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    article_id: Uuid,
    payload: UpdateQuantityRequest,
) -> AppResult<ApiResponse<Cart>> {
    payload.validate()?;
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let line = CartItems::find_by_id(article_id)
        .filter(CartItemCol::CartId.eq(cart.id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Cart item {article_id}")))?;

    let product = find_product(&state.orm, line.product_id).await?;
    let available = stock_of(&state.orm, product.id).await?;
    ensure_sufficient_stock(&product.name, available, payload.quantity)?;

    let mut active: CartItemActive = line.into();
    active.quantity = Set(payload.quantity);
    active.update(&state.orm).await?;
    let cart = touch_cart(&state.orm, cart).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "cart_item_id": article_id, "quantity": payload.quantity }),
    )
    .await;

    let cart = render_cart(&state.orm, cart).await?;
    Ok(ApiResponse::success("Quantity updated", cart, Some(Meta::empty())))
}

pub async fn remove_article(
    state: &AppState,
    user: &AuthUser,
    article_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let result = CartItems::delete_many()
        .filter(CartItemCol::Id.eq(article_id))
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Cart item {article_id}")));
    }
    let cart = touch_cart(&state.orm, cart).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "cart_item_id": article_id }),
    )
    .await;

    let cart = render_cart(&state.orm, cart).await?;
    Ok(ApiResponse::success("Removed from cart", cart, Some(Meta::empty())))
}

pub async fn empty_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = get_or_create_cart(&state.orm, user.user_id).await?;
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&state.orm)
        .await?;
    let cart = touch_cart(&state.orm, cart).await?;

    if result.rows_affected > 0 {
        audit::record(
            &state.orm,
            Some(user.user_id),
            "cart_empty",
            "cart_items",
            serde_json::json!({ "removed": result.rows_affected }),
        )
        .await;
    }

    let cart = render_cart(&state.orm, cart).await?;
    Ok(ApiResponse::success("Cart emptied", cart, Some(Meta::empty())))
}

pub async fn validate_cart(
    state: &AppState,
    user: &AuthUser,
    payload: ValidateCartRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;
    let placed = place_order(
        state,
        user,
        Some(payload.shipping_address),
        Some(payload.payment_method),
    )
    .await?;
    Ok(ApiResponse::success("Cart validated", placed, Some(Meta::empty())))
}
