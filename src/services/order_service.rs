use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    db::for_update,
    dto::orders::{CreateOrderRequest, OrderList, OrderWithItems, UpdateOrderRequest},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        enums::{OrderStatus, PaymentStatus, ShippingStatus},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{
        inventory_service::{REASON_CHECKOUT, locked_stock_of, write_stock},
        product_service::load_products,
    },
    state::AppState,
};

/// An order carrying both a shipping address and a payment method is validated.
pub(crate) fn initial_status(shipping_address: Option<&str>, payment_method: Option<&str>) -> OrderStatus {
    match (shipping_address, payment_method) {
        (Some(_), Some(_)) => OrderStatus::Validated,
        _ => OrderStatus::Pending,
    }
}

/// Status after an update. Supplying address and payment together forces
/// `validated`, overriding any explicitly requested status.
pub(crate) fn resolve_status(current: OrderStatus, payload: &UpdateOrderRequest) -> OrderStatus {
    if payload.shipping_address.is_some() && payload.payment_method.is_some() {
        return OrderStatus::Validated;
    }
    payload.order_status.unwrap_or(current)
}

pub(crate) fn ensure_sufficient_stock(product: &str, available: i32, requested: i32) -> AppResult<()> {
    if requested > available {
        return Err(AppError::BadRequest(format!(
            "Insufficient stock for {product}: {available} available, {requested} requested"
        )));
    }
    Ok(())
}

/// Turns the caller's cart into an order in one transaction: lines and
/// inventory rows are locked, stock is re-checked and decremented through the
/// ledger, and the cart is emptied. Nothing is written if any step fails.
pub(crate) async fn place_order(
    state: &AppState,
    user: &AuthUser,
    shipping_address: Option<String>,
    payment_method: Option<String>,
) -> AppResult<OrderWithItems> {
    let txn = state.orm.begin().await?;
    let backend = txn.get_database_backend();

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .one(&txn)
        .await?;
    let lines = match &cart {
        Some(cart) => {
            for_update(
                CartItems::find()
                    .filter(CartItemCol::CartId.eq(cart.id))
                    .order_by_asc(CartItemCol::CreatedAt),
                backend,
            )
            .all(&txn)
            .await?
        }
        None => Vec::new(),
    };
    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let product_ids: Vec<Uuid> = lines.iter().map(|line| line.product_id).collect();
    let models = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?;
    let products: HashMap<Uuid, _> = load_products(&txn, models)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let now = Utc::now();
    let order_id = Uuid::new_v4();
    let mut total_amount: i64 = 0;
    let mut pending_items = Vec::with_capacity(lines.len());

    for line in &lines {
        let product = products
            .get(&line.product_id)
            .ok_or_else(|| AppError::not_found(format!("Product {}", line.product_id)))?;
        if !product.active {
            return Err(AppError::BadRequest(format!(
                "Product {} is no longer available",
                product.name
            )));
        }
        let available = locked_stock_of(&txn, product.id).await?;
        ensure_sufficient_stock(&product.name, available, line.quantity)?;

        let unit_price = product.discounted_price.unwrap_or(product.price);
        total_amount += unit_price * i64::from(line.quantity);
        pending_items.push((product.id, product.name.clone(), line.quantity, unit_price, available));
    }

    let order_status = initial_status(shipping_address.as_deref(), payment_method.as_deref());
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        shipping_address: Set(shipping_address),
        payment_method: Set(payment_method),
        order_status: Set(order_status),
        payment_status: Set(PaymentStatus::Pending),
        shipping_status: Set(ShippingStatus::Preparation),
        total_amount: Set(total_amount),
        shipping_cost: Set(None),
        expedition_date: Set(None),
        estimated_delivery_date: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(pending_items.len());
    for (product_id, product_name, quantity, unit_price, available) in pending_items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product_id)),
            product_name: Set(product_name),
            quantity: Set(quantity),
            unit_price: Set(unit_price),
            created_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));

        write_stock(
            &txn,
            product_id,
            available - quantity,
            Some(user.user_id),
            REASON_CHECKOUT,
        )
        .await?;
    }

    if let Some(cart) = &cart {
        CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart.id))
            .exec(&txn)
            .await?;
    }

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total_amount,
        lines = items.len(),
        "order placed"
    );
    audit::record(
        &state.orm,
        Some(user.user_id),
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_amount": total_amount }),
    )
    .await;

    Ok(OrderWithItems {
        order: order_from_entity(order),
        items,
    })
}

pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;
    let placed = place_order(state, user, payload.shipping_address, payload.payment_method).await?;
    Ok(ApiResponse::success("Order created", placed, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::OrderStatus.eq(status));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let finder = Orders::find()
        .filter(condition)
        .order_by(OrderCol::CreatedAt, sort_order.into());

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

/// Orders of other users look absent to non-admins.
async fn find_visible_order<C: ConnectionTrait>(
    conn: &C,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<OrderModel> {
    let mut condition = Condition::all().add(OrderCol::Id.eq(id));
    if !user.is_admin() {
        condition = condition.add(OrderCol::UserId.eq(user.user_id));
    }
    Orders::find()
        .filter(condition)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {id}")))
}

async fn order_items<C: ConnectionTrait>(conn: &C, order_id: Uuid) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect())
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_visible_order(&state.orm, user, id).await?;
    let items = order_items(&state.orm, order.id).await?;
    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        None,
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    payload.validate()?;
    let touches_fulfilment = payload.order_status.is_some()
        || payload.payment_status.is_some()
        || payload.shipping_status.is_some()
        || payload.shipping_cost.is_some()
        || payload.expedition_date.is_some()
        || payload.estimated_delivery_date.is_some();
    if touches_fulfilment {
        ensure_admin(user)?;
    }

    let existing = find_visible_order(&state.orm, user, id).await?;
    let order_status = resolve_status(existing.order_status, &payload);

    let mut active: OrderActive = existing.into();
    active.order_status = Set(order_status);
    if let Some(address) = payload.shipping_address {
        active.shipping_address = Set(Some(address));
    }
    if let Some(method) = payload.payment_method {
        active.payment_method = Set(Some(method));
    }
    if let Some(status) = payload.payment_status {
        active.payment_status = Set(status);
    }
    if let Some(status) = payload.shipping_status {
        active.shipping_status = Set(status);
    }
    if let Some(cost) = payload.shipping_cost {
        active.shipping_cost = Set(Some(cost));
    }
    if let Some(date) = payload.expedition_date {
        active.expedition_date = Set(Some(date.into()));
    }
    if let Some(date) = payload.estimated_delivery_date {
        active.estimated_delivery_date = Set(Some(date.into()));
    }
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;
    let items = order_items(&state.orm, order.id).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_status": order.order_status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    OrderItems::delete_many()
        .filter(OrderItemCol::OrderId.eq(id))
        .exec(&txn)
        .await?;
    let result = Orders::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Order {id}")));
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Order deleted"))
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        shipping_address: model.shipping_address,
        payment_method: model.payment_method,
        order_status: model.order_status,
        payment_status: model.payment_status,
        shipping_status: model.shipping_status,
        total_amount: model.total_amount,
        shipping_cost: model.shipping_cost,
        expedition_date: model.expedition_date.map(|dt| dt.with_timezone(&Utc)),
        estimated_delivery_date: model.estimated_delivery_date.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name: model.product_name,
        quantity: model.quantity,
        unit_price: model.unit_price,
    }
}
