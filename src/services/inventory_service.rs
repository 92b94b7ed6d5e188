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
    dto::products::{AdjustStockRequest, InventoryHistoryList, StockLevelList, UpdateStockRequest},
    entity::{
        inventories::{ActiveModel as InventoryActive, Column as InvCol, Entity as Inventories},
        inventory_history::{
            ActiveModel as HistoryActive, Column as HistoryCol, Entity as InventoryHistory,
            Model as HistoryModel,
        },
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{InventoryEntry, Product, StockLevel},
    response::{ApiResponse, Meta},
    routes::params::{LowStockQuery, Pagination},
    services::product_service::load_product,
    state::AppState,
};

pub const REASON_INITIAL: &str = "initial";
pub const REASON_SET: &str = "set";
pub const REASON_ADJUST: &str = "adjust";
pub const REASON_CHECKOUT: &str = "checkout";

/// Products without an inventory row have nothing in stock.
pub(crate) async fn stock_of<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<i32> {
    let row = Inventories::find_by_id(product_id).one(conn).await?;
    Ok(row.map(|inv| inv.quantity).unwrap_or(0))
}

/// Same as [`stock_of`], with the inventory row locked until the transaction ends.
pub(crate) async fn locked_stock_of<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
) -> AppResult<i32> {
    let query = for_update(Inventories::find_by_id(product_id), conn.get_database_backend());
    let row = query.one(conn).await?;
    Ok(row.map(|inv| inv.quantity).unwrap_or(0))
}

pub(crate) async fn stock_map<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, i32>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Inventories::find()
        .filter(InvCol::ProductId.is_in(product_ids.to_vec()))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|inv| (inv.product_id, inv.quantity)).collect())
}

/// Sets the stock of a product and appends the matching ledger row.
/// Every quantity change in the system goes through here.
pub async fn write_stock<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    quantity: i32,
    changed_by: Option<Uuid>,
    reason: &str,
) -> AppResult<i32> {
    if quantity < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    let now = Utc::now();
    let existing = for_update(Inventories::find_by_id(product_id), conn.get_database_backend())
        .one(conn)
        .await?;

    let before = match existing {
        Some(inv) => {
            let before = inv.quantity;
            let mut active: InventoryActive = inv.into();
            active.quantity = Set(quantity);
            active.updated_at = Set(now.into());
            active.update(conn).await?;
            before
        }
        None => {
            InventoryActive {
                product_id: Set(product_id),
                quantity: Set(quantity),
                updated_at: Set(now.into()),
            }
            .insert(conn)
            .await?;
            0
        }
    };

    HistoryActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product_id),
        quantity_before: Set(before),
        quantity_after: Set(quantity),
        changed_by: Set(changed_by),
        reason: Set(reason.to_string()),
        created_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    tracing::debug!(%product_id, before, after = quantity, reason, "stock changed");
    Ok(before)
}

async fn ensure_product<C: ConnectionTrait>(conn: &C, product_id: Uuid) -> AppResult<()> {
    match Products::find_by_id(product_id).one(conn).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(format!("Product {product_id}"))),
    }
}

pub async fn update_stock(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateStockRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    ensure_product(&txn, product_id).await?;
    let before = write_stock(&txn, product_id, payload.stock, Some(user.user_id), REASON_SET).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "stock_update",
        "inventories",
        serde_json::json!({ "product_id": product_id, "before": before, "after": payload.stock }),
    )
    .await;

    let product = load_product(&state.orm, product_id).await?;
    Ok(ApiResponse::success("Stock updated", product, Some(Meta::empty())))
}

pub async fn adjust_stock(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AdjustStockRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    ensure_product(&txn, product_id).await?;
    let current = locked_stock_of(&txn, product_id).await?;
    let new_stock = current
        .checked_add(payload.delta)
        .ok_or_else(|| AppError::BadRequest("stock adjustment is out of range".into()))?;
    if new_stock < 0 {
        return Err(AppError::BadRequest("stock cannot be negative".into()));
    }
    write_stock(&txn, product_id, new_stock, Some(user.user_id), REASON_ADJUST).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "inventory_adjust",
        "inventories",
        serde_json::json!({ "product_id": product_id, "delta": payload.delta }),
    )
    .await;

    let product = load_product(&state.orm, product_id).await?;
    Ok(ApiResponse::success("Inventory updated", product, Some(Meta::empty())))
}

pub async fn stock_history(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<InventoryHistoryList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = pagination.normalize();

    let finder = InventoryHistory::find()
        .filter(HistoryCol::ProductId.eq(product_id))
        .order_by_desc(HistoryCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(history_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Stock history",
        InventoryHistoryList { items },
        Some(meta),
    ))
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<StockLevelList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(state.config.low_stock_threshold);
    let (page, limit, offset) = query.pagination().normalize();

    let mut rows: Vec<StockLevel> = Products::find()
        .find_also_related(Inventories)
        .filter(
            Condition::any()
                .add(InvCol::Quantity.lte(threshold))
                .add(InvCol::Quantity.is_null()),
        )
        .order_by_desc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(product, inventory)| StockLevel {
            product_id: product.id,
            product_name: product.name,
            quantity: inventory.map(|inv| inv.quantity).unwrap_or(0),
        })
        .collect();
    rows.sort_by_key(|row| row.quantity);

    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", StockLevelList { items }, Some(meta)))
}

fn history_from_entity(model: HistoryModel) -> InventoryEntry {
    InventoryEntry {
        id: model.id,
        product_id: model.product_id,
        quantity_before: model.quantity_before,
        quantity_after: model.quantity_after,
        changed_by: model.changed_by,
        reason: model.reason,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
