use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Func, LikeExpr},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    catalog::{derive_status, discounted_price},
    dto::products::{
        ApplyPromotionRequest, CreateProductRequest, ProductList, SearchQuery,
        UpdateProductRequest,
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        enums::ProductKind,
        inventories::{Column as InvCol, Entity as Inventories},
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        product_details::{
            ActiveModel as DetailsActive, Column as DetailsCol, Entity as ProductDetailsTable,
            Model as DetailsModel,
        },
        product_images::{ActiveModel as ImageActive, Column as ImageCol, Entity as ProductImages},
        product_promotions::{
            ActiveModel as ProductPromotionActive, Column as LinkCol, Entity as ProductPromotions,
        },
        product_sub_categories::{
            ActiveModel as ProductSubActive, Column as SubLinkCol, Entity as ProductSubCategories,
        },
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        promotions::{Column as PromoCol, Entity as Promotions, Model as PromotionModel},
        sub_categories::Entity as SubCategories,
        wishlist_items::{Column as WishlistItemCol, Entity as WishlistItems},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Product, ProductDetails, ProductImage},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::{
        category_service::find_category,
        inventory_service::{REASON_INITIAL, REASON_SET, stock_map, stock_of, write_stock},
        promotion_service::{find_promotion, promotion_from_entity, running_promotions},
    },
    state::AppState,
};

const NEW_ARRIVAL_DAYS: i64 = 7;

pub(crate) async fn find_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))
}

pub(crate) async fn load_product<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Product> {
    let model = find_product(conn, id).await?;
    let mut products = load_products(conn, vec![model]).await?;
    products
        .pop()
        .ok_or_else(|| AppError::not_found(format!("Product {id}")))
}

/// Renders product rows with their details, images, promotions, sub-categories
/// and stock, batching each relation into one query.
pub(crate) async fn load_products<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();

    let mut details: HashMap<Uuid, DetailsModel> = ProductDetailsTable::find()
        .filter(DetailsCol::ProductId.is_in(ids.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|row| (row.product_id, row))
        .collect();

    let mut images: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in ProductImages::find()
        .filter(ImageCol::ProductId.is_in(ids.clone()))
        .order_by_asc(ImageCol::Position)
        .all(conn)
        .await?
    {
        images.entry(image.product_id).or_default().push(ProductImage {
            id: image.id,
            url: image.url,
            description: image.description,
        });
    }

    let links = ProductPromotions::find()
        .filter(LinkCol::ProductId.is_in(ids.clone()))
        .all(conn)
        .await?;
    let promotion_ids: Vec<Uuid> = links
        .iter()
        .map(|link| link.promotion_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let promotions: HashMap<Uuid, PromotionModel> = if promotion_ids.is_empty() {
        HashMap::new()
    } else {
        Promotions::find()
            .filter(PromoCol::Id.is_in(promotion_ids))
            .all(conn)
            .await?
            .into_iter()
            .map(|promo| (promo.id, promo))
            .collect()
    };
    let mut promotions_by_product: HashMap<Uuid, Vec<PromotionModel>> = HashMap::new();
    for link in links {
        if let Some(promo) = promotions.get(&link.promotion_id) {
            promotions_by_product
                .entry(link.product_id)
                .or_default()
                .push(promo.clone());
        }
    }

    let mut subs_by_product: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for link in ProductSubCategories::find()
        .filter(SubLinkCol::ProductId.is_in(ids.clone()))
        .all(conn)
        .await?
    {
        subs_by_product
            .entry(link.product_id)
            .or_default()
            .push(link.sub_category_id);
    }

    let stock = stock_map(conn, &ids).await?;
    let now = Utc::now();

    Ok(models
        .into_iter()
        .map(|model| {
            let id = model.id;
            product_from_parts(
                model,
                details.remove(&id),
                images.remove(&id).unwrap_or_default(),
                promotions_by_product.remove(&id).unwrap_or_default(),
                subs_by_product.remove(&id).unwrap_or_default(),
                stock.get(&id).copied().unwrap_or(0),
                now,
            )
        })
        .collect())
}

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(Expr::expr(Func::lower(Expr::col(Column::Name))).like(contains(search)))
                .add(
                    Expr::expr(Func::lower(Expr::col(Column::Description)))
                        .like(contains(search)),
                ),
        );
    }

    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let finder = Products::find()
        .filter(condition)
        .order_by(sort_col, sort_order.into());

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_products(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = load_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Product", product, None))
}

/// Case-insensitive substring match on the product name.
pub async fn search_products(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("Search term `name` is required".into()))?;
    let models = Products::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::Name))).like(contains(name)))
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?;
    let items = load_products(&state.orm, models).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Search results", ProductList { items }, Some(meta)))
}

pub async fn new_arrivals(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let cutoff = Utc::now() - Duration::days(NEW_ARRIVAL_DAYS);
    let models = Products::find()
        .filter(Column::CreatedAt.gte(cutoff))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = load_products(&state.orm, models).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("New arrivals", ProductList { items }, Some(meta)))
}

/// Other products of the same category in random order, then every other
/// product, newest first.
pub async fn recommendations(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductList>> {
    let product = find_product(&state.orm, id).await?;

    let mut models = Products::find()
        .filter(Column::CategoryId.eq(product.category_id))
        .filter(Column::Id.ne(id))
        .all(&state.orm)
        .await?;
    models.shuffle(&mut rand::thread_rng());

    let others = Products::find()
        .filter(Column::CategoryId.ne(product.category_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    models.extend(others);

    let items = load_products(&state.orm, models).await?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Recommendations", ProductList { items }, Some(meta)))
}

pub async fn active_promotions(state: &AppState) -> AppResult<ApiResponse<ProductList>> {
    let running: Vec<Uuid> = running_promotions(&state.orm, Utc::now())
        .await?
        .into_iter()
        .map(|promo| promo.id)
        .collect();

    let items = if running.is_empty() {
        Vec::new()
    } else {
        let product_ids: Vec<Uuid> = ProductPromotions::find()
            .filter(LinkCol::PromotionId.is_in(running))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|link| link.product_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let models = Products::find()
            .filter(Column::Id.is_in(product_ids))
            .filter(Column::Active.eq(true))
            .order_by_desc(Column::CreatedAt)
            .all(&state.orm)
            .await?;
        load_products(&state.orm, models).await?
    };

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products on promotion", ProductList { items }, Some(meta)))
}

pub async fn products_by_category(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<ProductList>> {
    find_category(&state.orm, category_id).await?;
    let models = Products::find()
        .filter(Column::CategoryId.eq(category_id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?;
    let items = load_products(&state.orm, models).await?;

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    check_details(&payload.details)?;

    let id = Uuid::new_v4();
    let now = Utc::now();

    let txn = state.orm.begin().await?;
    find_category(&txn, payload.category_id).await?;

    ActiveModel {
        id: Set(id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        price: Set(payload.price),
        category_id: Set(payload.category_id),
        kind: Set(kind_of(&payload.details)),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    replace_details(&txn, id, &payload.details).await?;
    replace_images(&txn, id, &payload.images, now).await?;
    replace_promotions(&txn, id, &payload.promotion_ids).await?;
    replace_sub_categories(&txn, id, &payload.sub_category_ids).await?;
    write_stock(
        &txn,
        id,
        payload.stock.unwrap_or(0),
        Some(user.user_id),
        REASON_INITIAL,
    )
    .await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    let product = load_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    if let Some(details) = &payload.details {
        check_details(details)?;
    }

    let now = Utc::now();
    let txn = state.orm.begin().await?;
    let existing = find_product(&txn, id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(category_id) = payload.category_id {
        find_category(&txn, category_id).await?;
        active.category_id = Set(category_id);
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    if let Some(details) = &payload.details {
        active.kind = Set(kind_of(details));
        replace_details(&txn, id, details).await?;
    }
    active.updated_at = Set(now.into());
    active.update(&txn).await?;

    if let Some(urls) = &payload.images {
        replace_images(&txn, id, urls, now).await?;
    }
    if let Some(promotion_ids) = &payload.promotion_ids {
        replace_promotions(&txn, id, promotion_ids).await?;
    }
    if let Some(sub_category_ids) = &payload.sub_category_ids {
        replace_sub_categories(&txn, id, sub_category_ids).await?;
    }
    if let Some(stock) = payload.stock {
        if stock_of(&txn, id).await? != stock {
            write_stock(&txn, id, stock, Some(user.user_id), REASON_SET).await?;
        }
    }
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    let product = load_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Product updated", product, Some(Meta::empty())))
}

/// Removes the product from carts and wishlists; past order lines keep their
/// snapshot but lose the reference.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    find_product(&txn, id).await?;

    CartItems::delete_many()
        .filter(CartItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    WishlistItems::delete_many()
        .filter(WishlistItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    OrderItems::update_many()
        .col_expr(OrderItemCol::ProductId, Expr::value(Option::<Uuid>::None))
        .filter(OrderItemCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    ProductImages::delete_many()
        .filter(ImageCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    ProductPromotions::delete_many()
        .filter(LinkCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    ProductSubCategories::delete_many()
        .filter(SubLinkCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    ProductDetailsTable::delete_many()
        .filter(DetailsCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Inventories::delete_many()
        .filter(InvCol::ProductId.eq(id))
        .exec(&txn)
        .await?;
    Products::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Product deleted"))
}

/// `Some(id)` attaches one promotion (idempotent); `None` detaches them all.
pub async fn apply_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ApplyPromotionRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    find_product(&txn, id).await?;
    match payload.promotion_id {
        Some(promotion_id) => {
            find_promotion(&txn, promotion_id).await?;
            let linked = ProductPromotions::find_by_id((id, promotion_id))
                .one(&txn)
                .await?;
            if linked.is_none() {
                ProductPromotionActive {
                    product_id: Set(id),
                    promotion_id: Set(promotion_id),
                }
                .insert(&txn)
                .await?;
            }
        }
        None => {
            ProductPromotions::delete_many()
                .filter(LinkCol::ProductId.eq(id))
                .exec(&txn)
                .await?;
        }
    }
    touch(&txn, id).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_promotion_apply",
        "product_promotions",
        serde_json::json!({ "product_id": id, "promotion_id": payload.promotion_id }),
    )
    .await;

    let product = load_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Promotion applied", product, Some(Meta::empty())))
}

/// Detaching a promotion that was never attached is a no-op.
pub async fn remove_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    promotion_id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;
    find_product(&txn, id).await?;
    ProductPromotions::delete_many()
        .filter(LinkCol::ProductId.eq(id))
        .filter(LinkCol::PromotionId.eq(promotion_id))
        .exec(&txn)
        .await?;
    touch(&txn, id).await?;
    txn.commit().await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "product_promotion_remove",
        "product_promotions",
        serde_json::json!({ "product_id": id, "promotion_id": promotion_id }),
    )
    .await;

    let product = load_product(&state.orm, id).await?;
    Ok(ApiResponse::success("Promotion removed", product, Some(Meta::empty())))
}

/// Lowercased substring pattern in which `%`, `_` and backslashes match literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn contains(term: &str) -> LikeExpr {
    LikeExpr::new(like_pattern(term)).escape('\\')
}

async fn touch<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<()> {
    Products::update_many()
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id))
        .exec(conn)
        .await?;
    Ok(())
}

async fn replace_details<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    details: &ProductDetails,
) -> AppResult<()> {
    ProductDetailsTable::delete_many()
        .filter(DetailsCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    if let Some(row) = details_to_storage(product_id, details) {
        row.insert(conn).await?;
    }
    Ok(())
}

async fn replace_images<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    urls: &[String],
    now: DateTime<Utc>,
) -> AppResult<()> {
    ProductImages::delete_many()
        .filter(ImageCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    for (position, url) in urls.iter().enumerate() {
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::BadRequest("Image url cannot be empty".into()));
        }
        ImageActive {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            url: Set(url.to_string()),
            description: Set(None),
            position: Set(position as i32),
            added_at: Set(now.into()),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn replace_promotions<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    promotion_ids: &[Uuid],
) -> AppResult<()> {
    ProductPromotions::delete_many()
        .filter(LinkCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    let unique: HashSet<Uuid> = promotion_ids.iter().copied().collect();
    for promotion_id in unique {
        find_promotion(conn, promotion_id).await?;
        ProductPromotionActive {
            product_id: Set(product_id),
            promotion_id: Set(promotion_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn replace_sub_categories<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    sub_category_ids: &[Uuid],
) -> AppResult<()> {
    ProductSubCategories::delete_many()
        .filter(SubLinkCol::ProductId.eq(product_id))
        .exec(conn)
        .await?;
    let unique: HashSet<Uuid> = sub_category_ids.iter().copied().collect();
    for sub_category_id in unique {
        if SubCategories::find_by_id(sub_category_id).one(conn).await?.is_none() {
            return Err(AppError::not_found(format!("Sub-category {sub_category_id}")));
        }
        ProductSubActive {
            product_id: Set(product_id),
            sub_category_id: Set(sub_category_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn check_details(details: &ProductDetails) -> AppResult<()> {
    let required: Vec<&str> = match details {
        ProductDetails::Standard => Vec::new(),
        ProductDetails::DigitalDrawing {
            resolution,
            dimensions,
            ..
        } => vec![resolution.as_str(), dimensions.as_str()],
        ProductDetails::Sticker {
            format,
            dimensions,
            material,
        } => vec![format.as_str(), dimensions.as_str(), material.as_str()],
    };
    if required.iter().any(|value| value.trim().is_empty()) {
        return Err(AppError::BadRequest("Product details are incomplete".into()));
    }
    Ok(())
}

fn kind_of(details: &ProductDetails) -> ProductKind {
    match details {
        ProductDetails::Standard => ProductKind::Standard,
        ProductDetails::DigitalDrawing { .. } => ProductKind::DigitalDrawing,
        ProductDetails::Sticker { .. } => ProductKind::Sticker,
    }
}

// Both variants share one detail table: `format` holds the resolution of a
// drawing, `support` holds the material of a sticker.
fn details_to_storage(product_id: Uuid, details: &ProductDetails) -> Option<DetailsActive> {
    let (format, dimensions, support) = match details {
        ProductDetails::Standard => return None,
        ProductDetails::DigitalDrawing {
            resolution,
            dimensions,
            support,
        } => (resolution.clone(), dimensions.clone(), support.clone()),
        ProductDetails::Sticker {
            format,
            dimensions,
            material,
        } => (format.clone(), dimensions.clone(), Some(material.clone())),
    };
    Some(DetailsActive {
        product_id: Set(product_id),
        format: Set(format),
        dimensions: Set(dimensions),
        support: Set(support),
    })
}

fn details_from_storage(kind: ProductKind, row: Option<DetailsModel>) -> ProductDetails {
    match (kind, row) {
        (ProductKind::DigitalDrawing, Some(row)) => ProductDetails::DigitalDrawing {
            resolution: row.format,
            dimensions: row.dimensions,
            support: row.support,
        },
        (ProductKind::Sticker, Some(row)) => ProductDetails::Sticker {
            format: row.format,
            dimensions: row.dimensions,
            material: row.support.unwrap_or_default(),
        },
        _ => ProductDetails::Standard,
    }
}

fn product_from_parts(
    model: ProductModel,
    details: Option<DetailsModel>,
    images: Vec<ProductImage>,
    promotions: Vec<PromotionModel>,
    sub_category_ids: Vec<Uuid>,
    stock: i32,
    now: DateTime<Utc>,
) -> Product {
    let status = derive_status(model.active, stock, &promotions, now);
    let discounted_price = discounted_price(model.price, &promotions, now);
    Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        discounted_price,
        category_id: model.category_id,
        details: details_from_storage(model.kind, details),
        active: model.active,
        stock,
        status,
        images,
        promotions: promotions
            .into_iter()
            .map(|promo| promotion_from_entity(promo, now))
            .collect(),
        sub_category_ids,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
