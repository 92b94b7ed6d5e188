use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::products::{
        AdjustStockRequest, ApplyPromotionRequest, CreateProductRequest, InventoryHistoryList,
        ProductList, SearchQuery, StockLevelList, UpdateProductRequest, UpdateStockRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Product,
    response::ApiResponse,
    routes::params::{LowStockQuery, Pagination, ProductQuery},
    services::{inventory_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/new", get(new_arrivals))
        .route("/promotions/active", get(active_promotions))
        .route("/low-stock", get(low_stock))
        .route(
            "/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/{id}/recommendations", get(recommendations))
        .route("/{id}/stock", patch(update_stock))
        .route("/{id}/stock/adjust", post(adjust_stock))
        .route("/{id}/stock/history", get(stock_history))
        .route("/{id}/promotion", post(apply_promotion))
        .route("/{id}/promotion/{promotion_id}", delete(remove_promotion))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(ProductQuery),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::list_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::get_product(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Create product", body = ApiResponse<Product>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let resp = product_service::create_product(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProductRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::update_product(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Deleted product"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = product_service::delete_product(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/search",
    params(
        ("name" = String, Query, description = "Case-insensitive part of the product name")
    ),
    responses(
        (status = 200, description = "Matching products", body = ApiResponse<ProductList>),
        (status = 400, description = "Missing search term")
    ),
    tag = "Products"
)]
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::search_products(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/new",
    responses(
        (status = 200, description = "Products created during the last 7 days", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn new_arrivals(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::new_arrivals(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/promotions/active",
    responses(
        (status = 200, description = "Products with a running promotion", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn active_promotions(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::active_promotions(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/recommendations",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Same category first, shuffled", body = ApiResponse<ProductList>),
        (status = 404, description = "Product not found")
    ),
    tag = "Products"
)]
pub async fn recommendations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::recommendations(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/low-stock",
    params(LowStockQuery),
    responses(
        (status = 200, description = "Products at or below the threshold", body = ApiResponse<StockLevelList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<ApiResponse<StockLevelList>>> {
    let resp = inventory_service::list_low_stock(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/products/{id}/stock",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = UpdateStockRequest,
    responses(
        (status = 200, description = "Stock set", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn update_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStockRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = inventory_service::update_stock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/stock/adjust",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<Product>),
        (status = 400, description = "Stock would become negative")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = inventory_service::adjust_stock(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/stock/history",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        Pagination
    ),
    responses(
        (status = 200, description = "Inventory ledger, newest first", body = ApiResponse<InventoryHistoryList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn stock_history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<InventoryHistoryList>>> {
    let resp = inventory_service::stock_history(&state, &user, id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/promotion",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ApplyPromotionRequest,
    responses(
        (status = 200, description = "Promotion attached, or all detached for null", body = ApiResponse<Product>),
        (status = 404, description = "Product or promotion not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn apply_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApplyPromotionRequest>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::apply_promotion(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}/promotion/{promotion_id}",
    params(
        ("id" = Uuid, Path, description = "Product ID"),
        ("promotion_id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 200, description = "Promotion detached", body = ApiResponse<Product>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Products"
)]
pub async fn remove_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, promotion_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let resp = product_service::remove_promotion(&state, &user, id, promotion_id).await?;
    Ok(Json(resp))
}
