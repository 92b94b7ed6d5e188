use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        cart::{AddToCartRequest, UpdateQuantityRequest, ValidateCartRequest},
        orders::OrderWithItems,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Cart,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/update-quantity/{article_id}", patch(update_quantity))
        .route("/remove/{article_id}", delete(remove_from_cart))
        .route("/validate", post(validate_cart))
        .route("/empty", delete(empty_cart))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    responses(
        (status = 200, description = "Current user's cart", body = ApiResponse<Cart>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::get_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/add",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Product added", body = ApiResponse<Cart>),
        (status = 400, description = "Inactive product or insufficient stock"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::add_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/update-quantity/{article_id}",
    params(
        ("article_id" = Uuid, Path, description = "Cart line ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Quantity updated", body = ApiResponse<Cart>),
        (status = 400, description = "Insufficient stock"),
        (status = 404, description = "Cart line not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(article_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::update_quantity(&state, &user, article_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/remove/{article_id}",
    params(
        ("article_id" = Uuid, Path, description = "Cart line ID")
    ),
    responses(
        (status = 200, description = "Line removed", body = ApiResponse<Cart>),
        (status = 404, description = "Cart line not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(article_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::remove_article(&state, &user, article_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/empty",
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<Cart>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn empty_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Cart>>> {
    let resp = cart_service::empty_cart(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/validate",
    request_body = ValidateCartRequest,
    responses(
        (status = 200, description = "Order placed from the cart", body = ApiResponse<OrderWithItems>),
        (status = 400, description = "Empty cart or insufficient stock")
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn validate_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<ValidateCartRequest>,
) -> AppResult<Json<ApiResponse<OrderWithItems>>> {
    let resp = cart_service::validate_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}
