use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use uuid::Uuid;

use crate::{
    dto::wishlist::AddWishlistItemRequest,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Wishlist,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_wishlist))
        .route("/add", post(add_to_wishlist))
        .route("/{item_id}", delete(remove_from_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    responses(
        (status = 200, description = "Current user's wishlist", body = ApiResponse<Wishlist>)
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn get_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Wishlist>>> {
    let resp = wishlist_service::get_wishlist(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/wishlist/add",
    request_body = AddWishlistItemRequest,
    responses(
        (status = 200, description = "Product listed", body = ApiResponse<Wishlist>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddWishlistItemRequest>,
) -> AppResult<Json<ApiResponse<Wishlist>>> {
    let resp = wishlist_service::add_item(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{item_id}",
    params(
        ("item_id" = Uuid, Path, description = "Wishlist item ID")
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<Wishlist>),
        (status = 404, description = "Wishlist item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Wishlist>>> {
    let resp = wishlist_service::remove_item(&state, &user, item_id).await?;
    Ok(Json(resp))
}
