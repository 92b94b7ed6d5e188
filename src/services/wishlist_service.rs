use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::wishlist::AddWishlistItemRequest,
    entity::{
        products::Entity as Products,
        wishlist_items::{ActiveModel as ItemActive, Column as ItemCol, Entity as WishlistItems},
        wishlists::{
            ActiveModel as WishlistActive, Column as WishlistCol, Entity as Wishlists,
            Model as WishlistModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Wishlist, WishlistItem},
    response::{ApiResponse, Meta},
    services::product_service::find_product,
    state::AppState,
};

async fn get_or_create_wishlist<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<WishlistModel> {
    let existing = Wishlists::find()
        .filter(WishlistCol::UserId.eq(user_id))
        .one(conn)
        .await?;
    if let Some(wishlist) = existing {
        return Ok(wishlist);
    }

    let created = WishlistActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await;

    match created {
        Ok(wishlist) => Ok(wishlist),
        Err(err) => Wishlists::find()
            .filter(WishlistCol::UserId.eq(user_id))
            .one(conn)
            .await?
            .ok_or(AppError::OrmError(err)),
    }
}

async fn render_wishlist<C: ConnectionTrait>(
    conn: &C,
    wishlist: WishlistModel,
) -> AppResult<Wishlist> {
    let items = WishlistItems::find()
        .filter(ItemCol::WishlistId.eq(wishlist.id))
        .order_by_desc(ItemCol::AddedAt)
        .find_also_related(Products)
        .all(conn)
        .await?
        .into_iter()
        .filter_map(|(item, product)| {
            let product = product?;
            Some(WishlistItem {
                id: item.id,
                product_id: product.id,
                product_name: product.name,
                price: product.price,
                added_at: item.added_at.with_timezone(&Utc),
            })
        })
        .collect();

    Ok(Wishlist {
        id: wishlist.id,
        user_id: wishlist.user_id,
        items,
    })
}

pub async fn get_wishlist(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Wishlist>> {
    let wishlist = get_or_create_wishlist(&state.orm, user.user_id).await?;
    let wishlist = render_wishlist(&state.orm, wishlist).await?;
    let meta = Meta::total(wishlist.items.len());
    Ok(ApiResponse::success("Wishlist", wishlist, Some(meta)))
}

/// Adding a product that is already listed leaves the wishlist unchanged.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddWishlistItemRequest,
) -> AppResult<ApiResponse<Wishlist>> {
    let product = find_product(&state.orm, payload.product_id).await?;
    let wishlist = get_or_create_wishlist(&state.orm, user.user_id).await?;

    let existing = WishlistItems::find()
        .filter(ItemCol::WishlistId.eq(wishlist.id))
        .filter(ItemCol::ProductId.eq(product.id))
        .one(&state.orm)
        .await?;

    if existing.is_none() {
        ItemActive {
            id: Set(Uuid::new_v4()),
            wishlist_id: Set(wishlist.id),
            product_id: Set(product.id),
            added_at: Set(Utc::now().into()),
        }
        .insert(&state.orm)
        .await?;

        audit::record(
            &state.orm,
            Some(user.user_id),
            "wishlist_add",
            "wishlist_items",
            serde_json::json!({ "product_id": product.id }),
        )
        .await;
    }

    let wishlist = render_wishlist(&state.orm, wishlist).await?;
    Ok(ApiResponse::success("Added to wishlist", wishlist, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<Wishlist>> {
    let wishlist = get_or_create_wishlist(&state.orm, user.user_id).await?;
    let result = WishlistItems::delete_many()
        .filter(ItemCol::Id.eq(item_id))
        .filter(ItemCol::WishlistId.eq(wishlist.id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Wishlist item {item_id}")));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "wishlist_remove",
        "wishlist_items",
        serde_json::json!({ "wishlist_item_id": item_id }),
    )
    .await;

    let wishlist = render_wishlist(&state.orm, wishlist).await?;
    Ok(ApiResponse::success("Removed from wishlist", wishlist, Some(Meta::empty())))
}
