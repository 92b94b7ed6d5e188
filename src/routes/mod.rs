use axum::Router;

use crate::state::AppState;

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod promotions;
pub mod users;
pub mod wishlist;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/promotions", promotions::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/wishlist", wishlist::router())
        .nest("/addresses", addresses::router())
}
