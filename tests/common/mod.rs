#![allow(dead_code)]

use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        categories::CreateCategoryRequest, products::CreateProductRequest,
        promotions::CreatePromotionRequest,
    },
    entity::{enums::PromotionType, users::ActiveModel as UserActive},
    middleware::auth::{AuthUser, ROLE_ADMIN, ROLE_USER},
    models::ProductDetails,
    services::{
        auth_service::hash_password, category_service, product_service, promotion_service,
    },
    state::AppState,
};
use uuid::Uuid;

pub const PASSWORD: &str = "password123";

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        reset_token_ttl_minutes: 60,
        low_stock_threshold: 5,
    }
}

/// Fresh in-memory database per test.
pub async fn setup_state() -> anyhow::Result<AppState> {
    let config = test_config();
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;
    Ok(AppState::new(orm, config))
}

pub async fn create_user(state: &AppState, role: &str, email: &str) -> anyhow::Result<AuthUser> {
    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set("Test".into()),
        last_name: Set(role.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(PASSWORD)?),
        phone: Set(None),
        role: Set(role.to_string()),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

pub async fn admin(state: &AppState) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_ADMIN, "admin@example.com").await
}

pub async fn customer(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    create_user(state, ROLE_USER, email).await
}

pub async fn create_category(
    state: &AppState,
    admin: &AuthUser,
    name: &str,
) -> anyhow::Result<Uuid> {
    let resp = category_service::create_category(
        state,
        admin,
        CreateCategoryRequest {
            name: name.into(),
            description: None,
            active: None,
        },
    )
    .await?;
    Ok(resp.data.expect("category").id)
}

pub fn product_request(category_id: Uuid, name: &str, price: i64, stock: i32) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        description: Some(format!("{name} description")),
        price,
        category_id,
        active: None,
        stock: Some(stock),
        details: ProductDetails::Standard,
        images: Vec::new(),
        promotion_ids: Vec::new(),
        sub_category_ids: Vec::new(),
    }
}

pub async fn create_product(
    state: &AppState,
    admin: &AuthUser,
    category_id: Uuid,
    name: &str,
    price: i64,
    stock: i32,
) -> anyhow::Result<Uuid> {
    let resp = product_service::create_product(
        state,
        admin,
        product_request(category_id, name, price, stock),
    )
    .await?;
    Ok(resp.data.expect("product").id)
}

/// A product-scoped percentage promotion running from yesterday to tomorrow.
pub async fn create_running_promotion(
    state: &AppState,
    admin: &AuthUser,
    code: &str,
    percent: i64,
) -> anyhow::Result<Uuid> {
    let now = Utc::now();
    let resp = promotion_service::create_promotion(
        state,
        admin,
        CreatePromotionRequest {
            code: code.into(),
            description: None,
            promotion_type: Some(PromotionType::Percentage),
            value: percent,
            scope: None,
            starts_at: now - Duration::days(1),
            ends_at: now + Duration::days(1),
            usage_limit: None,
            active: None,
        },
    )
    .await?;
    Ok(resp.data.expect("promotion").id)
}
