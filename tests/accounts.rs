mod common;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use storefront_api::{
    dto::{
        addresses::{CreateAddressRequest, UpdateAddressRequest},
        auth::{ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest},
        users::{UpdatePasswordRequest, UpdateProfileRequest},
        wishlist::AddWishlistItemRequest,
    },
    entity::{users, wishlist_items},
    error::AppError,
    middleware::auth::{ROLE_USER, decode_token},
    services::{address_service, auth_service, user_service, wishlist_service},
};
use uuid::Uuid;

fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: email.into(),
        password: common::PASSWORD.into(),
        phone: None,
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn register_then_login_issues_a_bearer_token() -> anyhow::Result<()> {
    let state = common::setup_state().await?;

    let user = auth_service::register_user(&state, register_request("Ada@Example.com"))
        .await?
        .data
        .expect("user");
    assert_eq!(user.email, "ada@example.com");
    assert_eq!(user.role, ROLE_USER);

    let duplicate = auth_service::register_user(&state, register_request("ada@example.com")).await;
    assert!(matches!(duplicate, Err(AppError::BadRequest(_))));

    let login = auth_service::login_user(&state, login_request("ada@example.com", common::PASSWORD))
        .await?
        .data
        .expect("token");
    let token = login.token.strip_prefix("Bearer ").expect("bearer prefix");
    let claims = decode_token(token, &state.config.jwt_secret)?;
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.role, ROLE_USER);

    let wrong = auth_service::login_user(&state, login_request("ada@example.com", "not-the-one")).await;
    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn password_reset_token_is_single_use() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer(&state, "forgetful@example.com").await?;

    auth_service::forgot_password(
        &state,
        ForgotPasswordRequest {
            email: "forgetful@example.com".into(),
        },
    )
    .await?;
    // unknown addresses get the same answer
    auth_service::forgot_password(
        &state,
        ForgotPasswordRequest {
            email: "nobody@example.com".into(),
        },
    )
    .await?;

    let stored = users::Entity::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .expect("user row");
    let token = stored.reset_token.expect("reset token");

    let mismatch = auth_service::reset_password(
        &state,
        ResetPasswordRequest {
            token: token.clone(),
            new_password: "brand-new-pass".into(),
            confirm_password: "other-pass".into(),
        },
    )
    .await;
    assert!(matches!(mismatch, Err(AppError::BadRequest(_))));

    let reset = || ResetPasswordRequest {
        token: token.clone(),
        new_password: "brand-new-pass".into(),
        confirm_password: "brand-new-pass".into(),
    };
    auth_service::reset_password(&state, reset()).await?;
    let reused = auth_service::reset_password(&state, reset()).await;
    assert!(matches!(reused, Err(AppError::Unauthorized(_))));

    auth_service::login_user(&state, login_request("forgetful@example.com", "brand-new-pass")).await?;
    let old = auth_service::login_user(&state, login_request("forgetful@example.com", common::PASSWORD)).await;
    assert!(matches!(old, Err(AppError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn wishlist_ignores_duplicates() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let user = common::customer(&state, "dreamer@example.com").await?;
    let category = common::create_category(&state, &admin, "Drawings").await?;
    let product = common::create_product(&state, &admin, category, "Moon", 1_800, 1).await?;

    let empty = wishlist_service::get_wishlist(&state, &user).await?.data.expect("wishlist");
    assert!(empty.items.is_empty());

    for _ in 0..2 {
        wishlist_service::add_item(&state, &user, AddWishlistItemRequest { product_id: product })
            .await?;
    }
    let wishlist = wishlist_service::get_wishlist(&state, &user).await?.data.expect("wishlist");
    assert_eq!(wishlist.items.len(), 1);
    assert_eq!(wishlist.items[0].product_name, "Moon");

    let unknown = wishlist_service::add_item(
        &state,
        &user,
        AddWishlistItemRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let missing = wishlist_service::remove_item(&state, &user, Uuid::new_v4()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let item_id = wishlist.items[0].id;
    let wishlist = wishlist_service::remove_item(&state, &user, item_id)
        .await?
        .data
        .expect("wishlist");
    assert!(wishlist.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn wishlist_rows_are_unique_per_product() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let admin = common::admin(&state).await?;
    let user = common::customer(&state, "collector@example.com").await?;
    let category = common::create_category(&state, &admin, "Posters").await?;
    let product = common::create_product(&state, &admin, category, "Sun", 2_100, 1).await?;

    let wishlist = wishlist_service::add_item(
        &state,
        &user,
        AddWishlistItemRequest {
            product_id: product,
        },
    )
    .await?
    .data
    .expect("wishlist");
    let duplicate = wishlist_items::ActiveModel {
        id: Set(Uuid::new_v4()),
        wishlist_id: Set(wishlist.id),
        product_id: Set(product),
        added_at: Set(Utc::now().into()),
    };
    assert!(duplicate.insert(&state.orm).await.is_err());
    Ok(())
}

#[tokio::test]
async fn addresses_belong_to_their_owner() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let owner = common::customer(&state, "owner@example.com").await?;
    let stranger = common::customer(&state, "stranger@example.com").await?;

    let address = address_service::create_address(
        &state,
        &owner,
        CreateAddressRequest {
            street: "1 place Bellecour".into(),
            city: "Lyon".into(),
            postal_code: "69002".into(),
            country: "France".into(),
        },
    )
    .await?
    .data
    .expect("address");

    let foreign = address_service::update_address(
        &state,
        &stranger,
        address.id,
        UpdateAddressRequest {
            city: Some("Paris".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::NotFound(_))));
    let foreign_delete = address_service::delete_address(&state, &stranger, address.id).await;
    assert!(matches!(foreign_delete, Err(AppError::NotFound(_))));

    let moved = address_service::update_address(
        &state,
        &owner,
        address.id,
        UpdateAddressRequest {
            city: Some("Villeurbanne".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("address");
    assert_eq!(moved.city, "Villeurbanne");
    assert_eq!(moved.street, "1 place Bellecour");

    let listed = address_service::list_addresses(&state, &stranger).await?.data.expect("list");
    assert!(listed.items.is_empty());

    address_service::delete_address(&state, &owner, address.id).await?;
    let listed = address_service::list_addresses(&state, &owner).await?.data.expect("list");
    assert!(listed.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn profile_and_password_management() -> anyhow::Result<()> {
    let state = common::setup_state().await?;
    let user = common::customer(&state, "mover@example.com").await?;
    common::customer(&state, "taken@example.com").await?;

    let updated = user_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            first_name: Some("Marie".into()),
            email: Some("New@Example.com".into()),
            ..Default::default()
        },
    )
    .await?
    .data
    .expect("user");
    assert_eq!(updated.first_name, "Marie");
    assert_eq!(updated.email, "new@example.com");

    let clash = user_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            email: Some("taken@example.com".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::BadRequest(_))));

    let wrong_old = user_service::update_password(
        &state,
        &user,
        UpdatePasswordRequest {
            old_password: "guess-again".into(),
            new_password: "s3cure-enough".into(),
            confirm_password: "s3cure-enough".into(),
        },
    )
    .await;
    assert!(matches!(wrong_old, Err(AppError::Unauthorized(_))));

    user_service::update_password(
        &state,
        &user,
        UpdatePasswordRequest {
            old_password: common::PASSWORD.into(),
            new_password: "s3cure-enough".into(),
            confirm_password: "s3cure-enough".into(),
        },
    )
    .await?;
    auth_service::login_user(&state, login_request("new@example.com", "s3cure-enough")).await?;

    user_service::delete_account(&state, &user).await?;
    let gone = user_service::get_profile(&state, &user).await;
    assert!(matches!(gone, Err(AppError::Unauthorized(_))));
    Ok(())
}
