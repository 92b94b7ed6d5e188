use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::users::{UpdatePasswordRequest, UpdateProfileRequest},
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::{ApiResponse, Meta},
    services::auth_service::{hash_password, verify_password},
    state::AppState,
};

pub async fn find_by_id<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<Option<UserModel>> {
    Ok(Users::find_by_id(id).one(conn).await?)
}

pub async fn find_by_email<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::Email.eq(email))
        .one(conn)
        .await?)
}

async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<UserModel> {
    find_by_id(&state.orm, user.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = current_user(state, user).await?;
    Ok(ApiResponse::success("Profile", user_from_entity(model), None))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let existing = current_user(state, user).await?;

    let mut active: UserActive = existing.into();
    if let Some(first_name) = payload.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = payload.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if let Some(other) = find_by_email(&state.orm, &email).await? {
            if other.id != user.user_id {
                return Err(AppError::BadRequest("Email is already taken".into()));
            }
        }
        active.email = Set(email);
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "profile_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub async fn update_password(
    state: &AppState,
    user: &AuthUser,
    payload: UpdatePasswordRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    if payload.new_password != payload.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }
    let existing = current_user(state, user).await?;
    if !verify_password(&payload.old_password, &existing.password_hash)? {
        return Err(AppError::Unauthorized("Old password is incorrect".into()));
    }

    let mut active: UserActive = existing.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "password_update",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Password updated",
        user_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Carts, wishlists, addresses and orders go with the account through cascading keys.
pub async fn delete_account(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Users::delete_by_id(user.user_id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("User"));
    }
    tracing::info!(user_id = %user.user_id, "account deleted");
    Ok(ApiResponse::ack("Account deleted"))
}

pub(crate) fn user_from_entity(model: UserModel) -> User {
    User {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        role: model.role,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
