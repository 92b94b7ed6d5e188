use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{
        Claims, ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
        ResetPasswordRequest,
    },
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ROLE_USER},
    models::User,
    response::{ApiResponse, Meta},
    services::user_service::{find_by_email, user_from_entity},
    state::AppState,
};

const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account exists for this email, a reset link has been sent.";

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(user: &UserModel, config: &AppConfig) -> AppResult<String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<User>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();

    if find_by_email(&state.orm, &email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let now = Utc::now();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        first_name: Set(payload.first_name),
        last_name: Set(payload.last_name),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        phone: Set(payload.phone),
        role: Set(ROLE_USER.to_string()),
        reset_token: Set(None),
        reset_token_expires_at: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.id),
        "user_register",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created",
        user_from_entity(user),
        Some(Meta::empty()),
    ))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();
    let user = match find_by_email(&state.orm, &email).await? {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Invalid email or password".into())),
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let token = issue_token(&user, &state.config)?;
    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    audit::record(
        &state.orm,
        Some(user.id),
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Tokens are stateless; the client is expected to drop its copy.
pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    tracing::debug!(user_id = %user.user_id, "logout");
    audit::record(
        &state.orm,
        Some(user.user_id),
        "user_logout",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;
    Ok(ApiResponse::ack("Logged out, discard the token on the client"))
}

/// Answers identically whether or not the account exists.
pub async fn forgot_password(
    state: &AppState,
    payload: ForgotPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    let email = payload.email.trim().to_lowercase();
    let Some(user) = find_by_email(&state.orm, &email).await? else {
        return Ok(ApiResponse::ack(FORGOT_PASSWORD_MESSAGE));
    };

    let token = generate_reset_token();
    let expires_at = Utc::now() + Duration::minutes(state.config.reset_token_ttl_minutes);

    let mut active: UserActive = user.into();
    active.reset_token = Set(Some(token.clone()));
    active.reset_token_expires_at = Set(Some(expires_at.into()));
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    // stands in for the outgoing email
    tracing::info!(email = %user.email, reset_token = %token, "password reset requested");

    Ok(ApiResponse::ack(FORGOT_PASSWORD_MESSAGE))
}

pub async fn reset_password(
    state: &AppState,
    payload: ResetPasswordRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    payload.validate()?;
    if payload.new_password != payload.confirm_password {
        return Err(AppError::BadRequest("Passwords do not match".into()));
    }

    let user = Users::find()
        .filter(UserCol::ResetToken.eq(payload.token.clone()))
        .one(&state.orm)
        .await?;
    let user = match user {
        Some(u) if u.reset_token_expires_at.is_some_and(|exp| exp > Utc::now()) => u,
        _ => return Err(AppError::Unauthorized("Reset token is invalid or expired".into())),
    };

    let user_id = user.id;
    let mut active: UserActive = user.into();
    active.password_hash = Set(hash_password(&payload.new_password)?);
    active.reset_token = Set(None);
    active.reset_token_expires_at = Set(None);
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user_id),
        "password_reset",
        "users",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;

    Ok(ApiResponse::ack("Password has been reset"))
}

fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn reset_tokens_are_64_hex_chars_and_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
