use axum::{Json, Router, extract::State, routing::{get, patch}};

use crate::{
    dto::users::{UpdatePasswordRequest, UpdateProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::user_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(get_profile).patch(update_profile).delete(delete_account),
        )
        .route("/password", patch(update_password))
}

#[utoipa::path(
    get,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Current user", body = ApiResponse<User>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::get_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<User>),
        (status = 400, description = "Invalid payload or email taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/users/profile",
    responses(
        (status = 200, description = "Account deleted")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = user_service::delete_account(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/users/password",
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = ApiResponse<User>),
        (status = 400, description = "Passwords do not match"),
        (status = 401, description = "Old password is incorrect")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn update_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdatePasswordRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = user_service::update_password(&state, &user, payload).await?;
    Ok(Json(resp))
}
