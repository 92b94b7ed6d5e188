use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::promotions::{CreatePromotionRequest, PromotionList, UpdatePromotionRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Promotion,
    response::ApiResponse,
    services::promotion_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_promotions).post(create_promotion))
        .route(
            "/{id}",
            get(get_promotion)
                .patch(update_promotion)
                .delete(delete_promotion),
        )
}

#[utoipa::path(
    get,
    path = "/api/promotions",
    responses(
        (status = 200, description = "Promotions", body = ApiResponse<PromotionList>)
    ),
    tag = "Promotions"
)]
pub async fn list_promotions(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<PromotionList>>> {
    let resp = promotion_service::list_promotions(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/promotions/{id}",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 200, description = "Promotion", body = ApiResponse<Promotion>),
        (status = 404, description = "Promotion not found")
    ),
    tag = "Promotions"
)]
pub async fn get_promotion(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::get_promotion(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/promotions",
    request_body = CreatePromotionRequest,
    responses(
        (status = 201, description = "Promotion created", body = ApiResponse<Promotion>),
        (status = 400, description = "Invalid window, value or duplicate code"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn create_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreatePromotionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Promotion>>)> {
    let resp = promotion_service::create_promotion(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/promotions/{id}",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    request_body = UpdatePromotionRequest,
    responses(
        (status = 200, description = "Promotion updated", body = ApiResponse<Promotion>),
        (status = 404, description = "Promotion not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn update_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePromotionRequest>,
) -> AppResult<Json<ApiResponse<Promotion>>> {
    let resp = promotion_service::update_promotion(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/promotions/{id}",
    params(
        ("id" = Uuid, Path, description = "Promotion ID")
    ),
    responses(
        (status = 200, description = "Promotion deleted"),
        (status = 404, description = "Promotion not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Promotions"
)]
pub async fn delete_promotion(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = promotion_service::delete_promotion(&state, &user, id).await?;
    Ok(Json(resp))
}
