use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use uuid::Uuid;

use crate::{
    dto::{
        categories::{
            CategoryList, CreateCategoryRequest, CreateSubCategoryRequest, SubCategoryList,
            UpdateCategoryRequest, UpdateSubCategoryRequest,
        },
        products::ProductList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Category, SubCategory},
    response::ApiResponse,
    services::{category_service, product_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/{id}",
            get(get_category)
                .patch(update_category)
                .delete(delete_category),
        )
        .route(
            "/{id}/subcategories",
            get(list_sub_categories).post(create_sub_category),
        )
        .route("/{id}/products", get(category_products))
        .route(
            "/subcategories/{sub_id}",
            patch(update_sub_category).delete(delete_sub_category),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Categories with their sub-categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 400, description = "Name already used"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let resp = category_service::create_category(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::update_category(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Category still has products"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_category(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/subcategories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Sub-categories", body = ApiResponse<SubCategoryList>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn list_sub_categories(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<SubCategoryList>>> {
    let resp = category_service::list_sub_categories(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories/{id}/subcategories",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = CreateSubCategoryRequest,
    responses(
        (status = 201, description = "Sub-category created", body = ApiResponse<SubCategory>),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_sub_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSubCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SubCategory>>)> {
    let resp = category_service::create_sub_category(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    patch,
    path = "/api/categories/subcategories/{sub_id}",
    params(
        ("sub_id" = Uuid, Path, description = "Sub-category ID")
    ),
    request_body = UpdateSubCategoryRequest,
    responses(
        (status = 200, description = "Sub-category updated", body = ApiResponse<SubCategory>),
        (status = 404, description = "Sub-category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn update_sub_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sub_id): Path<Uuid>,
    Json(payload): Json<UpdateSubCategoryRequest>,
) -> AppResult<Json<ApiResponse<SubCategory>>> {
    let resp = category_service::update_sub_category(&state, &user, sub_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/categories/subcategories/{sub_id}",
    params(
        ("sub_id" = Uuid, Path, description = "Sub-category ID")
    ),
    responses(
        (status = 200, description = "Sub-category deleted"),
        (status = 404, description = "Sub-category not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn delete_sub_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sub_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = category_service::delete_sub_category(&state, &user, sub_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id}/products",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Products of the category", body = ApiResponse<ProductList>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn category_products(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let resp = product_service::products_by_category(&state, id).await?;
    Ok(Json(resp))
}
