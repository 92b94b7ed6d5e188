use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::categories::{
        CategoryList, CreateCategoryRequest, CreateSubCategoryRequest, SubCategoryList,
        UpdateCategoryRequest, UpdateSubCategoryRequest,
    },
    entity::{
        categories::{
            ActiveModel as CategoryActive, Column as CatCol, Entity as Categories,
            Model as CategoryModel,
        },
        sub_categories::{
            ActiveModel as SubCategoryActive, Column as SubCol, Entity as SubCategories,
            Model as SubCategoryModel,
        },
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, SubCategory},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub(crate) async fn find_category<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<CategoryModel> {
    Categories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Category {id}")))
}

async fn find_sub_category<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<SubCategoryModel> {
    SubCategories::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Sub-category {id}")))
}

async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let existing = Categories::find()
        .filter(CatCol::Name.eq(name))
        .one(conn)
        .await?;
    match existing {
        Some(other) if Some(other.id) != except => Err(AppError::BadRequest(format!(
            "Category {name} already exists"
        ))),
        _ => Ok(()),
    }
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let categories = Categories::find()
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?;
    let mut subs: HashMap<Uuid, Vec<SubCategory>> = HashMap::new();
    for sub in SubCategories::find()
        .order_by_asc(SubCol::Name)
        .all(&state.orm)
        .await?
    {
        subs.entry(sub.category_id)
            .or_default()
            .push(sub_category_from_entity(sub));
    }

    let items: Vec<Category> = categories
        .into_iter()
        .map(|model| {
            let children = subs.remove(&model.id).unwrap_or_default();
            category_from_entity(model, children)
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(meta),
    ))
}

pub async fn get_category(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Category>> {
    let model = find_category(&state.orm, id).await?;
    let children = load_sub_categories(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Category",
        category_from_entity(model, children),
        None,
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;
    let name = payload.name.trim().to_string();
    ensure_name_free(&state.orm, &name, None).await?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category, Vec::new()),
        Some(Meta::empty()),
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_category(&state.orm, id).await?;

    let mut active: CategoryActive = existing.into();
    if let Some(name) = payload.name {
        let name = name.trim().to_string();
        ensure_name_free(&state.orm, &name, Some(id)).await?;
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    let category = active.update(&state.orm).await?;
    let children = load_sub_categories(&state.orm, id).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_update",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated",
        category_from_entity(category, children),
        Some(Meta::empty()),
    ))
}

/// Fails while products still reference the category.
pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    find_category(&state.orm, id).await?;

    let in_use = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;
    if in_use > 0 {
        return Err(AppError::BadRequest(format!(
            "Category still has {in_use} product(s)"
        )));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Category deleted"))
}

pub async fn list_sub_categories(
    state: &AppState,
    category_id: Uuid,
) -> AppResult<ApiResponse<SubCategoryList>> {
    find_category(&state.orm, category_id).await?;
    let items = load_sub_categories(&state.orm, category_id).await?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success(
        "Sub-categories",
        SubCategoryList { items },
        Some(meta),
    ))
}

pub async fn create_sub_category(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
    payload: CreateSubCategoryRequest,
) -> AppResult<ApiResponse<SubCategory>> {
    ensure_admin(user)?;
    payload.validate()?;
    find_category(&state.orm, category_id).await?;

    let sub = SubCategoryActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category_id),
        name: Set(payload.name.trim().to_string()),
        description: Set(payload.description),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "sub_category_create",
        "sub_categories",
        serde_json::json!({ "sub_category_id": sub.id, "category_id": category_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Sub-category created",
        sub_category_from_entity(sub),
        Some(Meta::empty()),
    ))
}

pub async fn update_sub_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateSubCategoryRequest,
) -> AppResult<ApiResponse<SubCategory>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_sub_category(&state.orm, id).await?;

    let mut active: SubCategoryActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    let sub = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "sub_category_update",
        "sub_categories",
        serde_json::json!({ "sub_category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Sub-category updated",
        sub_category_from_entity(sub),
        Some(Meta::empty()),
    ))
}

pub async fn delete_sub_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = SubCategories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Sub-category {id}")));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "sub_category_delete",
        "sub_categories",
        serde_json::json!({ "sub_category_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Sub-category deleted"))
}

async fn load_sub_categories<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
) -> AppResult<Vec<SubCategory>> {
    Ok(SubCategories::find()
        .filter(SubCol::CategoryId.eq(category_id))
        .order_by_asc(SubCol::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(sub_category_from_entity)
        .collect())
}

fn category_from_entity(model: CategoryModel, sub_categories: Vec<SubCategory>) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        active: model.active,
        created_at: model.created_at.with_timezone(&Utc),
        sub_categories,
    }
}

fn sub_category_from_entity(model: SubCategoryModel) -> SubCategory {
    SubCategory {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        description: model.description,
        active: model.active,
    }
}
