use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    dto::addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
    entity::addresses::{
        ActiveModel as AddressActive, Column as AddressCol, Entity as Addresses,
        Model as AddressModel,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

async fn find_owned(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<AddressModel> {
    Addresses::find_by_id(id)
        .filter(AddressCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Address {id}")))
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items: Vec<Address> = Addresses::find()
        .filter(AddressCol::UserId.eq(user.user_id))
        .order_by_asc(AddressCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Addresses", AddressList { items }, Some(meta)))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        street: Set(payload.street),
        city: Set(payload.city),
        postal_code: Set(payload.postal_code),
        country: Set(payload.country),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "address_create",
        "addresses",
        serde_json::json!({ "address_id": address.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address created",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let existing = find_owned(state, user, id).await?;

    let mut active: AddressActive = existing.into();
    if let Some(street) = payload.street {
        active.street = Set(street);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(postal_code) = payload.postal_code {
        active.postal_code = Set(postal_code);
    }
    if let Some(country) = payload.country {
        active.country = Set(country);
    }
    let address = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "address_update",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address updated",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    find_owned(state, user, id).await?;
    Addresses::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "address_delete",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Address deleted"))
}

fn address_from_entity(model: AddressModel) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        street: model.street,
        city: model.city,
        postal_code: model.postal_code,
        country: model.country,
    }
}
