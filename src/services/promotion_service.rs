use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    audit,
    catalog::promotion_running,
    dto::promotions::{CreatePromotionRequest, PromotionList, UpdatePromotionRequest},
    entity::{
        enums::{PromotionScope, PromotionType},
        promotions::{
            ActiveModel as PromotionActive, Column as PromoCol, Entity as Promotions,
            Model as PromotionModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Promotion,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub(crate) async fn find_promotion<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> AppResult<PromotionModel> {
    Promotions::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Promotion {id}")))
}

/// Promotions currently inside their window, switched on.
pub(crate) async fn running_promotions<C: ConnectionTrait>(
    conn: &C,
    now: DateTime<Utc>,
) -> AppResult<Vec<PromotionModel>> {
    Ok(Promotions::find()
        .filter(PromoCol::Active.eq(true))
        .filter(PromoCol::StartsAt.lte(now))
        .filter(PromoCol::EndsAt.gte(now))
        .all(conn)
        .await?)
}

fn check_rules(
    promotion_type: PromotionType,
    value: i64,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
) -> AppResult<()> {
    if starts_at > ends_at {
        return Err(AppError::BadRequest(
            "starts_at must not be after ends_at".into(),
        ));
    }
    if value < 0 || (promotion_type == PromotionType::Percentage && value > 100) {
        return Err(AppError::BadRequest("Invalid promotion value".into()));
    }
    Ok(())
}

async fn ensure_code_free<C: ConnectionTrait>(
    conn: &C,
    code: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let existing = Promotions::find()
        .filter(PromoCol::Code.eq(code))
        .one(conn)
        .await?;
    match existing {
        Some(other) if Some(other.id) != except => Err(AppError::BadRequest(format!(
            "Promotion code {code} already exists"
        ))),
        _ => Ok(()),
    }
}

pub async fn list_promotions(state: &AppState) -> AppResult<ApiResponse<PromotionList>> {
    let now = Utc::now();
    let items: Vec<Promotion> = Promotions::find()
        .order_by_desc(PromoCol::StartsAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| promotion_from_entity(model, now))
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success(
        "Promotions",
        PromotionList { items },
        Some(meta),
    ))
}

pub async fn get_promotion(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Promotion>> {
    let model = find_promotion(&state.orm, id).await?;
    Ok(ApiResponse::success(
        "Promotion",
        promotion_from_entity(model, Utc::now()),
        None,
    ))
}

pub async fn create_promotion(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    ensure_admin(user)?;
    payload.validate()?;

    let code = payload.code.trim().to_uppercase();
    let promotion_type = payload.promotion_type.unwrap_or(PromotionType::Percentage);
    check_rules(promotion_type, payload.value, payload.starts_at, payload.ends_at)?;
    ensure_code_free(&state.orm, &code, None).await?;

    let now = Utc::now();
    let promotion = PromotionActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        description: Set(payload.description),
        promotion_type: Set(promotion_type),
        value: Set(payload.value),
        scope: Set(payload.scope.unwrap_or(PromotionScope::Product)),
        starts_at: Set(payload.starts_at.into()),
        ends_at: Set(payload.ends_at.into()),
        usage_limit: Set(payload.usage_limit),
        usage_count: Set(0),
        active: Set(payload.active.unwrap_or(true)),
        created_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "promotion_create",
        "promotions",
        serde_json::json!({ "promotion_id": promotion.id, "code": promotion.code }),
    )
    .await;

    Ok(ApiResponse::success(
        "Promotion created",
        promotion_from_entity(promotion, now),
        Some(Meta::empty()),
    ))
}

pub async fn update_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdatePromotionRequest,
) -> AppResult<ApiResponse<Promotion>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = find_promotion(&state.orm, id).await?;

    let promotion_type = payload.promotion_type.unwrap_or(existing.promotion_type);
    let value = payload.value.unwrap_or(existing.value);
    let starts_at = payload
        .starts_at
        .unwrap_or_else(|| existing.starts_at.with_timezone(&Utc));
    let ends_at = payload
        .ends_at
        .unwrap_or_else(|| existing.ends_at.with_timezone(&Utc));
    check_rules(promotion_type, value, starts_at, ends_at)?;

    let mut active: PromotionActive = existing.into();
    if let Some(code) = payload.code {
        let code = code.trim().to_uppercase();
        ensure_code_free(&state.orm, &code, Some(id)).await?;
        active.code = Set(code);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(scope) = payload.scope {
        active.scope = Set(scope);
    }
    if let Some(usage_limit) = payload.usage_limit {
        active.usage_limit = Set(Some(usage_limit));
    }
    if let Some(flag) = payload.active {
        active.active = Set(flag);
    }
    active.promotion_type = Set(promotion_type);
    active.value = Set(value);
    active.starts_at = Set(starts_at.into());
    active.ends_at = Set(ends_at.into());
    let promotion = active.update(&state.orm).await?;

    audit::record(
        &state.orm,
        Some(user.user_id),
        "promotion_update",
        "promotions",
        serde_json::json!({ "promotion_id": promotion.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Promotion updated",
        promotion_from_entity(promotion, Utc::now()),
        Some(Meta::empty()),
    ))
}

pub async fn delete_promotion(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Promotions::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found(format!("Promotion {id}")));
    }

    audit::record(
        &state.orm,
        Some(user.user_id),
        "promotion_delete",
        "promotions",
        serde_json::json!({ "promotion_id": id }),
    )
    .await;

    Ok(ApiResponse::ack("Promotion deleted"))
}

pub(crate) fn promotion_from_entity(model: PromotionModel, now: DateTime<Utc>) -> Promotion {
    let running = promotion_running(&model, now);
    Promotion {
        id: model.id,
        code: model.code,
        description: model.description,
        promotion_type: model.promotion_type,
        value: model.value,
        scope: model.scope,
        starts_at: model.starts_at.with_timezone(&Utc),
        ends_at: model.ends_at.with_timezone(&Utc),
        usage_limit: model.usage_limit,
        usage_count: model.usage_count,
        active: model.active,
        running,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn rejects_inverted_window() {
        let now = Utc::now();
        let err = check_rules(PromotionType::Percentage, 10, now, now - Duration::days(1));
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn percentage_is_capped_at_100() {
        let now = Utc::now();
        assert!(check_rules(PromotionType::Percentage, 100, now, now).is_ok());
        assert!(check_rules(PromotionType::Percentage, 101, now, now).is_err());
        assert!(check_rules(PromotionType::FixedAmount, 5_000, now, now).is_ok());
    }
}
