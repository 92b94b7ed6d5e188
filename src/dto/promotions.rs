use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entity::enums::{PromotionScope, PromotionType};
use crate::models::Promotion;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreatePromotionRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: String,
    pub description: Option<String>,
    pub promotion_type: Option<PromotionType>,
    #[validate(range(min = 0))]
    pub value: i64,
    pub scope: Option<PromotionScope>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[validate(range(min = 0))]
    pub usage_limit: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdatePromotionRequest {
    #[validate(length(min = 1, max = 64))]
    pub code: Option<String>,
    pub description: Option<String>,
    pub promotion_type: Option<PromotionType>,
    #[validate(range(min = 0))]
    pub value: Option<i64>,
    pub scope: Option<PromotionScope>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(range(min = 0))]
    pub usage_limit: Option<i32>,
    pub active: Option<bool>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct PromotionList {
    #[schema(value_type = Vec<Promotion>)]
    pub items: Vec<Promotion>,
}
