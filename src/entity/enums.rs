use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "en_cours")]
    EnCours,
    #[sea_orm(string_value = "expediee")]
    Expediee,
    #[sea_orm(string_value = "livree")]
    Livree,
    #[sea_orm(string_value = "annulee")]
    Annulee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "validated")]
    Validated,
    #[sea_orm(string_value = "echoue")]
    Echoue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ShippingStatus {
    #[sea_orm(string_value = "preparation")]
    Preparation,
    #[sea_orm(string_value = "expediee")]
    Expediee,
    #[sea_orm(string_value = "livree")]
    Livree,
}

/// Discriminator for the product variants; the variant payload lives in `product_details`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    #[sea_orm(string_value = "standard")]
    Standard,
    #[sea_orm(string_value = "digital_drawing")]
    DigitalDrawing,
    #[sea_orm(string_value = "sticker")]
    Sticker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PromotionType {
    #[sea_orm(string_value = "percentage")]
    Percentage,
    #[sea_orm(string_value = "fixed_amount")]
    FixedAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum PromotionScope {
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "product")]
    Product,
    #[sea_orm(string_value = "category")]
    Category,
}
