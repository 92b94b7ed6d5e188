use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{InventoryEntry, Product, ProductDetails, StockLevel};

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: i64,
    pub category_id: Uuid,
    pub active: Option<bool>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    #[serde(default)]
    pub details: ProductDetails,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub promotion_ids: Vec<Uuid>,
    #[serde(default)]
    pub sub_category_ids: Vec<Uuid>,
}

/// Absent fields are left untouched; present collections replace the stored ones.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub price: Option<i64>,
    pub category_id: Option<Uuid>,
    pub active: Option<bool>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub details: Option<ProductDetails>,
    pub images: Option<Vec<String>>,
    pub promotion_ids: Option<Vec<Uuid>>,
    pub sub_category_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateStockRequest {
    #[validate(range(min = 0))]
    pub stock: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustStockRequest {
    pub delta: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyPromotionRequest {
    /// `null` detaches every promotion from the product.
    pub promotion_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub name: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct InventoryHistoryList {
    #[schema(value_type = Vec<InventoryEntry>)]
    pub items: Vec<InventoryEntry>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct StockLevelList {
    #[schema(value_type = Vec<StockLevel>)]
    pub items: Vec<StockLevel>,
}
