use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::catalog::ProductStatus;
use crate::entity::enums::{
    OrderStatus, PaymentStatus, PromotionScope, PromotionType, ShippingStatus,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub sub_categories: Vec<SubCategory>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubCategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Promotion {
    pub id: Uuid,
    pub code: String,
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    pub value: i64,
    pub scope: PromotionScope,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub active: bool,
    /// Whether the promotion applies right now.
    pub running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: Uuid,
    pub url: String,
    pub description: Option<String>,
}

/// Variant-specific data, tagged by product type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProductDetails {
    #[default]
    Standard,
    DigitalDrawing {
        resolution: String,
        dimensions: String,
        support: Option<String>,
    },
    Sticker {
        format: String,
        dimensions: String,
        material: String,
    },
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    /// Price after the best running product promotion, if any.
    pub discounted_price: Option<i64>,
    pub category_id: Uuid,
    pub details: ProductDetails,
    pub active: bool,
    pub stock: i32,
    pub status: ProductStatus,
    pub images: Vec<ProductImage>,
    pub promotions: Vec<Promotion>,
    pub sub_category_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InventoryEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity_before: i32,
    pub quantity_after: i32,
    pub changed_by: Option<Uuid>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StockLevel {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<CartLine>,
    pub total: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub shipping_address: Option<String>,
    pub payment_method: Option<String>,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub shipping_status: ShippingStatus,
    pub total_amount: i64,
    pub shipping_cost: Option<i64>,
    pub expedition_date: Option<DateTime<Utc>>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Wishlist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub items: Vec<WishlistItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WishlistItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: i64,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}
