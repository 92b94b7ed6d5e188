use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entity::enums::{OrderStatus, PaymentStatus, ShippingStatus};
use crate::models::{Order, OrderItem};

/// Address and payment may be filled in later through an update.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub shipping_address: Option<String>,
    #[validate(length(min = 1))]
    pub payment_method: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1))]
    pub shipping_address: Option<String>,
    #[validate(length(min = 1))]
    pub payment_method: Option<String>,
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub shipping_status: Option<ShippingStatus>,
    #[validate(range(min = 0))]
    pub shipping_cost: Option<i64>,
    pub expedition_date: Option<DateTime<Utc>>,
    pub estimated_delivery_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}
