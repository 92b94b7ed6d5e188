use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ValidateCartRequest {
    #[validate(length(min = 1))]
    pub shipping_address: String,
    #[validate(length(min = 1))]
    pub payment_method: String,
}
