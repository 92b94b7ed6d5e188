use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::Address;

#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateAddressRequest {
    #[validate(length(min = 1, max = 255))]
    pub street: String,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: String,
    #[validate(length(min = 1, max = 100))]
    pub country: String,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateAddressRequest {
    #[validate(length(min = 1, max = 255))]
    pub street: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub postal_code: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct AddressList {
    #[schema(value_type = Vec<Address>)]
    pub items: Vec<Address>,
}
