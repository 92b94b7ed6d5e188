use sea_orm::entity::prelude::*;

use super::enums::{PromotionScope, PromotionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub description: Option<String>,
    pub promotion_type: PromotionType,
    /// Percent (0..=100) or minor currency units, depending on `promotion_type`.
    pub value: i64,
    pub scope: PromotionScope,
    pub starts_at: DateTimeWithTimeZone,
    pub ends_at: DateTimeWithTimeZone,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_promotions::Entity")]
    ProductPromotions,
}

impl Related<super::product_promotions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductPromotions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
