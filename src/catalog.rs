//! Read-time derivations over catalog rows. Nothing here touches the database:
//! status and effective price are recomputed from `(product, stock, promotions, now)`
//! every time a product is rendered, so they can never drift from the stored data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{
    enums::{PromotionScope, PromotionType},
    promotions,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ProductStatus {
    #[serde(rename = "Disponible")]
    Disponible,
    #[serde(rename = "En rupture")]
    EnRupture,
    #[serde(rename = "En promotion")]
    EnPromotion,
    #[serde(rename = "Arrêté")]
    Arrete,
}

/// A promotion runs when it is switched on and `now` falls inside
/// `[starts_at, ends_at]`, both ends inclusive.
pub fn promotion_running(promotion: &promotions::Model, now: DateTime<Utc>) -> bool {
    promotion.active && promotion.starts_at <= now && now <= promotion.ends_at
}

pub fn any_running(promotions: &[promotions::Model], now: DateTime<Utc>) -> bool {
    promotions.iter().any(|p| promotion_running(p, now))
}

/// Priority: withdrawn product, running promotion, out of stock, available.
pub fn derive_status(
    active: bool,
    stock: i32,
    promotions: &[promotions::Model],
    now: DateTime<Utc>,
) -> ProductStatus {
    if !active {
        return ProductStatus::Arrete;
    }
    if any_running(promotions, now) {
        return ProductStatus::EnPromotion;
    }
    if stock <= 0 {
        return ProductStatus::EnRupture;
    }
    ProductStatus::Disponible
}

/// Lowest price reachable through a running product-scoped promotion.
/// Order- and category-scoped promotions are applied elsewhere and ignored here.
pub fn discounted_price(
    price: i64,
    promotions: &[promotions::Model],
    now: DateTime<Utc>,
) -> Option<i64> {
    promotions
        .iter()
        .filter(|p| p.scope == PromotionScope::Product && promotion_running(p, now))
        .map(|p| apply_discount(price, p.promotion_type, p.value))
        .min()
}

pub fn apply_discount(price: i64, promotion_type: PromotionType, value: i64) -> i64 {
    let reduced = match promotion_type {
        PromotionType::Percentage => price - price * value.clamp(0, 100) / 100,
        PromotionType::FixedAmount => price - value.max(0),
    };
    reduced.max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn promo(starts_in_days: i64, ends_in_days: i64, now: DateTime<Utc>) -> promotions::Model {
        promotions::Model {
            id: Uuid::new_v4(),
            code: "SPRING".into(),
            description: None,
            promotion_type: PromotionType::Percentage,
            value: 20,
            scope: PromotionScope::Product,
            starts_at: (now + Duration::days(starts_in_days)).into(),
            ends_at: (now + Duration::days(ends_in_days)).into(),
            usage_limit: None,
            usage_count: 0,
            active: true,
            created_at: now.into(),
        }
    }

    #[test]
    fn out_of_stock_without_promotion_is_en_rupture() {
        let now = Utc::now();
        assert_eq!(derive_status(true, 0, &[], now), ProductStatus::EnRupture);
        let expired = promo(-10, -1, now);
        assert_eq!(
            derive_status(true, 0, &[expired], now),
            ProductStatus::EnRupture
        );
    }

    #[test]
    fn running_promotion_wins_over_stock() {
        let now = Utc::now();
        let running = promo(-1, 1, now);
        assert_eq!(
            derive_status(true, 12, std::slice::from_ref(&running), now),
            ProductStatus::EnPromotion
        );
        assert_eq!(
            derive_status(true, 0, &[running], now),
            ProductStatus::EnPromotion
        );
    }

    #[test]
    fn in_stock_is_disponible() {
        let now = Utc::now();
        let future = promo(2, 5, now);
        assert_eq!(derive_status(true, 3, &[future], now), ProductStatus::Disponible);
    }

    #[test]
    fn inactive_product_is_arrete() {
        let now = Utc::now();
        let running = promo(-1, 1, now);
        assert_eq!(derive_status(false, 5, &[running], now), ProductStatus::Arrete);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = Utc::now();
        let mut p = promo(0, 0, now);
        p.starts_at = now.into();
        p.ends_at = now.into();
        assert!(promotion_running(&p, now));
        p.active = false;
        assert!(!promotion_running(&p, now));
    }

    #[test]
    fn discount_picks_lowest_price_and_never_goes_negative() {
        let now = Utc::now();
        let pct = promo(-1, 1, now);
        let mut fixed = promo(-1, 1, now);
        fixed.promotion_type = PromotionType::FixedAmount;
        fixed.value = 5_000;
        assert_eq!(discounted_price(10_000, &[pct.clone(), fixed], now), Some(5_000));
        assert_eq!(apply_discount(1_000, PromotionType::FixedAmount, 5_000), 0);
        assert_eq!(discounted_price(10_000, &[pct], now + Duration::days(3)), None);
    }

    #[test]
    fn order_scoped_promotions_do_not_discount_products() {
        let now = Utc::now();
        let mut p = promo(-1, 1, now);
        p.scope = PromotionScope::Order;
        assert_eq!(discounted_price(10_000, &[p], now), None);
    }
}
