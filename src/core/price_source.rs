//! Supplier price refresh.
//!
//! Fetching prices is left to implementors of [`PriceSource`] and
//! [`SpotPriceSource`]. This module only decides which materials to refresh
//! and writes the results through the material store.

use crate::{
    core::material::{get_all_materials, get_material},
    entities::{PricingType, material},
    errors::Result,
};
use chrono::NaiveDateTime;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::{debug, info, instrument, warn};

/// Looks up current supplier prices.
pub trait PriceSource {
    /// Base price for the product at `url`: a pack price for `fixed`, a price
    /// per gram for `per_kg` and `per_kg_item`.
    fn fetch_price(&self, url: &str, pricing_type: PricingType) -> Option<f64>;

    /// Weight in grams of one item sold at `url`.
    fn fetch_item_weight(&self, url: &str) -> Option<f64>;
}

/// Current precious metal spot price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotPrice {
    /// Price of one gram of metal
    pub price_per_gram: f64,
    /// When the price was quoted
    pub timestamp: NaiveDateTime,
}

/// Looks up the metal spot price.
pub trait SpotPriceSource {
    /// Latest spot price, or `None` when no price is available.
    fn fetch_spot_price(&self) -> Option<SpotPrice>;
}

/// Outcome of [`refresh_material_price`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The stored material after the new price was saved
    Updated(material::Model),
    /// No supplier URL to refresh from
    Skipped,
    /// The source had no price for the URL
    Failed,
}

/// Counts from [`refresh_all_material_prices`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Materials given a new price
    pub updated: usize,
    /// Materials whose source returned no price
    pub failed: usize,
    /// Materials without a supplier URL
    pub skipped: usize,
}

/// Refreshes one material's base price from its supplier URL, keeping its markup.
///
/// A `per_kg_item` material with no item weight also gets its weight filled in
/// when the source knows it.
#[instrument(skip(db, source))]
pub async fn refresh_material_price<S>(
    db: &DatabaseConnection,
    source: &S,
    material_id: i64,
) -> Result<RefreshOutcome>
where
    S: PriceSource + ?Sized,
{
    let material = get_material(db, material_id).await?;
    let Some(url) = material.supplier_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        debug!(material_id, "No supplier URL");
        return Ok(RefreshOutcome::Skipped);
    };

    let Some(price) = source
        .fetch_price(url, material.pricing_type)
        .filter(|p| p.is_finite() && *p >= 0.0)
    else {
        warn!(material_id, url, "Could not fetch supplier price");
        return Ok(RefreshOutcome::Failed);
    };

    let needs_weight = material.pricing_type == PricingType::PerKgItem
        && material.weight_per_unit.is_none_or(|w| w == 0.0);
    let weight = if needs_weight {
        source.fetch_item_weight(url).filter(|w| w.is_finite() && *w > 0.0)
    } else {
        None
    };

    let old_price = material.base_price;
    let mut refreshed: material::ActiveModel = material.into();
    refreshed.base_price = Set(price);
    if let Some(weight) = weight {
        refreshed.weight_per_unit = Set(Some(weight));
    }
    refreshed.last_updated = Set(chrono::Local::now().naive_local());
    let updated = refreshed.update(db).await?;

    info!(
        material_id,
        old_price,
        new_price = price,
        "Refreshed supplier price"
    );
    Ok(RefreshOutcome::Updated(updated))
}

/// Refreshes every active material that has a supplier URL.
pub async fn refresh_all_material_prices<S>(
    db: &DatabaseConnection,
    source: &S,
) -> Result<RefreshReport>
where
    S: PriceSource + ?Sized,
{
    let mut report = RefreshReport::default();
    for material in get_all_materials(db, false).await? {
        match refresh_material_price(db, source, material.id).await? {
            RefreshOutcome::Updated(_) => report.updated += 1,
            RefreshOutcome::Failed => report.failed += 1,
            RefreshOutcome::Skipped => report.skipped += 1,
        }
    }
    info!(
        updated = report.updated,
        failed = report.failed,
        skipped = report.skipped,
        "Price refresh finished"
    );
    Ok(report)
}

/// Raw metal cost of an item at the current spot price, or `None` when unavailable.
pub fn spot_metal_cost<S>(source: &S, weight_grams: f64) -> Option<f64>
where
    S: SpotPriceSource + ?Sized,
{
    source
        .fetch_spot_price()
        .map(|spot| spot.price_per_gram * weight_grams)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::material::{MaterialInput, add_material, toggle_material_active};
    use crate::errors::Error;
    use crate::test_utils::*;
    use sea_orm::ConnectionTrait;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FixedPrices {
        prices: HashMap<&'static str, f64>,
        weights: HashMap<&'static str, f64>,
    }

    impl PriceSource for FixedPrices {
        fn fetch_price(&self, url: &str, _pricing_type: PricingType) -> Option<f64> {
            self.prices.get(url).copied()
        }

        fn fetch_item_weight(&self, url: &str) -> Option<f64> {
            self.weights.get(url).copied()
        }
    }

    struct Spot(Option<f64>);

    impl SpotPriceSource for Spot {
        fn fetch_spot_price(&self) -> Option<SpotPrice> {
            self.0.map(|price_per_gram| SpotPrice {
                price_per_gram,
                timestamp: test_date(2024, 6, 1),
            })
        }
    }

    fn sourced(name: &str, url: &str, pricing_type: PricingType) -> MaterialInput {
        MaterialInput {
            pricing_type,
            markup_percentage: 20.0,
            supplier_url: Some(url.to_string()),
            ..MaterialInput::new(name, "item", 1.0)
        }
    }

    #[tokio::test]
    async fn test_refresh_keeps_markup() -> Result<()> {
        let db = setup_test_db().await?;
        let hooks = add_material(&db, sourced("Hooks", "hooks", PricingType::Fixed)).await?;
        let source = FixedPrices {
            prices: HashMap::from([("hooks", 12.5)]),
            ..FixedPrices::default()
        };

        let outcome = refresh_material_price(&db, &source, hooks.id).await?;
        let RefreshOutcome::Updated(updated) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(updated.base_price, 12.5);
        assert_eq!(updated.markup_percentage, 20.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_fills_missing_item_weight() -> Result<()> {
        let db = setup_test_db().await?;
        let ring = add_material(&db, sourced("Ring", "ring", PricingType::PerKgItem)).await?;
        let source = FixedPrices {
            prices: HashMap::from([("ring", 1.9)]),
            weights: HashMap::from([("ring", 2.4)]),
        };

        refresh_material_price(&db, &source, ring.id).await?;

        let stored = get_material(&db, ring.id).await?;
        assert_eq!(stored.base_price, 1.9);
        assert_eq!(stored.weight_per_unit, Some(2.4));
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_material_unchanged() -> Result<()> {
        let db = setup_test_db().await?;
        let ring = add_material(&db, sourced("Ring", "ring", PricingType::PerKgItem)).await?;
        db.execute_unprepared(
            "CREATE TRIGGER reject_weight BEFORE UPDATE OF weight_per_unit ON materials \
             WHEN NEW.weight_per_unit IS NOT OLD.weight_per_unit \
             BEGIN SELECT RAISE(ABORT, 'weight rejected'); END",
        )
        .await?;
        let source = FixedPrices {
            prices: HashMap::from([("ring", 9.0)]),
            weights: HashMap::from([("ring", 2.0)]),
        };

        let result = refresh_material_price(&db, &source, ring.id).await;
        assert!(matches!(result.unwrap_err(), Error::Database(_)));

        let stored = get_material(&db, ring.id).await?;
        assert_eq!(stored.base_price, 1.0);
        assert_eq!(stored.weight_per_unit, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_all_counts_outcomes() -> Result<()> {
        let db = setup_test_db().await?;
        add_material(&db, sourced("Hooks", "hooks", PricingType::Fixed)).await?;
        add_material(&db, sourced("Broken", "gone", PricingType::Fixed)).await?;
        create_test_material(&db, "Local").await?;
        let retired = add_material(&db, sourced("Retired", "hooks", PricingType::Fixed)).await?;
        toggle_material_active(&db, retired.id).await?;

        let source = FixedPrices {
            prices: HashMap::from([("hooks", 3.0)]),
            ..FixedPrices::default()
        };
        let report = refresh_all_material_prices(&db, &source).await?;
        assert_eq!(
            report,
            RefreshReport {
                updated: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(get_material(&db, retired.id).await?.base_price, 1.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_missing_material() -> Result<()> {
        let db = setup_test_db().await?;
        let result = refresh_material_price(&db, &FixedPrices::default(), 5).await;
        assert!(matches!(result.unwrap_err(), Error::MaterialNotFound { id: 5 }));
        Ok(())
    }

    #[test]
    fn test_spot_metal_cost() {
        assert_eq!(spot_metal_cost(&Spot(Some(0.8)), 10.0), Some(8.0));
        assert_eq!(spot_metal_cost(&Spot(None), 10.0), None);
    }
}
