//! Unit-price calculation.
//!
//! Converts a material's pricing attributes into the price charged for one unit,
//! then multiplies by quantity. These functions are pure: purchases call them at
//! write time and store the result, reads never recompute.
//!
//! Numeric edge cases never fail. A pack quantity of zero or less prices the
//! whole pack as one item, and a `per_kg_item` material without a weight falls
//! back to the pack formula.

use crate::entities::{PricingType, material};

/// The subset of a material that determines its price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingInputs {
    /// Which formula to apply
    pub pricing_type: PricingType,
    /// Pack price or price per gram, depending on `pricing_type`
    pub base_price: f64,
    /// Items per pack
    pub pack_quantity: f64,
    /// Percentage added on top of the per-item cost
    pub markup_percentage: f64,
    /// Grams per item
    pub weight_per_unit: Option<f64>,
}

impl From<&material::Model> for PricingInputs {
    fn from(material: &material::Model) -> Self {
        Self {
            pricing_type: material.pricing_type,
            base_price: material.base_price,
            pack_quantity: material.pack_quantity,
            markup_percentage: material.markup_percentage,
            weight_per_unit: material.weight_per_unit,
        }
    }
}

/// Price and cost of a purchase line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    /// Price for one unit, markup included
    pub unit_price: f64,
    /// `quantity * unit_price`
    pub total_cost: f64,
}

fn pack_price_per_item(base_price: f64, pack_quantity: f64) -> f64 {
    if pack_quantity > 0.0 {
        base_price / pack_quantity
    } else {
        base_price
    }
}

/// Cost of a single item before markup.
#[must_use]
pub fn price_per_item(inputs: &PricingInputs) -> f64 {
    match inputs.pricing_type {
        PricingType::PerKgItem => match inputs.weight_per_unit {
            Some(weight) if weight != 0.0 => inputs.base_price * weight,
            _ => pack_price_per_item(inputs.base_price, inputs.pack_quantity),
        },
        // per_kg holds a price per gram yet still divides by pack quantity here.
        // Existing purchase history was priced this way, so it stays.
        PricingType::Fixed | PricingType::PerKg => {
            pack_price_per_item(inputs.base_price, inputs.pack_quantity)
        }
    }
}

/// Applies a percentage markup.
#[must_use]
pub fn apply_markup(price: f64, markup_percentage: f64) -> f64 {
    price * (1.0 + markup_percentage / 100.0)
}

/// Price charged for one unit: per-item cost with markup.
#[must_use]
pub fn unit_price(inputs: &PricingInputs) -> f64 {
    apply_markup(price_per_item(inputs), inputs.markup_percentage)
}

/// Prices `quantity` units.
#[must_use]
pub fn quote(inputs: &PricingInputs, quantity: f64) -> PriceQuote {
    let unit_price = unit_price(inputs);
    PriceQuote {
        unit_price,
        total_cost: quantity * unit_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    fn fixed(base_price: f64, pack_quantity: f64, markup_percentage: f64) -> PricingInputs {
        PricingInputs {
            pricing_type: PricingType::Fixed,
            base_price,
            pack_quantity,
            markup_percentage,
            weight_per_unit: None,
        }
    }

    #[test]
    fn test_fixed_pack_with_markup() {
        // £25 for 50, 10% markup
        assert_close(unit_price(&fixed(25.0, 50.0, 10.0)), 0.55);
    }

    #[test]
    fn test_fixed_single_item_no_markup() {
        assert_close(unit_price(&fixed(3.32, 1.0, 0.0)), 3.32);
    }

    #[test]
    fn test_zero_pack_quantity_treated_as_one() {
        assert_close(price_per_item(&fixed(12.0, 0.0, 0.0)), 12.0);
        assert_close(price_per_item(&fixed(12.0, -3.0, 0.0)), 12.0);
        assert_close(unit_price(&fixed(12.0, 0.0, 50.0)), 18.0);
    }

    #[test]
    fn test_per_kg_item_uses_weight() {
        let rings = PricingInputs {
            pricing_type: PricingType::PerKgItem,
            base_price: 2.5,
            pack_quantity: 1.0,
            markup_percentage: 0.0,
            weight_per_unit: Some(0.8),
        };
        assert_close(unit_price(&rings), 2.0);

        let marked_up = PricingInputs {
            markup_percentage: 25.0,
            ..rings
        };
        assert_close(unit_price(&marked_up), 2.5);
    }

    #[test]
    fn test_per_kg_item_without_weight_falls_back_to_pack() {
        let inputs = PricingInputs {
            pricing_type: PricingType::PerKgItem,
            base_price: 10.0,
            pack_quantity: 4.0,
            markup_percentage: 0.0,
            weight_per_unit: None,
        };
        assert_close(unit_price(&inputs), 2.5);

        let zero_weight = PricingInputs {
            weight_per_unit: Some(0.0),
            ..inputs
        };
        assert_close(unit_price(&zero_weight), 2.5);
    }

    #[test]
    fn test_per_kg_divides_by_pack_quantity() {
        let sheet = PricingInputs {
            pricing_type: PricingType::PerKg,
            base_price: 2.88,
            pack_quantity: 2.0,
            markup_percentage: 0.0,
            weight_per_unit: Some(5.0),
        };
        // weight is ignored for per_kg
        assert_close(unit_price(&sheet), 1.44);
    }

    #[test]
    fn test_quote_total_is_quantity_times_unit_price() {
        let inputs = fixed(25.0, 50.0, 10.0);
        for quantity in [0.5, 1.0, 3.0, 12.25] {
            let quote = quote(&inputs, quantity);
            assert_close(quote.unit_price, 0.55);
            assert!((quote.total_cost - quantity * quote.unit_price).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn test_apply_markup() {
        assert_close(apply_markup(10.0, 0.0), 10.0);
        assert_close(apply_markup(10.0, 100.0), 20.0);
    }
}
