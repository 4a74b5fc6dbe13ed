//! Shared input checks used by the write operations.

use crate::errors::{Error, Result};

/// Trims `value` and rejects it when empty.
pub fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation {
            message: format!("{field} cannot be empty"),
        });
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field, mapping blank values to `None`.
#[must_use]
pub fn optional_text(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Accepts finite prices of zero or more.
pub fn require_price(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Accepts finite amounts strictly greater than zero.
pub fn require_positive_amount(amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(amount)
}

/// Accepts finite quantities strictly greater than zero.
pub fn require_quantity(quantity: f64) -> Result<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(Error::InvalidQuantity { quantity });
    }
    Ok(quantity)
}

/// Accepts finite markups of zero or more.
pub fn require_markup(markup_percentage: f64) -> Result<f64> {
    if !markup_percentage.is_finite() || markup_percentage < 0.0 {
        return Err(Error::Validation {
            message: format!("Markup must be zero or more, got {markup_percentage}"),
        });
    }
    Ok(markup_percentage)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("Name", "  Ada  ").unwrap(), "Ada");
        assert!(matches!(
            require_text("Name", "   ").unwrap_err(),
            Error::Validation { message: _ }
        ));
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(Some(" Mon ".to_string())), Some("Mon".to_string()));
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn test_numeric_checks() {
        assert_eq!(require_price(0.0).unwrap(), 0.0);
        assert!(require_price(-0.01).is_err());
        assert!(require_price(f64::NAN).is_err());
        assert!(require_positive_amount(0.0).is_err());
        assert_eq!(require_positive_amount(12.5).unwrap(), 12.5);
        assert!(matches!(
            require_quantity(0.0).unwrap_err(),
            Error::InvalidQuantity { quantity: 0.0 }
        ));
        assert!(require_quantity(f64::INFINITY).is_err());
        assert!(require_markup(-5.0).is_err());
        assert_eq!(require_markup(0.0).unwrap(), 0.0);
    }
}
