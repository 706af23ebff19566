//! # Money Helpers — Exact Decimal Arithmetic
//!
//! Prices are `rust_decimal::Decimal` stored in their natural form
//! (e.g. `12.50` for $12.50, Postgres `NUMERIC`), not cents and never
//! floats. `Decimal` arithmetic is exact, so a snapshot taken at
//! cart-add time reproduces byte-for-byte when summed at conversion
//! time.
//!
//! The helpers here validate amounts at the API boundary and compute
//! line totals; nothing in this module rounds.

use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Validate that a catalog price is strictly positive.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositivePrice`] for zero or negative
/// amounts.
pub fn validate_price(price: Decimal) -> Result<Decimal, ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositivePrice(price.to_string()));
    }
    Ok(price)
}

/// Validate that a requested quantity is a positive integer.
///
/// # Errors
///
/// Returns [`ValidationError::NonPositiveQuantity`] for zero or
/// negative quantities.
pub fn validate_quantity(quantity: i32) -> Result<i32, ValidationError> {
    if quantity < 1 {
        return Err(ValidationError::NonPositiveQuantity(quantity));
    }
    Ok(quantity)
}

/// Compute a line total: `unit_price × quantity`, exact.
pub fn line_total(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn positive_price_accepted() {
        assert_eq!(validate_price(dec!(12.50)).unwrap(), dec!(12.50));
    }

    #[test]
    fn zero_and_negative_prices_rejected() {
        assert!(validate_price(Decimal::ZERO).is_err());
        assert!(validate_price(dec!(-0.01)).is_err());
    }

    #[test]
    fn quantity_bounds() {
        assert_eq!(validate_quantity(1).unwrap(), 1);
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn line_total_is_exact() {
        assert_eq!(line_total(dec!(12.50), 2), dec!(25.00));
        assert_eq!(line_total(dec!(5.00), 1), dec!(5.00));
        // The classic float trap: 0.1 * 3 must be exactly 0.3.
        assert_eq!(line_total(dec!(0.1), 3), dec!(0.3));
    }
}
