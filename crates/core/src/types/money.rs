//! Money helpers on top of `rust_decimal`.
//!
//! The storefront trades in a single fixed currency (Philippine peso).
//! Multi-currency support is out of scope, so amounts are plain `Decimal`
//! values and these helpers centralize formatting and line arithmetic.

use rust_decimal::Decimal;

/// ISO 4217 code for the storefront currency.
pub const CURRENCY_CODE: &str = "PHP";

/// Display symbol for the storefront currency.
pub const CURRENCY_SYMBOL: &str = "\u{20b1}";

/// Format an amount for display (e.g., `₱250.00`).
///
/// Always renders two decimal places.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{CURRENCY_SYMBOL}{:.2}", amount.round_dp(2))
}

/// Extended price for a line: unit price times quantity.
#[must_use]
pub fn line_total(unit_price: Decimal, quantity: u32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_amount_two_decimal_places() {
        assert_eq!(format_amount(d("250")), "\u{20b1}250.00");
        assert_eq!(format_amount(d("19.9")), "\u{20b1}19.90");
        assert_eq!(format_amount(d("0")), "\u{20b1}0.00");
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(d("100"), 2), d("200"));
        assert_eq!(line_total(d("49.99"), 3), d("149.97"));
        assert_eq!(line_total(d("10"), 0), d("0"));
    }
}
