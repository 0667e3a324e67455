use crate::error::{Result, VariationError};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal places a value is written with; whole numbers count as 0
pub fn decimal_places(value: Decimal) -> u32 {
    if value.fract().is_zero() {
        0
    } else {
        value.scale()
    }
}

/// Round away excess precision. Values already within `max_places` are returned untouched.
pub fn ensure_decimal_places(value: Decimal, max_places: u32) -> Decimal {
    if decimal_places(value) > max_places {
        value.round_dp_with_strategy(max_places, RoundingStrategy::MidpointAwayFromZero)
    } else {
        value
    }
}

/// Parse user input. A comma is accepted as decimal separator and blank input reads as zero.
pub fn parse_decimal(input: &str) -> Result<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&trimmed.replace(',', "."))
        .map_err(|_| VariationError::InvalidNumber(input.to_string()))
}

pub fn ensure_decimal_places_str(input: &str, max_places: u32) -> Result<String> {
    Ok(ensure_decimal_places(parse_decimal(input)?, max_places).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excess_precision_is_rounded() {
        assert_eq!(ensure_decimal_places_str("1.23456", 2).unwrap(), "1.23");
        assert_eq!(ensure_decimal_places_str("2.345", 2).unwrap(), "2.35");
        assert_eq!(ensure_decimal_places_str("-2.345", 2).unwrap(), "-2.35");
        assert_eq!(ensure_decimal_places_str("7.5", 0).unwrap(), "8");
    }

    #[test]
    fn test_values_within_limit_are_unchanged() {
        assert_eq!(ensure_decimal_places_str("5", 2).unwrap(), "5");
        assert_eq!(ensure_decimal_places_str("1.2", 4).unwrap(), "1.2");
        assert_eq!(ensure_decimal_places_str("5.00", 0).unwrap(), "5.00");
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(Decimal::from_str("10").unwrap()), 0);
        assert_eq!(decimal_places(Decimal::from_str("10.000").unwrap()), 0);
        assert_eq!(decimal_places(Decimal::from_str("10.250").unwrap()), 3);
    }

    #[test]
    fn test_parse_decimal_input() {
        assert_eq!(parse_decimal("1,5").unwrap(), Decimal::new(15, 1));
        assert_eq!(parse_decimal("  ").unwrap(), Decimal::ZERO);
        assert!(matches!(
            parse_decimal("abc"),
            Err(VariationError::InvalidNumber(_))
        ));
    }
}
