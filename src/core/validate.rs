//! Turns raw request input into validated amounts, rates and currency codes.

use crate::core::error::ValidationError;

/// Accepts either `.` or `,` as the fractional separator.
fn parse_decimal(raw: &str) -> Result<f64, String> {
    let normalized = raw.trim().replace(',', ".");
    let value = normalized
        .parse::<f64>()
        .map_err(|e| format!("parsing {raw:?}: {e}"))?;
    if !value.is_finite() {
        return Err(format!("parsing {raw:?}: value is not finite"));
    }
    Ok(value)
}

/// Parses an amount to convert. Zero is allowed, negatives are not.
pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    let amount = parse_decimal(raw).map_err(|_| ValidationError::InvalidAmount)?;
    if amount < 0.0 {
        return Err(ValidationError::NegativeAmount);
    }
    Ok(amount)
}

/// Parses a rate against the base currency. Must be strictly positive.
pub fn parse_rate(raw: &str) -> Result<f64, ValidationError> {
    let rate = parse_decimal(raw).map_err(ValidationError::InvalidRate)?;
    if rate <= 0.0 {
        return Err(ValidationError::NonPositiveRate);
    }
    Ok(rate)
}

/// Checks the ISO 4217 shape of a code and returns it uppercased.
pub fn validate_code(raw: &str) -> Result<String, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyCode);
    }
    if raw.len() != 3 {
        return Err(ValidationError::InvalidCodeLength);
    }
    if !raw.bytes().all(|b| b.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidCodeCharacters);
    }
    Ok(raw.to_ascii_uppercase())
}
