use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("amount out of range: {0}")]
    OutOfRange(Decimal),
}

/// Parse a bank-supplied decimal amount string.
///
/// Banks are inconsistent about separators: `-12.34`, `-12,34`, `1,234.56`
/// and `1.234,56` all occur in the wild. When both separators are present the
/// rightmost one is taken as the decimal point; a lone comma is treated as a
/// decimal comma.
pub fn parse_amount(s: &str) -> Result<Decimal, AmountError> {
    let compact: String = s.trim().replace(' ', "");
    if compact.is_empty() {
        return Err(AmountError::NotANumber(s.to_string()));
    }

    let comma = compact.rfind(',');
    let dot = compact.rfind('.');
    let normalized = match (comma, dot) {
        (Some(c), Some(d)) if c > d => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(_), None) => compact.replace(',', "."),
        _ => compact,
    };

    Decimal::from_str(&normalized).map_err(|_| AmountError::NotANumber(s.to_string()))
}

/// Convert a decimal currency amount to signed integer minor units
/// (thousandths of the major unit).
///
/// Rounds half to even (banker's rounding, the `rust_decimal` default).
/// The minor-unit value feeds the import fingerprint, so the rounding mode
/// must never change.
pub fn to_minor_units(amount: Decimal) -> Result<i64, AmountError> {
    (amount * Decimal::from(1000))
        .round()
        .to_i64()
        .ok_or(AmountError::OutOfRange(amount))
}
