//! Conversion of ledger amounts into integer milliunits

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::types::*;

/// Milliunits per whole currency unit (three implied decimal digits)
pub const MILLIUNITS_PER_UNIT: i64 = 1000;

/// Whole-unit digits that always fit in an `i64` once scaled by 1000
const MAX_INTEGER_DIGITS: i128 = 16;

/// Convert a raw ledger amount into milliunits
///
/// Rounds half away from zero at the third decimal place.
pub fn to_milliunits(amount: &RawAmount) -> ReconcileResult<Milliunits> {
    match amount {
        RawAmount::Number(value) => {
            if !value.is_finite() {
                return Err(ReconcileError::InvalidAmount(format!(
                    "{} is not a finite number",
                    value
                )));
            }
            // Display gives the shortest string that round-trips, so 0.1 stays 0.1
            parse_decimal(&value.to_string())
        }
        RawAmount::Text(text) => parse_decimal(text),
        RawAmount::Decimal(value) => decimal_to_milliunits(value),
    }
}

/// Convert an exact decimal into milliunits
pub fn decimal_to_milliunits(value: &BigDecimal) -> ReconcileResult<Milliunits> {
    if value.is_zero() {
        return Ok(Milliunits::ZERO);
    }

    // Exponents span the whole i64 range, so the digit count needs i128
    let (_, scale) = value.as_bigint_and_exponent();
    let integer_digits = i128::from(value.digits()) - i128::from(scale);

    // Anything below 0.0005 in magnitude rounds to zero
    if integer_digits < -3 {
        return Ok(Milliunits::ZERO);
    }
    if integer_digits > MAX_INTEGER_DIGITS + 1 {
        return Err(ReconcileError::AmountOverflow(format!(
            "{} does not fit in 64-bit milliunits",
            value
        )));
    }

    let scaled = value * BigDecimal::from(MILLIUNITS_PER_UNIT);
    scaled
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .map(Milliunits)
        .ok_or_else(|| {
            ReconcileError::AmountOverflow(format!("{} does not fit in 64-bit milliunits", value))
        })
}

fn parse_decimal(text: &str) -> ReconcileResult<Milliunits> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ReconcileError::InvalidAmount(
            "amount cannot be empty".to_string(),
        ));
    }

    let value = BigDecimal::from_str(trimmed).map_err(|_| {
        ReconcileError::InvalidAmount(format!("{:?} is not a decimal number", trimmed))
    })?;
    decimal_to_milliunits(&value)
}

/// Normalize every transaction amount, failing on the first bad one
///
/// Output has the same length and order as the input.
pub fn normalize(transactions: &[Transaction]) -> ReconcileResult<Vec<AmountEntry>> {
    transactions
        .iter()
        .map(|txn| {
            let amount = to_milliunits(&txn.amount).map_err(|e| with_transaction_id(&txn.id, e))?;
            Ok(AmountEntry {
                id: txn.id.clone(),
                amount,
            })
        })
        .collect()
}

/// A transaction whose amount could not be normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedAmount {
    pub id: String,
    pub error: ReconcileError,
}

/// Result of a drop-and-continue normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Successfully converted amounts, in input order
    pub entries: Vec<AmountEntry>,
    /// Transactions left out, in input order
    pub rejected: Vec<RejectedAmount>,
}

impl Normalization {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Normalize every transaction amount, setting aside the ones that fail
pub fn normalize_lenient(transactions: &[Transaction]) -> Normalization {
    let mut normalization = Normalization::default();

    for txn in transactions {
        match to_milliunits(&txn.amount) {
            Ok(amount) => normalization.entries.push(AmountEntry {
                id: txn.id.clone(),
                amount,
            }),
            Err(error) => {
                tracing::warn!(
                    transaction = %txn.id,
                    amount = %txn.amount,
                    %error,
                    "Skipping transaction with unusable amount"
                );
                normalization.rejected.push(RejectedAmount {
                    id: txn.id.clone(),
                    error,
                });
            }
        }
    }

    normalization
}

fn with_transaction_id(id: &str, error: ReconcileError) -> ReconcileError {
    match error {
        ReconcileError::InvalidAmount(msg) => {
            ReconcileError::InvalidAmount(format!("transaction '{}': {}", id, msg))
        }
        ReconcileError::AmountOverflow(msg) => {
            ReconcileError::AmountOverflow(format!("transaction '{}': {}", id, msg))
        }
        other => other,
    }
}
