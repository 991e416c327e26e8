//! Validation utilities

use crate::types::*;

/// Validate the desired balance the user typed in
///
/// Mirrors what the reconcile dialog accepts: a non-empty decimal number.
pub fn validate_balance_input(input: &str) -> ReconcileResult<RawAmount> {
    if input.trim().is_empty() {
        return Err(ReconcileError::InvalidAmount(
            "desired balance cannot be empty".to_string(),
        ));
    }

    let amount = RawAmount::Text(input.to_string());
    crate::amount::to_milliunits(&amount)?;
    Ok(amount)
}

/// Validate that a transaction ID is usable as a match reference
pub fn validate_transaction_id(transaction_id: &str) -> ReconcileResult<()> {
    if transaction_id.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Transaction ID cannot be empty".to_string(),
        ));
    }

    if transaction_id.len() > 100 {
        return Err(ReconcileError::Validation(
            "Transaction ID cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account ID is valid
pub fn validate_account_id(account_id: &str) -> ReconcileResult<()> {
    if account_id.trim().is_empty() {
        return Err(ReconcileError::Validation(
            "Account ID cannot be empty".to_string(),
        ));
    }
    Ok(())
}
