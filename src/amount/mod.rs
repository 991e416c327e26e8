//! Amount normalization and reconciliation target arithmetic

pub mod normalizer;

pub use normalizer::*;

use crate::types::*;

/// Compute the search target for a desired cleared balance
///
/// The target is the amount the newly cleared transactions must add up to:
/// the desired balance in milliunits minus the balance that is already
/// cleared.
pub fn compute_target(
    desired_balance: &RawAmount,
    cleared_balance: Milliunits,
) -> ReconcileResult<Milliunits> {
    let desired = to_milliunits(desired_balance)?;
    desired.checked_sub(cleared_balance).ok_or_else(|| {
        ReconcileError::AmountOverflow(format!(
            "target {} - {} is out of range",
            desired, cleared_balance
        ))
    })
}

/// Sum milliunit amounts, refusing to wrap
pub fn checked_total<'a>(
    amounts: impl IntoIterator<Item = &'a Milliunits>,
) -> ReconcileResult<Milliunits> {
    amounts
        .into_iter()
        .try_fold(Milliunits::ZERO, |acc, amount| acc.checked_add(*amount))
        .ok_or_else(|| ReconcileError::AmountOverflow("sum of amounts is out of range".to_string()))
}
