//! Traits for ledger access and eligibility rules

use async_trait::async_trait;

use crate::types::*;

/// Read/write access to the ledger the reconciliation runs against
///
/// This keeps the assistant independent of where transactions live (a web
/// application, a database, in-memory) by implementing these methods.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// All transactions of an account, including cleared and deleted ones
    async fn get_transactions(&self, account_id: &str) -> ReconcileResult<Vec<Transaction>>;

    /// Current cleared balance of an account
    async fn cleared_balance(&self, account_id: &str) -> ReconcileResult<Milliunits>;

    /// Mark the given transactions as cleared
    async fn mark_cleared(
        &mut self,
        account_id: &str,
        transaction_ids: &[String],
    ) -> ReconcileResult<()>;
}

/// Decides which transactions may take part in a search
pub trait EligibilityRule: Send + Sync {
    fn is_eligible(&self, transaction: &Transaction) -> bool;
}

/// Uncleared transactions that have not been deleted
pub struct DefaultEligibilityRule;

impl EligibilityRule for DefaultEligibilityRule {
    fn is_eligible(&self, transaction: &Transaction) -> bool {
        transaction.is_uncleared_live()
    }
}

/// Eligible only if at least this far from zero, on top of the default rule
///
/// Useful to keep pending card authorizations of a few cents out of the
/// candidates.
pub struct MinimumAmountRule {
    pub minimum: Milliunits,
}

impl EligibilityRule for MinimumAmountRule {
    fn is_eligible(&self, transaction: &Transaction) -> bool {
        if !DefaultEligibilityRule.is_eligible(transaction) {
            return false;
        }
        // Unparseable amounts pass through; normalization reports them
        match crate::amount::to_milliunits(&transaction.amount) {
            Ok(amount) => amount.value().unsigned_abs() >= self.minimum.value().unsigned_abs(),
            Err(_) => true,
        }
    }
}
