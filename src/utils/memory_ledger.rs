//! In-memory ledger source for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::amount::{checked_total, to_milliunits};
use crate::traits::*;
use crate::types::*;
use crate::utils::validate_transaction_id;

#[derive(Debug, Clone, Default)]
struct AccountBook {
    /// Cleared balance carried over from before the first transaction held here
    opening_cleared: Milliunits,
    transactions: Vec<Transaction>,
}

/// In-memory ledger implementation for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    accounts: Arc<RwLock<HashMap<String, AccountBook>>>,
}

impl MemoryLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account with an opening cleared balance
    pub fn open_account(
        &self,
        account_id: &str,
        opening_cleared: Milliunits,
    ) -> ReconcileResult<()> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        accounts.insert(
            account_id.to_string(),
            AccountBook {
                opening_cleared,
                transactions: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append a transaction to an open account
    pub fn add_transaction(
        &self,
        account_id: &str,
        transaction: Transaction,
    ) -> ReconcileResult<()> {
        validate_transaction_id(&transaction.id)?;

        let mut accounts = self.accounts.write().map_err(poisoned)?;
        let book = accounts
            .get_mut(account_id)
            .ok_or_else(|| ReconcileError::AccountNotFound(account_id.to_string()))?;

        if book.transactions.iter().any(|t| t.id == transaction.id) {
            return Err(ReconcileError::DuplicateId(transaction.id));
        }
        book.transactions.push(transaction);
        Ok(())
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> ReconcileResult<()> {
        self.accounts.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

#[async_trait]
impl LedgerSource for MemoryLedger {
    async fn get_transactions(&self, account_id: &str) -> ReconcileResult<Vec<Transaction>> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        accounts
            .get(account_id)
            .map(|book| book.transactions.clone())
            .ok_or_else(|| ReconcileError::AccountNotFound(account_id.to_string()))
    }

    async fn cleared_balance(&self, account_id: &str) -> ReconcileResult<Milliunits> {
        let accounts = self.accounts.read().map_err(poisoned)?;
        let book = accounts
            .get(account_id)
            .ok_or_else(|| ReconcileError::AccountNotFound(account_id.to_string()))?;

        let mut amounts = vec![book.opening_cleared];
        for txn in &book.transactions {
            if txn.is_tombstone || !txn.cleared.counts_as_cleared() {
                continue;
            }
            amounts.push(to_milliunits(&txn.amount)?);
        }
        checked_total(&amounts)
    }

    async fn mark_cleared(
        &mut self,
        account_id: &str,
        transaction_ids: &[String],
    ) -> ReconcileResult<()> {
        let mut accounts = self.accounts.write().map_err(poisoned)?;
        let book = accounts
            .get_mut(account_id)
            .ok_or_else(|| ReconcileError::AccountNotFound(account_id.to_string()))?;

        // Check everything first so a bad id leaves the account untouched
        for id in transaction_ids {
            if !book.transactions.iter().any(|t| &t.id == id) {
                return Err(ReconcileError::TransactionNotFound(id.clone()));
            }
        }

        for txn in book.transactions.iter_mut() {
            if transaction_ids.contains(&txn.id) {
                txn.cleared = ClearedStatus::Cleared;
            }
        }
        Ok(())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> ReconcileError {
    ReconcileError::Source("ledger lock poisoned".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn txn(id: &str, amount: &str, cleared: ClearedStatus) -> Transaction {
        Transaction::new(
            id.to_string(),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            amount,
            cleared,
        )
    }

    #[tokio::test]
    async fn test_cleared_balance_counts_cleared_live_transactions() {
        let ledger = MemoryLedger::new();
        ledger.open_account("checking", Milliunits(10_000)).unwrap();
        ledger
            .add_transaction("checking", txn("a", "5.00", ClearedStatus::Cleared))
            .unwrap();
        ledger
            .add_transaction("checking", txn("b", "-2.50", ClearedStatus::Reconciled))
            .unwrap();
        ledger
            .add_transaction("checking", txn("c", "100", ClearedStatus::Uncleared))
            .unwrap();
        ledger
            .add_transaction(
                "checking",
                txn("d", "7", ClearedStatus::Cleared).tombstoned(),
            )
            .unwrap();

        let balance = ledger.cleared_balance("checking").await.unwrap();
        assert_eq!(balance, Milliunits(12_500));
    }

    #[tokio::test]
    async fn test_mark_cleared() {
        let mut ledger = MemoryLedger::new();
        ledger.open_account("checking", Milliunits::ZERO).unwrap();
        ledger
            .add_transaction("checking", txn("a", "1", ClearedStatus::Uncleared))
            .unwrap();
        ledger
            .add_transaction("checking", txn("b", "2", ClearedStatus::Uncleared))
            .unwrap();

        ledger
            .mark_cleared("checking", &["b".to_string()])
            .await
            .unwrap();
        assert_eq!(
            ledger.cleared_balance("checking").await.unwrap(),
            Milliunits(2000)
        );

        let err = ledger
            .mark_cleared("checking", &["a".to_string(), "zzz".to_string()])
            .await
            .unwrap_err();
        assert_eq!(err, ReconcileError::TransactionNotFound("zzz".to_string()));

        // Nothing changed on failure
        let transactions = ledger.get_transactions("checking").await.unwrap();
        assert_eq!(transactions[0].cleared, ClearedStatus::Uncleared);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let ledger = MemoryLedger::new();
        assert!(matches!(
            ledger.get_transactions("nope").await,
            Err(ReconcileError::AccountNotFound(_))
        ));
        assert!(matches!(
            ledger.add_transaction("nope", txn("a", "1", ClearedStatus::Uncleared)),
            Err(ReconcileError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_blank_transaction_id_rejected() {
        let ledger = MemoryLedger::new();
        ledger.open_account("checking", Milliunits::ZERO).unwrap();
        assert!(matches!(
            ledger.add_transaction("checking", txn(" ", "1", ClearedStatus::Uncleared)),
            Err(ReconcileError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_transaction_rejected() {
        let ledger = MemoryLedger::new();
        ledger.open_account("checking", Milliunits::ZERO).unwrap();
        ledger
            .add_transaction("checking", txn("a", "1", ClearedStatus::Uncleared))
            .unwrap();
        assert_eq!(
            ledger.add_transaction("checking", txn("a", "2", ClearedStatus::Uncleared)),
            Err(ReconcileError::DuplicateId("a".to_string()))
        );
    }
}
