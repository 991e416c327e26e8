//! Reconciliation assistant
//!
//! Ties the pieces together the way the reconcile dialog uses them: read the
//! account, keep the transactions that may still be cleared, work out how
//! much they need to add up to, and search for the combinations that do.
//! Once the user picks one, [`ReconciliationEngine::apply_candidate`] marks
//! those transactions cleared.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amount::{compute_target, normalize_lenient};
use crate::config::SearchConfig;
use crate::engine::{search_with_cancellation, CancellationToken, SearchOptions};
use crate::traits::*;
use crate::types::*;
use crate::utils::{validate_account_id, validate_balance_input};

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileRequest {
    pub account_id: String,
    /// Balance shown on the bank statement, as typed
    pub desired_balance: String,
    /// Ignore transactions dated after the statement
    #[serde(default)]
    pub statement_date: Option<NaiveDate>,
}

impl ReconcileRequest {
    pub fn new(account_id: impl Into<String>, desired_balance: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            desired_balance: desired_balance.into(),
            statement_date: None,
        }
    }

    pub fn with_statement_date(mut self, statement_date: NaiveDate) -> Self {
        self.statement_date = Some(statement_date);
        self
    }
}

/// A transaction that was eligible but left out of the search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedTransaction {
    pub id: String,
    pub reason: String,
}

/// Everything the dialog needs to present the matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileAssistance {
    pub account_id: String,
    pub cleared_balance: Milliunits,
    /// Amount the selected transactions must add up to
    pub target: Milliunits,
    /// Transactions that took part in the search
    pub eligible_count: usize,
    /// Eligible transactions dropped because their amount was unusable
    pub skipped: Vec<SkippedTransaction>,
    pub result: SearchResult,
}

impl ReconcileAssistance {
    /// The balance already matches; nothing needs clearing
    pub fn is_balanced(&self) -> bool {
        self.target == Milliunits::ZERO
    }
}

/// Finds which uncleared transactions bring the cleared balance to a target
pub struct ReconciliationEngine {
    options: SearchOptions,
    eligibility: Box<dyn EligibilityRule>,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconciliationEngine {
    pub fn new() -> Self {
        Self {
            options: SearchOptions::default(),
            eligibility: Box::new(DefaultEligibilityRule),
        }
    }

    pub fn with_options(options: SearchOptions) -> Self {
        Self {
            options,
            eligibility: Box::new(DefaultEligibilityRule),
        }
    }

    /// Build an engine from validated configuration
    pub fn from_config(config: &SearchConfig) -> ReconcileResult<Self> {
        config.validate()?;
        Ok(Self::with_options(config.to_options()))
    }

    pub fn with_eligibility(mut self, rule: Box<dyn EligibilityRule>) -> Self {
        self.eligibility = rule;
        self
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    fn is_candidate(&self, txn: &Transaction, statement_date: Option<NaiveDate>) -> bool {
        self.eligibility.is_eligible(txn) && statement_date.is_none_or(|date| txn.date <= date)
    }

    /// Run the assistant over transactions already in hand
    ///
    /// Transactions with unusable amounts are reported in `skipped` and never
    /// appear in a match.
    pub fn plan(
        &self,
        account_id: &str,
        transactions: &[Transaction],
        cleared_balance: Milliunits,
        desired_balance: &RawAmount,
        statement_date: Option<NaiveDate>,
        cancellation: Option<&CancellationToken>,
    ) -> ReconcileResult<ReconcileAssistance> {
        let target = compute_target(desired_balance, cleared_balance)?;

        let eligible: Vec<Transaction> = transactions
            .iter()
            .filter(|txn| self.is_candidate(txn, statement_date))
            .cloned()
            .collect();

        let normalization = normalize_lenient(&eligible);
        let skipped: Vec<SkippedTransaction> = normalization
            .rejected
            .into_iter()
            .map(|rejected| SkippedTransaction {
                id: rejected.id,
                reason: rejected.error.to_string(),
            })
            .collect();

        let token = cancellation.cloned().unwrap_or_default();
        let result =
            search_with_cancellation(&normalization.entries, target, &self.options, &token)?;

        tracing::info!(
            account = account_id,
            target = target.value(),
            eligible = normalization.entries.len(),
            skipped = skipped.len(),
            matches = result.len(),
            partial = result.partial,
            "Reconciliation search finished"
        );

        Ok(ReconcileAssistance {
            account_id: account_id.to_string(),
            cleared_balance,
            target,
            eligible_count: normalization.entries.len(),
            skipped,
            result,
        })
    }

    /// Load the account from `source` and run the assistant
    pub async fn assist<S: LedgerSource + ?Sized>(
        &self,
        source: &S,
        request: &ReconcileRequest,
    ) -> ReconcileResult<ReconcileAssistance> {
        validate_account_id(&request.account_id)?;
        let desired_balance = validate_balance_input(&request.desired_balance)?;

        let transactions = source.get_transactions(&request.account_id).await?;
        let cleared_balance = source.cleared_balance(&request.account_id).await?;

        self.plan(
            &request.account_id,
            &transactions,
            cleared_balance,
            &desired_balance,
            request.statement_date,
            None,
        )
    }

    /// Mark the transactions of a chosen candidate as cleared
    ///
    /// The account is re-read first; every transaction must still exist and
    /// still be eligible, otherwise nothing is changed.
    pub async fn apply_candidate<S: LedgerSource + ?Sized>(
        &self,
        source: &mut S,
        account_id: &str,
        candidate: &MatchCandidate,
    ) -> ReconcileResult<()> {
        let transactions = source.get_transactions(account_id).await?;

        for id in &candidate.transaction_ids {
            let txn = transactions
                .iter()
                .find(|txn| &txn.id == id)
                .ok_or_else(|| ReconcileError::TransactionNotFound(id.clone()))?;
            if !self.eligibility.is_eligible(txn) {
                return Err(ReconcileError::IneligibleTransaction(id.clone()));
            }
        }

        source
            .mark_cleared(account_id, &candidate.transaction_ids)
            .await?;

        tracing::info!(
            account = account_id,
            cleared = candidate.len(),
            total = candidate.total.value(),
            "Applied reconciliation match"
        );
        Ok(())
    }
}
