//! Core types and data structures for the reconciliation assistant

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Clearing state of a ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearedStatus {
    /// Entered in the ledger but not yet seen on a bank statement
    Uncleared,
    /// Seen on a bank statement
    Cleared,
    /// Locked in by a completed reconciliation
    Reconciled,
}

impl ClearedStatus {
    /// Whether the transaction counts towards the cleared balance
    pub fn counts_as_cleared(&self) -> bool {
        matches!(self, ClearedStatus::Cleared | ClearedStatus::Reconciled)
    }
}

/// Transaction amount as handed over by the ledger
///
/// Ledgers export amounts either as JSON numbers or as decimal strings, so
/// both load transparently. `Decimal` is for callers that already hold an
/// exact value.
///
/// `Decimal` serializes as its decimal string and therefore loads back as
/// `Text`. The variant changes but the amount does not: both normalize to the
/// same milliunits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    Number(f64),
    Text(String),
    Decimal(BigDecimal),
}

impl From<f64> for RawAmount {
    fn from(value: f64) -> Self {
        RawAmount::Number(value)
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        RawAmount::Text(value.to_string())
    }
}

impl From<String> for RawAmount {
    fn from(value: String) -> Self {
        RawAmount::Text(value)
    }
}

impl From<BigDecimal> for RawAmount {
    fn from(value: BigDecimal) -> Self {
        RawAmount::Decimal(value)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawAmount::Number(value) => write!(f, "{}", value),
            RawAmount::Text(value) => write!(f, "{:?}", value),
            RawAmount::Decimal(value) => write!(f, "{}", value),
        }
    }
}

/// Signed amount in thousandths of the ledger currency unit
///
/// `1.234` units is `Milliunits(1234)`. The ledger stores every balance in
/// this fixed-point form, so the scale is not negotiable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Milliunits(pub i64);

impl Milliunits {
    pub const ZERO: Milliunits = Milliunits(0);

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Milliunits) -> Option<Milliunits> {
        self.0.checked_add(other.0).map(Milliunits)
    }

    pub fn checked_sub(self, other: Milliunits) -> Option<Milliunits> {
        self.0.checked_sub(other.0).map(Milliunits)
    }
}

impl From<i64> for Milliunits {
    fn from(value: i64) -> Self {
        Milliunits(value)
    }
}

impl fmt::Display for Milliunits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger transaction as seen by the reconciliation assistant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier within an account
    pub id: String,
    /// Date the transaction was entered for
    pub date: NaiveDate,
    /// Optional payee, only carried through for display
    #[serde(default)]
    pub payee: Option<String>,
    /// Amount in the ledger currency (outflows are negative)
    pub amount: RawAmount,
    /// Clearing state
    pub cleared: ClearedStatus,
    /// Deleted transactions stay in the ledger as tombstones
    #[serde(default)]
    pub is_tombstone: bool,
}

impl Transaction {
    /// Create a new live transaction
    pub fn new(
        id: String,
        date: NaiveDate,
        amount: impl Into<RawAmount>,
        cleared: ClearedStatus,
    ) -> Self {
        Self {
            id,
            date,
            payee: None,
            amount: amount.into(),
            cleared,
            is_tombstone: false,
        }
    }

    /// Create a new transaction with a random UUID identifier
    pub fn with_generated_id(
        date: NaiveDate,
        amount: impl Into<RawAmount>,
        cleared: ClearedStatus,
    ) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), date, amount, cleared)
    }

    pub fn with_payee(mut self, payee: impl Into<String>) -> Self {
        self.payee = Some(payee.into());
        self
    }

    pub fn tombstoned(mut self) -> Self {
        self.is_tombstone = true;
        self
    }

    /// Uncleared and not deleted
    pub fn is_uncleared_live(&self) -> bool {
        self.cleared == ClearedStatus::Uncleared && !self.is_tombstone
    }
}

/// Transaction identifier paired with its normalized amount
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AmountEntry {
    pub id: String,
    pub amount: Milliunits,
}

impl AmountEntry {
    pub fn new(id: impl Into<String>, amount: impl Into<Milliunits>) -> Self {
        Self {
            id: id.into(),
            amount: amount.into(),
        }
    }
}

/// A set of transactions whose amounts add up exactly to the target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    /// Identifiers in input order, no duplicates
    pub transaction_ids: Vec<String>,
    /// Sum of the included amounts (always equal to the searched target)
    pub total: Milliunits,
}

impl MatchCandidate {
    pub fn len(&self) -> usize {
        self.transaction_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transaction_ids.is_empty()
    }

    pub fn contains(&self, transaction_id: &str) -> bool {
        self.transaction_ids.iter().any(|id| id == transaction_id)
    }
}

/// Why the search stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Every branch was explored or pruned
    Exhausted,
    /// The requested number of matches was found
    LimitReached,
    /// The work budget ran out first
    BudgetExhausted,
    /// The caller cancelled the search
    Cancelled,
}

/// Outcome of one subset search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matches in discovery order
    pub candidates: Vec<MatchCandidate>,
    /// True when the search did not run to completion; more matches may exist
    pub partial: bool,
    pub stop_reason: StopReason,
    /// Number of search-tree nodes visited
    pub nodes_visited: u64,
}

impl SearchResult {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn first(&self) -> Option<&MatchCandidate> {
        self.candidates.first()
    }

    /// Candidates ordered by the number of transactions they touch
    ///
    /// Stable, so equally sized candidates keep their discovery order.
    pub fn smallest_first(&self) -> Vec<&MatchCandidate> {
        let mut ordered: Vec<&MatchCandidate> = self.candidates.iter().collect();
        ordered.sort_by_key(|candidate| candidate.len());
        ordered
    }
}

/// Errors that can occur while preparing or running a reconciliation search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ReconcileError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Duplicate transaction id: {0}")]
    DuplicateId(String),
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),
    #[error("Invalid search options: {0}")]
    InvalidOptions(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Account not found: {0}")]
    AccountNotFound(String),
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Transaction is not eligible for clearing: {0}")]
    IneligibleTransaction(String),
    #[error("Ledger source error: {0}")]
    Source(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for reconciliation operations
pub type ReconcileResult<T> = Result<T, ReconcileError>;
