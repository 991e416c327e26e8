//! # Reconcile Core
//!
//! Reconciliation assistant for personal-finance ledgers: given the balance on
//! a bank statement, find which uncleared transactions need to be marked
//! cleared so the account's cleared balance matches it.
//!
//! ## Features
//!
//! - **Amount normalization**: decimal strings and numbers become integer
//!   milliunits, so sums never drift
//! - **Subset search**: pruned, deterministic branch-and-bound with a match
//!   limit, a work budget and cooperative cancellation
//! - **Reconciliation flow**: eligibility filtering, target computation and
//!   applying the chosen match through a [`LedgerSource`]
//! - **Storage abstraction**: ledger-agnostic design with trait-based access
//!
//! ## Quick Start
//!
//! ```rust
//! use reconcile_core::{search, AmountEntry, Milliunits, SearchOptions};
//!
//! let amounts = vec![
//!     AmountEntry::new("a", 500),
//!     AmountEntry::new("b", -200),
//!     AmountEntry::new("c", 300),
//!     AmountEntry::new("d", 1000),
//! ];
//! let result = search(&amounts, Milliunits(800), &SearchOptions::new(1)).unwrap();
//! assert_eq!(result.candidates[0].transaction_ids, vec!["a", "c"]);
//! ```

pub mod amount;
pub mod config;
pub mod engine;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use amount::*;
pub use config::SearchConfig;
pub use engine::*;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
