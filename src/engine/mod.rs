//! Subset-sum search engine
//!
//! Given normalized amounts and a target, finds which transactions add up to
//! the target exactly. The search is pure and synchronous: it holds no state
//! between calls and can be moved onto a worker thread, with a
//! [`CancellationToken`] to abandon it.

pub mod cancel;
pub mod options;
pub mod search;

pub use cancel::*;
pub use options::*;
pub use search::*;
