//! Tuning knobs for a subset search

use serde::{Deserialize, Serialize};

use crate::types::*;

/// Default number of matches returned to the caller
pub const DEFAULT_MATCH_LIMIT: usize = 10;

/// Default number of search-tree nodes a single search may visit
pub const DEFAULT_WORK_BUDGET: u64 = 1_000_000;

/// Limits applied to a single subset search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Stop once this many matches have been found (at least 1)
    pub limit: usize,
    /// Maximum number of nodes to visit; `None` searches the whole tree
    pub work_budget: Option<u64>,
    /// Report "clear nothing" as a match when the target is zero
    pub allow_empty_match: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_MATCH_LIMIT,
            work_budget: Some(DEFAULT_WORK_BUDGET),
            allow_empty_match: false,
        }
    }
}

impl SearchOptions {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_work_budget(mut self, work_budget: u64) -> Self {
        self.work_budget = Some(work_budget);
        self
    }

    /// Remove the work budget entirely
    pub fn unbounded(mut self) -> Self {
        self.work_budget = None;
        self
    }

    pub fn allow_empty_match(mut self, allow: bool) -> Self {
        self.allow_empty_match = allow;
        self
    }

    pub fn validate(&self) -> ReconcileResult<()> {
        if self.limit == 0 {
            return Err(ReconcileError::InvalidOptions(
                "match limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = SearchOptions::default();
        assert_eq!(options.limit, DEFAULT_MATCH_LIMIT);
        assert_eq!(options.work_budget, Some(DEFAULT_WORK_BUDGET));
        assert!(!options.allow_empty_match);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let options = SearchOptions::new(3).with_work_budget(50).allow_empty_match(true);
        assert_eq!(options.limit, 3);
        assert_eq!(options.work_budget, Some(50));
        assert!(options.allow_empty_match);

        assert_eq!(options.unbounded().work_budget, None);
    }

    #[test]
    fn test_zero_limit_rejected() {
        assert!(matches!(
            SearchOptions::new(0).validate(),
            Err(ReconcileError::InvalidOptions(_))
        ));
    }
}
