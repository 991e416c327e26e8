//! Search configuration

use serde::{Deserialize, Serialize};

use crate::engine::{SearchOptions, DEFAULT_MATCH_LIMIT, DEFAULT_WORK_BUDGET};
use crate::types::*;

pub const ENV_MATCH_LIMIT: &str = "RECONCILE_MATCH_LIMIT";
pub const ENV_WORK_BUDGET: &str = "RECONCILE_WORK_BUDGET";
pub const ENV_ALLOW_EMPTY_MATCH: &str = "RECONCILE_ALLOW_EMPTY_MATCH";

/// Reconciliation assistant configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of matches offered to the user
    pub match_limit: usize,
    /// Maximum search-tree nodes per search; `None` for no cap
    pub work_budget: Option<u64>,
    /// Offer "clear nothing" when the balance already matches
    pub allow_empty_match: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            match_limit: DEFAULT_MATCH_LIMIT,
            work_budget: Some(DEFAULT_WORK_BUDGET),
            allow_empty_match: false,
        }
    }
}

impl SearchConfig {
    /// Load configuration from environment variables
    ///
    /// Missing or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let match_limit = lookup(ENV_MATCH_LIMIT)
            .and_then(|raw| parse_or_warn(ENV_MATCH_LIMIT, &raw))
            .unwrap_or(defaults.match_limit);

        let work_budget = match lookup(ENV_WORK_BUDGET) {
            Some(raw) if is_unlimited(&raw) => None,
            Some(raw) => parse_or_warn(ENV_WORK_BUDGET, &raw).or(defaults.work_budget),
            None => defaults.work_budget,
        };

        let allow_empty_match = lookup(ENV_ALLOW_EMPTY_MATCH)
            .and_then(|raw| parse_flag(&raw))
            .unwrap_or(defaults.allow_empty_match);

        Self {
            match_limit,
            work_budget,
            allow_empty_match,
        }
    }

    pub fn validate(&self) -> ReconcileResult<()> {
        if self.match_limit == 0 {
            return Err(ReconcileError::Config(
                "match_limit must be at least 1".to_string(),
            ));
        }
        if self.work_budget == Some(0) {
            return Err(ReconcileError::Config(
                "work_budget must be positive, or unset for no cap".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_options(&self) -> SearchOptions {
        SearchOptions {
            limit: self.match_limit,
            work_budget: self.work_budget,
            allow_empty_match: self.allow_empty_match,
        }
    }
}

fn is_unlimited(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "none" | "unlimited" | "off"
    )
}

fn parse_or_warn<T: std::str::FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = raw, "Ignoring unparsable configuration value");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(
                key = ENV_ALLOW_EMPTY_MATCH,
                value = raw,
                "Ignoring unparsable configuration value"
            );
            None
        }
    }
}
