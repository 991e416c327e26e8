//! Branch-and-bound subset-sum search
//!
//! Transactions are decided one at a time in input order, the *include*
//! branch before the *exclude* branch. Every node knows the lowest and the
//! highest sum its undecided suffix can still add, so any subtree that can no
//! longer reach the target is cut before it is entered.

use std::collections::HashSet;

use crate::engine::{CancellationToken, SearchOptions};
use crate::types::*;

/// Find subsets of `amounts` whose sum is exactly `target`
pub fn search(
    amounts: &[AmountEntry],
    target: Milliunits,
    options: &SearchOptions,
) -> ReconcileResult<SearchResult> {
    SubsetSearch::new(amounts, target, options)?.run()
}

/// Same as [`search`], polling `token` once per visited node
pub fn search_with_cancellation(
    amounts: &[AmountEntry],
    target: Milliunits,
    options: &SearchOptions,
    token: &CancellationToken,
) -> ReconcileResult<SearchResult> {
    SubsetSearch::new(amounts, target, options)?
        .with_cancellation(token)
        .run()
}

/// Reachable range of the undecided suffix starting at each index
///
/// `lowest[i]` is the sum of the negative amounts in `i..`, `highest[i]` the
/// sum of the positive ones. Both have one extra trailing zero for the leaf.
#[derive(Debug)]
struct SuffixBounds {
    lowest: Vec<i64>,
    highest: Vec<i64>,
}

impl SuffixBounds {
    fn build(amounts: &[AmountEntry]) -> ReconcileResult<Self> {
        let len = amounts.len();
        let mut lowest = vec![0i64; len + 1];
        let mut highest = vec![0i64; len + 1];

        for (index, entry) in amounts.iter().enumerate().rev() {
            let value = entry.amount.value();
            let (low, high) = if value < 0 {
                (lowest[index + 1].checked_add(value), Some(highest[index + 1]))
            } else {
                (Some(lowest[index + 1]), highest[index + 1].checked_add(value))
            };

            match (low, high) {
                (Some(low), Some(high)) => {
                    lowest[index] = low;
                    highest[index] = high;
                }
                _ => {
                    return Err(ReconcileError::AmountOverflow(format!(
                        "running total overflows at transaction '{}'",
                        entry.id
                    )));
                }
            }
        }

        Ok(Self { lowest, highest })
    }

    /// Whether `target` is reachable from a node at `index` with `partial_sum`
    ///
    /// Every partial sum lies within `[lowest[0], highest[0]]`, which were
    /// built with checked arithmetic, so these additions cannot overflow.
    fn admits(&self, index: usize, partial_sum: i64, target: i64) -> bool {
        partial_sum + self.lowest[index] <= target && target <= partial_sum + self.highest[index]
    }
}

/// One configured search over a borrowed amount list
pub struct SubsetSearch<'a> {
    amounts: &'a [AmountEntry],
    target: i64,
    options: &'a SearchOptions,
    cancellation: Option<&'a CancellationToken>,
    bounds: SuffixBounds,
}

impl<'a> SubsetSearch<'a> {
    /// Validate inputs and prepare the search
    ///
    /// Fails before any searching on bad options, duplicate identifiers, or
    /// amounts whose totals cannot be represented.
    pub fn new(
        amounts: &'a [AmountEntry],
        target: Milliunits,
        options: &'a SearchOptions,
    ) -> ReconcileResult<Self> {
        options.validate()?;
        ensure_unique_ids(amounts)?;
        let bounds = SuffixBounds::build(amounts)?;

        Ok(Self {
            amounts,
            target: target.value(),
            options,
            cancellation: None,
            bounds,
        })
    }

    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Run the search to completion, the match limit, the budget, or cancellation
    pub fn run(self) -> ReconcileResult<SearchResult> {
        tracing::debug!(
            transactions = self.amounts.len(),
            target = self.target,
            limit = self.options.limit,
            work_budget = ?self.options.work_budget,
            "Starting subset search"
        );

        if self.amounts.is_empty() {
            let mut candidates = Vec::new();
            if self.options.allow_empty_match && self.target == 0 {
                candidates.push(MatchCandidate {
                    transaction_ids: Vec::new(),
                    total: Milliunits::ZERO,
                });
            }
            return Ok(SearchResult {
                candidates,
                partial: false,
                stop_reason: StopReason::Exhausted,
                nodes_visited: 0,
            });
        }

        let mut walker = Walker {
            search: &self,
            included: Vec::with_capacity(self.amounts.len()),
            candidates: Vec::new(),
            nodes_visited: 0,
            stopped: None,
        };
        walker.walk();

        let stop_reason = walker.stopped.unwrap_or(StopReason::Exhausted);
        let partial = matches!(
            stop_reason,
            StopReason::BudgetExhausted | StopReason::Cancelled
        );

        if partial {
            tracing::warn!(
                reason = ?stop_reason,
                nodes = walker.nodes_visited,
                found = walker.candidates.len(),
                "Subset search stopped early, result is partial"
            );
        } else {
            tracing::debug!(
                reason = ?stop_reason,
                nodes = walker.nodes_visited,
                found = walker.candidates.len(),
                "Subset search complete"
            );
        }

        Ok(SearchResult {
            candidates: walker.candidates,
            partial,
            stop_reason,
            nodes_visited: walker.nodes_visited,
        })
    }
}

/// Pending work on the explicit traversal stack
#[derive(Debug, Clone, Copy)]
enum Frame {
    /// Visit the node deciding `index` with the sum of the path so far
    Enter { index: usize, partial_sum: i64 },
    /// The include subtree of `index` is done, take the exclude branch
    Exclude { index: usize, partial_sum: i64 },
}

/// Mutable depth-first traversal state
///
/// The walk keeps its own stack so depth is bounded by memory, not by the
/// thread's call stack.
struct Walker<'s, 'a> {
    search: &'s SubsetSearch<'a>,
    /// Indices on the include side of the current path
    included: Vec<usize>,
    candidates: Vec<MatchCandidate>,
    nodes_visited: u64,
    stopped: Option<StopReason>,
}

impl Walker<'_, '_> {
    fn walk(&mut self) {
        let search = self.search;
        let mut frames = Vec::with_capacity(2 * search.amounts.len() + 1);
        frames.push(Frame::Enter {
            index: 0,
            partial_sum: 0,
        });

        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter { index, partial_sum } => {
                    if !self.enter_node() {
                        return;
                    }
                    if !search.bounds.admits(index, partial_sum, search.target) {
                        continue;
                    }

                    if index == search.amounts.len() {
                        // Bounds are zero at the leaf, so admission means an exact hit
                        self.emit(partial_sum);
                        if self.stopped.is_some() {
                            return;
                        }
                        continue;
                    }

                    // Popped in reverse: the include branch runs first
                    frames.push(Frame::Exclude { index, partial_sum });
                    self.included.push(index);
                    frames.push(Frame::Enter {
                        index: index + 1,
                        partial_sum: partial_sum + search.amounts[index].amount.value(),
                    });
                }
                Frame::Exclude { index, partial_sum } => {
                    self.included.pop();
                    frames.push(Frame::Enter {
                        index: index + 1,
                        partial_sum,
                    });
                }
            }
        }
    }

    /// Charge one node against the budget, or record why the walk must stop
    fn enter_node(&mut self) -> bool {
        if self.stopped.is_some() {
            return false;
        }
        if self
            .search
            .cancellation
            .is_some_and(|token| token.is_cancelled())
        {
            self.stopped = Some(StopReason::Cancelled);
            return false;
        }
        if let Some(budget) = self.search.options.work_budget {
            if self.nodes_visited >= budget {
                self.stopped = Some(StopReason::BudgetExhausted);
                return false;
            }
        }
        self.nodes_visited += 1;
        true
    }

    fn emit(&mut self, total: i64) {
        if self.included.is_empty() && !self.search.options.allow_empty_match {
            return;
        }

        let transaction_ids = self
            .included
            .iter()
            .map(|&index| self.search.amounts[index].id.clone())
            .collect();
        self.candidates.push(MatchCandidate {
            transaction_ids,
            total: Milliunits(total),
        });

        if self.candidates.len() >= self.search.options.limit {
            self.stopped = Some(StopReason::LimitReached);
        }
    }
}

/// Reject amount lists that name the same transaction twice
pub fn ensure_unique_ids(amounts: &[AmountEntry]) -> ReconcileResult<()> {
    let mut seen = HashSet::with_capacity(amounts.len());
    for entry in amounts {
        if !seen.insert(entry.id.as_str()) {
            return Err(ReconcileError::DuplicateId(entry.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(amounts: &[i64]) -> Vec<AmountEntry> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, &amount)| AmountEntry::new(format!("t{}", i), amount))
            .collect()
    }

    fn ids(result: &SearchResult) -> Vec<Vec<&str>> {
        result
            .candidates
            .iter()
            .map(|c| c.transaction_ids.iter().map(String::as_str).collect())
            .collect()
    }

    fn unbounded(limit: usize) -> SearchOptions {
        SearchOptions::new(limit).unbounded()
    }

    #[test]
    fn test_finds_all_matches_in_input_order() {
        let amounts = entries(&[500, -200, 300, 1000]);
        let result = search(&amounts, Milliunits(800), &unbounded(10)).unwrap();

        assert_eq!(ids(&result), vec![vec!["t0", "t2"], vec!["t1", "t3"]]);
        assert!(!result.partial);
        assert_eq!(result.stop_reason, StopReason::Exhausted);
        for candidate in &result.candidates {
            assert_eq!(candidate.total, Milliunits(800));
        }
    }

    #[test]
    fn test_limit_returns_first_match() {
        let amounts = entries(&[500, -200, 300, 1000]);
        let result = search(&amounts, Milliunits(800), &unbounded(1)).unwrap();

        assert_eq!(ids(&result), vec![vec!["t0", "t2"]]);
        assert!(!result.partial);
        assert_eq!(result.stop_reason, StopReason::LimitReached);
    }

    #[test]
    fn test_identical_amounts_are_distinct_matches() {
        let amounts = entries(&[100, 100, 100]);
        let result = search(&amounts, Milliunits(200), &unbounded(10)).unwrap();

        assert_eq!(
            ids(&result),
            vec![vec!["t0", "t1"], vec!["t0", "t2"], vec!["t1", "t2"]]
        );
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<AmountEntry> = Vec::new();

        let allowed = unbounded(5).allow_empty_match(true);
        let result = search(&empty, Milliunits::ZERO, &allowed).unwrap();
        assert_eq!(result.len(), 1);
        assert!(result.candidates[0].is_empty());

        let result = search(&empty, Milliunits::ZERO, &unbounded(5)).unwrap();
        assert!(result.is_empty());

        let result = search(&empty, Milliunits(10), &allowed).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.nodes_visited, 0);
    }

    #[test]
    fn test_zero_target_with_items() {
        let amounts = entries(&[100, -100, 50]);

        let result = search(&amounts, Milliunits::ZERO, &unbounded(10)).unwrap();
        assert_eq!(ids(&result), vec![vec!["t0", "t1"]]);

        let allowed = unbounded(10).allow_empty_match(true);
        let result = search(&amounts, Milliunits::ZERO, &allowed).unwrap();
        assert_eq!(ids(&result), vec![vec!["t0", "t1"], vec![]]);
    }

    #[test]
    fn test_unreachable_target_is_pruned_at_root() {
        let amounts = entries(&[100, 200, 300]);
        let result = search(&amounts, Milliunits(10_000), &unbounded(10)).unwrap();

        assert!(result.is_empty());
        assert_eq!(result.nodes_visited, 1);
    }

    #[test]
    fn test_work_budget_caps_visits() {
        let amounts = entries(&(1..=40).map(|i| i * 7).collect::<Vec<_>>());
        let options = SearchOptions::new(10).with_work_budget(10);
        let result = search(&amounts, Milliunits(7 * 300), &options).unwrap();

        assert!(result.partial);
        assert_eq!(result.stop_reason, StopReason::BudgetExhausted);
        assert!(result.nodes_visited <= 10);
    }

    #[test]
    fn test_budget_keeps_matches_found_before_it_ran_out() {
        // The only match is found on the first path; excluding t0 is tried last
        let amounts = entries(&[100, 1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let full = search(&amounts, Milliunits(100), &unbounded(10)).unwrap();
        assert_eq!(ids(&full), vec![vec!["t0"]]);
        assert_eq!(full.stop_reason, StopReason::Exhausted);

        let options = SearchOptions::new(10).with_work_budget(full.nodes_visited - 1);
        let budgeted = search(&amounts, Milliunits(100), &options).unwrap();
        assert!(budgeted.partial);
        assert_eq!(budgeted.stop_reason, StopReason::BudgetExhausted);
        assert_eq!(budgeted.candidates, full.candidates);
        assert_eq!(budgeted.nodes_visited, full.nodes_visited - 1);
    }

    #[test]
    fn test_long_lists_do_not_exhaust_the_call_stack() {
        let amounts = entries(&[1; 50_000]);

        let result = search(&amounts, Milliunits(50_000), &SearchOptions::new(1)).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.candidates[0].len(), 50_000);
        assert_eq!(result.nodes_visited, 50_001);

        // Last item has to be excluded, so the walk backs out of the full depth once
        let result = search(&amounts, Milliunits(49_999), &SearchOptions::new(1)).unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result.candidates[0].contains("t49999"));
        assert_eq!(result.candidates[0].len(), 49_999);
    }

    #[test]
    fn test_budget_equal_to_tree_is_not_partial() {
        let amounts = entries(&[1, 2]);
        let full = search(&amounts, Milliunits(3), &unbounded(10)).unwrap();

        let options = SearchOptions::new(10).with_work_budget(full.nodes_visited);
        let budgeted = search(&amounts, Milliunits(3), &options).unwrap();
        assert!(!budgeted.partial);
        assert_eq!(budgeted.candidates, full.candidates);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let amounts = vec![AmountEntry::new("a", 1), AmountEntry::new("a", 2)];
        let err = search(&amounts, Milliunits(1), &unbounded(1)).unwrap_err();
        assert_eq!(err, ReconcileError::DuplicateId("a".to_string()));
    }

    #[test]
    fn test_overflow_rejected() {
        let amounts = entries(&[i64::MAX, 1]);
        assert!(matches!(
            search(&amounts, Milliunits(1), &unbounded(1)),
            Err(ReconcileError::AmountOverflow(_))
        ));

        let amounts = entries(&[i64::MIN, -1]);
        assert!(matches!(
            search(&amounts, Milliunits(-1), &unbounded(1)),
            Err(ReconcileError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_extreme_but_representable_amounts() {
        let amounts = entries(&[i64::MAX, i64::MIN]);
        let result = search(&amounts, Milliunits(-1), &unbounded(5)).unwrap();
        assert_eq!(ids(&result), vec![vec!["t0", "t1"]]);
    }

    #[test]
    fn test_cancelled_before_start() {
        let amounts = entries(&[1, 2, 3]);
        let token = CancellationToken::new();
        token.cancel();

        let result =
            search_with_cancellation(&amounts, Milliunits(3), &unbounded(10), &token).unwrap();
        assert!(result.partial);
        assert_eq!(result.stop_reason, StopReason::Cancelled);
        assert_eq!(result.nodes_visited, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_zero_limit_rejected() {
        let amounts = entries(&[1]);
        assert!(matches!(
            search(&amounts, Milliunits(1), &SearchOptions::new(0)),
            Err(ReconcileError::InvalidOptions(_))
        ));
    }
}
