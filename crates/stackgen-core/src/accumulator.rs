//! Result accumulator: the single collector for branch outcomes.
//!
//! Contributions are appended, never overwritten. Combining two
//! accumulators is associative and, ignoring physical order, commutative,
//! so the final content does not depend on which branch finished first.

use std::collections::HashSet;

use tokio::sync::mpsc;

use crate::dispatch::BranchId;
use crate::error::AccumulatorError;
use crate::task::BranchResult;

/// What a branch hands to the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchOutcome {
    pub branch: BranchId,
    pub result: BranchResult,
}

/// Append-only collection of branch results, at most one per branch.
#[derive(Debug, Default, Clone)]
pub struct ResultAccumulator {
    seen: HashSet<BranchId>,
    results: Vec<BranchResult>,
}

impl ResultAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one branch's result.
    ///
    /// A second contribution from the same branch is rejected and the
    /// first one is kept.
    pub fn contribute(&mut self, outcome: BranchOutcome) -> Result<(), AccumulatorError> {
        if !self.seen.insert(outcome.branch) {
            return Err(AccumulatorError::DuplicateContribution(outcome.branch));
        }
        self.results.push(outcome.result);
        Ok(())
    }

    /// Combine two accumulators built from disjoint branch sets.
    pub fn merge(mut self, other: Self) -> Result<Self, AccumulatorError> {
        if let Some(dup) = self.seen.intersection(&other.seen).min() {
            return Err(AccumulatorError::DuplicateContribution(*dup));
        }
        self.seen.extend(other.seen);
        self.results.extend(other.results);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results(&self) -> &[BranchResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<BranchResult> {
        self.results
    }

    /// Drain `rx` until every sender is gone, then check that exactly
    /// `expected` branches reported.
    ///
    /// Outcomes are accepted in whatever order they arrive. Duplicates are
    /// logged and discarded.
    pub async fn collect(
        mut rx: mpsc::Receiver<BranchOutcome>,
        expected: usize,
    ) -> Result<Vec<BranchResult>, AccumulatorError> {
        let mut acc = Self::new();
        while let Some(outcome) = rx.recv().await {
            if let Err(e) = acc.contribute(outcome) {
                tracing::error!(error = %e, "discarding duplicate branch outcome");
            }
        }

        if acc.len() != expected {
            return Err(AccumulatorError::Incomplete {
                expected,
                collected: acc.len(),
            });
        }
        Ok(acc.into_results())
    }
}
