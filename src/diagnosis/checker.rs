//! Consistency oracle
//!
//! Stateless wrapper around the solver: post a candidate subset, solve
//! once, put the store back exactly as it was. Probes and the diagnosis
//! algorithms never touch the solver directly.

use crate::config::{AnalysisConfig, CancelFlag};
use crate::diagnosis::store::{ConstraintId, ConstraintStore};
use crate::error::{Error, Result};
use crate::sat::SolverError;
use tracing::warn;

/// Transactional consistency checks over arbitrary constraint subsets
///
/// Contract per call: reset the store to empty, post exactly the given
/// subset, invoke one solve, restore the exact prior posted set — no state
/// leaks into the next call, on any path.
///
/// A solver failure (decision budget exhausted) is treated as inconsistent
/// — the fail-safe default — and logged as a distinct solver-failure event,
/// since an engine fault and a genuine logical inconsistency call for
/// different responses downstream. Cancellation instead aborts the run.
#[derive(Debug, Clone)]
pub struct ConsistencyChecker {
    budget: u64,
    cancel: CancelFlag,
}

impl ConsistencyChecker {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            budget: config.solve_budget,
            cancel: config.cancel.clone(),
        }
    }

    /// Is the given constraint subset satisfiable?
    pub fn is_consistent(
        &self,
        store: &mut ConstraintStore,
        subset: &[ConstraintId],
    ) -> Result<bool> {
        let saved: Vec<ConstraintId> = store.posted().to_vec();
        store.replace_posted(subset);
        let outcome = store.solver().solve(self.budget, &self.cancel);
        store.replace_posted(&saved);

        match outcome {
            Ok(sat) => Ok(sat),
            Err(SolverError::Cancelled) => Err(Error::Cancelled),
            Err(SolverError::BudgetExhausted) => {
                warn!(
                    budget = self.budget,
                    subset_len = subset.len(),
                    "solver failure: decision budget exhausted, treating subset as inconsistent"
                );
                Ok(false)
            }
        }
    }
}
