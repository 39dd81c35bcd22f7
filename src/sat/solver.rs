//! DPLL SAT solver over CNF
//!
//! Algorithm:
//!
//! 1. **Unit propagation**: a clause with all but one literal false forces
//!    the remaining literal.
//! 2. **Decision**: pick the first unassigned variable of an unsatisfied
//!    clause and try both values.
//! 3. **Backtracking**: plain chronological backtracking; no clause
//!    learning, no watched literals.
//!
//! Every decision consumes one unit of the caller's budget; an exhausted
//! budget or an observed cancellation flag aborts the search with an error,
//! which the consistency oracle maps to its fail-safe policy.

use crate::config::CancelFlag;
use thiserror::Error;

/// A boolean decision variable (0-indexed)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Var(pub u32);

impl Var {
    #[inline]
    pub fn new(idx: u32) -> Self {
        Var(idx)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A literal: a variable or its negation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Lit(u32);

impl Lit {
    /// Positive literal
    #[inline]
    pub fn pos(var: Var) -> Self {
        Lit(var.0 << 1)
    }

    /// Negative literal
    #[inline]
    pub fn neg(var: Var) -> Self {
        Lit((var.0 << 1) | 1)
    }

    /// Literal from variable and sign (true = positive)
    #[inline]
    pub fn new(var: Var, sign: bool) -> Self {
        if sign {
            Self::pos(var)
        } else {
            Self::neg(var)
        }
    }

    #[inline]
    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    #[inline]
    pub fn is_pos(self) -> bool {
        (self.0 & 1) == 0
    }

    /// The negation of this literal
    #[inline]
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Lit(self.0 ^ 1)
    }
}

/// A disjunction of literals
pub type Clause = Vec<Lit>;

/// Solver-level failures, distinct from an UNSAT answer
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    /// The decision budget ran out before the search finished
    #[error("solver decision budget exhausted")]
    BudgetExhausted,

    /// The caller's cancellation flag was observed
    #[error("solve cancelled")]
    Cancelled,
}

/// A DPLL solver instance for a fixed set of clauses
///
/// Built fresh for every solve call by the consistency oracle; all mutable
/// search state lives on the stack of [`Solver::solve`].
#[derive(Debug, Clone)]
pub struct Solver {
    num_vars: usize,
    clauses: Vec<Clause>,
}

impl Solver {
    pub fn new(num_vars: usize) -> Self {
        Self {
            num_vars,
            clauses: Vec::new(),
        }
    }

    pub fn add_clause(&mut self, clause: Clause) {
        debug_assert!(clause.iter().all(|l| l.var().index() < self.num_vars));
        self.clauses.push(clause);
    }

    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// Decide satisfiability. Returns `Ok(true)` iff a satisfying
    /// assignment exists within the decision budget.
    pub fn solve(&self, budget: u64, cancel: &CancelFlag) -> Result<bool, SolverError> {
        let mut assignment: Vec<Option<bool>> = vec![None; self.num_vars];
        let mut budget = budget;
        self.search(&mut assignment, &mut budget, cancel)
    }

    fn search(
        &self,
        assignment: &mut Vec<Option<bool>>,
        budget: &mut u64,
        cancel: &CancelFlag,
    ) -> Result<bool, SolverError> {
        if cancel.is_cancelled() {
            return Err(SolverError::Cancelled);
        }

        // Unit propagation to fixpoint
        loop {
            let mut changed = false;
            for clause in &self.clauses {
                let mut satisfied = false;
                let mut unassigned = 0usize;
                let mut unit = None;
                for &lit in clause {
                    match assignment[lit.var().index()] {
                        Some(value) if value == lit.is_pos() => {
                            satisfied = true;
                            break;
                        }
                        Some(_) => {}
                        None => {
                            unassigned += 1;
                            unit = Some(lit);
                        }
                    }
                }
                if satisfied {
                    continue;
                }
                match unassigned {
                    0 => return Ok(false), // conflict
                    1 => {
                        let lit = unit.expect("unit literal present");
                        assignment[lit.var().index()] = Some(lit.is_pos());
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                break;
            }
        }

        // Branch on the first unassigned variable of an unsatisfied clause;
        // if every clause is satisfied the formula is satisfiable.
        let branch = self.pick_branch_var(assignment);
        let Some(var) = branch else {
            return Ok(true);
        };

        if *budget == 0 {
            return Err(SolverError::BudgetExhausted);
        }
        *budget -= 1;

        for value in [true, false] {
            let mut trial = assignment.clone();
            trial[var.index()] = Some(value);
            if self.search(&mut trial, budget, cancel)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn pick_branch_var(&self, assignment: &[Option<bool>]) -> Option<Var> {
        for clause in &self.clauses {
            let satisfied = clause
                .iter()
                .any(|l| assignment[l.var().index()] == Some(l.is_pos()));
            if satisfied {
                continue;
            }
            for &lit in clause {
                if assignment[lit.var().index()].is_none() {
                    return Some(lit.var());
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(solver: &Solver) -> bool {
        solver.solve(u64::MAX, &CancelFlag::new()).unwrap()
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let solver = Solver::new(0);
        assert!(solve(&solver));
    }

    #[test]
    fn test_unit_clauses() {
        let mut solver = Solver::new(2);
        solver.add_clause(vec![Lit::pos(Var(0))]);
        solver.add_clause(vec![Lit::neg(Var(1))]);
        assert!(solve(&solver));
    }

    #[test]
    fn test_contradiction_is_unsat() {
        let mut solver = Solver::new(1);
        solver.add_clause(vec![Lit::pos(Var(0))]);
        solver.add_clause(vec![Lit::neg(Var(0))]);
        assert!(!solve(&solver));
    }

    #[test]
    fn test_propagation_chain() {
        // a, a -> b, b -> c, !c  is unsat through pure propagation
        let mut solver = Solver::new(3);
        solver.add_clause(vec![Lit::pos(Var(0))]);
        solver.add_clause(vec![Lit::neg(Var(0)), Lit::pos(Var(1))]);
        solver.add_clause(vec![Lit::neg(Var(1)), Lit::pos(Var(2))]);
        solver.add_clause(vec![Lit::neg(Var(2))]);
        assert!(!solve(&solver));
    }

    #[test]
    fn test_branching_required() {
        // (a | b) & (!a | b) & (a | !b) is sat with a = b = true
        let mut solver = Solver::new(2);
        solver.add_clause(vec![Lit::pos(Var(0)), Lit::pos(Var(1))]);
        solver.add_clause(vec![Lit::neg(Var(0)), Lit::pos(Var(1))]);
        solver.add_clause(vec![Lit::pos(Var(0)), Lit::neg(Var(1))]);
        assert!(solve(&solver));
    }

    #[test]
    fn test_all_binary_combinations_unsat() {
        let mut solver = Solver::new(2);
        solver.add_clause(vec![Lit::pos(Var(0)), Lit::pos(Var(1))]);
        solver.add_clause(vec![Lit::neg(Var(0)), Lit::pos(Var(1))]);
        solver.add_clause(vec![Lit::pos(Var(0)), Lit::neg(Var(1))]);
        solver.add_clause(vec![Lit::neg(Var(0)), Lit::neg(Var(1))]);
        assert!(!solve(&solver));
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut solver = Solver::new(2);
        solver.add_clause(vec![Lit::pos(Var(0)), Lit::pos(Var(1))]);
        solver.add_clause(vec![Lit::neg(Var(0)), Lit::pos(Var(1))]);
        assert_eq!(
            solver.solve(0, &CancelFlag::new()),
            Err(SolverError::BudgetExhausted)
        );
    }

    #[test]
    fn test_cancellation() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut solver = Solver::new(1);
        solver.add_clause(vec![Lit::pos(Var(0))]);
        assert_eq!(solver.solve(u64::MAX, &cancel), Err(SolverError::Cancelled));
    }

    #[test]
    fn test_lit_negation() {
        let lit = Lit::pos(Var(3));
        assert!(lit.is_pos());
        assert!(!lit.not().is_pos());
        assert_eq!(lit.not().not(), lit);
        assert_eq!(lit.var(), Var(3));
    }
}
