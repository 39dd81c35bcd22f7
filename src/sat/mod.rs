//! Boolean satisfiability backend
//!
//! The consistency oracle reduces every probe to one propositional
//! satisfiability question over the posted constraint set. Feature models
//! are small CNF instances (one variable per feature, a handful of clauses
//! per relationship), so the solver is a compact DPLL with unit propagation
//! rather than a full CDCL engine.

mod solver;

pub use solver::{Clause, Lit, Solver, SolverError, Var};
