//! FastDiag — one inclusion-minimal diagnosis
//!
//! Divide-and-conquer diagnosis over an ordered candidate sequence:
//!
//! ```text
//! fastDiag(C, AC):
//!   if C = ∅ or consistent(AC ∪ C) or inconsistent(AC \ C): return ∅
//!   return fd(∅, C, AC)
//!
//! fd(D, C, AC):
//!   if D ≠ ∅ and consistent(AC): return ∅
//!   if |C| = 1: return C
//!   k = |C| / 2;  C1 = C[..k];  C2 = C[k..]
//!   D1 = fd(C1, C2, AC \ C1)
//!   D2 = fd(D1, C1, AC \ D1)
//!   return D1 ∪ D2
//! ```
//!
//! The candidate order is the caller's and decides *which* minimal
//! diagnosis is found first when several exist; the analyzer passes `CF`
//! in reverse declaration order (most recently declared first). Costs
//! `O(2·log₂|C| + 1)` oracle calls in the common case, `O(|C|)` worst case.

use crate::diagnosis::checker::ConsistencyChecker;
use crate::diagnosis::store::{ConstraintId, ConstraintStore};
use crate::error::Result;

/// An inclusion-minimal subset of the candidates whose removal restores
/// consistency, in candidate order. Empty when there is nothing to explain.
pub type Diagnosis = Vec<ConstraintId>;

/// Compute one minimal diagnosis for `candidates` against `background`.
///
/// Returns the empty diagnosis when `candidates` is empty, when
/// `background ∪ candidates` is already consistent, or when the defect does
/// not originate in `candidates` (`background \ candidates` is itself
/// inconsistent).
pub fn fast_diag(
    checker: &ConsistencyChecker,
    store: &mut ConstraintStore,
    candidates: &[ConstraintId],
    background: &[ConstraintId],
) -> Result<Diagnosis> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let all = union(background, candidates);
    if checker.is_consistent(store, &all)? {
        return Ok(Vec::new());
    }
    if !checker.is_consistent(store, &subtract(background, candidates))? {
        return Ok(Vec::new());
    }
    fd(checker, store, &[], candidates, background)
}

fn fd(
    checker: &ConsistencyChecker,
    store: &mut ConstraintStore,
    removed: &[ConstraintId],
    candidates: &[ConstraintId],
    background: &[ConstraintId],
) -> Result<Diagnosis> {
    if !removed.is_empty() && checker.is_consistent(store, background)? {
        return Ok(Vec::new());
    }
    if candidates.len() == 1 {
        return Ok(candidates.to_vec());
    }

    let k = candidates.len() / 2;
    let (c1, c2) = candidates.split_at(k);

    let d1 = fd(checker, store, c1, c2, &subtract(background, c1))?;
    let d2 = fd(checker, store, &d1, c1, &subtract(background, &d1))?;
    Ok(union(&d1, &d2))
}

/// Order-preserving set difference
fn subtract(a: &[ConstraintId], b: &[ConstraintId]) -> Vec<ConstraintId> {
    a.iter().filter(|id| !b.contains(id)).copied().collect()
}

/// Order-preserving set union: all of `a`, then the members of `b` not in `a`
fn union(a: &[ConstraintId], b: &[ConstraintId]) -> Vec<ConstraintId> {
    let mut out = a.to_vec();
    for &id in b {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
