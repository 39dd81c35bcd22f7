//! All-diagnoses enumeration
//!
//! Breadth-first hitting-set-style expansion over the first diagnosis
//! FastDiag found. Each frontier node holds a diagnosis and the candidate
//! set it was computed from; removing one constraint of the diagnosis from
//! the candidates and re-running FastDiag yields a child diagnosis.
//!
//! A child is accepted only if it is non-empty, not a superset of any
//! accepted diagnosis (minimality), and not value-equal to an accepted
//! diagnosis (deduplication). The worst case is exponential in the number
//! of constraints touching the defect, so both the accepted count and the
//! number of expansion rounds are capped; tripping a cap is an explicit,
//! recoverable [`Error::DiagnosisLimit`].

use crate::config::AnalysisConfig;
use crate::diagnosis::checker::ConsistencyChecker;
use crate::diagnosis::fastdiag::{fast_diag, Diagnosis};
use crate::diagnosis::store::{ConstraintId, ConstraintStore};
use crate::error::{Error, Result};
use tracing::warn;

/// Enumerate every minimal diagnosis reachable from `first`.
///
/// `candidates` and `background` must be the sets `first` was computed
/// from. The returned list starts with `first` and preserves discovery
/// order; no returned diagnosis is a subset of another.
pub fn all_diagnoses(
    checker: &ConsistencyChecker,
    store: &mut ConstraintStore,
    first: Diagnosis,
    candidates: &[ConstraintId],
    background: &[ConstraintId],
    config: &AnalysisConfig,
) -> Result<Vec<Diagnosis>> {
    let mut all = vec![first.clone()];
    let mut frontier = vec![(first, candidates.to_vec())];
    let mut rounds = 0usize;

    while !frontier.is_empty() {
        rounds += 1;
        if rounds > config.max_rounds {
            warn!(
                max_rounds = config.max_rounds,
                accepted = all.len(),
                "diagnosis enumeration exceeded the round cap"
            );
            return Err(Error::DiagnosisLimit {
                limit: config.max_rounds,
            });
        }

        let mut next = Vec::new();
        for (diagnosis, node_candidates) in frontier {
            for &constraint in &diagnosis {
                let child_candidates: Vec<ConstraintId> = node_candidates
                    .iter()
                    .filter(|&&id| id != constraint)
                    .copied()
                    .collect();

                let child = fast_diag(checker, store, &child_candidates, background)?;
                if child.is_empty() || !is_minimal(&child, &all) || all.contains(&child) {
                    continue;
                }

                if all.len() >= config.max_diagnoses {
                    warn!(
                        max_diagnoses = config.max_diagnoses,
                        "diagnosis enumeration exceeded the diagnosis cap"
                    );
                    return Err(Error::DiagnosisLimit {
                        limit: config.max_diagnoses,
                    });
                }
                all.push(child.clone());
                next.push((child, child_candidates));
            }
        }
        frontier = next;
    }

    Ok(all)
}

/// A candidate diagnosis is minimal iff it is not a superset of any
/// already-accepted diagnosis
fn is_minimal(candidate: &Diagnosis, accepted: &[Diagnosis]) -> bool {
    !accepted
        .iter()
        .any(|d| d.iter().all(|id| candidate.contains(id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeatureModel, RelationshipType};

    fn setup(fm: &mut FeatureModel) -> (ConsistencyChecker, ConstraintStore) {
        let store = ConstraintStore::build(fm).unwrap();
        (ConsistencyChecker::new(&AnalysisConfig::default()), store)
    }

    fn dead_b_model() -> FeatureModel {
        let mut fm = FeatureModel::new();
        fm.add_features(&["Root", "A", "B"]).unwrap();
        fm.add_relationship(RelationshipType::Mandatory, "Root", &["A"]);
        fm.add_relationship(RelationshipType::Optional, "B", &["Root"]);
        fm.add_constraint(RelationshipType::Excludes, "A", &["B"]);
        fm
    }

    fn enumerate(
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
        config: &AnalysisConfig,
    ) -> Result<Vec<Diagnosis>> {
        let c: Vec<_> = store.cf().iter().rev().copied().collect();
        let ac: Vec<_> = store.posted().iter().rev().copied().collect();
        let first = fast_diag(checker, store, &c, &ac)?;
        assert!(!first.is_empty());
        all_diagnoses(checker, store, first, &c, &ac, config)
    }

    #[test]
    fn test_finds_both_repairs_for_dead_feature() {
        let mut fm = dead_b_model();
        let (checker, mut store) = setup(&mut fm);
        store.assume("B", true).unwrap();

        let all = enumerate(&checker, &mut store, &AnalysisConfig::default()).unwrap();
        let rules: Vec<Vec<&str>> = all
            .iter()
            .map(|d| d.iter().map(|&id| store.rule_of(id)).collect())
            .collect();
        // B is dead through excludes(A, B) together with mandatory(Root, A);
        // removing either one repairs it
        assert_eq!(
            rules,
            vec![vec!["excludes(A, B)"], vec!["mandatory(Root, A)"]]
        );
        store.reset_to_baseline();
    }

    #[test]
    fn test_no_subset_relation_between_diagnoses() {
        let mut fm = dead_b_model();
        let (checker, mut store) = setup(&mut fm);
        store.assume("B", true).unwrap();

        let all = enumerate(&checker, &mut store, &AnalysisConfig::default()).unwrap();
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert!(!a.iter().all(|id| b.contains(id)), "{:?} dominates {:?}", a, b);
                }
            }
        }
        store.reset_to_baseline();
    }

    #[test]
    fn test_diagnosis_cap_is_explicit_error() {
        let mut fm = dead_b_model();
        let (checker, mut store) = setup(&mut fm);
        store.assume("B", true).unwrap();

        let config = AnalysisConfig {
            max_diagnoses: 1,
            ..Default::default()
        };
        assert!(matches!(
            enumerate(&checker, &mut store, &config),
            Err(Error::DiagnosisLimit { limit: 1 })
        ));
        store.reset_to_baseline();
    }

    #[test]
    fn test_round_cap_is_explicit_error() {
        let mut fm = dead_b_model();
        let (checker, mut store) = setup(&mut fm);
        store.assume("B", true).unwrap();

        let config = AnalysisConfig {
            max_rounds: 1,
            ..Default::default()
        };
        // Round 1 accepts a second diagnosis, so a second round is needed
        // to exhaust the frontier.
        assert!(matches!(
            enumerate(&checker, &mut store, &config),
            Err(Error::DiagnosisLimit { limit: 1 })
        ));
        store.reset_to_baseline();
    }

    #[test]
    fn test_is_minimal() {
        let d = |ids: &[usize]| -> Diagnosis {
            ids.iter().map(|&i| ConstraintId::from_raw(i)).collect()
        };
        let accepted = vec![d(&[0, 1])];
        assert!(is_minimal(&d(&[2]), &accepted));
        assert!(is_minimal(&d(&[0]), &accepted)); // subset is fine
        assert!(!is_minimal(&d(&[0, 1]), &accepted)); // duplicate
        assert!(!is_minimal(&d(&[0, 1, 2]), &accepted)); // superset
    }
}
