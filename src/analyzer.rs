//! Anomaly analysis — the defect probes
//!
//! Drives the diagnosis engine through every defect class. Each probe
//! follows the same transactional lifecycle:
//!
//! ```text
//! idle → perturbed → solved → (diagnosed if infeasible) → restored → idle
//! ```
//!
//! The store holds exactly `AC` at every probe boundary. Restoration is not
//! manual bookkeeping: every perturbation lives inside a
//! [`ProbeScope`](crate::diagnosis::ProbeScope), which resets the baseline
//! on all exit paths.
//!
//! Probes run strictly sequentially over one shared store (single-threaded
//! by design; the underlying solve is the only blocking operation and
//! honors the configured cancellation flag).

use crate::config::AnalysisConfig;
use crate::diagnosis::{
    all_diagnoses, fast_diag, ConsistencyChecker, ConstraintId, ConstraintStore, Diagnosis,
};
use crate::error::{Error, Result};
use crate::model::{AnomalyType, FeatureModel};
use crate::report::{AnalysisReport, AnomalyFinding, AnomalyKind};
use tracing::{debug, warn};

/// Analyze a feature model with the default configuration
pub fn analyze(model: &mut FeatureModel) -> Result<AnalysisReport> {
    Analyzer::new().analyze(model)
}

/// Feature-model analyzer
///
/// Builds the constraint store once per model, then runs the probes:
/// void model, dead features, conditionally-dead features, full-mandatory
/// features, false-optional features, redundant constraints — in that
/// order, since later probes consume the dead-feature tags of earlier ones.
pub struct Analyzer {
    config: AnalysisConfig,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self {
            config: AnalysisConfig::default(),
        }
    }

    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run every probe and assemble the report.
    ///
    /// Build and lookup errors are fatal and propagate immediately; an
    /// enumeration cap is recovered per probe (the finding keeps its seed
    /// diagnosis); cancellation aborts the run with [`Error::Cancelled`].
    pub fn analyze(&self, model: &mut FeatureModel) -> Result<AnalysisReport> {
        let mut store = ConstraintStore::build(model)?;
        let checker = ConsistencyChecker::new(&self.config);
        let mut report = AnalysisReport::new(model.fingerprint());

        debug!("void-model probe");
        let ac = store.ac();
        let consistent = checker.is_consistent(&mut store, &ac)?;
        report.consistent = consistent;
        if !consistent {
            let explanations = self.explain(&checker, &mut store)?;
            report.push(
                AnomalyKind::VoidModel,
                AnomalyFinding::new("void feature model", explanations),
            );
            // A void model has no meaningful per-feature anomalies.
            return Ok(report);
        }

        self.probe_dead(&checker, &mut store, model, &mut report)?;
        self.probe_conditionally_dead(&checker, &mut store, model, &mut report)?;
        self.probe_full_mandatory(&checker, &mut store, model, &mut report)?;
        self.probe_false_optional(&checker, &mut store, model, &mut report)?;
        self.probe_redundant(&checker, &mut store, model, &mut report)?;

        debug_assert!(store.at_baseline());
        Ok(report)
    }

    /// Dead feature: `f` can never be selected
    fn probe_dead(
        &self,
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
        model: &mut FeatureModel,
        report: &mut AnalysisReport,
    ) -> Result<()> {
        for name in non_root_features(model) {
            debug!(feature = %name, "dead-feature probe");
            let mut scope = store.scope();
            scope.assume(&name, true)?;
            let posted = scope.posted().to_vec();
            if !checker.is_consistent(&mut scope, &posted)? {
                model.tag_anomaly(&name, AnomalyType::Dead);
                let explanations = self.explain(checker, &mut scope)?;
                report.push(AnomalyKind::Dead, AnomalyFinding::new(name.clone(), explanations));
            }
        }
        Ok(())
    }

    /// Conditionally dead: optional `f` cannot be selected together with
    /// some other live feature
    fn probe_conditionally_dead(
        &self,
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
        model: &mut FeatureModel,
        report: &mut AnalysisReport,
    ) -> Result<()> {
        let names = non_root_features(model);
        for fi in &names {
            if model.has_anomaly(fi, AnomalyType::Dead) || !model.is_optional_feature(fi) {
                continue;
            }
            for fj in &names {
                if fj == fi || model.has_anomaly(fj, AnomalyType::Dead) {
                    continue;
                }
                debug!(feature = %fi, with = %fj, "conditionally-dead probe");
                let mut scope = store.scope();
                scope.assume(fi, true)?;
                scope.assume(fj, true)?;
                let posted = scope.posted().to_vec();
                if !checker.is_consistent(&mut scope, &posted)? {
                    model.tag_anomaly(fi, AnomalyType::ConditionallyDead);
                    let explanations = self.explain(checker, &mut scope)?;
                    report.push(
                        AnomalyKind::ConditionallyDead,
                        AnomalyFinding::new(fi.clone(), explanations),
                    );
                    // One witness pairing is enough; further partners can
                    // only repeat the same explanations.
                    break;
                }
            }
        }
        Ok(())
    }

    /// Full mandatory: `f` is effectively selected in every configuration
    fn probe_full_mandatory(
        &self,
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
        model: &mut FeatureModel,
        report: &mut AnalysisReport,
    ) -> Result<()> {
        for name in non_root_features(model) {
            debug!(feature = %name, "full-mandatory probe");
            let mut scope = store.scope();
            scope.assume(&name, false)?;
            let posted = scope.posted().to_vec();
            if !checker.is_consistent(&mut scope, &posted)? {
                model.tag_anomaly(&name, AnomalyType::FullMandatory);
                let explanations = self.explain(checker, &mut scope)?;
                report.push(
                    AnomalyKind::FullMandatory,
                    AnomalyFinding::new(name.clone(), explanations),
                );
            }
        }
        Ok(())
    }

    /// False optional: structurally optional `f` forced by a requires
    /// constraint from a mandatory feature.
    ///
    /// Policy: only the first mandatory requiring parent is probed — any
    /// one mandatory parent already proves the anomaly, so further parents
    /// are short-circuited.
    fn probe_false_optional(
        &self,
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
        model: &mut FeatureModel,
        report: &mut AnalysisReport,
    ) -> Result<()> {
        for name in non_root_features(model) {
            if !model.is_optional_feature(&name) {
                continue;
            }
            let parent = model
                .requiring_parents(&name)
                .into_iter()
                .find(|p| model.is_mandatory_feature(p))
                .map(str::to_string);
            let Some(parent) = parent else {
                continue;
            };

            debug!(feature = %name, parent = %parent, "false-optional probe");
            let mut scope = store.scope();
            scope.assume(&name, false)?;
            scope.assume(&parent, true)?;
            let posted = scope.posted().to_vec();
            if !checker.is_consistent(&mut scope, &posted)? {
                model.tag_anomaly(&name, AnomalyType::FalseOptional);
                let explanations = self.explain(checker, &mut scope)?;
                report.push(
                    AnomalyKind::FalseOptional,
                    AnomalyFinding::new(name.clone(), explanations),
                );
            }
        }
        Ok(())
    }

    /// Redundant constraint: a cross-tree constraint entailed by the rest
    /// of the model.
    ///
    /// The only probe that mutates the `AC` baseline itself: it swaps the
    /// constraint for its negation and asks the oracle; the scope reposts
    /// the original before the next constraint either way.
    fn probe_redundant(
        &self,
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
        model: &mut FeatureModel,
        report: &mut AnalysisReport,
    ) -> Result<()> {
        let crosses: Vec<_> = model.constraints().to_vec();
        for (index, cstr) in crosses.iter().enumerate() {
            debug!(rule = %cstr.rule(), "redundancy probe");
            let mut scope = store.scope();
            let group = scope.cross_group(index).to_vec();
            for &id in &group {
                scope.unpost(id);
            }
            scope.post_negation_of(cstr)?;
            let posted = scope.posted().to_vec();
            if !checker.is_consistent(&mut scope, &posted)? {
                report.push(
                    AnomalyKind::Redundant,
                    AnomalyFinding::new(cstr.rule(), Vec::new()),
                );
            }
        }
        Ok(())
    }

    /// Diagnose the current (perturbed, infeasible) store state and render
    /// the explanation strings.
    ///
    /// Candidates are `CF` and the background is the full posted set
    /// (baseline plus perturbation), both in reverse declaration order —
    /// the documented deterministic order for diagnosis discovery.
    fn explain(
        &self,
        checker: &ConsistencyChecker,
        store: &mut ConstraintStore,
    ) -> Result<Vec<String>> {
        let candidates: Vec<ConstraintId> = store.cf().iter().rev().copied().collect();
        let background: Vec<ConstraintId> = store.posted().iter().rev().copied().collect();

        let first = fast_diag(checker, store, &candidates, &background)?;
        if first.is_empty() {
            return Ok(Vec::new());
        }

        let diagnoses = match all_diagnoses(
            checker,
            store,
            first.clone(),
            &candidates,
            &background,
            &self.config,
        ) {
            Ok(all) => all,
            Err(Error::DiagnosisLimit { limit }) => {
                warn!(limit, "enumeration capped, keeping the seed diagnosis");
                vec![first]
            }
            Err(other) => return Err(other),
        };

        Ok(render_explanations(store, &diagnoses))
    }
}

/// Feature names in declaration order, root excluded
fn non_root_features(model: &FeatureModel) -> Vec<String> {
    model
        .features()
        .iter()
        .skip(1)
        .map(|f| f.name().to_string())
        .collect()
}

/// Render diagnoses as deduplicated, numbered explanation strings:
/// `Diagnosis 1: [excludes(A, B)]`
fn render_explanations(store: &ConstraintStore, diagnoses: &[Diagnosis]) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for diagnosis in diagnoses {
        let rules: Vec<&str> = diagnosis.iter().map(|&id| store.rule_of(id)).collect();
        let rendered = format!("[{}]", rules.join(","));
        if !unique.contains(&rendered) {
            unique.push(rendered);
        }
    }
    unique
        .into_iter()
        .enumerate()
        .map(|(i, d)| format!("Diagnosis {}: {}", i + 1, d))
        .collect()
}
