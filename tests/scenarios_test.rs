//! End-to-end analysis scenarios

use fmdiag::{
    analyze, AnalysisConfig, Analyzer, AnomalyKind, AnomalyType, Error, FeatureModel,
    RelationshipType,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Root <-> A, B optional, excludes(A, B): B can never be selected
fn dead_b_model() -> FeatureModel {
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "A", "B"]).unwrap();
    fm.add_relationship(RelationshipType::Mandatory, "Root", &["A"]);
    fm.add_relationship(RelationshipType::Optional, "B", &["Root"]);
    fm.add_constraint(RelationshipType::Excludes, "A", &["B"]);
    fm
}

#[test]
fn scenario_a_unknown_feature_is_a_structural_error() {
    // requires(Root, Ghost) where Ghost does not exist: the build fails
    // before any probe runs, it is not reported as a consistency defect
    let mut fm = FeatureModel::new();
    fm.add_feature("Root").unwrap();
    fm.add_constraint(RelationshipType::Requires, "Root", &["Ghost"]);

    match analyze(&mut fm) {
        Err(Error::UnknownFeature(name)) => assert_eq!(name, "Ghost"),
        other => panic!("expected a structural error, got {:?}", other),
    }
}

#[test]
fn scenario_b_dead_feature() {
    let mut fm = dead_b_model();
    let report = analyze(&mut fm).unwrap();

    assert!(report.consistent);
    assert_eq!(report.subjects(AnomalyKind::Dead), vec!["B"]);
    assert_eq!(
        report.findings(AnomalyKind::Dead)[0].explanations,
        vec![
            "Diagnosis 1: [excludes(A, B)]",
            "Diagnosis 2: [mandatory(Root, A)]",
        ]
    );
    assert!(fm.has_anomaly("B", AnomalyType::Dead));
}

#[test]
fn scenario_c_full_mandatory() {
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "A"]).unwrap();
    fm.add_relationship(RelationshipType::Optional, "A", &["Root"]);
    fm.add_constraint(RelationshipType::Requires, "Root", &["A"]);

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    assert_eq!(report.subjects(AnomalyKind::FullMandatory), vec!["A"]);
    assert_eq!(
        report.findings(AnomalyKind::FullMandatory)[0].explanations,
        vec!["Diagnosis 1: [requires(Root, A)]"]
    );
    assert!(fm.has_anomaly("A", AnomalyType::FullMandatory));
}

#[test]
fn scenario_d_redundant_constraint() {
    // requires(Root, A) is already entailed by mandatory(Root, A)
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "A"]).unwrap();
    fm.add_relationship(RelationshipType::Mandatory, "Root", &["A"]);
    fm.add_constraint(RelationshipType::Requires, "Root", &["A"]);

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    assert_eq!(
        report.subjects(AnomalyKind::Redundant),
        vec!["requires(Root, A)"]
    );
    assert!(report.findings(AnomalyKind::Redundant)[0]
        .explanations
        .is_empty());
}

#[test]
fn scenario_e_clean_model() {
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "A", "B"]).unwrap();
    fm.add_relationship(RelationshipType::Optional, "A", &["Root"]);
    fm.add_relationship(RelationshipType::Optional, "B", &["Root"]);

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    assert!(report.is_clean());
}

#[test]
fn void_model_is_diagnosed_and_stops_the_run() {
    // Root <-> A together with excludes(Root, A) admits no configuration
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "A"]).unwrap();
    fm.add_relationship(RelationshipType::Mandatory, "Root", &["A"]);
    fm.add_constraint(RelationshipType::Excludes, "Root", &["A"]);

    let report = analyze(&mut fm).unwrap();
    assert!(!report.consistent);
    assert_eq!(
        report.subjects(AnomalyKind::VoidModel),
        vec!["void feature model"]
    );
    assert_eq!(
        report.findings(AnomalyKind::VoidModel)[0].explanations,
        vec![
            "Diagnosis 1: [excludes(Root, A)]",
            "Diagnosis 2: [mandatory(Root, A)]",
        ]
    );
    // No per-feature probes run on a void model
    assert_eq!(report.count(AnomalyKind::Dead), 0);
    assert_eq!(report.count(AnomalyKind::FullMandatory), 0);
}

#[test]
fn false_optional_feature_via_mandatory_requiring_parent() {
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "P", "F"]).unwrap();
    fm.add_relationship(RelationshipType::Mandatory, "Root", &["P"]);
    fm.add_relationship(RelationshipType::Optional, "F", &["Root"]);
    fm.add_constraint(RelationshipType::Requires, "P", &["F"]);

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    assert_eq!(report.subjects(AnomalyKind::FalseOptional), vec!["F"]);
    assert_eq!(
        report.findings(AnomalyKind::FalseOptional)[0].explanations,
        vec!["Diagnosis 1: [requires(P, F)]"]
    );
    assert!(fm.has_anomaly("F", AnomalyType::FalseOptional));
}

#[test]
fn conditionally_dead_features_via_excludes() {
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "A", "B"]).unwrap();
    fm.add_relationship(RelationshipType::Optional, "A", &["Root"]);
    fm.add_relationship(RelationshipType::Optional, "B", &["Root"]);
    fm.add_constraint(RelationshipType::Excludes, "A", &["B"]);

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    // Both optional features are unselectable together with the other
    assert_eq!(
        report.subjects(AnomalyKind::ConditionallyDead),
        vec!["A", "B"]
    );
    for finding in report.findings(AnomalyKind::ConditionallyDead) {
        assert_eq!(
            finding.explanations,
            vec!["Diagnosis 1: [excludes(A, B)]"]
        );
    }
}

#[test]
fn mixed_anomalies_in_a_larger_model() {
    // Root <-> Engine, Engine alternatives Gas/Electric, Nav optional,
    // Nav requires Electric, Gas excludes Nav
    let mut fm = FeatureModel::new();
    fm.add_features(&["Root", "Engine", "Gas", "Electric", "Nav"])
        .unwrap();
    fm.add_relationship(RelationshipType::Mandatory, "Root", &["Engine"]);
    fm.add_relationship(RelationshipType::Alternative, "Engine", &["Gas", "Electric"]);
    fm.add_relationship(RelationshipType::Optional, "Nav", &["Root"]);
    fm.add_constraint(RelationshipType::Requires, "Nav", &["Electric"]);
    fm.add_constraint(RelationshipType::Excludes, "Gas", &["Nav"]);

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    assert_eq!(report.count(AnomalyKind::Dead), 0);
    assert_eq!(report.subjects(AnomalyKind::FullMandatory), vec!["Engine"]);

    // Alternative branches kill each other; Nav dies next to Gas
    assert_eq!(
        report.subjects(AnomalyKind::ConditionallyDead),
        vec!["Gas", "Electric", "Nav"]
    );
    assert!(report.findings(AnomalyKind::ConditionallyDead)[0].explanations[0]
        .contains("alternative(Engine, Gas,Electric)"));

    // Each cross-tree constraint is entailed by the other plus the
    // alternative group
    assert_eq!(
        report.subjects(AnomalyKind::Redundant),
        vec!["requires(Nav, Electric)", "excludes(Gas, Nav)"]
    );
}

#[rstest]
#[case::chain_of_mandatory(&[("Root", "A"), ("A", "B"), ("B", "C")])]
#[case::flat(&[("Root", "A"), ("Root", "B"), ("Root", "C")])]
fn mandatory_trees_are_clean(#[case] edges: &[(&str, &str)]) {
    let mut fm = FeatureModel::new();
    fm.add_feature("Root").unwrap();
    for &(_, child) in edges {
        fm.add_feature(child).unwrap();
    }
    for &(parent, child) in edges {
        fm.add_relationship(RelationshipType::Mandatory, parent, &[child]);
    }

    let report = analyze(&mut fm).unwrap();
    assert!(report.consistent);
    // Mandatory children of a mandatory chain are always selected, which
    // the full-mandatory probe reports; nothing else fires.
    assert_eq!(report.count(AnomalyKind::Dead), 0);
    assert_eq!(report.count(AnomalyKind::ConditionallyDead), 0);
    assert_eq!(report.count(AnomalyKind::FalseOptional), 0);
    assert_eq!(report.count(AnomalyKind::Redundant), 0);
    assert_eq!(report.count(AnomalyKind::FullMandatory), edges.len());
}

#[test]
fn analysis_is_deterministic_across_runs() {
    let mut first = dead_b_model();
    let mut second = dead_b_model();
    let a = analyze(&mut first).unwrap();
    let b = analyze(&mut second).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn capped_enumeration_keeps_the_seed_diagnosis() {
    let config = AnalysisConfig {
        max_diagnoses: 1,
        ..Default::default()
    };
    let mut fm = dead_b_model();
    let report = Analyzer::with_config(config).analyze(&mut fm).unwrap();

    // B has two minimal diagnoses; the cap keeps only the first
    assert_eq!(report.subjects(AnomalyKind::Dead), vec!["B"]);
    assert_eq!(
        report.findings(AnomalyKind::Dead)[0].explanations,
        vec!["Diagnosis 1: [excludes(A, B)]"]
    );
}

#[test]
fn report_serializes_for_the_presentation_layer() {
    let mut fm = dead_b_model();
    let report = analyze(&mut fm).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["consistent"], true);
    assert_eq!(json["dead"][0]["subject"], "B");
    assert!(json["model_fingerprint"].as_str().unwrap().len() >= 32);
}
