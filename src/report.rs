//! Analysis report types
//!
//! The analyzer's output: overall consistency plus one ordered finding list
//! per defect category. The presentation layer owns all formatting and
//! coloring; this crate only produces the structured data.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Defect categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    VoidModel,
    Dead,
    FalseOptional,
    ConditionallyDead,
    FullMandatory,
    Redundant,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 6] = [
        AnomalyKind::VoidModel,
        AnomalyKind::Dead,
        AnomalyKind::FalseOptional,
        AnomalyKind::ConditionallyDead,
        AnomalyKind::FullMandatory,
        AnomalyKind::Redundant,
    ];
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AnomalyKind::VoidModel => "void feature model",
            AnomalyKind::Dead => "dead feature",
            AnomalyKind::FalseOptional => "false optional feature",
            AnomalyKind::ConditionallyDead => "conditionally dead feature",
            AnomalyKind::FullMandatory => "full mandatory feature",
            AnomalyKind::Redundant => "redundant constraint",
        };
        write!(f, "{}", s)
    }
}

/// One detected defect: a subject plus its numbered diagnosis explanations
///
/// The subject is a feature name, a constraint rule string (redundancy), or
/// the synthetic `"void feature model"`. Explanations are deduplicated and
/// numbered in discovery order, e.g.
/// `Diagnosis 1: [excludes(A, B)]`. Redundant-constraint findings carry no
/// explanations; the subject itself names the entailed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnomalyFinding {
    pub subject: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub explanations: Vec<String>,
}

impl AnomalyFinding {
    pub fn new(subject: impl Into<String>, explanations: Vec<String>) -> Self {
        Self {
            subject: subject.into(),
            explanations,
        }
    }
}

/// The complete result of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisReport {
    /// Overall consistency: false means the model is void
    pub consistent: bool,

    /// Fingerprint of the analyzed model, for matching reports to inputs
    pub model_fingerprint: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub void_model: Vec<AnomalyFinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dead: Vec<AnomalyFinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub false_optional: Vec<AnomalyFinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditionally_dead: Vec<AnomalyFinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub full_mandatory: Vec<AnomalyFinding>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redundant: Vec<AnomalyFinding>,
}

impl AnalysisReport {
    pub fn new(model_fingerprint: impl Into<String>) -> Self {
        Self {
            consistent: true,
            model_fingerprint: model_fingerprint.into(),
            void_model: Vec::new(),
            dead: Vec::new(),
            false_optional: Vec::new(),
            conditionally_dead: Vec::new(),
            full_mandatory: Vec::new(),
            redundant: Vec::new(),
        }
    }

    pub fn findings(&self, kind: AnomalyKind) -> &[AnomalyFinding] {
        match kind {
            AnomalyKind::VoidModel => &self.void_model,
            AnomalyKind::Dead => &self.dead,
            AnomalyKind::FalseOptional => &self.false_optional,
            AnomalyKind::ConditionallyDead => &self.conditionally_dead,
            AnomalyKind::FullMandatory => &self.full_mandatory,
            AnomalyKind::Redundant => &self.redundant,
        }
    }

    pub fn push(&mut self, kind: AnomalyKind, finding: AnomalyFinding) {
        let list = match kind {
            AnomalyKind::VoidModel => &mut self.void_model,
            AnomalyKind::Dead => &mut self.dead,
            AnomalyKind::FalseOptional => &mut self.false_optional,
            AnomalyKind::ConditionallyDead => &mut self.conditionally_dead,
            AnomalyKind::FullMandatory => &mut self.full_mandatory,
            AnomalyKind::Redundant => &mut self.redundant,
        };
        list.push(finding);
    }

    pub fn count(&self, kind: AnomalyKind) -> usize {
        self.findings(kind).len()
    }

    /// True when no category holds any finding
    pub fn is_clean(&self) -> bool {
        AnomalyKind::ALL.iter().all(|&k| self.count(k) == 0)
    }

    /// Subjects of one category, in discovery order
    pub fn subjects(&self, kind: AnomalyKind) -> Vec<&str> {
        self.findings(kind)
            .iter()
            .map(|f| f.subject.as_str())
            .collect()
    }
}
