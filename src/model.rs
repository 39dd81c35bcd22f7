//! Feature-model types — the core input data model
//!
//! A `FeatureModel` is a tree of boolean features joined by structural
//! relationships (mandatory/optional/or/alternative) plus cross-tree
//! constraints (requires/excludes). The first feature added is the root.
//!
//! How a model is parsed is out of scope here: format parsers build a
//! `FeatureModel` programmatically through [`FeatureModel::add_feature`],
//! [`FeatureModel::add_relationship`] and [`FeatureModel::add_constraint`],
//! then hand it to [`crate::analyze`].

use crate::error::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Relationship and cross-tree constraint types
///
/// Structural relationships use the first four variants; cross-tree
/// constraints use `Requires` and `Excludes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipType {
    /// Child selected iff parent selected: `mandatory(parent, child)`
    Mandatory,
    /// Child may be selected only if parent selected: `optional(child, parent)`
    Optional,
    /// At least one child selected iff parent selected: `or(parent, c1..cn)`
    Or,
    /// Exactly one child selected iff parent selected: `alternative(parent, c1..cn)`
    Alternative,
    /// Left selected implies right selected: `requires(left, right)`
    Requires,
    /// Left and right cannot both be selected: `excludes(left, right)`
    Excludes,
}

impl std::fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelationshipType::Mandatory => "mandatory",
            RelationshipType::Optional => "optional",
            RelationshipType::Or => "or",
            RelationshipType::Alternative => "alternative",
            RelationshipType::Requires => "requires",
            RelationshipType::Excludes => "excludes",
        };
        write!(f, "{}", s)
    }
}

/// Anomaly classes a feature can be tagged with during analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    Dead,
    FalseOptional,
    ConditionallyDead,
    FullMandatory,
}

/// A feature of a feature model
///
/// Identified by its name, which is unique within the model and stable for
/// the model's lifetime. Anomaly tags are attached by the analyzer and
/// consumed by downstream renderers (and by the conditionally-dead probe,
/// which skips dead features).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Feature {
    name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    anomalies: Vec<AnomalyType>,
}

impl Feature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            anomalies: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tag the feature with a discovered anomaly type
    pub fn tag_anomaly(&mut self, anomaly: AnomalyType) {
        if !self.anomalies.contains(&anomaly) {
            self.anomalies.push(anomaly);
        }
    }

    pub fn has_anomaly(&self, anomaly: AnomalyType) -> bool {
        self.anomalies.contains(&anomaly)
    }

    pub fn anomalies(&self) -> &[AnomalyType] {
        &self.anomalies
    }
}

/// A structural relationship or cross-tree constraint
///
/// `left` and `right` hold feature names. For `mandatory`, `or` and
/// `alternative` the left side is the parent; for `optional` the left side
/// is the child and the right side its parent; `requires`/`excludes` are
/// directional left→right.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    #[serde(rename = "type")]
    rtype: RelationshipType,
    left: String,
    right: Vec<String>,

    /// Descriptions of the solver constraints derived from this relationship,
    /// attached at store-build time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    constraints: Vec<String>,
}

impl Relationship {
    pub fn new(rtype: RelationshipType, left: impl Into<String>, right: Vec<String>) -> Self {
        Self {
            rtype,
            left: left.into(),
            right,
            constraints: Vec::new(),
        }
    }

    pub fn rtype(&self) -> RelationshipType {
        self.rtype
    }

    pub fn is_type(&self, rtype: RelationshipType) -> bool {
        self.rtype == rtype
    }

    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> &[String] {
        &self.right
    }

    pub fn belongs_to_left(&self, name: &str) -> bool {
        self.left == name
    }

    pub fn belongs_to_right(&self, name: &str) -> bool {
        self.right.iter().any(|r| r == name)
    }

    /// The rule identifier used in diagnosis explanations,
    /// e.g. `requires(Root, A)` or `alternative(P, C1,C2)`
    pub fn rule(&self) -> String {
        match self.rtype {
            RelationshipType::Or | RelationshipType::Alternative => {
                format!("{}({}, {})", self.rtype, self.left, self.right.join(","))
            }
            _ => format!(
                "{}({}, {})",
                self.rtype,
                self.left,
                self.right.first().map(String::as_str).unwrap_or("")
            ),
        }
    }

    /// Human-readable implication forms of the relationship,
    /// e.g. `A <-> B` for mandatory or `A -> XOR(B,C)` for alternative
    pub fn text_rules(&self) -> Vec<String> {
        let mut rules = Vec::new();
        match self.rtype {
            RelationshipType::Mandatory => {
                rules.push(format!("{} <-> {}", self.left, self.right[0]));
            }
            RelationshipType::Optional | RelationshipType::Requires => {
                rules.push(format!("{} -> {}", self.left, self.right[0]));
            }
            RelationshipType::Alternative => {
                rules.push(format!("{} -> XOR({})", self.left, self.right.join(",")));
                for right in &self.right {
                    rules.push(format!("{} -> {}", right, self.left));
                }
            }
            RelationshipType::Or => {
                rules.push(format!("{} -> OR({})", self.left, self.right.join(",")));
                for right in &self.right {
                    rules.push(format!("{} -> {}", right, self.left));
                }
            }
            RelationshipType::Excludes => {
                rules.push(format!("not({}) or not({})", self.left, self.right[0]));
            }
        }
        rules
    }

    /// Attach the description of a derived solver constraint back onto the
    /// relationship. Called by the constraint store during build.
    pub fn attach_constraint(&mut self, description: impl Into<String>) {
        self.constraints.push(description.into());
    }

    pub fn attached_constraints(&self) -> &[String] {
        &self.constraints
    }
}

/// A feature model: ordered features, structural relationships and
/// cross-tree constraints
///
/// The first feature added is the root. Feature order is the declaration
/// order, which also fixes the solver variable order and thereby the
/// deterministic diagnosis order documented in [`crate::diagnosis`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct FeatureModel {
    #[serde(default)]
    features: Vec<Feature>,

    #[serde(default)]
    relationships: Vec<Relationship>,

    #[serde(default)]
    constraints: Vec<Relationship>,
}

impl FeatureModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a feature. Names must be unique and non-empty.
    pub fn add_feature(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::Other("feature name must not be empty".into()));
        }
        if self.feature(name).is_some() {
            return Err(Error::DuplicateFeature(name.to_string()));
        }
        self.features.push(Feature::new(name));
        Ok(())
    }

    pub fn add_features(&mut self, names: &[&str]) -> Result<()> {
        for name in names {
            self.add_feature(name)?;
        }
        Ok(())
    }

    /// Add a structural relationship (mandatory/optional/or/alternative)
    pub fn add_relationship(&mut self, rtype: RelationshipType, left: &str, right: &[&str]) {
        let right = right.iter().map(|s| s.to_string()).collect();
        self.relationships.push(Relationship::new(rtype, left, right));
    }

    /// Add a cross-tree constraint (requires/excludes)
    pub fn add_constraint(&mut self, rtype: RelationshipType, left: &str, right: &[&str]) {
        let right = right.iter().map(|s| s.to_string()).collect();
        self.constraints.push(Relationship::new(rtype, left, right));
    }

    /// The root feature: the first one declared
    pub fn root(&self) -> Result<&Feature> {
        self.features.first().ok_or(Error::EmptyModel)
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.name() == name)
    }

    pub fn feature_mut(&mut self, name: &str) -> Option<&mut Feature> {
        self.features.iter_mut().find(|f| f.name() == name)
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationships_mut(&mut self) -> &mut [Relationship] {
        &mut self.relationships
    }

    pub fn constraints(&self) -> &[Relationship] {
        &self.constraints
    }

    pub fn constraints_mut(&mut self) -> &mut [Relationship] {
        &mut self.constraints
    }

    /// Tag a feature with a discovered anomaly type
    pub fn tag_anomaly(&mut self, name: &str, anomaly: AnomalyType) {
        if let Some(feature) = self.feature_mut(name) {
            feature.tag_anomaly(anomaly);
        }
    }

    pub fn has_anomaly(&self, name: &str, anomaly: AnomalyType) -> bool {
        self.feature(name)
            .map(|f| f.has_anomaly(anomaly))
            .unwrap_or(false)
    }

    /// A feature is structurally mandatory if it is the child of a
    /// mandatory relationship
    pub fn is_mandatory_feature(&self, name: &str) -> bool {
        self.relationships
            .iter()
            .any(|r| r.is_type(RelationshipType::Mandatory) && r.belongs_to_right(name))
    }

    /// A feature is structurally optional if it is the child of an optional
    /// relationship or a branch of an or/alternative group
    pub fn is_optional_feature(&self, name: &str) -> bool {
        self.relationships.iter().any(|r| match r.rtype() {
            RelationshipType::Optional => r.belongs_to_left(name),
            RelationshipType::Or | RelationshipType::Alternative => r.belongs_to_right(name),
            _ => false,
        })
    }

    /// Left-hand features of `requires` constraints that have `name` on
    /// their right-hand side
    pub fn requiring_parents(&self, name: &str) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|r| r.is_type(RelationshipType::Requires) && r.belongs_to_right(name))
            .map(|r| r.left())
            .collect()
    }

    /// Content fingerprint of the model: features, relationships and
    /// constraints in declaration order. Stable across runs; carried in the
    /// analysis report so consumers can match a report to its model.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for feature in &self.features {
            hasher.update(feature.name().as_bytes());
            hasher.update([0]);
        }
        for rel in self.relationships.iter().chain(self.constraints.iter()) {
            hasher.update(rel.rule().as_bytes());
            hasher.update([0]);
        }
        hex::encode(&hasher.finalize()[..16])
    }
}
