// Production-quality lints
#![warn(
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
// Deny truly dangerous patterns
#![deny(clippy::mem_forget)]
// Allow common patterns in library code
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! # fmdiag — Feature-Model Anomaly Analysis
//!
//! Analyzes a feature model — a tree of boolean features joined by
//! structural relationships plus cross-tree constraints — for logical
//! defects, and explains every defect with *minimal diagnoses*: minimal
//! subsets of the model's constraints whose removal eliminates the defect.
//!
//! ## Defect classes
//!
//! - **Void model** — the model has no valid configuration at all
//! - **Dead feature** — a feature that can never be selected
//! - **False optional** — structurally optional but effectively forced
//! - **Conditionally dead** — unselectable together with some other feature
//! - **Full mandatory** — effectively selected in every configuration
//! - **Redundant constraint** — entailed by the rest of the model
//!
//! ## Quick Start
//!
//! ```rust
//! use fmdiag::{analyze, AnomalyKind, FeatureModel, RelationshipType};
//!
//! # fn main() -> fmdiag::Result<()> {
//! let mut fm = FeatureModel::new();
//! fm.add_features(&["Root", "A", "B"])?;
//! fm.add_relationship(RelationshipType::Mandatory, "Root", &["A"]);
//! fm.add_relationship(RelationshipType::Optional, "B", &["Root"]);
//! fm.add_constraint(RelationshipType::Excludes, "A", &["B"]);
//!
//! let report = analyze(&mut fm)?;
//! assert!(report.consistent);
//! assert_eq!(report.subjects(AnomalyKind::Dead), vec!["B"]);
//! // => explanations like "Diagnosis 1: [excludes(A, B)]"
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                                                             │
//! │  FeatureModel                                               │
//! │       │                                                     │
//! │       └──► ConstraintStore (build once: CF, AC baselines)   │
//! │                 │                                           │
//! │   Analyzer probes: perturb ──► ConsistencyChecker           │
//! │                 │                  │ (infeasible)           │
//! │                 │                  ▼                        │
//! │                 │         FastDiag ──► all_diagnoses        │
//! │                 │                  │                        │
//! │                 ◄── restore ◄── explanations                │
//! │                                                             │
//! │  AnalysisReport (per-category findings)                     │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store is built once per model and restored to its `AC` baseline at
//! every probe boundary. How the model was parsed and how reports are
//! rendered are out of scope: parsers build a [`FeatureModel`]
//! programmatically, and the presentation layer consumes the
//! serializable [`AnalysisReport`].

// Core modules
pub mod config;
pub mod error;
pub mod model;
pub mod report;

// The diagnosis engine
pub mod diagnosis;
pub mod sat;

// The probe orchestrator
pub mod analyzer;

// Re-exports
pub use analyzer::{analyze, Analyzer};
pub use config::{AnalysisConfig, CancelFlag};
pub use diagnosis::{
    all_diagnoses, fast_diag, ConsistencyChecker, Constraint, ConstraintId, ConstraintStore,
    Diagnosis, ProbeScope,
};
pub use error::{Error, Result};
pub use model::{AnomalyType, Feature, FeatureModel, Relationship, RelationshipType};
pub use report::{AnalysisReport, AnomalyFinding, AnomalyKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
