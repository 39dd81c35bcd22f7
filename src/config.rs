//! Analysis configuration
//!
//! Bounds for the diagnosis engine. The all-diagnoses enumerator is
//! exponential in the worst case and the underlying solve call can be too,
//! so every run carries explicit caps and a cancellation flag.

use crate::error::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Configuration for one analysis run
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisConfig {
    /// Maximum number of minimal diagnoses collected per defect
    #[serde(default = "default_max_diagnoses")]
    pub max_diagnoses: usize,

    /// Maximum breadth-first expansion rounds in the enumerator
    #[serde(default = "default_max_rounds")]
    pub max_rounds: usize,

    /// Decision budget per solve call; exhausting it is treated as
    /// inconsistent by the oracle (fail-safe) and logged as a solver failure
    #[serde(default = "default_solve_budget")]
    pub solve_budget: u64,

    /// Cooperative cancellation flag, shared with the caller
    #[serde(skip, default)]
    #[schemars(skip)]
    pub cancel: CancelFlag,
}

fn default_max_diagnoses() -> usize {
    100
}

fn default_max_rounds() -> usize {
    50
}

fn default_solve_budget() -> u64 {
    1_000_000
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_diagnoses: default_max_diagnoses(),
            max_rounds: default_max_rounds(),
            solve_budget: default_solve_budget(),
            cancel: CancelFlag::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a configuration from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_norway::from_str(yaml)?)
    }

    /// Replace the cancellation flag with one the caller holds on to
    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Shared cancellation flag
///
/// Cloning shares the underlying flag: a caller keeps one clone, hands the
/// other to the analysis, and may cancel from another thread at any time.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; observed at the next solver step
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.max_diagnoses, 100);
        assert_eq!(config.max_rounds, 50);
        assert_eq!(config.solve_budget, 1_000_000);
        assert!(!config.cancel.is_cancelled());
    }

    #[test]
    fn test_from_yaml_partial() {
        let config = AnalysisConfig::from_yaml("max_diagnoses: 5").unwrap();
        assert_eq!(config.max_diagnoses, 5);
        assert_eq!(config.max_rounds, 50);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analysis.yaml");
        std::fs::write(&path, "max_rounds: 3\nsolve_budget: 1000\n").unwrap();

        let config = AnalysisConfig::from_file(&path).unwrap();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.solve_budget, 1000);
    }
}
