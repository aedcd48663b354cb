//! Experiment configuration.
//!
//! An [`ExperimentConfig`] is built once (usually from the command line),
//! validated, and then passed by reference into every component. Nothing
//! in the crate reads process-wide settings.

use crate::error::{Result, WfError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Number of features in a vector produced by the upstream extractor.
pub const DEFAULT_FEATURE_COUNT: usize = 1225;

/// Suffix of every feature file.
pub const FEATURE_SUFFIX: &str = ".feat";

/// Immutable description of one evaluation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Number of monitored sites (S)
    pub sites: usize,
    /// Instances per monitored site (I)
    pub instances: usize,
    /// Number of unmonitored sites (O)
    pub open: usize,
    /// Monitored sites are numbered `offset + 1 ..= offset + sites`
    pub offset: usize,
    /// Cross-validation fold count
    pub folds: usize,
    /// Weight-learning rounds per fold (R)
    pub rounds: usize,
    /// Smallest neighbourhood size evaluated
    pub k_min: usize,
    /// Largest neighbourhood size evaluated
    pub k_max: usize,
    /// Step between evaluated neighbourhood sizes
    pub k_step: usize,
    /// Worker pool size is available parallelism times this factor
    pub worker_factor: usize,
    /// Include per-fold confusion counts in the run log
    pub verbose: bool,
    /// Tokens per feature vector (F)
    pub feature_count: usize,
    /// Run seed; a fresh one is drawn when absent
    pub seed: Option<u64>,
    /// Root directory holding feature files or work-unit sub-directories
    pub data_dir: PathBuf,
    /// Directory receiving the result tables
    pub output_dir: PathBuf,
}

impl ExperimentConfig {
    /// Create a configuration with the given dataset shape and defaults for
    /// everything else.
    pub fn new(sites: usize, instances: usize, open: usize, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            sites,
            instances,
            open,
            offset: 0,
            folds: 10,
            rounds: 2500,
            k_min: 1,
            k_max: 2,
            k_step: 1,
            worker_factor: 1,
            verbose: true,
            feature_count: DEFAULT_FEATURE_COUNT,
            seed: None,
            data_dir: data_dir.into(),
            output_dir: PathBuf::from("."),
        }
    }

    /// Check every structural constraint. Must pass before any I/O.
    pub fn validate(&self) -> Result<()> {
        if self.sites == 0 || self.instances == 0 {
            return Err(WfError::InvalidConfig(
                "missing sites and/or instances".into(),
            ));
        }
        if self.folds < 2 {
            return Err(WfError::InvalidConfig(format!(
                "need at least 2 folds, got {}",
                self.folds
            )));
        }
        if self.instances % self.folds != 0 || self.open % self.folds != 0 {
            return Err(WfError::InvalidConfig(format!(
                "k ({}) has to fold instances ({}) and open ({}) evenly",
                self.folds, self.instances, self.open
            )));
        }
        if self.k_min == 0 || self.k_step == 0 || self.k_min > self.k_max {
            return Err(WfError::InvalidConfig(format!(
                "invalid neighbourhood range {}..={} step {}",
                self.k_min, self.k_max, self.k_step
            )));
        }
        if self.worker_factor == 0 {
            return Err(WfError::InvalidConfig("worker factor must be positive".into()));
        }
        if self.feature_count == 0 {
            return Err(WfError::InvalidConfig("feature count must be positive".into()));
        }
        Ok(())
    }

    /// Size of the monitored collection (S·I).
    pub fn monitored_len(&self) -> usize {
        self.sites * self.instances
    }

    /// Size of the global index space (S·I + O).
    pub fn total_len(&self) -> usize {
        self.monitored_len() + self.open
    }

    /// Number of held-out instances in every fold.
    pub fn test_per_fold(&self) -> usize {
        self.total_len() / self.folds
    }

    /// Neighbourhood sizes evaluated, in ascending order.
    pub fn k_values(&self) -> Vec<usize> {
        (self.k_min..=self.k_max).step_by(self.k_step.max(1)).collect()
    }

    /// Base name shared by all output files, e.g. `"100x40+2000"`.
    pub fn run_name(&self) -> String {
        format!("{}x{}+{}", self.sites, self.instances, self.open)
    }

    /// Workers per fold during evaluation.
    pub fn worker_count(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        cores * self.worker_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ExperimentConfig {
        ExperimentConfig::new(2, 4, 2, "data")
    }

    #[test]
    fn test_defaults() {
        let cfg = base();
        assert_eq!(cfg.folds, 10);
        assert_eq!(cfg.rounds, 2500);
        assert_eq!(cfg.feature_count, 1225);
        assert_eq!(cfg.k_values(), vec![1, 2]);
    }

    #[test]
    fn test_valid_config() {
        let mut cfg = base();
        cfg.folds = 2;
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.test_per_fold(), 5);
        assert_eq!(cfg.run_name(), "2x4+2");
    }

    #[test]
    fn test_uneven_folds_rejected() {
        let mut cfg = base();
        cfg.folds = 3;
        assert!(matches!(cfg.validate(), Err(WfError::InvalidConfig(_))));

        let mut cfg = base();
        cfg.folds = 2;
        cfg.open = 3;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_missing_counts_rejected() {
        let mut cfg = ExperimentConfig::new(0, 4, 0, "data");
        cfg.folds = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_bad_k_range_rejected() {
        let mut cfg = base();
        cfg.folds = 2;
        cfg.k_min = 3;
        cfg.k_max = 2;
        assert!(cfg.validate().is_err());
        cfg.k_min = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_k_values_step() {
        let mut cfg = base();
        cfg.k_min = 1;
        cfg.k_max = 7;
        cfg.k_step = 3;
        assert_eq!(cfg.k_values(), vec![1, 4, 7]);
    }
}
