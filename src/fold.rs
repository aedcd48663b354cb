//! Fold partitioning for k-fold cross-validation.
//!
//! Membership is a pure function of (global index, fold). The same
//! [`FoldPartition`] is used by the weight learner to exclude test
//! instances and by the harness to select them.

use crate::config::ExperimentConfig;

/// Deterministic train/test split over the global index space.
///
/// Monitored index `i < S·I` is held out in fold `f` when its position
/// within its site (`i mod I`) lies in the `f`-th block of `I / folds`
/// positions. Unmonitored indices use their position within the
/// unmonitored collection and blocks of `O / folds`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoldPartition {
    instances: usize,
    open: usize,
    monitored_len: usize,
    folds: usize,
}

impl FoldPartition {
    /// Build the partition for a validated configuration.
    pub fn new(config: &ExperimentConfig) -> Self {
        Self {
            instances: config.instances,
            open: config.open,
            monitored_len: config.monitored_len(),
            folds: config.folds,
        }
    }

    pub fn folds(&self) -> usize {
        self.folds
    }

    /// Size of the global index space.
    pub fn len(&self) -> usize {
        self.monitored_len + self.open
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether global index `i` is a test instance in `fold`.
    pub fn is_held_out(&self, i: usize, fold: usize) -> bool {
        let (position, block) = if i < self.monitored_len {
            (i % self.instances, self.instances / self.folds)
        } else {
            ((i - self.monitored_len) % self.open, self.open / self.folds)
        };
        position >= block * fold && position < block * (fold + 1)
    }

    /// All test instances of `fold`, in ascending global order.
    pub fn held_out(&self, fold: usize) -> Vec<usize> {
        (0..self.len())
            .filter(|&i| self.is_held_out(i, fold))
            .collect()
    }
}
