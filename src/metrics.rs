//! Confusion statistics and aggregate metrics.
//!
//! Every classification lands in exactly one of five outcomes. Counts are
//! only ever added together, so per-instance results can be merged in any
//! order.
//!
//! Ratio metrics are computed per fold and averaged across folds. A fold
//! whose ratio is undefined (zero denominator) contributes nothing to the
//! sum but still counts in the divisor.

use crate::dataset::ClassLabel;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

/// Outcome of a single classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Monitored, predicted as the right site
    TruePositive,
    /// Monitored, predicted as a different monitored site
    FalsePositiveToPositive,
    /// Unmonitored, predicted as some monitored site
    FalseNegativeToPositive,
    /// Monitored, predicted unmonitored
    FalseNegative,
    /// Unmonitored, predicted unmonitored
    TrueNegative,
}

impl Outcome {
    /// Classify a prediction against the true label. `unmonitored` is S.
    pub fn of(predicted: ClassLabel, truth: ClassLabel, unmonitored: ClassLabel) -> Self {
        if predicted == truth {
            if truth < unmonitored {
                Outcome::TruePositive
            } else {
                Outcome::TrueNegative
            }
        } else if predicted == unmonitored {
            Outcome::FalseNegative
        } else if truth == unmonitored {
            Outcome::FalseNegativeToPositive
        } else {
            Outcome::FalsePositiveToPositive
        }
    }
}

/// The five outcome counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionCounts {
    pub tp: u64,
    pub fpp: u64,
    pub fnp: u64,
    #[serde(rename = "fn")]
    pub fn_: u64,
    pub tn: u64,
}

impl ConfusionCounts {
    /// Counts holding a single outcome.
    pub fn from_outcome(outcome: Outcome) -> Self {
        let mut c = Self::default();
        c.record(outcome);
        c
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::TruePositive => self.tp += 1,
            Outcome::FalsePositiveToPositive => self.fpp += 1,
            Outcome::FalseNegativeToPositive => self.fnp += 1,
            Outcome::FalseNegative => self.fn_ += 1,
            Outcome::TrueNegative => self.tn += 1,
        }
    }

    /// Number of classifications counted.
    pub fn total(&self) -> u64 {
        self.tp + self.fpp + self.fnp + self.fn_ + self.tn
    }

    /// TP / (TP + FN + FPP)
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_ + self.fpp)
    }

    /// TP / (TP + FPP + FNP)
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fpp + self.fnp)
    }

    /// (FPP + FNP) / (TN + FNP)
    pub fn fpr(&self) -> f64 {
        ratio(self.fpp + self.fnp, self.tn + self.fnp)
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        2.0 * (p * r) / (p + r)
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }
}

impl AddAssign for ConfusionCounts {
    fn add_assign(&mut self, other: Self) {
        self.tp += other.tp;
        self.fpp += other.fpp;
        self.fnp += other.fnp;
        self.fn_ += other.fn_;
        self.tn += other.tn;
    }
}

impl Add for ConfusionCounts {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

fn ratio(num: u64, den: u64) -> f64 {
    num as f64 / den as f64
}

/// Average `metric` over folds, treating NaN folds as zero contributions.
pub fn fold_mean(folds: &[ConfusionCounts], metric: impl Fn(&ConfusionCounts) -> f64) -> f64 {
    let sum: f64 = folds.iter().map(metric).filter(|d| !d.is_nan()).sum();
    sum / folds.len() as f64
}

/// Cross-fold averages for one (work unit, variant).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub recall: f64,
    pub precision: f64,
    pub f1score: f64,
    pub fpr: f64,
    pub accuracy: f64,
}

impl MetricSummary {
    pub fn from_folds(folds: &[ConfusionCounts]) -> Self {
        Self {
            recall: fold_mean(folds, ConfusionCounts::recall),
            precision: fold_mean(folds, ConfusionCounts::precision),
            f1score: fold_mean(folds, ConfusionCounts::f1),
            fpr: fold_mean(folds, ConfusionCounts::fpr),
            accuracy: fold_mean(folds, ConfusionCounts::accuracy),
        }
    }
}
