//! Cross-validation harness.
//!
//! Two fan-out/fan-in phases per work unit:
//!
//! 1. one weight-learning task per fold, all folds concurrently;
//! 2. per fold, a bounded worker pool classifying every held-out instance.
//!
//! Workers only read the dataset and the fold's weights. Per-instance
//! results are merged serially once the pool has drained.

use crate::classifier::Classifier;
use crate::config::ExperimentConfig;
use crate::dataset::{discover_work_units, Dataset};
use crate::error::Result;
use crate::fold::FoldPartition;
use crate::learner::WeightLearner;
use crate::metrics::{ConfusionCounts, Outcome};
use log::info;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Name of the classifier variant for neighbourhood size `k`.
pub fn variant_name(k: usize) -> String {
    format!("k{}-wf", k)
}

/// Per-instance result: variant name → outcome.
pub type InstanceResult = BTreeMap<String, Outcome>;

/// Everything produced for one work unit.
#[derive(Clone, Debug)]
pub struct WorkResult {
    pub name: String,
    /// variant → per-fold counts
    pub variants: BTreeMap<String, Vec<ConfusionCounts>>,
    /// fold → learned weights
    pub weights: Vec<Vec<f64>>,
}

/// Seed for the learner stream of (`work`, `fold`).
///
/// SHA-256 of (run seed || work name || fold), first 8 bytes.
pub fn fold_seed(run_seed: u64, work: &str, fold: usize) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(run_seed.to_le_bytes());
    hasher.update(work.as_bytes());
    hasher.update((fold as u64).to_le_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[0..8]);
    u64::from_le_bytes(bytes)
}

/// Cross-validation over one dataset.
pub struct Evaluation<'a> {
    config: &'a ExperimentConfig,
    dataset: &'a Dataset,
    partition: FoldPartition,
    run_seed: u64,
}

impl<'a> Evaluation<'a> {
    pub fn new(config: &'a ExperimentConfig, dataset: &'a Dataset, run_seed: u64) -> Self {
        Self {
            config,
            dataset,
            partition: FoldPartition::new(config),
            run_seed,
        }
    }

    pub fn partition(&self) -> &FoldPartition {
        &self.partition
    }

    /// Phase 1: learn every fold's weights concurrently.
    pub fn learn_weights(&self, work: &str) -> Vec<Vec<f64>> {
        let learner = WeightLearner::new(self.dataset, &self.partition, self.config.rounds);
        let weights = (0..self.config.folds)
            .into_par_iter()
            .map(|fold| {
                let mut rng = ChaCha8Rng::seed_from_u64(fold_seed(self.run_seed, work, fold));
                learner.learn(fold, &mut rng)
            })
            .collect();
        info!("determined global kNN-weights for all folds");
        weights
    }

    /// Classify one held-out instance under every configured `k`.
    pub fn test_instance(&self, classifier: &Classifier<'_>, test: usize) -> InstanceResult {
        let ks = self.config.k_values();
        let truth = self.dataset.label(test);
        let unmonitored = self.dataset.unmonitored_label();
        ks.iter()
            .zip(classifier.classify(test, &ks))
            .map(|(&k, predicted)| (variant_name(k), Outcome::of(predicted, truth, unmonitored)))
            .collect()
    }

    /// Phase 2 for one fold: classify held-out instances on a worker pool
    /// and merge the outcomes into per-variant counts.
    pub fn evaluate_fold(
        &self,
        fold: usize,
        weights: &[f64],
        workers: usize,
    ) -> Result<BTreeMap<String, ConfusionCounts>> {
        let classifier = Classifier::new(self.dataset, &self.partition, weights, fold);
        let tests = self.partition.held_out(fold);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()?;
        let results: Vec<InstanceResult> = pool.install(|| {
            tests
                .par_iter()
                .map(|&test| self.test_instance(&classifier, test))
                .collect()
        });

        let mut merged: BTreeMap<String, ConfusionCounts> = BTreeMap::new();
        for result in results {
            for (variant, outcome) in result {
                *merged.entry(variant).or_default() += ConfusionCounts::from_outcome(outcome);
            }
        }
        Ok(merged)
    }

    /// Both phases for a whole work unit.
    pub fn run(&self, work: &str) -> Result<WorkResult> {
        let weights = self.learn_weights(work);
        let workers = self.config.worker_count();
        let folds = self.config.folds;

        let mut variants: BTreeMap<String, Vec<ConfusionCounts>> = BTreeMap::new();
        for (fold, fold_weights) in weights.iter().enumerate() {
            info!(
                "starting fold {}/{} ({} tests, {} workers)",
                fold + 1,
                folds,
                self.config.test_per_fold(),
                workers
            );
            for (variant, counts) in self.evaluate_fold(fold, fold_weights, workers)? {
                variants
                    .entry(variant)
                    .or_insert_with(|| vec![ConfusionCounts::default(); folds])[fold] += counts;
            }
        }

        Ok(WorkResult {
            name: work.to_string(),
            variants,
            weights,
        })
    }
}

/// Load and evaluate every work unit under the configured data directory.
pub fn run_experiment(config: &ExperimentConfig, run_seed: u64) -> Result<Vec<WorkResult>> {
    config.validate()?;
    let units = discover_work_units(&config.data_dir)?;

    let mut results = Vec::with_capacity(units.len());
    for (name, path) in units {
        info!("starting with work {}", name);
        let dataset = Dataset::load(&path, config)?;
        let evaluation = Evaluation::new(config, &dataset, run_seed);
        results.push(evaluation.run(&name)?);
    }
    Ok(results)
}
