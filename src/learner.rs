//! Distance-metric learning.
//!
//! [`WeightLearner`] learns one per-feature weight vector per fold. Each
//! round picks a training instance, finds its nearest same-site neighbours
//! ("good") and nearest other-class neighbours ("bad"), and shrinks the
//! weights of features that fail to keep the bad neighbours further away
//! than the good ones.
//!
//! Held-out instances of the fold never enter the candidate pools, so the
//! learned weights carry no information about that fold's test set.

use crate::dataset::Dataset;
use crate::distance::{extract_nearest, weighted_distance};
use crate::fold::FoldPartition;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

/// Neighbours drawn per side in every round.
pub const RECO_POINTS: usize = 5;

/// Base multiplicative shrink rate for poorly separating features.
const SHRINK_RATE: f64 = 0.01;

/// Per-fold learner over a shared, read-only dataset.
pub struct WeightLearner<'a> {
    dataset: &'a Dataset,
    partition: &'a FoldPartition,
    rounds: usize,
}

/// Statistics of one learning round, used by tests and debug logging.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundStats {
    pub instance: usize,
    pub bad_counts: Vec<usize>,
    pub min_bad_count: usize,
    pub confusion_severity: usize,
}

impl<'a> WeightLearner<'a> {
    pub fn new(dataset: &'a Dataset, partition: &'a FoldPartition, rounds: usize) -> Self {
        Self {
            dataset,
            partition,
            rounds,
        }
    }

    /// Initial weights: independent draws from [0.5, 1.5).
    pub fn initial_weights<R: Rng>(&self, rng: &mut R) -> Vec<f64> {
        (0..self.dataset.dimensions())
            .map(|_| rng.gen::<f64>() + 0.5)
            .collect()
    }

    /// Learn the weight vector for `fold`.
    pub fn learn<R: Rng>(&self, fold: usize, rng: &mut R) -> Vec<f64> {
        let mut weights = self.initial_weights(rng);
        let mut site_order: Vec<usize> = (0..self.dataset.sites()).collect();
        site_order.shuffle(rng);

        let mut cursor = 0;
        for round in 0..self.rounds {
            let instance = self.draw_training_instance(fold, &site_order, &mut cursor, rng);
            let stats = self.round(instance, fold, &mut weights);
            if round % 500 == 0 {
                debug!(
                    "fold {} round {}: instance {} min bad {} severity {}",
                    fold, round, stats.instance, stats.min_bad_count, stats.confusion_severity
                );
            }
        }
        weights
    }

    /// Cycle through sites in `site_order`, pick a random instance of the
    /// current site, and retry until it is a training instance.
    fn draw_training_instance<R: Rng>(
        &self,
        fold: usize,
        site_order: &[usize],
        cursor: &mut usize,
        rng: &mut R,
    ) -> usize {
        let instances = self.dataset.instances();
        loop {
            let site = site_order[*cursor % site_order.len()];
            *cursor += 1;
            let i = site * instances + rng.gen_range(0..instances);
            if !self.partition.is_held_out(i, fold) {
                return i;
            }
        }
    }

    /// Run one update around training instance `i`.
    pub fn round(&self, i: usize, fold: usize, weights: &mut [f64]) -> RoundStats {
        let ds = self.dataset;
        let query = ds.get(i);
        let present = query.present_indices();
        let instances = ds.instances();
        let site = i / instances;
        let block = site * instances..(site + 1) * instances;

        let mut distances: Vec<f64> = (0..ds.len())
            .map(|j| {
                if j == i || self.partition.is_held_out(j, fold) {
                    f64::INFINITY
                } else {
                    weighted_distance(query, ds.get(j), weights, &present)
                }
            })
            .collect();

        // good neighbours come from the query's own site block
        let good: Vec<usize> = extract_nearest(&mut distances[block.clone()], RECO_POINTS)
            .into_iter()
            .map(|j| j + block.start)
            .collect();
        let max_good_dist = good
            .iter()
            .map(|&j| weighted_distance(query, ds.get(j), weights, &present))
            .fold(0.0, f64::max);

        for d in &mut distances[block] {
            *d = f64::INFINITY;
        }
        let bad = extract_nearest(&mut distances, RECO_POINTS);

        let dims = weights.len();
        let mut bad_counts = vec![0usize; dims];
        for (f, count) in bad_counts.iter_mut().enumerate() {
            let max_good = good
                .iter()
                .map(|&j| query.feature_gap(ds.get(j), f))
                .fold(0.0, f64::max);
            *count = bad
                .iter()
                .filter(|&&j| query.feature_gap(ds.get(j), f) <= max_good)
                .count();
        }
        let min_bad_count = bad_counts.iter().copied().min().unwrap_or(0);

        let confusion_severity = bad
            .iter()
            .filter(|&&j| weighted_distance(query, ds.get(j), weights, &present) <= max_good_dist)
            .count();

        apply_update(weights, &bad_counts, min_bad_count, confusion_severity);

        RoundStats {
            instance: i,
            bad_counts,
            min_bad_count,
            confusion_severity,
        }
    }
}

/// Shrink features whose bad count exceeds the round minimum, then lift
/// every weight by that minimum.
pub fn apply_update(
    weights: &mut [f64],
    bad_counts: &[usize],
    min_bad_count: usize,
    confusion_severity: usize,
) {
    let reco = RECO_POINTS as f64;
    let severity = (1 + confusion_severity) as f64 / reco;
    for (w, &count) in weights.iter_mut().zip(bad_counts) {
        if count != min_bad_count {
            *w -= *w * SHRINK_RATE * (count as f64 / reco) * severity;
        }
        *w += min_bad_count as f64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use crate::vector::FeatureVector;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Two sites × 4 instances + 2 unmonitored. Feature 0 separates the
    /// classes; features 1..4 alternate 0/1 with the instance position.
    fn fixture() -> (Dataset, FoldPartition) {
        let row = |class_value: f64, position: usize| {
            let mut v = vec![class_value];
            v.extend((1..4).map(|f| ((position + f) % 2) as f64));
            FeatureVector::from_values(v)
        };
        let monitored = (0..8)
            .map(|i| row(if i < 4 { 0.0 } else { 10.0 }, i % 4))
            .collect();
        let unmonitored = vec![row(100.0, 0), row(110.0, 1)];
        let ds = Dataset::from_parts(2, 4, monitored, unmonitored).unwrap();

        let mut cfg = ExperimentConfig::new(2, 4, 2, "data");
        cfg.folds = 2;
        (ds, FoldPartition::new(&cfg))
    }

    #[test]
    fn test_initial_weights_in_range() {
        let (ds, p) = fixture();
        let learner = WeightLearner::new(&ds, &p, 0);
        let w = learner.initial_weights(&mut ChaCha8Rng::seed_from_u64(1));
        assert_eq!(w.len(), 4);
        assert!(w.iter().all(|&x| (0.5..1.5).contains(&x)));
    }

    #[test]
    fn test_minimum_features_are_not_shrunk() {
        let mut w = vec![1.0, 1.0, 1.0];
        apply_update(&mut w, &[0, 3, 5], 0, 4);
        assert_eq!(w[0], 1.0);
        assert!(w[1] < 1.0);
        assert!(w[2] < w[1]);
    }

    #[test]
    fn test_update_lifts_all_weights_by_minimum() {
        let mut w = vec![1.0, 1.0];
        apply_update(&mut w, &[2, 4], 2, 0);
        // 1 + 2 for the minimum feature; shrink by 0.01*0.8*0.2 then +2
        assert!((w[0] - 3.0).abs() < 1e-10);
        assert!((w[1] - (1.0 - 0.0016 + 2.0)).abs() < 1e-10);
    }

    #[test]
    fn test_round_ignores_held_out_candidates() {
        let (ds, p) = fixture();
        let learner = WeightLearner::new(&ds, &p, 0);
        let mut w = vec![1.0; 4];
        // instance 2 trains in fold 0; its only same-site candidate is 3
        let stats = learner.round(2, 0, &mut w);
        assert_eq!(stats.instance, 2);
        // feature 0 never confuses sites; noise features confuse every
        // one of the three available bad neighbours
        assert_eq!(stats.bad_counts, vec![0, 3, 3, 3]);
        assert_eq!(stats.min_bad_count, 0);
        assert_eq!(stats.confusion_severity, 0);
        assert_eq!(w[0], 1.0);
        assert!(w[1] < 1.0);
    }

    #[test]
    fn test_learning_upweights_discriminative_feature() {
        let (ds, p) = fixture();
        let learner = WeightLearner::new(&ds, &p, 2000);
        for fold in 0..2 {
            let mut rng = ChaCha8Rng::seed_from_u64(fold as u64);
            let w = learner.learn(fold, &mut rng);
            for noise in &w[1..] {
                assert!(w[0] > *noise, "fold {}: {:?}", fold, w);
            }
        }
    }

    #[test]
    fn test_learning_is_deterministic_for_a_seed() {
        let (ds, p) = fixture();
        let learner = WeightLearner::new(&ds, &p, 50);
        let a = learner.learn(1, &mut ChaCha8Rng::seed_from_u64(3));
        let b = learner.learn(1, &mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a, b);
    }
}
