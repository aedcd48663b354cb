//! Weighted k-NN classification with a unanimity rule.
//!
//! A test instance is assigned a monitored site only when all of its `k`
//! nearest training neighbours agree on that site; any disagreement (or
//! an all-unmonitored neighbourhood) yields the unmonitored label.

use crate::dataset::{ClassLabel, Dataset};
use crate::distance::{extract_nearest, weighted_distance};
use crate::fold::FoldPartition;

/// Nearest-neighbour search for one fold.
pub struct Classifier<'a> {
    dataset: &'a Dataset,
    partition: &'a FoldPartition,
    weights: &'a [f64],
    fold: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(
        dataset: &'a Dataset,
        partition: &'a FoldPartition,
        weights: &'a [f64],
        fold: usize,
    ) -> Self {
        Self {
            dataset,
            partition,
            weights,
            fold,
        }
    }

    /// Labels of the `k` nearest training instances to global index `test`,
    /// nearest first.
    ///
    /// Held-out instances of the fold are never neighbours; fewer than `k`
    /// labels are returned when the training pool is smaller than `k`.
    pub fn neighbour_classes(&self, test: usize, k: usize) -> Vec<ClassLabel> {
        let ds = self.dataset;
        let query = ds.get(test);
        let present = query.present_indices();

        let mut distances: Vec<f64> = (0..ds.len())
            .map(|j| {
                if self.partition.is_held_out(j, self.fold) {
                    f64::INFINITY
                } else {
                    weighted_distance(query, ds.get(j), self.weights, &present)
                }
            })
            .collect();

        extract_nearest(&mut distances, k)
            .into_iter()
            .map(|j| ds.label(j))
            .collect()
    }

    /// Decide the class of `test` for every `k` in `ks`.
    ///
    /// One neighbour search of depth `max(ks)` serves every variant.
    pub fn classify(&self, test: usize, ks: &[usize]) -> Vec<ClassLabel> {
        let depth = ks.iter().copied().max().unwrap_or(0);
        let classes = self.neighbour_classes(test, depth);
        ks.iter()
            .map(|&k| knn_class(&classes, k, self.dataset.unmonitored_label()))
            .collect()
    }
}

/// Unanimity rule over the first `k` neighbour labels.
///
/// Returns the shared label when every one of them agrees, otherwise
/// `unmonitored`. An empty neighbourhood is unmonitored.
pub fn knn_class(classes: &[ClassLabel], k: usize, unmonitored: ClassLabel) -> ClassLabel {
    let window = &classes[..k.min(classes.len())];
    match window.first() {
        Some(&first) if window.windows(2).all(|pair| pair[0] == pair[1]) => first,
        _ => unmonitored,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use crate::vector::FeatureVector;

    #[test]
    fn test_knn_class_single_neighbour_agrees() {
        assert_eq!(knn_class(&[3], 1, 9), 3);
        assert_eq!(knn_class(&[3, 1, 1], 1, 9), 3);
    }

    #[test]
    fn test_knn_class_disagreement_is_unmonitored() {
        assert_eq!(knn_class(&[2, 2, 4], 3, 9), 9);
        assert_eq!(knn_class(&[2, 4, 2], 3, 9), 9);
        assert_eq!(knn_class(&[2, 2, 2], 3, 9), 2);
    }

    #[test]
    fn test_knn_class_empty_is_unmonitored() {
        assert_eq!(knn_class(&[], 3, 9), 9);
    }

    #[test]
    fn test_neighbours_skip_held_out() {
        let v = |x: f64| FeatureVector::from_values(vec![x]);
        // one site, 4 instances; fold 0 holds out 0 and 1
        let ds = Dataset::from_parts(1, 4, vec![v(0.0), v(0.1), v(5.0), v(1.0)], vec![]).unwrap();
        let mut cfg = ExperimentConfig::new(1, 4, 0, "data");
        cfg.folds = 2;
        let p = FoldPartition::new(&cfg);
        let w = vec![1.0];
        let c = Classifier::new(&ds, &p, &w, 0);

        assert_eq!(c.neighbour_classes(0, 5), vec![0, 0]);
        assert_eq!(c.classify(0, &[1, 2]), vec![0, 0]);
    }

    #[test]
    fn test_unmonitored_neighbour_maps_to_catch_all() {
        let v = |x: f64| FeatureVector::from_values(vec![x]);
        let ds = Dataset::from_parts(
            2,
            2,
            vec![v(0.0), v(0.0), v(10.0), v(10.0)],
            vec![v(50.0), v(51.0)],
        )
        .unwrap();
        let mut cfg = ExperimentConfig::new(2, 2, 2, "data");
        cfg.folds = 2;
        let p = FoldPartition::new(&cfg);
        let w = vec![1.0];
        let c = Classifier::new(&ds, &p, &w, 0);

        // test index 4 (unmonitored, held out); training pool is 1, 3, 5
        assert_eq!(c.neighbour_classes(4, 3), vec![2, 1, 0]);
        assert_eq!(c.classify(4, &[1, 2]), vec![2, 2]);
    }
}
