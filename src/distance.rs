//! Weighted distance and nearest-candidate extraction.
//!
//! The distance is a weighted Manhattan distance restricted to features
//! present in both vectors. It is asymmetric: the query's present-feature
//! set is computed once and drives the sum.

use crate::vector::FeatureVector;

/// Weighted L1 distance from `from` to `to`.
///
/// Sums `weight[i] * |from[i] - to[i]|` over `present` (the present
/// features of `from`), skipping features missing in `to`.
pub fn weighted_distance(
    from: &FeatureVector,
    to: &FeatureVector,
    weight: &[f64],
    present: &[usize],
) -> f64 {
    assert_eq!(
        from.dimensions(),
        to.dimensions(),
        "Dimension mismatch in weighted_distance"
    );
    assert_eq!(
        from.dimensions(),
        weight.len(),
        "Weight vector dimension mismatch"
    );

    present
        .iter()
        .filter(|&&i| !to.is_missing(i))
        .map(|&i| weight[i] * (from[i] - to[i]).abs())
        .sum()
}

/// Take the smallest finite entry out of `distances`.
///
/// Returns its index and marks it as `+inf` so it cannot be taken again.
/// Ties go to the lowest index. Returns `None` once only infinite entries
/// remain.
pub fn extract_min(distances: &mut [f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    let mut best_val = f64::INFINITY;
    for (i, &d) in distances.iter().enumerate() {
        if d < best_val {
            best_val = d;
            best = Some(i);
        }
    }
    if let Some(i) = best {
        distances[i] = f64::INFINITY;
    }
    best
}

/// Extract up to `n` minima in ascending order of distance.
pub fn extract_nearest(distances: &mut [f64], n: usize) -> Vec<usize> {
    let mut out = Vec::with_capacity(n);
    for _ in 0..n {
        match extract_min(distances) {
            Some(i) => out.push(i),
            None => break,
        }
    }
    out
}
