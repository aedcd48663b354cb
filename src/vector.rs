//! Feature vector type for wfknn.
//!
//! A feature vector holds the statistics extracted from one traced session.
//! Entries the extractor could not compute are stored as [`MISSING`].

use crate::error::{Result, WfError};
use std::ops::Index;
use std::path::Path;

/// Internal representation of a missing feature.
pub const MISSING: f64 = -1.0;

/// Token the extractor writes for a missing feature.
pub const MISSING_TOKEN: &str = "'X'";

/// A fixed-length feature vector.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    data: Vec<f64>,
}

impl FeatureVector {
    /// Create a vector from raw values. NaN and infinities become [`MISSING`].
    pub fn from_values(values: Vec<f64>) -> Self {
        let data = values.into_iter().map(normalize).collect();
        Self { data }
    }

    /// Parse the extractor's token stream.
    ///
    /// `path` is only used for error reporting.
    pub fn parse(text: &str, expected: usize, path: &Path) -> Result<Self> {
        let mut data = Vec::with_capacity(expected);
        for token in text.split_whitespace() {
            if token == MISSING_TOKEN {
                data.push(MISSING);
                continue;
            }
            let value: f64 = token.parse().map_err(|_| WfError::MalformedToken {
                path: path.to_path_buf(),
                token: token.to_string(),
            })?;
            data.push(normalize(value));
        }

        if data.len() != expected {
            return Err(WfError::FeatureCount {
                path: path.to_path_buf(),
                expected,
                got: data.len(),
            });
        }

        Ok(Self { data })
    }

    /// Read and parse a feature file.
    pub fn read(path: &Path, expected: usize) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| WfError::io(path, e))?;
        Self::parse(&text, expected, path)
    }

    /// Get the dimensionality.
    pub fn dimensions(&self) -> usize {
        self.data.len()
    }

    /// Get the raw data as a slice.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Whether feature `i` is missing.
    pub fn is_missing(&self, i: usize) -> bool {
        self.data[i] == MISSING
    }

    /// Indices of all present features, in ascending order.
    pub fn present_indices(&self) -> Vec<usize> {
        self.data
            .iter()
            .enumerate()
            .filter(|&(_, &v)| v != MISSING)
            .map(|(i, _)| i)
            .collect()
    }

    /// Absolute difference at feature `i`, or 0 if either side is missing.
    pub fn feature_gap(&self, other: &FeatureVector, i: usize) -> f64 {
        if self.is_missing(i) || other.is_missing(i) {
            0.0
        } else {
            (self.data[i] - other.data[i]).abs()
        }
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

fn normalize(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        MISSING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_missing() {
        let v = FeatureVector::parse("1 2.5 'X' 4", 4, Path::new("t")).unwrap();
        assert_eq!(v.data(), &[1.0, 2.5, MISSING, 4.0]);
        assert_eq!(v.present_indices(), vec![0, 1, 3]);
    }

    #[test]
    fn test_parse_tolerates_repeated_delimiters() {
        let v = FeatureVector::parse(" 1  2 3 \n", 3, Path::new("t")).unwrap();
        assert_eq!(v.dimensions(), 3);
    }

    #[test]
    fn test_non_finite_collapses_to_missing() {
        let v = FeatureVector::parse("NaN inf -inf 7", 4, Path::new("t")).unwrap();
        assert_eq!(v.data(), &[MISSING, MISSING, MISSING, 7.0]);
    }

    #[test]
    fn test_wrong_token_count() {
        let err = FeatureVector::parse("1 2 3", 4, Path::new("t")).unwrap_err();
        assert!(matches!(
            err,
            WfError::FeatureCount {
                expected: 4,
                got: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_token() {
        let err = FeatureVector::parse("1 abc 3", 3, Path::new("t")).unwrap_err();
        assert!(matches!(err, WfError::MalformedToken { token, .. } if token == "abc"));
    }

    #[test]
    fn test_feature_gap_ignores_missing() {
        let a = FeatureVector::from_values(vec![1.0, MISSING, 5.0]);
        let b = FeatureVector::from_values(vec![4.0, 2.0, MISSING]);
        assert!((a.feature_gap(&b, 0) - 3.0).abs() < 1e-10);
        assert_eq!(a.feature_gap(&b, 1), 0.0);
        assert_eq!(a.feature_gap(&b, 2), 0.0);
    }
}
