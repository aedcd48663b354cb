//! # wfknn: weighted k-NN website fingerprinting evaluation
//!
//! Given per-session feature vectors extracted from encrypted traffic
//! traces, wfknn learns a per-feature distance weighting and classifies
//! held-out sessions as one of a fixed set of monitored sites or as the
//! catch-all unmonitored class, reporting recall, precision, F1, false
//! positive rate and accuracy under k-fold cross-validation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wfknn::{run_experiment, ExperimentConfig};
//!
//! let mut config = ExperimentConfig::new(100, 40, 2000, "features/");
//! config.folds = 10;
//! config.k_max = 5;
//!
//! let results = run_experiment(&config, 42)?;
//! for work in &results {
//!     println!("{}: {} variants", work.name, work.variants.len());
//! }
//! # Ok::<(), wfknn::WfError>(())
//! ```
//!
//! ## Pipeline
//!
//! - [`dataset`] - load monitored / unmonitored feature matrices
//! - [`distance`] - weighted L1 over jointly present features
//! - [`fold`] - deterministic train/test split
//! - [`learner`] - per-fold weight learning
//! - [`classifier`] - k-NN with a unanimity decision rule
//! - [`harness`] - parallel cross-validation
//! - [`metrics`] - confusion counts and cross-fold averages
//! - [`report`] - CSV, log, weights and JSON output

pub mod classifier;
pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod fold;
pub mod harness;
pub mod learner;
pub mod metrics;
pub mod report;
pub mod vector;

// Re-exports for convenience
pub use classifier::{knn_class, Classifier};
pub use config::ExperimentConfig;
pub use dataset::{ClassLabel, Dataset};
pub use distance::weighted_distance;
pub use error::{Result, WfError};
pub use fold::FoldPartition;
pub use harness::{run_experiment, Evaluation, WorkResult};
pub use learner::WeightLearner;
pub use metrics::{ConfusionCounts, MetricSummary, Outcome};
pub use vector::FeatureVector;
