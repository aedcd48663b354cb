//! Result tables.
//!
//! Given the per-work-unit results of a run, writes into the output
//! directory (`B` = `{S}x{I}+{O}`):
//!
//! - `B-recall.csv` and `B-precision.csv`: one row per work unit, one
//!   column per classifier variant
//! - `B.log`: every metric per variant, optionally with per-fold counts
//! - `B.weights`: the learned weights, one row per (work unit, fold)
//! - `B.json`: a machine-readable summary of the whole run

use crate::config::ExperimentConfig;
use crate::error::{Result, WfError};
use crate::harness::WorkResult;
use crate::metrics::{ConfusionCounts, MetricSummary};
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Variants present in the results, sorted.
pub fn variants(results: &[WorkResult]) -> Vec<String> {
    results
        .first()
        .map(|r| r.variants.keys().cloned().collect())
        .unwrap_or_default()
}

fn folds_of<'r>(result: &'r WorkResult, variant: &str) -> &'r [ConfusionCounts] {
    result
        .variants
        .get(variant)
        .map(|v| v.as_slice())
        .unwrap_or(&[])
}

/// Write a `work,<variant...>` table of one cross-fold metric.
pub fn write_metric_csv(
    path: &Path,
    results: &[WorkResult],
    metric: impl Fn(&MetricSummary) -> f64,
) -> Result<()> {
    let variants = variants(results);
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["work".to_string()];
    header.extend(variants.iter().cloned());
    writer.write_record(&header)?;

    for result in results {
        let mut row = vec![result.name.clone()];
        for variant in &variants {
            let summary = MetricSummary::from_folds(folds_of(result, variant));
            row.push(format!("{:.3}", metric(&summary)));
        }
        writer.write_record(&row)?;
    }
    writer.flush().map_err(|e| WfError::io(path, e))?;
    Ok(())
}

/// Per-variant metric tables, as printed and logged.
pub fn variant_tables(results: &[WorkResult], verbose: bool) -> BTreeMap<String, String> {
    let mut tables = BTreeMap::new();
    for variant in variants(results) {
        let mut out = String::from("work,recall,precision,f1score,fpr,accuracy\n");
        for result in results {
            let folds = folds_of(result, &variant);
            let s = MetricSummary::from_folds(folds);
            let _ = writeln!(
                out,
                "{},{:.3},{:.3},{:.3},{:.3},{:.3}",
                result.name, s.recall, s.precision, s.f1score, s.fpr, s.accuracy
            );
            if verbose {
                for c in folds {
                    let _ = writeln!(
                        out,
                        "\ttp{},fpp{},fnp{},fn{},tn{}",
                        c.tp, c.fpp, c.fnp, c.fn_, c.tn
                    );
                }
            }
        }
        tables.insert(variant, out);
    }
    tables
}

/// Human-readable log of the whole run.
pub fn render_log(config: &ExperimentConfig, results: &[WorkResult], timestamp: &str) -> String {
    let mut out = format!("{}: wfknn for {}\n\n", timestamp, config.run_name());
    for (variant, table) in variant_tables(results, config.verbose) {
        let _ = writeln!(out, "{} attack\n{}", variant, table);
    }
    out
}

/// Write the learned weights table.
pub fn write_weights(path: &Path, results: &[WorkResult]) -> Result<()> {
    let dims = results
        .iter()
        .flat_map(|r| r.weights.first())
        .map(|w| w.len())
        .next()
        .unwrap_or(0);

    let mut writer = csv::Writer::from_path(path)?;
    let mut header = vec!["work".to_string(), "fold".to_string()];
    header.extend((1..=dims).map(|i| format!("f{}", i)));
    writer.write_record(&header)?;

    for result in results {
        for (fold, weights) in result.weights.iter().enumerate() {
            let mut row = vec![result.name.clone(), fold.to_string()];
            row.extend(weights.iter().map(|w| w.to_string()));
            writer.write_record(&row)?;
        }
    }
    writer.flush().map_err(|e| WfError::io(path, e))?;
    Ok(())
}

#[derive(Serialize)]
struct VariantSummary<'r> {
    metrics: MetricSummary,
    folds: &'r [ConfusionCounts],
}

#[derive(Serialize)]
struct WorkSummary<'r> {
    work: &'r str,
    variants: BTreeMap<&'r str, VariantSummary<'r>>,
}

#[derive(Serialize)]
struct RunSummary<'r> {
    config: &'r ExperimentConfig,
    seed: u64,
    results: Vec<WorkSummary<'r>>,
}

/// Write the JSON summary of the run.
pub fn write_summary(
    path: &Path,
    config: &ExperimentConfig,
    seed: u64,
    results: &[WorkResult],
) -> Result<()> {
    let summary = RunSummary {
        config,
        seed,
        results: results
            .iter()
            .map(|r| WorkSummary {
                work: &r.name,
                variants: r
                    .variants
                    .iter()
                    .map(|(name, folds)| {
                        (
                            name.as_str(),
                            VariantSummary {
                                metrics: MetricSummary::from_folds(folds),
                                folds: folds.as_slice(),
                            },
                        )
                    })
                    .collect(),
            })
            .collect(),
    };
    let text = serde_json::to_string_pretty(&summary)?;
    std::fs::write(path, text).map_err(|e| WfError::io(path, e))
}

/// Paths of every output file of a run, in write order.
pub fn output_paths(config: &ExperimentConfig) -> [PathBuf; 5] {
    let base = config.run_name();
    let dir = &config.output_dir;
    [
        dir.join(format!("{}-recall.csv", base)),
        dir.join(format!("{}-precision.csv", base)),
        dir.join(format!("{}.log", base)),
        dir.join(format!("{}.weights", base)),
        dir.join(format!("{}.json", base)),
    ]
}

/// Write all result files and print the metric tables to stdout.
pub fn write_all(
    config: &ExperimentConfig,
    seed: u64,
    results: &[WorkResult],
    timestamp: &str,
) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| WfError::io(&config.output_dir, e))?;
    let [recall, precision, log_path, weights, json] = output_paths(config);

    write_metric_csv(&recall, results, |s| s.recall)?;
    write_metric_csv(&precision, results, |s| s.precision)?;

    for (variant, table) in variant_tables(results, config.verbose) {
        info!("{} attack", variant);
        println!("{}", table);
    }
    let log_text = render_log(config, results, timestamp);
    std::fs::write(&log_path, log_text).map_err(|e| WfError::io(&log_path, e))?;

    write_weights(&weights, results)?;
    write_summary(&json, config, seed, results)?;
    info!("wrote results to {}", config.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn result() -> WorkResult {
        let mut variants = BTreeMap::new();
        variants.insert(
            "k1-wf".to_string(),
            vec![
                ConfusionCounts {
                    tp: 8,
                    fpp: 1,
                    fnp: 1,
                    fn_: 1,
                    tn: 9,
                },
                ConfusionCounts {
                    tp: 4,
                    fpp: 0,
                    fnp: 0,
                    fn_: 0,
                    tn: 0,
                },
            ],
        );
        WorkResult {
            name: "w0".to_string(),
            variants,
            weights: vec![vec![0.5, 1.25], vec![2.0, 0.125]],
        }
    }

    #[test]
    fn test_metric_csv_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.csv");
        write_metric_csv(&path, &[result()], |s| s.recall).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "work,k1-wf\nw0,0.900\n");
    }

    #[test]
    fn test_weights_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("w.weights");
        write_weights(&path, &[result()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "work,fold,f1,f2\nw0,0,0.5,1.25\nw0,1,2,0.125\n");
    }

    #[test]
    fn test_verbose_log_lists_fold_counts() {
        let mut cfg = ExperimentConfig::new(2, 4, 2, "data");
        cfg.verbose = true;
        let text = render_log(&cfg, &[result()], "T");
        assert!(text.starts_with("T: wfknn for 2x4+2\n\n"));
        assert!(text.contains("k1-wf attack\nwork,recall,precision,f1score,fpr,accuracy\n"));
        assert!(text.contains("\ttp8,fpp1,fnp1,fn1,tn9\n"));

        cfg.verbose = false;
        assert!(!render_log(&cfg, &[result()], "T").contains("\ttp"));
    }

    #[test]
    fn test_summary_is_valid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.json");
        let cfg = ExperimentConfig::new(2, 4, 2, "data");
        write_summary(&path, &cfg, 42, &[result()]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["seed"], 42);
        assert_eq!(value["results"][0]["variants"]["k1-wf"]["folds"][0]["fn"], 1);
    }
}
