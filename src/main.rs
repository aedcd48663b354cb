//! wfknn command-line entry point.
//!
//! ```bash
//! wfknn --sites 100 --instances 40 --open 2000 --folds 10 --k-max 5 features/
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use wfknn::config::{ExperimentConfig, DEFAULT_FEATURE_COUNT};
use wfknn::{harness, report};

/// Weighted k-NN website fingerprinting with k-fold cross-validation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "wfknn")]
#[command(version)]
struct Cli {
    /// Directory of feature files, or of work-unit sub-directories
    data_dir: PathBuf,

    /// Number of monitored sites
    #[arg(long)]
    sites: usize,

    /// Number of instances per monitored site
    #[arg(long)]
    instances: usize,

    /// Number of unmonitored sites
    #[arg(long, default_value_t = 0)]
    open: usize,

    /// Offset to read monitored sites from
    #[arg(long, default_value_t = 0)]
    roffset: usize,

    /// Cross-validation fold count
    #[arg(long, default_value_t = 10)]
    folds: usize,

    /// Weight-learning rounds per fold
    #[arg(short, long, default_value_t = 2500)]
    rounds: usize,

    /// Smallest k to evaluate
    #[arg(long, default_value_t = 1)]
    k_min: usize,

    /// Largest k to evaluate
    #[arg(long, default_value_t = 2)]
    k_max: usize,

    /// Step between evaluated k
    #[arg(long, default_value_t = 1)]
    k_step: usize,

    /// Factor to multiply available parallelism with for workers
    #[arg(short = 'f', long, default_value_t = 1)]
    worker_factor: usize,

    /// Features per vector
    #[arg(long, default_value_t = DEFAULT_FEATURE_COUNT)]
    features: usize,

    /// Run seed (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Omit per-fold confusion counts from the run log
    #[arg(long)]
    no_verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> ExperimentConfig {
        let mut config = ExperimentConfig::new(self.sites, self.instances, self.open, self.data_dir);
        config.offset = self.roffset;
        config.folds = self.folds;
        config.rounds = self.rounds;
        config.k_min = self.k_min;
        config.k_max = self.k_max;
        config.k_step = self.k_step;
        config.worker_factor = self.worker_factor;
        config.feature_count = self.features;
        config.seed = self.seed;
        config.output_dir = self.output_dir;
        config.verbose = !self.no_verbose;
        config
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = cli.into_config();
    if let Err(e) = config.validate() {
        log::error!("{}", e);
        return ExitCode::FAILURE;
    }

    let seed = config.seed.unwrap_or_else(rand::random);
    log::info!("run seed {}", seed);

    let outcome = harness::run_experiment(&config, seed).and_then(|results| {
        let timestamp = chrono::Local::now().to_rfc3339();
        report::write_all(&config, seed, &results, &timestamp)
    });

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
