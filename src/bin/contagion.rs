//! Interbank Contagion Simulation Binary
//!
//! Runs the Monte Carlo contagion model and prints the per-density report.
//!
//! ## Usage
//! ```bash
//! # Reference run: 1M trials, 10 impacts, bins 0..2700
//! cargo run --bin contagion --release -- --banks banks.csv
//!
//! # Quick run over synthetic banks, report to a file
//! cargo run --bin contagion --release -- --trials 20000 --seed 7 -o report.csv
//! ```

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use contagion_simulation::report::{write_report, write_trial_results};
use contagion_simulation::{
    simulate, synthetic_banks, BankLoader, BankNetwork, BankRecord, RecordPolicy,
    SimulationConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Interbank contagion simulator
///
/// Rewires a bank network at random for every trial, shocks it, and reports
/// how far the shock spread, binned by the number of links.
#[derive(Parser, Debug)]
#[command(name = "contagion")]
#[command(version, about, long_about = None)]
struct Args {
    /// CSV of `name,assets,deposits` rows. Synthetic banks are used if omitted.
    #[arg(short, long)]
    banks: Option<PathBuf>,

    /// Number of synthetic banks when no CSV is given
    #[arg(long, default_value = "50")]
    synthetic_banks: usize,

    /// The bank CSV starts with a header row
    #[arg(long)]
    has_headers: bool,

    /// Skip malformed bank rows instead of aborting
    #[arg(long)]
    skip_invalid: bool,

    /// Number of trials
    #[arg(short, long, default_value = "1000000")]
    trials: usize,

    /// Banks hit by the initial shock in each trial
    #[arg(short, long, default_value = "10")]
    impacts: usize,

    /// Report bins 0..BINS by link count
    #[arg(long, default_value = "2700")]
    bins: usize,

    /// Magnitude below which a shock is absorbed instead of propagated
    #[arg(long, default_value = "0.025")]
    threshold: f64,

    /// Magnitude of each initial shock
    #[arg(long, default_value = "1.0")]
    initial_shock: f64,

    /// Divisor for the "Avg links per node" column
    #[arg(long, default_value = "50")]
    links_per_node_divisor: f64,

    /// Base seed; trial i uses seed + i
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    threads: Option<usize>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write every trial result to this CSV
    #[arg(long)]
    results_csv: Option<PathBuf>,

    /// Print the neighbor lists of one sample network to stderr
    #[arg(long)]
    dump_network: bool,
}

impl Args {
    fn config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default()
            .with_trials(self.trials)
            .with_impacts(self.impacts)
            .with_max_bins(self.bins)
            .with_threshold(self.threshold)
            .with_initial_magnitude(self.initial_shock)
            .with_links_per_node_divisor(self.links_per_node_divisor)
            .with_seed(self.seed);
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        config
    }

    fn records(&self) -> Result<Vec<BankRecord>> {
        match &self.banks {
            Some(path) => {
                let policy = if self.skip_invalid {
                    RecordPolicy::Skip
                } else {
                    RecordPolicy::Abort
                };
                BankLoader::new(policy)
                    .with_headers(self.has_headers)
                    .load(path)
                    .with_context(|| format!("Failed to load banks from {}", path.display()))
            }
            None => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                synthetic_banks(self.synthetic_banks, &mut rng)
                    .context("Failed to generate synthetic banks")
            }
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn dump_network(network: &BankNetwork, seed: u64) -> Result<()> {
    let mut sample = network.clone();
    let links = sample
        .construct_network(&mut ChaCha8Rng::seed_from_u64(seed))
        .context("Failed to construct sample network")?;
    eprintln!("Sample network ({} links):", links);
    eprint!("{}", sample.graph());
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,contagion_simulation=info,contagion=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.config();

    let records = args.records()?;
    let network = BankNetwork::from_records(&records).context("Failed to build bank network")?;
    info!(
        banks = network.bank_count(),
        source = %args.banks.as_deref().map_or("synthetic".into(), |p| p.display().to_string()),
        "Bank network ready"
    );

    if args.dump_network {
        dump_network(&network, config.seed)?;
    }

    let summary = simulate(&network, &config).context("Simulation failed")?;

    if let Some(path) = &args.results_csv {
        write_trial_results(create(path)?, &summary.outcome.results)
            .with_context(|| format!("Failed to write trial results to {}", path.display()))?;
    }

    match &args.output {
        Some(path) => {
            write_report(create(path)?, &summary.bins)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => write_report(io::stdout().lock(), &summary.bins).context("Failed to write report")?,
    }

    Ok(())
}
