//! Monte Carlo Driver
//!
//! Runs many independent contagion trials and bins their outcomes by
//! network density.
//!
//! ## Parallelism
//! Trials run on a rayon pool. Each worker clones the bank network once and
//! reuses the clone for every trial it picks up, so no network is ever
//! shared between threads.
//!
//! ## Reproducibility
//! Trial `i` draws from its own `ChaCha8Rng` seeded with `seed + i`, and
//! results are collected in trial order. The output depends only on the
//! banks and the configuration, never on the thread count.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cascade::ShockModel;
use crate::config::{ConfigError, SimulationConfig};
use crate::network::BankNetwork;
use crate::stats::{aggregate_bins, BinSummary};
use crate::trial::{run_trial, TrialError, TrialResult};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("all {trials} trials failed, first error: {first}")]
    AllTrialsFailed { trials: usize, first: TrialError },
}

#[derive(Debug, Clone)]
pub struct MonteCarloOutcome {
    /// Successful trials, in trial order.
    pub results: Vec<TrialResult>,
    pub failed_trials: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub outcome: MonteCarloOutcome,
    pub bins: Vec<BinSummary>,
}

pub fn run_monte_carlo(
    network: &BankNetwork,
    config: &SimulationConfig,
) -> Result<MonteCarloOutcome, SimulationError> {
    config.validate()?;
    let model = config.shock_model()?;

    info!(
        trials = config.trials,
        banks = network.bank_count(),
        impacts = config.impacts,
        seed = config.seed,
        threads = ?config.threads,
        "Starting Monte Carlo run"
    );
    let start = Instant::now();

    let run = || run_trials(network, &model, config);
    let outcomes = match config.threads {
        Some(threads) => rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()?
            .install(run),
        None => run(),
    };

    let mut results = Vec::with_capacity(outcomes.len());
    let mut first_error = None;
    let mut failed_trials = 0;
    for (trial, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => {
                if first_error.is_none() {
                    warn!(trial, error = %err, "Trial failed");
                    first_error = Some(err);
                }
                failed_trials += 1;
            }
        }
    }

    if results.is_empty() {
        if let Some(first) = first_error {
            return Err(SimulationError::AllTrialsFailed {
                trials: config.trials,
                first,
            });
        }
    }
    if failed_trials > 0 {
        warn!(failed_trials, "Some trials were abandoned");
    }

    info!(
        completed = results.len(),
        failed_trials,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Monte Carlo run finished"
    );

    Ok(MonteCarloOutcome {
        results,
        failed_trials,
    })
}

fn run_trials(
    network: &BankNetwork,
    model: &ShockModel,
    config: &SimulationConfig,
) -> Vec<Result<TrialResult, TrialError>> {
    (0..config.trials)
        .into_par_iter()
        .map_init(
            || network.clone(),
            |worker_network, i| {
                let mut rng = ChaCha8Rng::seed_from_u64(config.seed.wrapping_add(i as u64));
                run_trial(worker_network, model, config.impacts, &mut rng)
            },
        )
        .collect()
}

/// Runs every trial and bins the results.
pub fn simulate(
    network: &BankNetwork,
    config: &SimulationConfig,
) -> Result<SimulationSummary, SimulationError> {
    let outcome = run_monte_carlo(network, config)?;
    let bins = aggregate_bins(&outcome.results, config.max_bins, config.links_per_node_divisor);
    debug!(
        bins = bins.len(),
        populated = bins.iter().filter(|b| b.stats.count() > 0).count(),
        "Aggregated trial results"
    );
    Ok(SimulationSummary { outcome, bins })
}
