//! Single contagion trial: rebuild the network, shock it, summarize.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cascade::{ShockError, ShockModel};
use crate::network::{BankNetwork, NetworkError};

#[derive(Debug, Error, PartialEq)]
pub enum TrialError {
    #[error("network construction failed: {0}")]
    Network(#[from] NetworkError),

    #[error("shock propagation failed: {0}")]
    Shock(#[from] ShockError),
}

/// Outcome of one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    pub num_links: usize,
    /// Banks that ended the trial with any shock at all.
    pub total_shocked: usize,
    pub max_shock: f64,
    pub min_shock: f64,
}

/// Snapshot of the network's current shock state.
///
/// The shocked count starts at zero and `min_shock` is the true minimum over
/// all banks (0.0 for an empty network).
pub fn summarize(network: &BankNetwork) -> TrialResult {
    let mut total_shocked = 0;
    let mut max_shock = 0.0_f64;
    let mut min_shock = f64::INFINITY;

    for bank in network.banks() {
        if bank.is_shocked() {
            total_shocked += 1;
        }
        max_shock = max_shock.max(bank.total_shock);
        min_shock = min_shock.min(bank.total_shock);
    }

    TrialResult {
        num_links: network.num_links(),
        total_shocked,
        max_shock,
        min_shock: if min_shock.is_finite() { min_shock } else { 0.0 },
    }
}

pub fn run_trial<R: Rng + ?Sized>(
    network: &mut BankNetwork,
    model: &ShockModel,
    impacts: usize,
    rng: &mut R,
) -> Result<TrialResult, TrialError> {
    network.reset_network();
    network.construct_network(rng)?;
    model.start_shock(network, impacts, rng)?;
    Ok(summarize(network))
}
