//! Simulation parameters.

use thiserror::Error;

use crate::cascade::{ShockError, ShockModel, DEFAULT_INITIAL_MAGNITUDE, DEFAULT_THRESHOLD};

pub const DEFAULT_TRIALS: usize = 1_000_000;
pub const DEFAULT_IMPACTS: usize = 10;
pub const DEFAULT_MAX_BINS: usize = 2_700;
/// Fixed normalization for the "links per node" column. Not derived from
/// the actual bank count.
pub const DEFAULT_LINKS_PER_NODE_DIVISOR: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("trial count must be positive")]
    NoTrials,

    #[error("links-per-node divisor must be finite and positive, got {0}")]
    InvalidDivisor(f64),

    #[error("thread count must be positive")]
    NoThreads,

    #[error(transparent)]
    Shock(#[from] ShockError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub trials: usize,
    /// Banks hit with the initial shock in each trial.
    pub impacts: usize,
    /// Bins `0..max_bins` appear in the report.
    pub max_bins: usize,
    pub threshold: f64,
    pub initial_magnitude: f64,
    pub links_per_node_divisor: f64,
    /// Trial `i` is seeded with `seed + i`.
    pub seed: u64,
    /// Worker threads; `None` uses rayon's global pool.
    pub threads: Option<usize>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            impacts: DEFAULT_IMPACTS,
            max_bins: DEFAULT_MAX_BINS,
            threshold: DEFAULT_THRESHOLD,
            initial_magnitude: DEFAULT_INITIAL_MAGNITUDE,
            links_per_node_divisor: DEFAULT_LINKS_PER_NODE_DIVISOR,
            seed: 0,
            threads: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_impacts(mut self, impacts: usize) -> Self {
        self.impacts = impacts;
        self
    }

    pub fn with_max_bins(mut self, max_bins: usize) -> Self {
        self.max_bins = max_bins;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_initial_magnitude(mut self, magnitude: f64) -> Self {
        self.initial_magnitude = magnitude;
        self
    }

    pub fn with_links_per_node_divisor(mut self, divisor: f64) -> Self {
        self.links_per_node_divisor = divisor;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn shock_model(&self) -> Result<ShockModel, ConfigError> {
        Ok(ShockModel::new(self.threshold, self.initial_magnitude)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trials == 0 {
            return Err(ConfigError::NoTrials);
        }
        if !(self.links_per_node_divisor.is_finite() && self.links_per_node_divisor > 0.0) {
            return Err(ConfigError::InvalidDivisor(self.links_per_node_divisor));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::NoThreads);
        }
        self.shock_model()?;
        Ok(())
    }
}
