//! Interbank Contagion Simulation Library
//!
//! Monte Carlo model of systemic risk in a randomly wired interbank
//! network. Each trial rewires the network, shocks a handful of banks and
//! lets the distress decay across lending links; the trial outcomes are
//! then binned by how densely the network was wired.
//!
//! ## Modules
//!
//! - `graph`: named directed graph used as the network substrate
//! - `network`: bank network with random link construction
//! - `cascade`: decayed shock propagation
//! - `trial`: one trial and its summary
//! - `monte_carlo`: parallel, seeded execution of many trials
//! - `stats`: per-density bin statistics
//! - `loader`: bank records from CSV, or synthetic ones
//! - `report`: CSV report output
//! - `config`: simulation parameters
//!
//! ## Usage
//!
//! ```bash
//! # 10k trials over 50 synthetic banks
//! cargo run --bin contagion --release -- --trials 10000
//!
//! # Reference run over a bank list
//! cargo run --bin contagion --release -- --banks banks.csv --output report.csv
//! ```

pub mod cascade;
pub mod config;
pub mod graph;
pub mod loader;
pub mod monte_carlo;
pub mod network;
pub mod report;
pub mod stats;
pub mod trial;

pub use cascade::{PropagationStats, ShockError, ShockModel};
pub use config::{ConfigError, SimulationConfig};
pub use graph::{Graph, Node, NodeId};
pub use loader::{synthetic_banks, BankLoader, BankRecord, LoadError, RecordPolicy};
pub use monte_carlo::{run_monte_carlo, simulate, MonteCarloOutcome, SimulationError, SimulationSummary};
pub use network::{Bank, BankNetwork, NetworkError};
pub use stats::{aggregate_bins, BinMetrics, BinStatistics, BinSummary};
pub use trial::{run_trial, summarize, TrialError, TrialResult};
