//! Shock Propagation
//!
//! Models how distress at one bank spreads through its lending links.
//!
//! ## Propagation Rule
//! A bank hit by magnitude `m` with `k` neighbors:
//! 1. `m >= threshold`: keeps `m / (k + 1)` and passes the same share to
//!    every neighbor, which applies the rule again
//! 2. `m < threshold`: absorbs all of `m` and stops
//!
//! There is no visited set. A bank reachable along several paths (or around
//! a cycle) absorbs a share from each of them. The injected magnitude is
//! conserved: the sum of all `total_shock` increases equals `m`.
//!
//! ## Termination
//! Any propagating hop with `k >= 1` at least halves the magnitude, and a
//! bank with `k = 0` has nowhere to pass it. The depth of any hop is
//! therefore bounded by the number of halvings that keep `m` at or above the
//! threshold, plus one for the terminal hop. The work stack enforces this
//! bound and reports a violation as [`ShockError::RecursionDepthExceeded`].

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use thiserror::Error;

use crate::graph::NodeId;
use crate::network::BankNetwork;

pub const DEFAULT_THRESHOLD: f64 = 0.025;
pub const DEFAULT_INITIAL_MAGNITUDE: f64 = 1.0;

#[derive(Debug, Error, PartialEq)]
pub enum ShockError {
    #[error("network has no banks to shock")]
    EmptyNetwork,

    #[error("no bank with index {0}")]
    UnknownBank(usize),

    #[error("shock magnitude must be finite and non-negative, got {0}")]
    InvalidMagnitude(f64),

    #[error("propagation threshold must be finite and positive, got {0}")]
    InvalidThreshold(f64),

    #[error("propagation reached depth {depth}, ceiling is {ceiling}")]
    RecursionDepthExceeded { depth: usize, ceiling: usize },
}

/// Counters from one or more propagation runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Hops processed, terminal ones included.
    pub visits: usize,
    pub max_depth: usize,
}

impl PropagationStats {
    fn merge(&mut self, other: PropagationStats) {
        self.visits += other.visits;
        self.max_depth = self.max_depth.max(other.max_depth);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShockModel {
    threshold: f64,
    initial_magnitude: f64,
}

impl Default for ShockModel {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            initial_magnitude: DEFAULT_INITIAL_MAGNITUDE,
        }
    }
}

impl ShockModel {
    pub fn new(threshold: f64, initial_magnitude: f64) -> Result<Self, ShockError> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(ShockError::InvalidThreshold(threshold));
        }
        check_magnitude(initial_magnitude)?;
        Ok(Self {
            threshold,
            initial_magnitude,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn initial_magnitude(&self) -> f64 {
        self.initial_magnitude
    }

    /// Deepest hop (root = 0) a shock of `magnitude` can reach.
    pub fn depth_ceiling(&self, magnitude: f64) -> usize {
        let mut m = magnitude;
        let mut depth = 0;
        while m >= self.threshold {
            m /= 2.0;
            depth += 1;
        }
        depth
    }

    /// Applies `magnitude` to `bank` and propagates it through the network.
    ///
    /// Hops are processed depth-first in neighbor order, matching a
    /// recursive walk, so floating-point accumulation is reproducible.
    pub fn apply_shock(
        &self,
        network: &mut BankNetwork,
        bank: NodeId,
        magnitude: f64,
    ) -> Result<PropagationStats, ShockError> {
        check_magnitude(magnitude)?;
        let graph = network.graph_mut();
        if graph.node(bank).is_none() {
            return Err(ShockError::UnknownBank(bank.index()));
        }

        let ceiling = self.depth_ceiling(magnitude);
        let mut stats = PropagationStats::default();
        let mut pending = vec![(bank, magnitude, 0usize)];

        while let Some((id, m, depth)) = pending.pop() {
            if depth > ceiling {
                return Err(ShockError::RecursionDepthExceeded { depth, ceiling });
            }
            stats.visits += 1;
            stats.max_depth = stats.max_depth.max(depth);

            let node = graph
                .node_mut(id)
                .ok_or(ShockError::UnknownBank(id.index()))?;

            if m >= self.threshold {
                let share = m / (node.degree() + 1) as f64;
                node.data.total_shock += share;
                pending.extend(node.neighbours().iter().rev().map(|&n| (n, share, depth + 1)));
            } else {
                node.data.total_shock += m;
            }
        }

        Ok(stats)
    }

    /// Hits `impacts` banks, drawn uniformly with replacement, with the
    /// initial magnitude.
    pub fn start_shock<R: Rng + ?Sized>(
        &self,
        network: &mut BankNetwork,
        impacts: usize,
        rng: &mut R,
    ) -> Result<PropagationStats, ShockError> {
        let n = network.bank_count();
        if n == 0 {
            return Err(ShockError::EmptyNetwork);
        }

        let pick = Uniform::new(0, n);
        let mut stats = PropagationStats::default();
        for _ in 0..impacts {
            let target = NodeId(pick.sample(rng));
            stats.merge(self.apply_shock(network, target, self.initial_magnitude)?);
        }
        Ok(stats)
    }
}

fn check_magnitude(magnitude: f64) -> Result<(), ShockError> {
    if magnitude.is_finite() && magnitude >= 0.0 {
        Ok(())
    } else {
        Err(ShockError::InvalidMagnitude(magnitude))
    }
}
