//! Interbank Network
//!
//! A [`Graph`] of [`Bank`]s whose lending links are redrawn every trial.
//!
//! ## Construction
//! With `n` banks the link count is `floor(n + U(0,1) * n^2)`, so density
//! varies from trial to trial and doubles as the binning key later on.
//! Each link joins two distinct banks chosen uniformly; a collision on the
//! second endpoint is redrawn. Every link is bidirectional.
//!
//! ## Lifecycle
//! Bank identities and balance-sheet figures persist for the life of the
//! network. [`BankNetwork::reset_network`] drops all links and shock state
//! so the same network can be rebuilt for the next trial.

use rand::Rng;
use rand_distr::{Distribution, Uniform};
use thiserror::Error;

use crate::graph::{DuplicateNode, Graph, NodeId};
use crate::loader::BankRecord;

#[derive(Debug, Error, PartialEq)]
pub enum NetworkError {
    #[error("network has no banks")]
    EmptyNetwork,

    #[error("cannot draw a link between distinct banks in a network of {bank_count}")]
    DegenerateIndex { bank_count: usize },

    #[error("unknown bank '{0}'")]
    UnknownBank(String),

    #[error(transparent)]
    DuplicateBank(#[from] DuplicateNode),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Bank {
    pub assets: f64,
    pub deposits: f64,
    /// Shock absorbed during the current trial. Never decreases until reset.
    pub total_shock: f64,
}

impl Bank {
    pub fn new(assets: f64, deposits: f64) -> Self {
        Self {
            assets,
            deposits,
            total_shock: 0.0,
        }
    }

    pub fn is_shocked(&self) -> bool {
        self.total_shock > 0.0
    }
}

#[derive(Clone, Debug, Default)]
pub struct BankNetwork {
    graph: Graph<Bank>,
    num_links: usize,
}

impl BankNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<'a, I>(records: I) -> Result<Self, NetworkError>
    where
        I: IntoIterator<Item = &'a BankRecord>,
    {
        let mut network = Self::new();
        for record in records {
            network.add_bank(&record.name, Bank::new(record.assets, record.deposits))?;
        }
        Ok(network)
    }

    pub fn add_bank(&mut self, name: &str, bank: Bank) -> Result<NodeId, NetworkError> {
        Ok(self.graph.insert(name, bank)?)
    }

    pub fn graph(&self) -> &Graph<Bank> {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut Graph<Bank> {
        &mut self.graph
    }

    pub fn bank_count(&self) -> usize {
        self.graph.len()
    }

    /// Bidirectional links added since the last
    /// [`reset_network`](Self::reset_network), drawn or manual.
    pub fn num_links(&self) -> usize {
        self.num_links
    }

    pub fn bank(&self, id: NodeId) -> Option<&Bank> {
        self.graph.node(id).map(|n| &n.data)
    }

    pub fn total_shock(&self, name: &str) -> Option<f64> {
        self.graph
            .get(name)
            .and_then(|id| self.bank(id))
            .map(|b| b.total_shock)
    }

    pub fn banks(&self) -> impl Iterator<Item = &Bank> {
        self.graph.nodes().iter().map(|n| &n.data)
    }

    fn lookup(&self, name: &str) -> Result<NodeId, NetworkError> {
        self.graph
            .get(name)
            .ok_or_else(|| NetworkError::UnknownBank(name.to_string()))
    }

    /// Adds one bidirectional link between two existing banks.
    pub fn link_banks(&mut self, a: &str, b: &str) -> Result<(), NetworkError> {
        let a = self.lookup(a)?;
        let b = self.lookup(b)?;
        self.graph.add_link(a, b);
        self.graph.add_link(b, a);
        self.num_links += 1;
        Ok(())
    }

    /// Draws a fresh random topology on top of the current links and returns
    /// the number of bidirectional links added. Call
    /// [`reset_network`](Self::reset_network) first to start from scratch.
    pub fn construct_network<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<usize, NetworkError> {
        let n = self.graph.len();
        match n {
            0 => return Err(NetworkError::EmptyNetwork),
            1 => return Err(NetworkError::DegenerateIndex { bank_count: 1 }),
            _ => {}
        }

        let density: f64 = rng.gen();
        let num_links = (n as f64 + density * (n * n) as f64).floor() as usize;
        let pick = Uniform::new(0, n);

        for _ in 0..num_links {
            let x = pick.sample(rng);
            let mut y = pick.sample(rng);
            while y == x {
                y = pick.sample(rng);
            }
            self.graph.add_link(NodeId(x), NodeId(y));
            self.graph.add_link(NodeId(y), NodeId(x));
        }

        self.num_links += num_links;
        Ok(num_links)
    }

    pub fn reset_network(&mut self) {
        self.graph.clear_links();
        for node in self.graph.nodes_mut() {
            node.data.total_shock = 0.0;
        }
        self.num_links = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn network_of(n: usize) -> BankNetwork {
        let mut network = BankNetwork::new();
        for i in 0..n {
            network
                .add_bank(&format!("bank-{}", i), Bank::new(100.0 + i as f64, 50.0))
                .unwrap();
        }
        network
    }

    #[test]
    fn test_link_count_within_density_range() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut network = network_of(10);
        for _ in 0..50 {
            network.reset_network();
            let links = network.construct_network(&mut rng).unwrap();
            assert!(links >= 10 && links < 10 + 100);
            assert_eq!(network.graph().edge_count(), links * 2);
        }
    }

    #[test]
    fn test_construct_never_creates_self_links() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut network = network_of(2);
        for _ in 0..100 {
            network.reset_network();
            network.construct_network(&mut rng).unwrap();
            for (from, to) in network.graph().edges() {
                assert_ne!(from, to);
            }
        }
    }

    #[test]
    fn test_seeded_construction_is_reproducible() {
        let mut first = network_of(8);
        let mut second = network_of(8);
        let a = first
            .construct_network(&mut ChaCha8Rng::seed_from_u64(42))
            .unwrap();
        let b = second
            .construct_network(&mut ChaCha8Rng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(first.graph().edges(), second.graph().edges());
    }

    #[test]
    fn test_degenerate_networks_are_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert_eq!(
            BankNetwork::new().construct_network(&mut rng),
            Err(NetworkError::EmptyNetwork)
        );
        assert_eq!(
            network_of(1).construct_network(&mut rng),
            Err(NetworkError::DegenerateIndex { bank_count: 1 })
        );
    }

    #[test]
    fn test_reset_clears_links_and_shock_but_keeps_banks() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut network = network_of(5);
        network.construct_network(&mut rng).unwrap();
        network.graph_mut().node_mut(NodeId(2)).unwrap().data.total_shock = 0.4;

        network.reset_network();

        assert_eq!(network.num_links(), 0);
        assert_eq!(network.graph().edge_count(), 0);
        assert_eq!(network.bank_count(), 5);
        let bank = network.bank(NodeId(2)).unwrap();
        assert_eq!(bank.total_shock, 0.0);
        assert_eq!(bank.assets, 102.0);
        assert_eq!(network.graph().nodes()[2].name(), "bank-2");
    }

    #[test]
    fn test_construct_counts_on_top_of_manual_links() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let mut network = network_of(4);
        network.link_banks("bank-0", "bank-3").unwrap();

        let drawn = network.construct_network(&mut rng).unwrap();

        assert_eq!(network.num_links(), drawn + 1);
        assert_eq!(network.graph().edge_count(), 2 * network.num_links());
    }

    #[test]
    fn test_duplicate_bank_rejected() {
        let mut network = network_of(2);
        assert!(matches!(
            network.add_bank("bank-0", Bank::default()),
            Err(NetworkError::DuplicateBank(_))
        ));
    }
}
