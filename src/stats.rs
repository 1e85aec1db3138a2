//! Per-Density Statistics
//!
//! Groups trial results by link count and summarizes each group.
//!
//! ## Metrics
//! For every bin with at least one trial:
//! - Mean, maximum/minimum and population standard deviation of the
//!   per-trial results
//! - `links_per_node`, the bin's link count over a fixed divisor
//!
//! Bins with no trials are reported as [`BinStatistics::Empty`] rather than
//! as NaN-filled rows.

use rayon::prelude::*;
use tracing::debug;

use crate::trial::TrialResult;

#[derive(Debug, Clone, PartialEq)]
pub struct BinMetrics {
    pub count: usize,
    pub avg_shocked: f64,
    pub avg_max_shock: f64,
    pub avg_min_shock: f64,
    pub max_max_shock: f64,
    pub min_min_shock: f64,
    pub stdev_shocked: f64,
    pub stdev_max_shock: f64,
    pub stdev_min_shock: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BinStatistics {
    Empty,
    Populated(BinMetrics),
}

impl BinStatistics {
    pub fn count(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Populated(m) => m.count,
        }
    }

    pub fn metrics(&self) -> Option<&BinMetrics> {
        match self {
            Self::Empty => None,
            Self::Populated(m) => Some(m),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinSummary {
    pub links: usize,
    pub links_per_node: f64,
    pub stats: BinStatistics,
}

fn mean(values: impl Iterator<Item = f64>, n: f64) -> f64 {
    values.sum::<f64>() / n
}

fn population_stdev(values: impl Iterator<Item = f64>, mean: f64, n: f64) -> f64 {
    (values.map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Summarizes one bin. Returns `Empty` when `results` is empty.
pub fn bin_statistics(results: &[&TrialResult]) -> BinStatistics {
    if results.is_empty() {
        return BinStatistics::Empty;
    }
    let n = results.len() as f64;

    let shocked = || results.iter().map(|r| r.total_shocked as f64);
    let max_shock = || results.iter().map(|r| r.max_shock);
    let min_shock = || results.iter().map(|r| r.min_shock);

    let avg_shocked = mean(shocked(), n);
    let avg_max_shock = mean(max_shock(), n);
    let avg_min_shock = mean(min_shock(), n);

    BinStatistics::Populated(BinMetrics {
        count: results.len(),
        avg_shocked,
        avg_max_shock,
        avg_min_shock,
        max_max_shock: max_shock().fold(f64::NEG_INFINITY, f64::max),
        min_min_shock: min_shock().fold(f64::INFINITY, f64::min),
        stdev_shocked: population_stdev(shocked(), avg_shocked, n),
        stdev_max_shock: population_stdev(max_shock(), avg_max_shock, n),
        stdev_min_shock: population_stdev(min_shock(), avg_min_shock, n),
    })
}

/// One summary per link count in `0..max_bins`, in increasing order.
///
/// Results with `num_links >= max_bins` fall outside every bin and are
/// dropped.
pub fn aggregate_bins(
    results: &[TrialResult],
    max_bins: usize,
    links_per_node_divisor: f64,
) -> Vec<BinSummary> {
    let mut bins: Vec<Vec<&TrialResult>> = vec![Vec::new(); max_bins];
    let mut out_of_range = 0usize;
    for result in results {
        match bins.get_mut(result.num_links) {
            Some(bin) => bin.push(result),
            None => out_of_range += 1,
        }
    }
    if out_of_range > 0 {
        debug!(out_of_range, max_bins, "Trials beyond the last bin were dropped");
    }

    bins.par_iter()
        .enumerate()
        .map(|(links, bin)| BinSummary {
            links,
            links_per_node: links as f64 / links_per_node_divisor,
            stats: bin_statistics(bin),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(num_links: usize, total_shocked: usize, max_shock: f64, min_shock: f64) -> TrialResult {
        TrialResult {
            num_links,
            total_shocked,
            max_shock,
            min_shock,
        }
    }

    #[test]
    fn test_two_result_bin() {
        let results = vec![result(5, 3, 0.8, 0.1), result(5, 5, 0.6, 0.2)];
        let bins = aggregate_bins(&results, 10, 50.0);

        let metrics = bins[5].stats.metrics().expect("bin 5 populated");
        assert_eq!(metrics.count, 2);
        assert!((metrics.avg_shocked - 4.0).abs() < 1e-12);
        assert!((metrics.avg_max_shock - 0.7).abs() < 1e-12);
        assert!((metrics.avg_min_shock - 0.15).abs() < 1e-12);
        assert!((metrics.stdev_shocked - 1.0).abs() < 1e-12);
        assert!((metrics.stdev_max_shock - 0.1).abs() < 1e-12);
        assert!((metrics.stdev_min_shock - 0.05).abs() < 1e-12);
        assert_eq!(metrics.max_max_shock, 0.8);
        assert_eq!(metrics.min_min_shock, 0.1);
    }

    #[test]
    fn test_empty_bins_are_marked() {
        let results = vec![result(2, 1, 0.5, 0.0)];
        let bins = aggregate_bins(&results, 4, 50.0);

        assert_eq!(bins.len(), 4);
        for (links, bin) in bins.iter().enumerate() {
            assert_eq!(bin.links, links);
        }
        assert_eq!(bins[0].stats, BinStatistics::Empty);
        assert_eq!(bins[0].stats.count(), 0);
        assert_eq!(bins[2].stats.count(), 1);
        assert!(bins[3].stats.metrics().is_none());
    }

    #[test]
    fn test_single_sample_has_zero_spread() {
        let r = result(1, 7, 0.9, 0.3);
        match bin_statistics(&[&r]) {
            BinStatistics::Populated(m) => {
                assert_eq!(m.avg_shocked, 7.0);
                assert_eq!(m.stdev_shocked, 0.0);
                assert_eq!(m.stdev_max_shock, 0.0);
            }
            BinStatistics::Empty => panic!("expected populated bin"),
        }
    }

    #[test]
    fn test_out_of_range_results_dropped() {
        let results = vec![result(3, 1, 0.2, 0.1), result(30, 2, 0.4, 0.2)];
        let bins = aggregate_bins(&results, 5, 50.0);
        let total: usize = bins.iter().map(|b| b.stats.count()).sum();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_links_per_node_uses_divisor() {
        let bins = aggregate_bins(&[], 101, 50.0);
        assert_eq!(bins[100].links_per_node, 2.0);
        assert_eq!(bins[25].links_per_node, 0.5);
    }

    #[test]
    fn test_result_order_does_not_matter() {
        let mut results = vec![
            result(2, 1, 0.5, 0.0),
            result(2, 3, 0.7, 0.1),
            result(1, 2, 0.4, 0.2),
        ];
        let forward = aggregate_bins(&results, 3, 50.0);
        results.reverse();
        let backward = aggregate_bins(&results, 3, 50.0);
        for (a, b) in forward.iter().zip(&backward) {
            assert_eq!(a.stats.count(), b.stats.count());
            if let (Some(x), Some(y)) = (a.stats.metrics(), b.stats.metrics()) {
                assert!((x.avg_shocked - y.avg_shocked).abs() < 1e-12);
                assert!((x.stdev_max_shock - y.stdev_max_shock).abs() < 1e-12);
            }
        }
    }
}
