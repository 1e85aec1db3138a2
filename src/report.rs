//! CSV rendering of bin summaries and raw trial results.

use std::io::Write;

use csv::Writer;

use crate::stats::{BinStatistics, BinSummary};
use crate::trial::TrialResult;

pub const REPORT_HEADER: [&str; 11] = [
    "Links",
    "Avg links per node",
    "#Results",
    "Avg Node Shocked",
    "Avg Max Shock",
    "Avg Min Shock",
    "Max Max Shock",
    "Max Min Shock",
    "Stdev Nodes Shocked",
    "Stdev Max Shock",
    "Stdev Min Shock",
];

/// Cells for one bin. Empty bins leave the eight statistic cells blank.
pub fn report_row(bin: &BinSummary) -> Vec<String> {
    let mut row = vec![
        bin.links.to_string(),
        bin.links_per_node.to_string(),
        bin.stats.count().to_string(),
    ];
    match &bin.stats {
        BinStatistics::Empty => row.extend(std::iter::repeat(String::new()).take(8)),
        BinStatistics::Populated(m) => row.extend(
            [
                m.avg_shocked,
                m.avg_max_shock,
                m.avg_min_shock,
                m.max_max_shock,
                m.min_min_shock,
                m.stdev_shocked,
                m.stdev_max_shock,
                m.stdev_min_shock,
            ]
            .iter()
            .map(f64::to_string),
        ),
    }
    row
}

pub fn write_report<W: Write>(out: W, bins: &[BinSummary]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(REPORT_HEADER)?;
    for bin in bins {
        writer.write_record(report_row(bin))?;
    }
    writer.flush()?;
    Ok(())
}

/// One row per trial: `num_links,total_shocked,max_shock,min_shock`.
pub fn write_trial_results<W: Write>(out: W, results: &[TrialResult]) -> Result<(), csv::Error> {
    let mut writer = Writer::from_writer(out);
    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;
    Ok(())
}
