//! Bank record ingestion.
//!
//! Records are CSV rows of `name, assets, deposits` with no header by
//! default. Extra trailing fields are ignored.

use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, Trim};
use rand::Rng;
use rand_distr::{Distribution, LogNormal, NormalError, Uniform};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("invalid bank record on line {line}: {reason}")]
    InvalidBankRecord { line: u64, reason: String },

    #[error("failed to read bank records: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to open bank records: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid synthetic bank distribution: {0}")]
    Distribution(#[from] NormalError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankRecord {
    pub name: String,
    pub assets: f64,
    pub deposits: f64,
}

/// What to do with a malformed row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordPolicy {
    #[default]
    Abort,
    Skip,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BankLoader {
    pub policy: RecordPolicy,
    pub has_headers: bool,
}

impl BankLoader {
    pub fn new(policy: RecordPolicy) -> Self {
        Self {
            policy,
            has_headers: false,
        }
    }

    pub fn with_headers(mut self, has_headers: bool) -> Self {
        self.has_headers = has_headers;
        self
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<BankRecord>, LoadError> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "Loading bank records");
        self.read(file)
    }

    pub fn read<R: Read>(&self, source: R) -> Result<Vec<BankRecord>, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(self.has_headers)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(source);

        let mut banks: Vec<BankRecord> = Vec::new();
        let mut seen = HashSet::new();
        let mut skipped = 0usize;

        for row in reader.byte_records() {
            let row = row?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let parsed = parse_record(&row).and_then(|bank| {
                if seen.insert(bank.name.clone()) {
                    Ok(bank)
                } else {
                    Err(format!("duplicate bank name '{}'", bank.name))
                }
            });

            match parsed {
                Ok(bank) => banks.push(bank),
                Err(reason) => match self.policy {
                    RecordPolicy::Abort => return Err(LoadError::InvalidBankRecord { line, reason }),
                    RecordPolicy::Skip => {
                        warn!(line, %reason, "Skipping invalid bank record");
                        skipped += 1;
                    }
                },
            }
        }

        debug!(loaded = banks.len(), skipped, "Bank records loaded");
        Ok(banks)
    }
}

fn parse_record(row: &ByteRecord) -> Result<BankRecord, String> {
    if row.len() < 3 {
        return Err(format!("expected 3 fields, found {}", row.len()));
    }
    let name = field_str("name", &row[0])?;
    if name.is_empty() {
        return Err("empty bank name".to_string());
    }
    Ok(BankRecord {
        name: name.to_string(),
        assets: parse_amount("assets", field_str("assets", &row[1])?)?,
        deposits: parse_amount("deposits", field_str("deposits", &row[2])?)?,
    })
}

fn field_str<'a>(field: &str, raw: &'a [u8]) -> Result<&'a str, String> {
    std::str::from_utf8(raw).map_err(|e| format!("{} is not valid UTF-8: {}", field, e))
}

fn parse_amount(field: &str, raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("{} is not a finite number: '{}'", field, raw)),
    }
}

/// Generates `count` banks named `bank-<i>` with log-normal assets and a
/// deposit base of 40-90% of assets.
pub fn synthetic_banks<R: Rng + ?Sized>(
    count: usize,
    rng: &mut R,
) -> Result<Vec<BankRecord>, LoadError> {
    // Median assets of 1e9 with a heavy right tail.
    let assets = LogNormal::new(20.7, 1.2)?;
    let deposit_ratio = Uniform::new(0.4, 0.9);

    Ok((0..count)
        .map(|i| {
            let a: f64 = assets.sample(rng);
            BankRecord {
                name: format!("bank-{}", i),
                assets: a,
                deposits: a * deposit_ratio.sample(rng),
            }
        })
        .collect())
}
