//! Folder-wide repair runs.
//!
//! A folder holds ground-truth tables `<stem>.csv` next to generated variants
//! `<stem>_<n>.csv`. Every variant is repaired against its ground truth and
//! one summary row per pair is written to a results CSV.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::BatchArgs,
    config::RepairConfig,
    io_utils,
    search::{self, RepairOutcome},
};

pub const DEFAULT_RESULTS_FILE: &str = "comparison_results.csv";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePair {
    pub generated: PathBuf,
    pub groundtruth: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub generate_file: String,
    pub groundtruth_file: String,
    pub initial_score: f64,
    pub best_score: f64,
    pub operations: usize,
    pub operation_log: String,
}

impl BatchRecord {
    fn new(pair: &TablePair, outcome: &RepairOutcome) -> Self {
        Self {
            generate_file: file_name(&pair.generated),
            groundtruth_file: file_name(&pair.groundtruth),
            initial_score: outcome.initial_score.score,
            best_score: outcome.final_score.score,
            operations: outcome.operations.len(),
            operation_log: outcome.operation_log().join("; "),
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `table_4_2` → `table_4`; `None` unless the suffix after the last `_` is numeric.
fn groundtruth_stem(stem: &str) -> Option<&str> {
    let (base, suffix) = stem.rsplit_once('_')?;
    (!base.is_empty() && !suffix.is_empty() && suffix.chars().all(|ch| ch.is_ascii_digit()))
        .then_some(base)
}

/// Pairs every `<stem>_<n>.csv` with an existing `<stem>.csv`, sorted by path.
pub fn discover_pairs(folder: &Path) -> Result<Vec<TablePair>> {
    let mut pairs = Vec::new();
    for entry in fs::read_dir(folder).with_context(|| format!("Listing folder {folder:?}"))? {
        let path = entry
            .with_context(|| format!("Reading entry in {folder:?}"))?
            .path();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let Some(base) = groundtruth_stem(stem) else {
            continue;
        };
        let groundtruth = folder.join(format!("{base}.csv"));
        if groundtruth.is_file() {
            pairs.push(TablePair {
                generated: path.clone(),
                groundtruth,
            });
        }
    }
    pairs.sort_by(|a, b| a.generated.cmp(&b.generated));
    Ok(pairs)
}

pub fn run_pair(
    pair: &TablePair,
    delimiter: Option<u8>,
    encoding: &'static encoding_rs::Encoding,
    config: &RepairConfig,
) -> Result<RepairOutcome> {
    let generated = io_utils::load_rows(
        &pair.generated,
        io_utils::resolve_input_delimiter(&pair.generated, delimiter),
        encoding,
    )?;
    let groundtruth = io_utils::load_rows(
        &pair.groundtruth,
        io_utils::resolve_input_delimiter(&pair.groundtruth, delimiter),
        encoding,
    )?;
    Ok(search::repair(&generated, &groundtruth, &[], config))
}

pub fn execute(args: &BatchArgs) -> Result<()> {
    let config = RepairConfig::load_optional(args.config.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let pairs = discover_pairs(&args.folder)?;
    info!("Found {} table pair(s) in {:?}", pairs.len(), args.folder);

    let mut records = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        info!("Repairing {:?} against {:?}", pair.generated, pair.groundtruth);
        match run_pair(pair, args.delimiter, encoding, &config) {
            Ok(outcome) => records.push(BatchRecord::new(pair, &outcome)),
            Err(err) => warn!("Skipping {:?}: {err:#}", pair.generated),
        }
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.folder.join(DEFAULT_RESULTS_FILE));
    let mut writer = io_utils::open_csv_writer(Some(&output), io_utils::DEFAULT_CSV_DELIMITER)?;
    for record in &records {
        writer
            .serialize(record)
            .with_context(|| format!("Writing result for {}", record.generate_file))?;
    }
    writer.flush().context("Flushing results")?;
    info!("Wrote {} result row(s) to {output:?}", records.len());
    Ok(())
}
