pub mod align;
pub mod batch;
pub mod cell;
pub mod classify;
pub mod cli;
pub mod config;
pub mod edits;
pub mod grid;
pub mod grid_distance;
pub mod io_utils;
pub mod matcher;
pub mod normalize;
pub mod operations;
pub mod reconstruct;
pub mod report;
pub mod residual;
pub mod score;
pub mod search;
pub mod table;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use encoding_rs::Encoding;
use log::{LevelFilter, debug, info};

use crate::{
    cli::{Cli, Commands, ReportFormat},
    config::RepairConfig,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("table_repair", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => handle_compare(&args),
        Commands::Repair(args) => handle_repair(&args),
        Commands::Edit(args) => edits::execute(&args),
        Commands::Batch(args) => batch::execute(&args),
        Commands::Distance(args) => grid_distance::execute(&args),
    }
}

fn load_table(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<Vec<Vec<String>>> {
    let delimiter = io_utils::resolve_input_delimiter(path, delimiter);
    info!(
        "Reading '{}' with delimiter '{}'",
        path.display(),
        printable_delimiter(delimiter)
    );
    io_utils::load_rows(path, delimiter, encoding)
        .with_context(|| format!("Loading table {path:?}"))
}

fn handle_compare(args: &cli::CompareArgs) -> Result<()> {
    let config = RepairConfig::load_optional(args.config.as_deref())?;
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let generated_rows = load_table(&args.generated, args.delimiter, encoding)?;
    let groundtruth_rows = load_table(&args.groundtruth, args.delimiter, encoding)?;

    let (mut generated, mut groundtruth) = search::prepare_grids(&generated_rows, &groundtruth_rows);
    let (classification, plan) = search::analyze(&mut generated, &mut groundtruth, &config);
    let score = score::score(&generated, &groundtruth);
    debug!("Comparison summary: {:?}", classification.summary());
    let report = report::compare_report(
        &args.generated,
        &args.groundtruth,
        score,
        plan,
        classification,
        &generated,
        &groundtruth,
    );
    match args.format {
        ReportFormat::Text => print!(
            "{}",
            report::render_compare_text(&report, &generated, &groundtruth)
        ),
        ReportFormat::Json => println!("{}", report::to_json(&report)?),
    }
    Ok(())
}

fn handle_repair(args: &cli::RepairArgs) -> Result<()> {
    let mut config = RepairConfig::load_optional(args.config.as_deref())?;
    if let Some(limit) = args.max_iterations {
        config.max_iterations = limit;
    }
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let generated_rows = load_table(&args.generated, args.delimiter, encoding)?;
    let groundtruth_rows = load_table(&args.groundtruth, args.delimiter, encoding)?;
    let edits = match &args.edits {
        Some(path) => edits::load_instructions(path)?,
        None => Vec::new(),
    };

    let outcome = search::repair(&generated_rows, &groundtruth_rows, &edits, &config);
    info!(
        "Repair finished after {} operation(s): {:.4} -> {:.4}",
        outcome.operations.len(),
        outcome.initial_score.score,
        outcome.final_score.score
    );

    if let Some(output) = &args.output {
        let delimiter = io_utils::resolve_input_delimiter(output, args.delimiter);
        io_utils::write_grid(Some(output), delimiter, &outcome.repaired)
            .with_context(|| format!("Writing repaired table to {output:?}"))?;
    }
    let to_stdout = args.output.as_deref().is_some_and(io_utils::is_dash);
    match args.format {
        ReportFormat::Json => {
            let report = report::repair_report(&args.generated, &args.groundtruth, &outcome);
            println!("{}", report::to_json(&report)?);
        }
        ReportFormat::Text if !to_stdout => {
            print!("{}", report::render_repair_text(&outcome));
            if args.output.is_none() {
                table::print_grid(&outcome.repaired);
            }
        }
        ReportFormat::Text => {}
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}
