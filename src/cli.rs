use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Score extracted tables against ground truth and repair them",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Classify every cell of a generated table against its ground truth and report the score
    Compare(CompareArgs),
    /// Search for the operations that turn a generated table into its ground truth
    Repair(RepairArgs),
    /// Apply JSON edit instructions to the tables in a folder
    Edit(EditArgs),
    /// Repair every `<stem>_<n>.csv` in a folder against `<stem>.csv`
    Batch(BatchArgs),
    /// Compute the 2D Levenshtein distance between two tables
    Distance(DistanceArgs),
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Generated (extracted) table
    #[arg(short = 'g', long = "generated")]
    pub generated: PathBuf,
    /// Ground-truth table
    #[arg(short = 't', long = "groundtruth")]
    pub groundtruth: PathBuf,
    /// Report layout
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
    /// Optional YAML or JSON file overriding the repair settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RepairArgs {
    /// Generated (extracted) table
    #[arg(short = 'g', long = "generated")]
    pub generated: PathBuf,
    /// Ground-truth table
    #[arg(short = 't', long = "groundtruth")]
    pub groundtruth: PathBuf,
    /// Write the repaired table here (`-` for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// JSON edit instructions applied to the generated table before the search
    #[arg(long)]
    pub edits: Option<PathBuf>,
    /// Report layout
    #[arg(long, value_enum, default_value = "text")]
    pub format: ReportFormat,
    /// Optional YAML or JSON file overriding the repair settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Override the configured iteration cap
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Folder holding the tables the instructions refer to
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// JSON file with `{fileName, action, details}` instructions
    #[arg(short = 'j', long = "instructions")]
    pub instructions: PathBuf,
    /// Folder for `<stem>_edited.csv` outputs (defaults to next to each input)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Folder holding ground-truth tables and their numbered variants
    #[arg(short = 'f', long = "folder")]
    pub folder: PathBuf,
    /// Results CSV (defaults to comparison_results.csv inside the folder)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Optional YAML or JSON file overriding the repair settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct DistanceArgs {
    /// Generated (extracted) table
    #[arg(short = 'g', long = "generated")]
    pub generated: PathBuf,
    /// Ground-truth table
    #[arg(short = 't', long = "groundtruth")]
    pub groundtruth: PathBuf,
    /// Treat `1,234.5` and `1234.5` as the same cell
    #[arg(long = "ignore-comma")]
    pub ignore_comma: bool,
    /// CSV delimiter character
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
