//! tagsheet CLI - export records into a styled XLSX sheet

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tagsheet_io_xlsx::{
    C_SHEET_NAME_DEFAULT, SpecRecord, derive_default_write_options, derive_sample_records,
    write_records_to_xlsx,
};

#[derive(Parser)]
#[command(name = "tagsheet")]
#[command(author, version, about = "Export records into a styled XLSX sheet")]
struct Cli {
    /// Output XLSX file
    #[arg(short, long, default_value = "example_records.xlsx")]
    output: PathBuf,

    /// JSON file holding an array of records (default: built-in sample records)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Worksheet name
    #[arg(long, default_value = C_SHEET_NAME_DEFAULT)]
    sheet_name: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        log::error!("Failed to create Excel: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let records = match &cli.input {
        Some(path) => load_records(path)?,
        None => derive_sample_records(),
    };

    let mut options = derive_default_write_options();
    options.sheet_name = cli.sheet_name.clone();

    let report = write_records_to_xlsx(&records, &cli.output, &options)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    log::info!("{report}");
    log::info!(
        "Excel file created successfully: {}",
        cli.output.display()
    );
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<SpecRecord>> {
    let c_content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_json::from_str(&c_content)
        .with_context(|| format!("Failed to parse records from {}", path.display()))
}
