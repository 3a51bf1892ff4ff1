//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_bar_source::CsvBarSource;
use crate::adapters::csv_stats_writer::write_stats;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::ipc_split_sink::IpcSplitSink;
use crate::domain::config::PrepConfig;
use crate::domain::config_validation::validate_prep_config;
use crate::domain::error::PrepError;
use crate::domain::pipeline::{self, PreparedDataset};
use crate::domain::schema::Schema;
use crate::domain::stats::describe;
use crate::ports::bar_source::BarSource;

#[derive(Parser, Debug)]
#[command(name = "barprep", about = "Leakage-free minute-bar dataset preparation")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build features and targets, then write train/validation/test artifacts
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Check configuration and input files without computing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file and print the resolved column schema
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Prepare the dataset in memory and write per-split column statistics
    Describe {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run { config, dry_run } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_prepare(&config)
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Describe { config, output } => run_describe(&config, output.as_deref()),
    }
}

fn fail(err: PrepError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

/// Loads and validates the configuration file.
pub fn load_config(path: &Path) -> Result<PrepConfig, PrepError> {
    let adapter = FileConfigAdapter::from_file(path)?;
    let config = PrepConfig::from_port(&adapter)?;
    validate_prep_config(&config)?;
    Ok(config)
}

fn bar_source(config: &PrepConfig) -> CsvBarSource {
    CsvBarSource::new(
        config.input_dir.clone(),
        config.file_suffix.clone(),
        config.session,
    )
}

fn print_schema(schema: &Schema) {
    let columns = schema.all_columns();
    println!("Target:     {}", schema.target);
    println!("Predictors: {}", schema.predictors.join(", "));
    println!("Columns ({}):", columns.len());
    for column in &columns {
        println!("  {column}");
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    println!("Configuration is valid.");
    println!("Split mode: {}", config.split.name());
    print_schema(&Schema::from_config(&config));
    ExitCode::SUCCESS
}

fn run_dry_run(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let source = bar_source(&config);
    let available = match source.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let missing: Vec<String> = config
        .symbols()
        .into_iter()
        .filter(|s| !available.contains(s))
        .collect();

    println!("Input:  {}", config.input_dir.display());
    println!("Output: {}", config.output_dir.display());
    print_schema(&Schema::from_config(&config));

    if missing.is_empty() {
        println!("All {} symbols have input files.", config.symbols().len());
        ExitCode::SUCCESS
    } else {
        fail(PrepError::DataUnavailable {
            symbol: missing.join(","),
            reason: format!("no input file in {}", config.input_dir.display()),
        })
    }
}

fn run_prepare(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let source = bar_source(&config);
    let sink = IpcSplitSink::new(config.output_dir.clone());

    match pipeline::run(&source, &sink, &config) {
        Ok(outcome) => {
            print_summary(&outcome.dataset);
            for path in &outcome.artifacts {
                println!("  {}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn print_summary(dataset: &PreparedDataset) {
    let report = &dataset.clean_report;
    println!(
        "Prepared {} rows x {} columns ({} rows in, {} dropped by cleaning)",
        dataset.table.len(),
        dataset.table.columns().len(),
        report.input_rows,
        report.input_rows - report.output_rows
    );
    for (kind, part) in dataset.splits.iter() {
        println!("  {:<10} {:>8} rows", kind.name(), part.len());
    }
}

fn run_describe(config_path: &Path, output: Option<&Path>) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let source = bar_source(&config);

    let mut series = std::collections::BTreeMap::new();
    for symbol in config.symbols() {
        match source.fetch_bars(&symbol) {
            Ok(s) => {
                series.insert(symbol, s);
            }
            Err(e) => return fail(e),
        }
    }

    let dataset = match pipeline::prepare(&series, &config) {
        Ok(d) => d,
        Err(e) => return fail(e),
    };
    print_summary(&dataset);

    let groups: Vec<(&str, Vec<_>)> = dataset
        .splits
        .iter()
        .map(|(kind, part)| (kind.name(), describe(part)))
        .collect();

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| config.output_dir.join("feature_stats.csv"));
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            return fail(e.into());
        }
    }
    if let Err(e) = write_stats(&path, &groups) {
        return fail(e);
    }
    println!("Statistics written to {}", path.display());
    ExitCode::SUCCESS
}
