//! Stage composition.
//!
//! Stages run strictly in order; each consumes the complete table of the
//! previous one and is checked against the schema before the next starts.
//! [`prepare`] is pure. [`run`] adds the two I/O edges: reading bars at the
//! start and persisting the splits at the very end, after every fallible
//! stage has succeeded.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::domain::align::align_bars;
use crate::domain::bar::BarSeries;
use crate::domain::cleaner::{CleanReport, clean};
use crate::domain::config::PrepConfig;
use crate::domain::config_validation::validate_prep_config;
use crate::domain::cross_asset::add_cross_asset_features;
use crate::domain::error::PrepError;
use crate::domain::features::build_aligned_table;
use crate::domain::schema::Schema;
use crate::domain::split::{SplitSet, split_table};
use crate::domain::table::FeatureTable;
use crate::domain::targets::add_targets;
use crate::ports::bar_source::BarSource;
use crate::ports::split_sink::SplitSink;

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDataset {
    pub schema: Schema,
    /// Cleaned, labeled table before splitting.
    pub table: FeatureTable,
    pub splits: SplitSet,
    pub clean_report: CleanReport,
}

#[derive(Debug)]
pub struct RunOutcome {
    pub dataset: PreparedDataset,
    pub artifacts: Vec<PathBuf>,
}

pub fn prepare(
    series: &BTreeMap<String, BarSeries>,
    config: &PrepConfig,
) -> Result<PreparedDataset, PrepError> {
    validate_prep_config(config)?;
    let schema = Schema::from_config(config);

    let mut universe = BTreeMap::new();
    for symbol in schema.symbols() {
        let s = series
            .get(symbol)
            .ok_or_else(|| PrepError::unavailable(symbol, "no bar series supplied"))?;
        s.validate(&config.session)?;
        universe.insert(symbol.to_string(), s.clone());
    }
    for extra in series.keys().filter(|k| !universe.contains_key(*k)) {
        log::debug!("ignoring {extra}: not in the configured universe");
    }

    let alignment = align_bars(&universe)?;
    log::info!(
        "aligned {} symbols: {} shared minutes",
        universe.len(),
        alignment.len()
    );

    let mut table = build_aligned_table(&universe, &alignment, &schema)?;
    log::info!("per-symbol features: {} columns", table.columns().len());

    add_cross_asset_features(&mut table, &schema)?;
    schema.expect(&table, &schema.cross_asset_columns(), "cross-asset features")?;

    add_targets(&mut table, &schema)?;
    schema.expect(&table, &schema.target_columns(), "target generation")?;

    let (table, clean_report) = clean(table, &config.cleaning);
    schema.expect(&table, &schema.all_columns(), "cleaning")?;

    let splits = split_table(&table, &config.split, &config.session)?;

    Ok(PreparedDataset {
        schema,
        table,
        splits,
        clean_report,
    })
}

/// Fetches every configured symbol, prepares the dataset and persists the
/// three splits. Nothing is written unless every stage succeeded.
pub fn run(
    source: &dyn BarSource,
    sink: &dyn SplitSink,
    config: &PrepConfig,
) -> Result<RunOutcome, PrepError> {
    validate_prep_config(config)?;

    let mut series = BTreeMap::new();
    for symbol in config.symbols() {
        let bars = source.fetch_bars(&symbol)?;
        log::info!("{}: {} bars", symbol, bars.len());
        series.insert(symbol, bars);
    }

    let dataset = prepare(&series, config)?;
    let artifacts = sink.persist(&dataset.splits)?;
    for path in &artifacts {
        log::info!("wrote {}", path.display());
    }

    Ok(RunOutcome { dataset, artifacts })
}
