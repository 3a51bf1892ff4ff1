//! Per-symbol feature engine.
//!
//! Features are computed over each symbol's full history, before alignment
//! truncation, so rolling windows at the start of the aligned index already
//! have their warm-up. The aligned rows are then gathered into one table.

use std::collections::BTreeMap;

use crate::domain::align::Alignment;
use crate::domain::bar::BarSeries;
use crate::domain::error::PrepError;
use crate::domain::indicator::ema::{calculate_ema, ema_diff};
use crate::domain::indicator::returns::calculate_return;
use crate::domain::indicator::volatility::calculate_realized_vol;
use crate::domain::indicator::volume::{calculate_vwap_ratio, calculate_volume_ratio};
use crate::domain::schema::{ColumnId, FeatureKind, Schema};
use crate::domain::table::FeatureTable;

/// Named feature columns over one symbol's full history.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFeatures {
    pub symbol: String,
    pub columns: Vec<(FeatureKind, Vec<Option<f64>>)>,
}

impl SymbolFeatures {
    pub fn get(&self, kind: FeatureKind) -> Option<&[Option<f64>]> {
        self.columns
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, v)| v.as_slice())
    }
}

pub fn compute_symbol_features(
    series: &BarSeries,
    schema: &Schema,
) -> Result<SymbolFeatures, PrepError> {
    let closes = series.closes();
    let volumes = series.volumes();
    let vwaps = series.vwaps().ok_or_else(|| PrepError::MissingColumn {
        symbol: series.symbol.clone(),
        column: "vwap".to_string(),
    })?;

    let mut emas: BTreeMap<usize, Vec<Option<f64>>> = BTreeMap::new();
    for &span in &schema.ema_spans {
        emas.insert(span, calculate_ema(&closes, span));
    }

    let mut columns = Vec::new();
    for kind in schema.symbol_kinds(&series.symbol) {
        let values = match kind {
            FeatureKind::Close => closes.iter().map(|&c| Some(c)).collect(),
            FeatureKind::Ema(span) => emas
                .get(&span)
                .cloned()
                .unwrap_or_else(|| calculate_ema(&closes, span)),
            FeatureKind::EmaDiff => match schema.ema_pair() {
                Some((fast, slow)) => match (emas.get(&fast), emas.get(&slow)) {
                    (Some(f), Some(s)) => ema_diff(f, s),
                    _ => vec![None; closes.len()],
                },
                None => vec![None; closes.len()],
            },
            FeatureKind::Return(w) => calculate_return(&closes, w),
            FeatureKind::RealizedVol(w) => calculate_realized_vol(&closes, w),
            FeatureKind::VolumeRatio(w) => calculate_volume_ratio(&volumes, w),
            FeatureKind::VwapRatio => calculate_vwap_ratio(&vwaps, &closes),
        };
        columns.push((kind, values));
    }

    log::debug!(
        "{}: {} feature columns over {} bars",
        series.symbol,
        columns.len(),
        closes.len()
    );

    Ok(SymbolFeatures {
        symbol: series.symbol.clone(),
        columns,
    })
}

/// Computes every symbol's features and joins them onto the aligned index,
/// target symbol first, predictors in configured order.
pub fn build_aligned_table(
    series: &BTreeMap<String, BarSeries>,
    alignment: &Alignment,
    schema: &Schema,
) -> Result<FeatureTable, PrepError> {
    let mut table = FeatureTable::new(alignment.index.clone());

    for symbol in schema.symbols() {
        let s = series
            .get(symbol)
            .ok_or_else(|| PrepError::unavailable(symbol, "no bar series supplied"))?;
        let features = compute_symbol_features(s, schema)?;
        for (kind, full) in &features.columns {
            let aligned = alignment
                .gather(symbol, full)
                .ok_or_else(|| PrepError::unavailable(symbol, "symbol missing from alignment"))?;
            table.insert_float(ColumnId::symbol(symbol, *kind), aligned);
        }
    }

    schema.expect(&table, &schema.aligned_columns(), "feature join")?;
    Ok(table)
}
