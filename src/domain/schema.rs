//! Explicit column schema.
//!
//! Every column the pipeline produces is named by a [`ColumnId`], built once
//! from the configuration. Stages look columns up by id and classify them by
//! [`ColumnRole`]; nothing is discovered by matching substrings of names.

use std::fmt;

use crate::domain::config::PrepConfig;
use crate::domain::error::PrepError;
use crate::domain::table::FeatureTable;

/// Per-symbol derived quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    Close,
    Ema(usize),
    /// EMA(fast) - EMA(slow)
    EmaDiff,
    Return(usize),
    RealizedVol(usize),
    VolumeRatio(usize),
    VwapRatio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// (close[i+h] - close[i]) / close[i]
    Regression,
    /// 1 if close[i+h] > close[i] else 0
    Direction,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnId {
    Symbol { symbol: String, kind: FeatureKind },
    Correlation {
        target: String,
        predictor: String,
        window: usize,
    },
    RelativeStrength,
    MomentumLeader,
    Target { horizon: usize, kind: TargetKind },
}

/// How the cleaner and the statistics treat a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Price,
    Smoothing,
    Return,
    Volatility,
    VolumeRatio,
    Ratio,
    CrossAsset,
    Category,
    Target,
}

impl ColumnId {
    pub fn symbol(symbol: &str, kind: FeatureKind) -> Self {
        ColumnId::Symbol {
            symbol: symbol.to_string(),
            kind,
        }
    }

    pub fn role(&self) -> ColumnRole {
        match self {
            ColumnId::Symbol { kind, .. } => match kind {
                FeatureKind::Close => ColumnRole::Price,
                FeatureKind::Ema(_) | FeatureKind::EmaDiff => ColumnRole::Smoothing,
                FeatureKind::Return(_) => ColumnRole::Return,
                FeatureKind::RealizedVol(_) => ColumnRole::Volatility,
                FeatureKind::VolumeRatio(_) => ColumnRole::VolumeRatio,
                FeatureKind::VwapRatio => ColumnRole::Ratio,
            },
            ColumnId::Correlation { .. } | ColumnId::RelativeStrength => ColumnRole::CrossAsset,
            ColumnId::MomentumLeader => ColumnRole::Category,
            ColumnId::Target { .. } => ColumnRole::Target,
        }
    }

    pub fn is_target(&self) -> bool {
        self.role() == ColumnRole::Target
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnId::Symbol { symbol, kind } => match kind {
                FeatureKind::Close => write!(f, "{}_close", symbol),
                FeatureKind::Ema(span) => write!(f, "{}_ema_{}", symbol, span),
                FeatureKind::EmaDiff => write!(f, "{}_ema_diff", symbol),
                FeatureKind::Return(w) => write!(f, "{}_return_{}", symbol, w),
                FeatureKind::RealizedVol(w) => write!(f, "{}_realized_vol_{}", symbol, w),
                FeatureKind::VolumeRatio(_) => write!(f, "{}_volume_norm", symbol),
                FeatureKind::VwapRatio => write!(f, "{}_vwap_norm", symbol),
            },
            ColumnId::Correlation {
                target,
                predictor,
                window,
            } => write!(f, "corr_{}_{}_{}", target, predictor, window),
            ColumnId::RelativeStrength => write!(f, "relative_strength"),
            ColumnId::MomentumLeader => write!(f, "momentum_leader"),
            ColumnId::Target { horizon, kind } => match kind {
                TargetKind::Regression => write!(f, "target_{}m", horizon),
                TargetKind::Direction => write!(f, "target_dir_{}m", horizon),
            },
        }
    }
}

/// The full set of columns one pipeline run produces, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub target: String,
    pub predictors: Vec<String>,
    pub ema_spans: Vec<usize>,
    pub return_horizons: Vec<usize>,
    pub volatility_window: usize,
    pub volume_window: usize,
    pub correlation_window: usize,
    pub cross_horizon: usize,
    pub target_horizons: Vec<usize>,
    pub target_kinds: Vec<TargetKind>,
}

impl Schema {
    pub fn from_config(config: &PrepConfig) -> Self {
        Self {
            target: config.target.clone(),
            predictors: config.predictors.clone(),
            ema_spans: config.features.ema_spans.clone(),
            return_horizons: config.features.return_horizons.clone(),
            volatility_window: config.features.volatility_window,
            volume_window: config.features.volume_window,
            correlation_window: config.features.correlation_window,
            cross_horizon: config.features.cross_horizon(),
            target_horizons: config.targets.horizons.clone(),
            target_kinds: config.targets.kinds.clone(),
        }
    }

    /// Target symbol first, then predictors in configured order.
    pub fn symbols(&self) -> Vec<&str> {
        std::iter::once(self.target.as_str())
            .chain(self.predictors.iter().map(String::as_str))
            .collect()
    }

    /// Fastest and slowest configured EMA spans, used for `EmaDiff`.
    pub fn ema_pair(&self) -> Option<(usize, usize)> {
        let fast = self.ema_spans.iter().min()?;
        let slow = self.ema_spans.iter().max()?;
        (fast != slow).then_some((*fast, *slow))
    }

    pub fn symbol_kinds(&self, symbol: &str) -> Vec<FeatureKind> {
        let mut kinds = Vec::new();
        if symbol == self.target {
            kinds.push(FeatureKind::Close);
        }
        kinds.extend(self.ema_spans.iter().map(|&s| FeatureKind::Ema(s)));
        if self.ema_pair().is_some() {
            kinds.push(FeatureKind::EmaDiff);
        }
        kinds.extend(self.return_horizons.iter().map(|&w| FeatureKind::Return(w)));
        kinds.push(FeatureKind::RealizedVol(self.volatility_window));
        kinds.push(FeatureKind::VolumeRatio(self.volume_window));
        kinds.push(FeatureKind::VwapRatio);
        kinds
    }

    pub fn symbol_columns(&self, symbol: &str) -> Vec<ColumnId> {
        self.symbol_kinds(symbol)
            .into_iter()
            .map(|kind| ColumnId::symbol(symbol, kind))
            .collect()
    }

    pub fn aligned_columns(&self) -> Vec<ColumnId> {
        self.symbols()
            .into_iter()
            .flat_map(|s| self.symbol_columns(s))
            .collect()
    }

    pub fn cross_asset_columns(&self) -> Vec<ColumnId> {
        let mut cols: Vec<ColumnId> = self
            .predictors
            .iter()
            .map(|p| ColumnId::Correlation {
                target: self.target.clone(),
                predictor: p.clone(),
                window: self.correlation_window,
            })
            .collect();
        cols.push(ColumnId::RelativeStrength);
        cols.push(ColumnId::MomentumLeader);
        cols
    }

    pub fn target_columns(&self) -> Vec<ColumnId> {
        self.target_horizons
            .iter()
            .flat_map(|&horizon| {
                self.target_kinds
                    .iter()
                    .map(move |&kind| ColumnId::Target { horizon, kind })
            })
            .collect()
    }

    /// Every output column in order.
    pub fn all_columns(&self) -> Vec<ColumnId> {
        let mut cols = self.aligned_columns();
        cols.extend(self.cross_asset_columns());
        cols.extend(self.target_columns());
        cols
    }

    pub fn close_column(&self) -> ColumnId {
        ColumnId::symbol(&self.target, FeatureKind::Close)
    }

    pub fn cross_return_column(&self, symbol: &str) -> ColumnId {
        ColumnId::symbol(symbol, FeatureKind::Return(self.cross_horizon))
    }

    /// Fails with `SchemaMismatch` if any of `expected` is absent from `table`.
    pub fn expect(
        &self,
        table: &FeatureTable,
        expected: &[ColumnId],
        stage: &str,
    ) -> Result<(), PrepError> {
        match expected.iter().find(|id| !table.has_column(id)) {
            Some(missing) => Err(PrepError::SchemaMismatch {
                stage: stage.to_string(),
                column: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::from_config(&PrepConfig::default())
    }

    #[test]
    fn column_names_are_stable() {
        assert_eq!(
            ColumnId::symbol("QQQ", FeatureKind::Return(5)).to_string(),
            "QQQ_return_5"
        );
        assert_eq!(
            ColumnId::symbol("NVDA", FeatureKind::VolumeRatio(60)).to_string(),
            "NVDA_volume_norm"
        );
        assert_eq!(
            ColumnId::Correlation {
                target: "QQQ".into(),
                predictor: "AAPL".into(),
                window: 15
            }
            .to_string(),
            "corr_QQQ_AAPL_15"
        );
        assert_eq!(
            ColumnId::Target {
                horizon: 30,
                kind: TargetKind::Regression
            }
            .to_string(),
            "target_30m"
        );
        assert_eq!(
            ColumnId::Target {
                horizon: 5,
                kind: TargetKind::Direction
            }
            .to_string(),
            "target_dir_5m"
        );
    }

    #[test]
    fn roles_classify_columns() {
        assert_eq!(
            ColumnId::symbol("QQQ", FeatureKind::Return(15)).role(),
            ColumnRole::Return
        );
        assert_eq!(
            ColumnId::symbol("QQQ", FeatureKind::RealizedVol(10)).role(),
            ColumnRole::Volatility
        );
        assert_eq!(ColumnId::RelativeStrength.role(), ColumnRole::CrossAsset);
        assert!(
            ColumnId::Target {
                horizon: 5,
                kind: TargetKind::Regression
            }
            .is_target()
        );
    }

    #[test]
    fn only_target_symbol_keeps_close() {
        let s = schema();
        assert!(s.symbol_kinds("QQQ").contains(&FeatureKind::Close));
        assert!(!s.symbol_kinds("NVDA").contains(&FeatureKind::Close));
    }

    #[test]
    fn reference_schema_column_count() {
        let s = schema();
        // per symbol: 3 ema + diff + 3 returns + vol + volume + vwap = 10, target adds close
        assert_eq!(s.aligned_columns().len(), 11 + 5 * 10);
        // 5 correlations + relative strength + leader
        assert_eq!(s.cross_asset_columns().len(), 7);
        assert_eq!(s.target_columns().len(), 3);
        assert_eq!(s.cross_horizon, 5);
    }

    #[test]
    fn all_column_names_are_unique() {
        let names: Vec<String> = schema().all_columns().iter().map(|c| c.to_string()).collect();
        let unique: std::collections::HashSet<&String> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }

    #[test]
    fn ema_pair_requires_two_distinct_spans() {
        let mut s = schema();
        assert_eq!(s.ema_pair(), Some((5, 20)));
        s.ema_spans = vec![10];
        assert_eq!(s.ema_pair(), None);
        assert!(!s.symbol_kinds("QQQ").contains(&FeatureKind::EmaDiff));
    }
}
