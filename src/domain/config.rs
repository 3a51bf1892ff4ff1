//! Pipeline configuration value.
//!
//! Built once (from defaults or a [`ConfigPort`]) and passed by reference into
//! every stage. Nothing downstream reads configuration from anywhere else.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::domain::error::PrepError;
use crate::domain::schema::TargetKind;
use crate::domain::session::TradingSession;
use crate::domain::split::{DEFAULT_TRAIN_RATIO, DEFAULT_VALIDATION_RATIO, SplitMode};
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureConfig {
    pub ema_spans: Vec<usize>,
    pub return_horizons: Vec<usize>,
    pub volatility_window: usize,
    pub volume_window: usize,
    pub correlation_window: usize,
}

impl FeatureConfig {
    /// Horizon of the short-horizon return used by the cross-asset features.
    pub fn cross_horizon(&self) -> usize {
        self.return_horizons.iter().copied().min().unwrap_or(0)
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ema_spans: vec![5, 10, 20],
            return_horizons: vec![5, 15, 30],
            volatility_window: 10,
            volume_window: 60,
            correlation_window: 15,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TargetConfig {
    pub horizons: Vec<usize>,
    pub kinds: Vec<TargetKind>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            horizons: vec![5, 15, 30],
            kinds: vec![TargetKind::Regression],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningConfig {
    pub return_bound: f64,
    pub volume_ratio_max: f64,
    pub volume_ratio_floor: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            return_bound: 0.05,
            volume_ratio_max: 10.0,
            volume_ratio_floor: 0.01,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrepConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub file_suffix: String,
    pub session: TradingSession,
    pub target: String,
    pub predictors: Vec<String>,
    pub features: FeatureConfig,
    pub targets: TargetConfig,
    pub cleaning: CleaningConfig,
    pub split: SplitMode,
}

impl Default for PrepConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data/raw"),
            output_dir: PathBuf::from("data/processed"),
            file_suffix: "_1m.csv".to_string(),
            session: TradingSession::regular_us_equities(),
            target: "QQQ".to_string(),
            predictors: ["NVDA", "AAPL", "MSFT", "GOOGL", "AMZN"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            features: FeatureConfig::default(),
            targets: TargetConfig::default(),
            cleaning: CleaningConfig::default(),
            split: SplitMode::default(),
        }
    }
}

impl PrepConfig {
    /// Target symbol first, then predictors in configured order.
    pub fn symbols(&self) -> Vec<String> {
        std::iter::once(self.target.clone())
            .chain(self.predictors.iter().cloned())
            .collect()
    }

    /// Reads every section, falling back to the reference defaults for
    /// absent keys. Malformed values are errors, not defaults.
    pub fn from_port(port: &dyn ConfigPort) -> Result<Self, PrepError> {
        let defaults = PrepConfig::default();

        let input_dir = port
            .get_string("data", "input_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.input_dir);
        let output_dir = port
            .get_string("data", "output_dir")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let file_suffix = port
            .get_string("data", "file_suffix")
            .unwrap_or(defaults.file_suffix);

        let tz = match port.get_string("data", "timezone") {
            Some(name) => name.trim().parse::<Tz>().map_err(|_| {
                PrepError::invalid_config("data", "timezone", format!("unknown time zone {name}"))
            })?,
            None => defaults.session.tz,
        };
        let open = parse_time(port, "session_open")?.unwrap_or(defaults.session.open);
        let close = parse_time(port, "session_close")?.unwrap_or(defaults.session.close);

        let target = port
            .get_string("universe", "target")
            .map(|s| s.trim().to_uppercase())
            .unwrap_or(defaults.target);
        let predictors = match port.get_string("universe", "predictors") {
            Some(list) => parse_symbols(&list)
                .map_err(|e| PrepError::invalid_config("universe", "predictors", e.to_string()))?,
            None => defaults.predictors,
        };

        let features = FeatureConfig {
            ema_spans: parse_usize_list(port, "features", "ema_spans")?
                .unwrap_or(defaults.features.ema_spans),
            return_horizons: parse_usize_list(port, "features", "return_horizons")?
                .unwrap_or(defaults.features.return_horizons),
            volatility_window: get_usize(port, "features", "volatility_window")?
                .unwrap_or(defaults.features.volatility_window),
            volume_window: get_usize(port, "features", "volume_window")?
                .unwrap_or(defaults.features.volume_window),
            correlation_window: get_usize(port, "features", "correlation_window")?
                .unwrap_or(defaults.features.correlation_window),
        };

        let targets = TargetConfig {
            horizons: parse_usize_list(port, "targets", "horizons")?
                .unwrap_or(defaults.targets.horizons),
            kinds: match port.get_string("targets", "kinds") {
                Some(s) => parse_target_kinds(&s)?,
                None => defaults.targets.kinds,
            },
        };

        let cleaning = CleaningConfig {
            return_bound: get_f64(port, "cleaning", "return_bound")?
                .unwrap_or(defaults.cleaning.return_bound),
            volume_ratio_max: get_f64(port, "cleaning", "volume_ratio_max")?
                .unwrap_or(defaults.cleaning.volume_ratio_max),
            volume_ratio_floor: get_f64(port, "cleaning", "volume_ratio_floor")?
                .unwrap_or(defaults.cleaning.volume_ratio_floor),
        };

        let split = parse_split_mode(port)?;

        Ok(PrepConfig {
            input_dir,
            output_dir,
            file_suffix,
            session: TradingSession::new(tz, open, close),
            target,
            predictors,
            features,
            targets,
            cleaning,
            split,
        })
    }
}

fn parse_time(port: &dyn ConfigPort, key: &str) -> Result<Option<NaiveTime>, PrepError> {
    port.get_string("data", key)
        .map(|s| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| {
                PrepError::invalid_config("data", key, "invalid time format (expected HH:MM)")
            })
        })
        .transpose()
}

fn get_usize(port: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<usize>, PrepError> {
    port.get_string(section, key)
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| PrepError::invalid_config(section, key, "expected a non-negative integer"))
        })
        .transpose()
}

fn get_f64(port: &dyn ConfigPort, section: &str, key: &str) -> Result<Option<f64>, PrepError> {
    port.get_string(section, key)
        .map(|s| {
            s.trim()
                .parse::<f64>()
                .map_err(|_| PrepError::invalid_config(section, key, "expected a number"))
        })
        .transpose()
}

fn parse_usize_list(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<usize>>, PrepError> {
    let Some(items) = port.get_list(section, key) else {
        return Ok(None);
    };
    items
        .iter()
        .map(|s| {
            s.parse::<usize>().map_err(|_| {
                PrepError::invalid_config(section, key, format!("{s} is not a non-negative integer"))
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

fn parse_target_kinds(value: &str) -> Result<Vec<TargetKind>, PrepError> {
    match value.trim().to_lowercase().as_str() {
        "regression" => Ok(vec![TargetKind::Regression]),
        "classification" | "direction" => Ok(vec![TargetKind::Direction]),
        "both" => Ok(vec![TargetKind::Regression, TargetKind::Direction]),
        other => Err(PrepError::invalid_config(
            "targets",
            "kinds",
            format!("unknown target kind {other} (expected regression, classification or both)"),
        )),
    }
}

fn parse_date(port: &dyn ConfigPort, key: &str) -> Result<NaiveDate, PrepError> {
    let value = port
        .get_string("split", key)
        .ok_or_else(|| PrepError::ConfigMissing {
            section: "split".to_string(),
            key: key.to_string(),
        })?;
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        PrepError::invalid_config("split", key, format!("invalid {key} format, expected YYYY-MM-DD"))
    })
}

fn parse_split_mode(port: &dyn ConfigPort) -> Result<SplitMode, PrepError> {
    let mode = port
        .get_string("split", "mode")
        .unwrap_or_else(|| "proportional".to_string());
    match mode.trim().to_lowercase().as_str() {
        "proportional" => Ok(SplitMode::Proportional {
            train_ratio: get_f64(port, "split", "train_ratio")?.unwrap_or(DEFAULT_TRAIN_RATIO),
            validation_ratio: get_f64(port, "split", "validation_ratio")?
                .unwrap_or(DEFAULT_VALIDATION_RATIO),
        }),
        "calendar" => Ok(SplitMode::Calendar {
            train_end: parse_date(port, "train_end")?,
            val_end: parse_date(port, "val_end")?,
            test_end: parse_date(port, "test_end")?,
        }),
        other => Err(PrepError::invalid_config(
            "split",
            "mode",
            format!("unknown split mode {other} (expected proportional or calendar)"),
        )),
    }
}
