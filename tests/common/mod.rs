#![allow(dead_code)]

use barprep::domain::bar::{Bar, BarSeries};
use barprep::domain::config::PrepConfig;
use barprep::domain::error::PrepError;
use barprep::domain::schema::TargetKind;
use barprep::domain::split::SplitSet;
use barprep::ports::bar_source::BarSource;
use barprep::ports::split_sink::SplitSink;
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::America::New_York;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// New York local wall-clock time as a UTC instant.
pub fn ny(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    New_York
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

/// `n` consecutive regular-session minutes starting at 09:30 on `start`,
/// rolling over to the next weekday after 15:59.
pub fn session_minutes(start: NaiveDate, n: usize) -> Vec<DateTime<Utc>> {
    let mut out = Vec::with_capacity(n);
    let mut day = start;
    while out.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let open = ny(day.year(), day.month(), day.day(), 9, 30);
            for m in 0..390 {
                if out.len() == n {
                    break;
                }
                out.push(open + Duration::minutes(m));
            }
        }
        day = day.succ_opt().unwrap();
    }
    out
}

pub fn make_bar(timestamp: DateTime<Utc>, close: f64, volume: u64) -> Bar {
    Bar {
        timestamp,
        open: close,
        high: close * 1.0005,
        low: close * 0.9995,
        close,
        volume,
        trade_count: Some(volume / 10),
        vwap: Some(close * 1.0001),
    }
}

pub fn make_series(symbol: &str, timestamps: &[DateTime<Utc>], closes: &[f64]) -> BarSeries {
    let bars = timestamps
        .iter()
        .zip(closes)
        .enumerate()
        .map(|(i, (ts, close))| make_bar(*ts, *close, 1_000 + ((i * 37 + 11) % 17) as u64 * 10))
        .collect();
    BarSeries::new(symbol, bars)
}

/// Smooth, deterministic price path: small enough moves to pass the cleaner.
pub fn wave_closes(n: usize, phase: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let x = i as f64;
            100.0 + (x * 0.3 + phase).sin() + 0.5 * (x * 0.071 + 2.0 * phase).cos() + 0.002 * x
        })
        .collect()
}

pub fn wave_series(symbol: &str, timestamps: &[DateTime<Utc>], phase: f64) -> BarSeries {
    make_series(symbol, timestamps, &wave_closes(timestamps.len(), phase))
}

/// Target plus predictors with identical session minutes.
pub fn universe(config: &PrepConfig, n: usize) -> BTreeMap<String, BarSeries> {
    let minutes = session_minutes(date(2024, 1, 16), n);
    config
        .symbols()
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), wave_series(s, &minutes, i as f64)))
        .collect()
}

/// Short windows so a few hundred rows exercise every stage.
pub fn small_config() -> PrepConfig {
    let mut config = PrepConfig::default();
    config.predictors = vec!["NVDA".into(), "AAPL".into(), "MSFT".into()];
    config.features.ema_spans = vec![3, 6, 12];
    config.features.return_horizons = vec![2, 5];
    config.features.volatility_window = 5;
    config.features.volume_window = 20;
    config.features.correlation_window = 8;
    config.targets.horizons = vec![1, 3, 5];
    config.targets.kinds = vec![TargetKind::Regression, TargetKind::Direction];
    config
}

pub struct MockBarSource {
    pub data: HashMap<String, BarSeries>,
    pub errors: HashMap<String, String>,
}

impl MockBarSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_series(mut self, series: BarSeries) -> Self {
        self.data.insert(series.symbol.clone(), series);
        self
    }

    pub fn with_universe(mut self, universe: BTreeMap<String, BarSeries>) -> Self {
        self.data.extend(universe);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl BarSource for MockBarSource {
    fn fetch_bars(&self, symbol: &str) -> Result<BarSeries, PrepError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(PrepError::Source {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| BarSeries::new(symbol, Vec::new())))
    }

    fn list_symbols(&self) -> Result<Vec<String>, PrepError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

/// Sink that keeps every persisted split set in memory.
pub struct RecordingSink {
    pub persisted: RefCell<Vec<SplitSet>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            persisted: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.persisted.borrow().len()
    }
}

impl SplitSink for RecordingSink {
    fn persist(&self, splits: &SplitSet) -> Result<Vec<PathBuf>, PrepError> {
        self.persisted.borrow_mut().push(splits.clone());
        Ok(vec![
            PathBuf::from("train"),
            PathBuf::from("validation"),
            PathBuf::from("test"),
        ])
    }
}
