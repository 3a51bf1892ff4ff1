//! CSV bar source.
//!
//! Reads `<input_dir>/<SYMBOL><suffix>`. Columns are addressed by header name:
//! `timestamp`, `open`, `high`, `low`, `close`, `volume` are required;
//! `trade_count` and `vwap` are optional. Timestamps carry a UTC offset
//! (`2024-01-16T09:30:00-05:00` or `2024-01-16 09:30:00-05:00`); naive
//! timestamps are read as UTC.

use crate::domain::bar::{Bar, BarSeries};
use crate::domain::error::PrepError;
use crate::domain::session::TradingSession;
use crate::ports::bar_source::BarSource;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fs;
use std::path::PathBuf;

pub struct CsvBarSource {
    base_path: PathBuf,
    suffix: String,
    session: TradingSession,
}

struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
    trade_count: Option<usize>,
    vwap: Option<usize>,
}

impl CsvBarSource {
    pub fn new(base_path: PathBuf, suffix: impl Into<String>, session: TradingSession) -> Self {
        Self {
            base_path,
            suffix: suffix.into(),
            session,
        }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", symbol, self.suffix))
    }
}

fn source_err(symbol: &str, reason: impl std::fmt::Display) -> PrepError {
    PrepError::Source {
        reason: format!("{symbol}: {reason}"),
    }
}

fn resolve_columns(symbol: &str, headers: &csv::StringRecord) -> Result<Columns, PrepError> {
    let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let require = |name: &str| {
        find(name).ok_or_else(|| PrepError::MissingColumn {
            symbol: symbol.to_string(),
            column: name.to_string(),
        })
    };
    Ok(Columns {
        timestamp: require("timestamp")?,
        open: require("open")?,
        high: require("high")?,
        low: require("low")?,
        close: require("close")?,
        volume: require("volume")?,
        trade_count: find("trade_count"),
        vwap: find("vwap"),
    })
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn field<'r>(symbol: &str, record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, PrepError> {
    record
        .get(idx)
        .map(str::trim)
        .ok_or_else(|| source_err(symbol, format!("row has no {name} field")))
}

fn parse_f64(symbol: &str, record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, PrepError> {
    let raw = field(symbol, record, idx, name)?;
    raw.parse()
        .map_err(|e| source_err(symbol, format!("invalid {name} value {raw:?}: {e}")))
}

/// Volumes are integers but some providers write them as `1234.0`.
fn parse_count(symbol: &str, record: &csv::StringRecord, idx: usize, name: &str) -> Result<u64, PrepError> {
    let raw = field(symbol, record, idx, name)?;
    if let Ok(v) = raw.parse::<u64>() {
        return Ok(v);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as u64),
        _ => Err(source_err(symbol, format!("invalid {name} value {raw:?}"))),
    }
}

/// Absent column or empty cell is `None`; anything else must parse.
fn parse_optional<T>(
    record: &csv::StringRecord,
    idx: Option<usize>,
    parse: impl FnOnce(usize) -> Result<T, PrepError>,
) -> Result<Option<T>, PrepError> {
    match idx {
        Some(i) if record.get(i).is_some_and(|s| !s.trim().is_empty()) => parse(i).map(Some),
        _ => Ok(None),
    }
}

impl BarSource for CsvBarSource {
    fn fetch_bars(&self, symbol: &str) -> Result<BarSeries, PrepError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| PrepError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| source_err(symbol, format!("CSV header error: {e}")))?
            .clone();
        let cols = resolve_columns(symbol, &headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| source_err(symbol, format!("CSV parse error: {e}")))?;

            let raw_ts = field(symbol, &record, cols.timestamp, "timestamp")?;
            let timestamp = parse_timestamp(raw_ts)
                .ok_or_else(|| source_err(symbol, format!("invalid timestamp {raw_ts:?}")))?;

            bars.push(Bar {
                timestamp,
                open: parse_f64(symbol, &record, cols.open, "open")?,
                high: parse_f64(symbol, &record, cols.high, "high")?,
                low: parse_f64(symbol, &record, cols.low, "low")?,
                close: parse_f64(symbol, &record, cols.close, "close")?,
                volume: parse_count(symbol, &record, cols.volume, "volume")?,
                trade_count: parse_optional(&record, cols.trade_count, |i| {
                    parse_count(symbol, &record, i, "trade_count")
                })?,
                vwap: parse_optional(&record, cols.vwap, |i| parse_f64(symbol, &record, i, "vwap"))?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        let before = bars.len();
        bars.dedup_by_key(|b| b.timestamp);
        if bars.len() < before {
            log::warn!("{}: dropped {} duplicate timestamps", symbol, before - bars.len());
        }

        let mut series = BarSeries::new(symbol, bars);
        let outside = series.retain_session(&self.session);
        if outside > 0 {
            log::warn!("{}: dropped {} bars outside the regular session", symbol, outside);
        }
        log::debug!("{}: read {} bars from {}", symbol, series.len(), path.display());

        Ok(series)
    }

    fn list_symbols(&self) -> Result<Vec<String>, PrepError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| PrepError::Source {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| PrepError::Source {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(symbol) = name_str.strip_suffix(&self.suffix) {
                if !symbol.is_empty() {
                    symbols.push(symbol.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        // 2024-01-16 is a Tuesday; the 16:00 row is after the close.
        let qqq = "timestamp,open,high,low,close,volume,trade_count,vwap\n\
            2024-01-16T09:31:00-05:00,101.0,102.0,100.5,101.5,1200,40,101.2\n\
            2024-01-16T09:30:00-05:00,100.0,101.0,99.5,100.5,1000,35,100.3\n\
            2024-01-16T16:00:00-05:00,102.0,102.0,102.0,102.0,500,10,102.0\n";
        fs::write(path.join("QQQ_1m.csv"), qqq).unwrap();

        let nvda = "timestamp,open,high,low,close,volume\n\
            2024-01-16 09:30:00-05:00,50.0,51.0,49.0,50.5,300.0\n";
        fs::write(path.join("NVDA_1m.csv"), nvda).unwrap();

        fs::write(path.join("BAD_1m.csv"), "timestamp,open,high,low,volume\n").unwrap();
        fs::write(path.join("notes.txt"), "ignore me").unwrap();

        (dir, path)
    }

    fn source(path: PathBuf) -> CsvBarSource {
        CsvBarSource::new(path, "_1m.csv", TradingSession::regular_us_equities())
    }

    #[test]
    fn fetch_bars_sorts_and_filters_session() {
        let (_dir, path) = setup_test_data();
        let series = source(path).fetch_bars("QQQ").unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(
            series.bars[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 16, 14, 30, 0).unwrap()
        );
        assert_eq!(series.bars[0].close, 100.5);
        assert_eq!(series.bars[0].volume, 1000);
        assert_eq!(series.bars[0].trade_count, Some(35));
        assert_eq!(series.bars[1].vwap, Some(101.2));
    }

    #[test]
    fn optional_columns_may_be_absent() {
        let (_dir, path) = setup_test_data();
        let series = source(path).fetch_bars("NVDA").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars[0].volume, 300);
        assert_eq!(series.bars[0].vwap, None);
        assert!(series.vwaps().is_none());
    }

    #[test]
    fn missing_required_header_is_missing_column() {
        let (_dir, path) = setup_test_data();
        let err = source(path).fetch_bars("BAD").unwrap_err();
        assert!(matches!(
            err,
            PrepError::MissingColumn { ref symbol, ref column } if symbol == "BAD" && column == "close"
        ));
    }

    #[test]
    fn empty_optional_cells_are_missing() {
        let dir = TempDir::new().unwrap();
        let csv = "timestamp,open,high,low,close,volume,trade_count,vwap\n\
            2024-01-16T09:30:00-05:00,100.0,101.0,99.5,100.5,1000,,\n";
        fs::write(dir.path().join("QQQ_1m.csv"), csv).unwrap();
        let series = source(dir.path().to_path_buf()).fetch_bars("QQQ").unwrap();
        assert_eq!(series.bars[0].trade_count, None);
        assert_eq!(series.bars[0].vwap, None);
    }

    #[test]
    fn malformed_optional_cells_are_source_errors() {
        let dir = TempDir::new().unwrap();
        let bad_vwap = "timestamp,open,high,low,close,volume,trade_count,vwap\n\
            2024-01-16T09:30:00-05:00,100.0,101.0,99.5,100.5,1000,35,n/a\n";
        let bad_count = "timestamp,open,high,low,close,volume,trade_count,vwap\n\
            2024-01-16T09:30:00-05:00,100.0,101.0,99.5,100.5,1000,-3,100.2\n";
        fs::write(dir.path().join("QQQ_1m.csv"), bad_vwap).unwrap();
        fs::write(dir.path().join("SPY_1m.csv"), bad_count).unwrap();
        let source = source(dir.path().to_path_buf());

        for symbol in ["QQQ", "SPY"] {
            let err = source.fetch_bars(symbol).unwrap_err();
            assert!(matches!(err, PrepError::Source { .. }), "{symbol}: {err:?}");
        }
    }

    #[test]
    fn missing_file_is_unavailable() {
        let (_dir, path) = setup_test_data();
        assert!(matches!(
            source(path).fetch_bars("XYZ"),
            Err(PrepError::DataUnavailable { .. })
        ));
    }

    #[test]
    fn list_symbols_matches_suffix() {
        let (_dir, path) = setup_test_data();
        let symbols = source(path).list_symbols().unwrap();
        assert_eq!(symbols, vec!["BAD", "NVDA", "QQQ"]);
    }

    #[test]
    fn timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 16, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-16T09:30:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-16 09:30:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-16T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-16 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
