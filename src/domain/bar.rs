//! Minute bar and per-symbol bar series.

use chrono::{DateTime, Utc};

use crate::domain::error::PrepError;
use crate::domain::session::TradingSession;

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub trade_count: Option<u64>,
    pub vwap: Option<f64>,
}

/// One symbol's bars, ordered by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume as f64).collect()
    }

    /// VWAP per bar, or `None` when no bar carries a VWAP at all (the column
    /// is absent from the source table).
    pub fn vwaps(&self) -> Option<Vec<Option<f64>>> {
        if self.bars.iter().all(|b| b.vwap.is_none()) {
            return None;
        }
        Some(self.bars.iter().map(|b| b.vwap).collect())
    }

    /// Checks the acquisition contract: strictly increasing timestamps,
    /// positive prices, and every bar inside the regular session.
    pub fn validate(&self, session: &TradingSession) -> Result<(), PrepError> {
        for (i, bar) in self.bars.iter().enumerate() {
            if i > 0 && bar.timestamp <= self.bars[i - 1].timestamp {
                return Err(self.invalid(format!(
                    "timestamp {} is not after {}",
                    bar.timestamp,
                    self.bars[i - 1].timestamp
                )));
            }
            let prices = [bar.open, bar.high, bar.low, bar.close];
            if prices.iter().any(|p| !(p.is_finite() && *p > 0.0)) {
                return Err(self.invalid(format!("non-positive price at {}", bar.timestamp)));
            }
            if !session.contains(bar.timestamp) {
                return Err(self.invalid(format!(
                    "bar at {} is outside the regular session",
                    session.local(bar.timestamp)
                )));
            }
        }
        Ok(())
    }

    /// Drops bars outside the regular session. Returns how many were removed.
    pub fn retain_session(&mut self, session: &TradingSession) -> usize {
        let before = self.bars.len();
        self.bars.retain(|b| session.contains(b.timestamp));
        before - self.bars.len()
    }

    fn invalid(&self, reason: String) -> PrepError {
        PrepError::InvalidSeries {
            symbol: self.symbol.clone(),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn bar_at(ts: DateTime<Utc>, close: f64) -> Bar {
        Bar {
            timestamp: ts,
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1_000,
            trade_count: Some(10),
            vwap: Some(close),
        }
    }

    fn open_utc() -> DateTime<Utc> {
        // Tuesday 2024-01-16 09:30 EST
        Utc.with_ymd_and_hms(2024, 1, 16, 14, 30, 0).unwrap()
    }

    #[test]
    fn validate_accepts_ordered_session_bars() {
        let start = open_utc();
        let bars = (0..5)
            .map(|i| bar_at(start + Duration::minutes(i), 100.0 + i as f64))
            .collect();
        let series = BarSeries::new("QQQ", bars);
        assert!(series.validate(&TradingSession::default()).is_ok());
    }

    #[test]
    fn validate_rejects_duplicate_timestamp() {
        let start = open_utc();
        let series = BarSeries::new("QQQ", vec![bar_at(start, 100.0), bar_at(start, 101.0)]);
        let err = series.validate(&TradingSession::default()).unwrap_err();
        assert!(matches!(err, PrepError::InvalidSeries { ref symbol, .. } if symbol == "QQQ"));
    }

    #[test]
    fn validate_rejects_non_positive_price() {
        let series = BarSeries::new("QQQ", vec![bar_at(open_utc(), 0.0)]);
        assert!(series.validate(&TradingSession::default()).is_err());
    }

    #[test]
    fn validate_rejects_pre_market_bar() {
        let series = BarSeries::new(
            "QQQ",
            vec![bar_at(open_utc() - Duration::minutes(1), 100.0)],
        );
        assert!(series.validate(&TradingSession::default()).is_err());
    }

    #[test]
    fn retain_session_drops_extended_hours() {
        let start = open_utc();
        let mut series = BarSeries::new(
            "QQQ",
            vec![
                bar_at(start - Duration::minutes(5), 99.0),
                bar_at(start, 100.0),
                bar_at(start + Duration::minutes(390), 101.0),
            ],
        );
        let dropped = series.retain_session(&TradingSession::default());
        assert_eq!(dropped, 2);
        assert_eq!(series.len(), 1);
        assert_eq!(series.bars[0].timestamp, start);
    }

    #[test]
    fn vwaps_absent_when_no_bar_has_one() {
        let mut bar = bar_at(open_utc(), 100.0);
        bar.vwap = None;
        let series = BarSeries::new("QQQ", vec![bar]);
        assert!(series.vwaps().is_none());
    }
}
