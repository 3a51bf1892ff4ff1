//! Regular trading session calendar.
//!
//! Bars are stored as UTC instants; the session decides which instants are
//! regular-hours minutes and which exchange-local date they belong to.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingSession {
    pub tz: Tz,
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl TradingSession {
    pub fn new(tz: Tz, open: NaiveTime, close: NaiveTime) -> Self {
        Self { tz, open, close }
    }

    /// US equities: 09:30 to 16:00 America/New_York, Monday to Friday.
    pub fn regular_us_equities() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn local(&self, ts: DateTime<Utc>) -> DateTime<Tz> {
        ts.with_timezone(&self.tz)
    }

    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.local(ts).date_naive()
    }

    /// open <= local time < close on a weekday.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        let local = self.local(ts);
        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return false;
        }
        let time = local.time();
        self.open <= time && time < self.close
    }
}

impl Default for TradingSession {
    fn default() -> Self {
        Self::regular_us_equities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn open_is_inclusive_close_is_exclusive() {
        let session = TradingSession::regular_us_equities();
        // 2024-01-16 is a Tuesday, EST = UTC-5
        assert!(session.contains(utc(2024, 1, 16, 14, 30)));
        assert!(session.contains(utc(2024, 1, 16, 20, 59)));
        assert!(!session.contains(utc(2024, 1, 16, 21, 0)));
        assert!(!session.contains(utc(2024, 1, 16, 14, 29)));
    }

    #[test]
    fn daylight_saving_shifts_utc_open() {
        let session = TradingSession::regular_us_equities();
        // 2024-07-16, EDT = UTC-4
        assert!(session.contains(utc(2024, 7, 16, 13, 30)));
        assert!(!session.contains(utc(2024, 7, 16, 13, 29)));
    }

    #[test]
    fn weekends_are_closed() {
        let session = TradingSession::regular_us_equities();
        // 2024-01-13 is a Saturday
        assert!(!session.contains(utc(2024, 1, 13, 15, 0)));
        assert!(!session.contains(utc(2024, 1, 14, 15, 0)));
    }

    #[test]
    fn local_date_uses_exchange_zone() {
        let session = TradingSession::regular_us_equities();
        // 02:00 UTC on the 17th is still the 16th in New York
        assert_eq!(
            session.local_date(utc(2024, 1, 17, 2, 0)),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
    }
}
