//! Bar aligner: the shared trading-minute index.
//!
//! The aligned index is the intersection of every symbol's timestamps, sorted
//! ascending. Minutes where any symbol did not trade are absent; they are
//! never filled.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::domain::bar::BarSeries;
use crate::domain::error::PrepError;

/// The shared index plus, for each symbol, the position in that symbol's own
/// series of every aligned timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    pub index: Vec<DateTime<Utc>>,
    positions: BTreeMap<String, Vec<usize>>,
}

impl Alignment {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn positions(&self, symbol: &str) -> Option<&[usize]> {
        self.positions.get(symbol).map(Vec::as_slice)
    }

    /// Picks the aligned rows out of a column computed over a symbol's full
    /// history.
    pub fn gather<T: Copy>(&self, symbol: &str, full: &[Option<T>]) -> Option<Vec<Option<T>>> {
        let positions = self.positions.get(symbol)?;
        Some(positions.iter().map(|&p| full[p]).collect())
    }
}

pub fn align_bars(series: &BTreeMap<String, BarSeries>) -> Result<Alignment, PrepError> {
    if series.is_empty() {
        return Err(PrepError::unavailable("*", "no symbols supplied"));
    }

    let mut common: Option<BTreeSet<DateTime<Utc>>> = None;
    for (symbol, s) in series {
        if s.is_empty() {
            return Err(PrepError::unavailable(symbol, "bar series is empty"));
        }
        let stamps: BTreeSet<DateTime<Utc>> = s.bars.iter().map(|b| b.timestamp).collect();
        common = Some(match common {
            None => stamps,
            Some(acc) => acc.intersection(&stamps).copied().collect(),
        });
    }

    let index: Vec<DateTime<Utc>> = common.unwrap_or_default().into_iter().collect();
    if index.is_empty() {
        let names: Vec<&str> = series.keys().map(String::as_str).collect();
        return Err(PrepError::unavailable(
            &names.join(","),
            "timestamp intersection is empty",
        ));
    }

    let mut positions = BTreeMap::new();
    for (symbol, s) in series {
        let stamps = s.timestamps();
        let pos: Vec<usize> = index
            .iter()
            .filter_map(|ts| stamps.binary_search(ts).ok())
            .collect();
        if pos.len() != index.len() {
            return Err(PrepError::InvalidSeries {
                symbol: symbol.clone(),
                reason: "timestamps are not sorted ascending".to_string(),
            });
        }
        positions.insert(symbol.clone(), pos);
    }

    log::debug!(
        "aligned {} symbols onto {} shared minutes",
        series.len(),
        index.len()
    );

    Ok(Alignment { index, positions })
}
