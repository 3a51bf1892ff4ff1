//! Temporal splitter.
//!
//! Partitions the cleaned, labeled table into train, validation and test
//! without reordering rows. Either by row position (proportional) or by
//! exchange-local calendar cutoffs, never both.

use chrono::NaiveDate;

use crate::domain::error::PrepError;
use crate::domain::session::TradingSession;
use crate::domain::table::FeatureTable;

pub const DEFAULT_TRAIN_RATIO: f64 = 0.70;
pub const DEFAULT_VALIDATION_RATIO: f64 = 0.15;

#[derive(Debug, Clone, PartialEq)]
pub enum SplitMode {
    /// First `train_ratio` of rows, next `validation_ratio`, remainder to test.
    Proportional {
        train_ratio: f64,
        validation_ratio: f64,
    },
    /// Inclusive cutoffs on the bar's exchange-local date. Rows after
    /// `test_end` belong to no split.
    Calendar {
        train_end: NaiveDate,
        val_end: NaiveDate,
        test_end: NaiveDate,
    },
}

impl Default for SplitMode {
    fn default() -> Self {
        SplitMode::Proportional {
            train_ratio: DEFAULT_TRAIN_RATIO,
            validation_ratio: DEFAULT_VALIDATION_RATIO,
        }
    }
}

impl SplitMode {
    pub fn validate(&self) -> Result<(), PrepError> {
        match *self {
            SplitMode::Proportional {
                train_ratio,
                validation_ratio,
            } => {
                if !(train_ratio > 0.0 && train_ratio < 1.0) {
                    return Err(PrepError::split(format!(
                        "train_ratio must be in (0, 1), got {train_ratio}"
                    )));
                }
                if !(validation_ratio > 0.0 && validation_ratio < 1.0) {
                    return Err(PrepError::split(format!(
                        "validation_ratio must be in (0, 1), got {validation_ratio}"
                    )));
                }
                if train_ratio + validation_ratio >= 1.0 {
                    return Err(PrepError::split(
                        "train_ratio + validation_ratio must leave rows for test",
                    ));
                }
                Ok(())
            }
            SplitMode::Calendar {
                train_end,
                val_end,
                test_end,
            } => {
                if !(train_end < val_end && val_end < test_end) {
                    return Err(PrepError::split(format!(
                        "cutoff dates must be strictly increasing: {train_end}, {val_end}, {test_end}"
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SplitMode::Proportional { .. } => "proportional",
            SplitMode::Calendar { .. } => "calendar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitKind {
    Train,
    Validation,
    Test,
}

impl SplitKind {
    pub const ALL: [SplitKind; 3] = [SplitKind::Train, SplitKind::Validation, SplitKind::Test];

    pub fn name(self) -> &'static str {
        match self {
            SplitKind::Train => "train",
            SplitKind::Validation => "validation",
            SplitKind::Test => "test",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SplitSet {
    pub train: FeatureTable,
    pub validation: FeatureTable,
    pub test: FeatureTable,
}

impl SplitSet {
    pub fn get(&self, kind: SplitKind) -> &FeatureTable {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Validation => &self.validation,
            SplitKind::Test => &self.test,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (SplitKind, &FeatureTable)> {
        SplitKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }

    pub fn total_rows(&self) -> usize {
        self.iter().map(|(_, t)| t.len()).sum()
    }
}

pub fn split_table(
    table: &FeatureTable,
    mode: &SplitMode,
    session: &TradingSession,
) -> Result<SplitSet, PrepError> {
    mode.validate()?;

    let set = match *mode {
        SplitMode::Proportional {
            train_ratio,
            validation_ratio,
        } => {
            let n = table.len();
            let train_end = (n as f64 * train_ratio).floor() as usize;
            let val_end = ((n as f64 * (train_ratio + validation_ratio)).floor() as usize).min(n);
            SplitSet {
                train: table.slice(0..train_end),
                validation: table.slice(train_end..val_end),
                test: table.slice(val_end..n),
            }
        }
        SplitMode::Calendar {
            train_end,
            val_end,
            test_end,
        } => {
            let mut train = Vec::new();
            let mut validation = Vec::new();
            let mut test = Vec::new();
            let mut excluded = 0usize;
            for (row, ts) in table.index().iter().enumerate() {
                let date = session.local_date(*ts);
                if date <= train_end {
                    train.push(row);
                } else if date <= val_end {
                    validation.push(row);
                } else if date <= test_end {
                    test.push(row);
                } else {
                    excluded += 1;
                }
            }
            if excluded > 0 {
                log::warn!("{excluded} rows after {test_end} excluded from every split");
            }
            SplitSet {
                train: table.select_rows(&train),
                validation: table.select_rows(&validation),
                test: table.select_rows(&test),
            }
        }
    };

    for (kind, part) in set.iter() {
        if part.is_empty() {
            return Err(PrepError::split(format!(
                "{} split is empty ({} mode, {} input rows)",
                kind.name(),
                mode.name(),
                table.len()
            )));
        }
    }

    for (kind, part) in set.iter() {
        if let (Some(first), Some(last)) = (part.first_timestamp(), part.last_timestamp()) {
            log::info!(
                "{}: {} rows, {} to {}",
                kind.name(),
                part.len(),
                session.local_date(first),
                session.local_date(last)
            );
        }
    }

    Ok(set)
}
