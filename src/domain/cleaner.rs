//! Outlier and missing-data cleaner.
//!
//! Runs after target generation, on feature columns only. Steps, in order:
//!
//! 1. drop rows where any return feature is outside `±return_bound`
//! 2. floor volume ratios at `volume_ratio_floor`
//! 3. drop rows where any volume ratio exceeds `volume_ratio_max`
//! 4. replace zero realized volatility with missing
//! 5. forward-fill feature columns (never backward)
//! 6. drop rows still holding a missing value in any column
//!
//! Row drops come before the forward-fill so no value is carried from a row
//! that is about to be discarded.

use crate::domain::config::CleaningConfig;
use crate::domain::schema::ColumnRole;
use crate::domain::table::{ColumnValues, FeatureTable};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub input_rows: usize,
    pub return_outliers: usize,
    pub volume_floored: usize,
    pub volume_outliers: usize,
    pub zero_volatility: usize,
    pub forward_filled: usize,
    pub residual_missing: usize,
    pub output_rows: usize,
}

pub fn clean(mut table: FeatureTable, config: &CleaningConfig) -> (FeatureTable, CleanReport) {
    let mut report = CleanReport {
        input_rows: table.len(),
        ..CleanReport::default()
    };

    let keep = rows_within(&table, ColumnRole::Return, |v| v.abs() <= config.return_bound);
    report.return_outliers = table.retain_rows(&keep);
    if report.return_outliers > 0 {
        log::warn!(
            "dropped {} rows with a return outside ±{}",
            report.return_outliers,
            config.return_bound
        );
    }

    for column in table.columns_mut() {
        if column.id.role() != ColumnRole::VolumeRatio {
            continue;
        }
        if let ColumnValues::Float(values) = &mut column.values {
            for v in values.iter_mut().flatten() {
                if *v < config.volume_ratio_floor {
                    *v = config.volume_ratio_floor;
                    report.volume_floored += 1;
                }
            }
        }
    }

    let keep = rows_within(&table, ColumnRole::VolumeRatio, |v| v <= config.volume_ratio_max);
    report.volume_outliers = table.retain_rows(&keep);
    if report.volume_outliers > 0 {
        log::warn!(
            "dropped {} rows with a volume ratio above {}",
            report.volume_outliers,
            config.volume_ratio_max
        );
    }

    for column in table.columns_mut() {
        if column.id.role() != ColumnRole::Volatility {
            continue;
        }
        if let ColumnValues::Float(values) = &mut column.values {
            for slot in values.iter_mut() {
                if *slot == Some(0.0) {
                    *slot = None;
                    report.zero_volatility += 1;
                }
            }
        }
    }

    for column in table.columns_mut() {
        if !column.id.is_target() {
            report.forward_filled += column.values.forward_fill();
        }
    }

    let keep: Vec<bool> = (0..table.len()).map(|row| !table.row_has_missing(row)).collect();
    report.residual_missing = table.retain_rows(&keep);
    if report.residual_missing > 0 {
        log::warn!(
            "dropped {} rows with unresolved missing values",
            report.residual_missing
        );
    }

    report.output_rows = table.len();
    log::info!(
        "cleaner: {} -> {} rows ({} forward-filled values, {} zero volatilities)",
        report.input_rows,
        report.output_rows,
        report.forward_filled,
        report.zero_volatility
    );

    (table, report)
}

/// Row mask: false where any column of `role` holds a present value failing
/// `ok`. Missing values pass.
fn rows_within(table: &FeatureTable, role: ColumnRole, ok: impl Fn(f64) -> bool) -> Vec<bool> {
    let mut keep = vec![true; table.len()];
    for column in table.columns() {
        if column.id.role() != role {
            continue;
        }
        for (row, flag) in keep.iter_mut().enumerate() {
            if let Some(v) = column.values.get_f64(row) {
                if !ok(v) {
                    *flag = false;
                }
            }
        }
    }
    keep
}
