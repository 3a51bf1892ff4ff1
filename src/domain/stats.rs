//! Descriptive statistics for feature and target columns.
//!
//! Count, mean, sample standard deviation, min, quartiles and max over the
//! present values of each column. Quartiles interpolate linearly between
//! order statistics.

use crate::domain::table::FeatureTable;

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

pub fn describe_values(name: &str, values: &[Option<f64>]) -> ColumnStats {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();
    present.sort_by(f64::total_cmp);

    let count = present.len();
    let mean = (count > 0).then(|| present.iter().sum::<f64>() / count as f64);
    let std = match (mean, count) {
        (Some(m), c) if c >= 2 => {
            let ss: f64 = present.iter().map(|v| (v - m).powi(2)).sum();
            Some((ss / (c - 1) as f64).sqrt())
        }
        _ => None,
    };

    ColumnStats {
        name: name.to_string(),
        count,
        missing: values.len() - count,
        mean,
        std,
        min: present.first().copied(),
        p25: quantile(&present, 0.25),
        p50: quantile(&present, 0.50),
        p75: quantile(&present, 0.75),
        max: present.last().copied(),
    }
}

/// Statistics for every column of the table, in column order.
pub fn describe(table: &FeatureTable) -> Vec<ColumnStats> {
    table
        .columns()
        .iter()
        .map(|c| {
            let values: Vec<Option<f64>> = (0..c.values.len()).map(|i| c.values.get_f64(i)).collect();
            describe_values(&c.id.to_string(), &values)
        })
        .collect()
}

fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}
