//! Writes descriptive statistics to CSV, one row per column.

use std::path::Path;

use crate::domain::error::PrepError;
use crate::domain::stats::ColumnStats;

const HEADER: [&str; 11] = [
    "column", "count", "missing", "mean", "std", "min", "25%", "50%", "75%", "max", "split",
];

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `(split name, stats)` groups to `path`.
pub fn write_stats(path: &Path, groups: &[(&str, Vec<ColumnStats>)]) -> Result<(), PrepError> {
    let to_storage = |e: csv::Error| PrepError::Storage {
        reason: format!("writing {}: {}", path.display(), e),
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_storage)?;
    writer.write_record(HEADER).map_err(to_storage)?;

    for (split, stats) in groups {
        for s in stats {
            writer
                .write_record([
                    s.name.clone(),
                    s.count.to_string(),
                    s.missing.to_string(),
                    cell(s.mean),
                    cell(s.std),
                    cell(s.min),
                    cell(s.p25),
                    cell(s.p50),
                    cell(s.p75),
                    cell(s.max),
                    split.to_string(),
                ])
                .map_err(to_storage)?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::stats::describe_values;
    use tempfile::TempDir;

    #[test]
    fn writes_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stats.csv");
        let stats = vec![
            describe_values("QQQ_return_5", &[Some(0.01), Some(-0.01)]),
            describe_values("target_5m", &[None]),
        ];
        write_stats(&path, &[("train", stats)]).unwrap();

        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let headers = rdr.headers().unwrap().clone();
        assert_eq!(headers.get(0), Some("column"));
        assert_eq!(headers.get(7), Some("50%"));

        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some("QQQ_return_5"));
        assert_eq!(rows[0].get(1), Some("2"));
        assert_eq!(rows[0].get(3), Some("0"));
        assert_eq!(rows[1].get(3), Some(""));
        assert_eq!(rows[1].get(10), Some("train"));
    }
}
