//! Target generator.
//!
//! For each horizon `h`:
//!
//! ```text
//! target_{h}m[i]     = (close[i+h] - close[i]) / close[i]
//! target_dir_{h}m[i] = 1 if close[i+h] > close[i] else 0
//! ```
//!
//! The last `max(h)` rows cannot be labeled for every horizon, so the table is
//! truncated to `len - max(h)` rows *before* any label is computed. Every
//! label is then built from two present closes; there is no comparison
//! against a missing future value.

use crate::domain::error::PrepError;
use crate::domain::schema::{ColumnId, Schema, TargetKind};
use crate::domain::stats::describe_values;
use crate::domain::table::FeatureTable;

pub fn add_targets(table: &mut FeatureTable, schema: &Schema) -> Result<(), PrepError> {
    let close_id = schema.close_column();
    let closes: Vec<Option<f64>> = table
        .float(&close_id)
        .map(<[Option<f64>]>::to_vec)
        .ok_or_else(|| PrepError::SchemaMismatch {
            stage: "target input".to_string(),
            column: close_id.to_string(),
        })?;

    let max_h = schema.target_horizons.iter().copied().max().unwrap_or(0);
    let n = closes.len();
    if n <= max_h {
        return Err(PrepError::unavailable(
            &schema.target,
            format!("{n} aligned rows cannot be labeled at horizon {max_h}"),
        ));
    }

    let keep = n - max_h;
    table.truncate(keep);

    for &horizon in &schema.target_horizons {
        for &kind in &schema.target_kinds {
            let id = ColumnId::Target { horizon, kind };
            match kind {
                TargetKind::Regression => {
                    let values: Vec<Option<f64>> = (0..keep)
                        .map(|i| match (closes[i], closes[i + horizon]) {
                            (Some(now), Some(future)) if now != 0.0 => Some((future - now) / now),
                            _ => None,
                        })
                        .collect();
                    let stats = describe_values(&id.to_string(), &values);
                    log::info!(
                        "{}: mean {:.6}, std {:.6}",
                        stats.name,
                        stats.mean.unwrap_or(f64::NAN),
                        stats.std.unwrap_or(f64::NAN)
                    );
                    table.insert_float(id, values);
                }
                TargetKind::Direction => {
                    let values: Vec<Option<i32>> = (0..keep)
                        .map(|i| match (closes[i], closes[i + horizon]) {
                            (Some(now), Some(future)) => Some(i32::from(future > now)),
                            _ => None,
                        })
                        .collect();
                    let ups = values.iter().flatten().filter(|&&v| v == 1).count();
                    log::info!("{}: {} of {} rows up", id, ups, values.len());
                    table.insert_code(id, values);
                }
            }
        }
    }

    log::info!(
        "targets: {} columns, truncated {} tail rows, {} rows remain",
        schema.target_horizons.len() * schema.target_kinds.len(),
        max_h,
        keep
    );

    Ok(())
}
