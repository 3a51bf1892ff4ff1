//! Cross-asset feature engine.
//!
//! Works on the aligned table, using each symbol's short-horizon return
//! (the smallest configured return horizon):
//!
//! - `corr_{T}_{P}_{w}`: rolling Pearson correlation of target and predictor returns
//! - `relative_strength`: target return minus the mean predictor return
//! - `momentum_leader`: index, in configured order, of the predictor with the
//!   highest return; ties go to the earliest predictor
//!
//! Rows where any input return is missing produce missing outputs.

use crate::domain::error::PrepError;
use crate::domain::indicator::correlation::rolling_corr;
use crate::domain::indicator::mean;
use crate::domain::schema::{ColumnId, Schema};
use crate::domain::table::FeatureTable;

pub fn add_cross_asset_features(table: &mut FeatureTable, schema: &Schema) -> Result<(), PrepError> {
    let target_ret = short_return(table, schema, &schema.target)?;
    let predictor_rets: Vec<Vec<Option<f64>>> = schema
        .predictors
        .iter()
        .map(|p| short_return(table, schema, p))
        .collect::<Result<_, _>>()?;

    for (predictor, returns) in schema.predictors.iter().zip(&predictor_rets) {
        let id = ColumnId::Correlation {
            target: schema.target.clone(),
            predictor: predictor.clone(),
            window: schema.correlation_window,
        };
        table.insert_float(id, rolling_corr(&target_ret, returns, schema.correlation_window));
    }

    let n = table.len();
    let mut relative = Vec::with_capacity(n);
    let mut leader = Vec::with_capacity(n);
    for i in 0..n {
        let row: Option<Vec<f64>> = predictor_rets.iter().map(|r| r[i]).collect();
        match row {
            Some(values) if !values.is_empty() => {
                relative.push(target_ret[i].map(|t| t - mean(&values)));
                leader.push(Some(leader_code(&values)));
            }
            _ => {
                relative.push(None);
                leader.push(None);
            }
        }
    }
    table.insert_float(ColumnId::RelativeStrength, relative);
    table.insert_code(ColumnId::MomentumLeader, leader);

    log::info!(
        "cross-asset features: {} correlations over window {}, horizon {}",
        schema.predictors.len(),
        schema.correlation_window,
        schema.cross_horizon
    );

    Ok(())
}

fn short_return(
    table: &FeatureTable,
    schema: &Schema,
    symbol: &str,
) -> Result<Vec<Option<f64>>, PrepError> {
    let id = schema.cross_return_column(symbol);
    table
        .float(&id)
        .map(<[Option<f64>]>::to_vec)
        .ok_or_else(|| PrepError::SchemaMismatch {
            stage: "cross-asset input".to_string(),
            column: id.to_string(),
        })
}

/// First index holding the maximum.
fn leader_code(values: &[f64]) -> i32 {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best as i32
}
