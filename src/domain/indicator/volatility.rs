//! Realized volatility: rolling sample standard deviation of the one-bar
//! percent change.
//!
//! VOL(n)[i] = stddev(r[i-n+1..=i]) with r[j] = C[j]/C[j-1] - 1, divisor n-1.
//! Warmup: r[0] is missing, so the first valid value is at i = n.

use super::returns::calculate_return;
use super::{mean, trailing_window};

/// Sample (n-1) standard deviation over a trailing window. Windows shorter
/// than two or touching a missing value yield missing.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            if window < 2 {
                return None;
            }
            let w = trailing_window(values, i, window)?;
            let m = mean(&w);
            let ss: f64 = w.iter().map(|x| (x - m) * (x - m)).sum();
            Some((ss / (window as f64 - 1.0)).sqrt())
        })
        .collect()
}

pub fn calculate_realized_vol(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling_std(&calculate_return(closes, 1), window)
}
