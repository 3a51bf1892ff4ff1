//! Causal rolling and exponential kernels.
//!
//! Every kernel maps an input series to an output of the same length where
//! output[i] depends only on input[..=i]. Insufficient history yields `None`.

pub mod correlation;
pub mod ema;
pub mod returns;
pub mod volatility;
pub mod volume;

/// The trailing window ending at `end` (inclusive), or `None` if it reaches
/// before the start of the series or contains a missing value.
pub(crate) fn trailing_window(values: &[Option<f64>], end: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || end + 1 < window {
        return None;
    }
    values[end + 1 - window..=end].iter().copied().collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
