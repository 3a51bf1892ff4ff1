//! Exponential Moving Average.
//!
//! alpha = 2/(span+1), EMA[0] = C[0], EMA[i] = C[i]*alpha + EMA[i-1]*(1-alpha).
//! Recursive form seeded with the first observation, so there is no warm-up gap.

pub fn calculate_ema(closes: &[f64], span: usize) -> Vec<Option<f64>> {
    if span == 0 {
        return vec![None; closes.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut values = Vec::with_capacity(closes.len());
    let mut ema: Option<f64> = None;

    for &close in closes {
        let next = match ema {
            None => close,
            Some(prev) => close * alpha + prev * (1.0 - alpha),
        };
        ema = Some(next);
        values.push(ema);
    }

    values
}

/// fast - slow, missing where either side is missing.
pub fn ema_diff(fast: &[Option<f64>], slow: &[Option<f64>]) -> Vec<Option<f64>> {
    fast.iter()
        .zip(slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect()
}
