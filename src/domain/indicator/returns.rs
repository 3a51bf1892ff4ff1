//! Percent return over a fixed look-back.
//!
//! RETURN(w)[i] = (C[i] - C[i-w]) / C[i-w]
//! Warmup: first w bars missing. C[i-w] == 0 yields missing.

pub fn calculate_return(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..closes.len())
        .map(|i| {
            if period == 0 || i < period {
                return None;
            }
            let prev = closes[i - period];
            if prev == 0.0 {
                None
            } else {
                Some((closes[i] - prev) / prev)
            }
        })
        .collect()
}
