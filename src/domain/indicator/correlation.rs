//! Rolling Pearson correlation between two aligned series.
//!
//! A window with any missing value, or with zero variance on either side,
//! yields missing. Never a fabricated zero.

use super::{mean, trailing_window};

pub fn rolling_corr(a: &[Option<f64>], b: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let len = a.len().min(b.len());
    (0..len)
        .map(|i| {
            if window < 2 {
                return None;
            }
            let xa = trailing_window(a, i, window)?;
            let xb = trailing_window(b, i, window)?;
            pearson(&xa, &xb)
        })
        .collect()
}

fn pearson(xa: &[f64], xb: &[f64]) -> Option<f64> {
    let ma = mean(xa);
    let mb = mean(xb);
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for (x, y) in xa.iter().zip(xb) {
        let dx = x - ma;
        let dy = y - mb;
        cov += dx * dy;
        va += dx * dx;
        vb += dy * dy;
    }
    let denom = (va * vb).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return None;
    }
    Some((cov / denom).clamp(-1.0, 1.0))
}
