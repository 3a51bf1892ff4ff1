//! Volume and VWAP normalisation.
//!
//! VOLUME_NORM(n)[i] = V[i] / mean(V[i-n+1..=i]) (window includes the current bar)
//! VWAP_NORM[i] = VWAP[i] / C[i]

use super::{mean, trailing_window};

pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| trailing_window(values, i, window).map(|w| mean(&w)))
        .collect()
}

/// Missing during warm-up and where the trailing mean is zero.
pub fn calculate_volume_ratio(volumes: &[f64], window: usize) -> Vec<Option<f64>> {
    let wrapped: Vec<Option<f64>> = volumes.iter().map(|&v| Some(v)).collect();
    rolling_mean(&wrapped, window)
        .into_iter()
        .zip(volumes)
        .map(|(avg, &v)| match avg {
            Some(avg) if avg > 0.0 => Some(v / avg),
            _ => None,
        })
        .collect()
}

/// Missing where the VWAP is absent, non-finite or not positive.
pub fn calculate_vwap_ratio(vwaps: &[Option<f64>], closes: &[f64]) -> Vec<Option<f64>> {
    vwaps
        .iter()
        .zip(closes)
        .map(|(vwap, &close)| {
            let vwap = vwap.filter(|v| v.is_finite() && *v > 0.0)?;
            (close != 0.0).then(|| vwap / close)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn volume_ratio_includes_current_bar() {
        let series = calculate_volume_ratio(&[100.0, 200.0, 300.0], 3);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert_relative_eq!(series[2].unwrap(), 300.0 / 200.0);
    }

    #[test]
    fn volume_ratio_zero_average_is_missing() {
        let series = calculate_volume_ratio(&[0.0, 0.0], 2);
        assert_eq!(series[1], None);
    }

    #[test]
    fn vwap_ratio_basic() {
        let series = calculate_vwap_ratio(&[Some(101.0), None], &[100.0, 100.0]);
        assert_relative_eq!(series[0].unwrap(), 1.01);
        assert_eq!(series[1], None);
    }

    #[test]
    fn vwap_ratio_rejects_unusable_vwap() {
        let series = calculate_vwap_ratio(
            &[Some(f64::NAN), Some(f64::INFINITY), Some(0.0), Some(-1.0), Some(100.0)],
            &[100.0; 5],
        );
        assert_eq!(series, vec![None, None, None, None, Some(1.0)]);
    }

    #[test]
    fn rolling_mean_basic() {
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)];
        let series = rolling_mean(&values, 2);
        assert_eq!(series, vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }
}
