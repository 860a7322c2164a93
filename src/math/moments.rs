//! Sample moments and Z-scores.

/// Arithmetic mean. `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). `None` below two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let n = values.len() as f64;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    Some(variance.sqrt())
}

/// Number of standard deviations `x` lies from the mean.
///
/// `None` when the deviation is zero or undefined.
pub fn z_score(x: f64, mean: f64, std: f64) -> Option<f64> {
    if !(std.is_finite() && std > 0.0) {
        return None;
    }
    Some((x - mean) / std)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moments_of_a_small_sample() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(mean(&v), Some(5.0));
        // Sum of squared deviations is 32 → 32 / 7.
        let s = sample_std(&v).unwrap();
        assert!((s - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn z_score_requires_positive_std() {
        assert_eq!(z_score(7.0, 5.0, 2.0), Some(1.0));
        assert_eq!(z_score(7.0, 5.0, 0.0), None);
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }
}
