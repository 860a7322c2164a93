//! Quantile estimation on a sample.
//!
//! Positions use the `p * (n - 1)` convention on the ascending-sorted sample; the
//! `QuartileMethod` picks how a fractional position is resolved.

use crate::domain::QuartileMethod;

/// Sort finite values ascending. Non-finite values are dropped.
pub fn sorted_finite(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
    out.sort_by(f64::total_cmp);
    out
}

/// Quantile `p` (0..=1) of an ascending-sorted sample.
///
/// Returns `None` for an empty sample or `p` outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64, method: QuartileMethod) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }

    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(match method {
        QuartileMethod::Linear => sorted[lo] + (sorted[hi] - sorted[lo]) * frac,
        QuartileMethod::Lower => sorted[lo],
        QuartileMethod::Higher => sorted[hi],
        QuartileMethod::Midpoint => (sorted[lo] + sorted[hi]) / 2.0,
    })
}

/// `(Q1, Q3)` of an ascending-sorted sample.
pub fn quartiles(sorted: &[f64], method: QuartileMethod) -> Option<(f64, f64)> {
    Some((
        quantile_sorted(sorted, 0.25, method)?,
        quantile_sorted(sorted, 0.75, method)?,
    ))
}
