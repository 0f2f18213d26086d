//! Descriptive statistics over `f64` slices.
//!
//! Everything returns `None` rather than NaN when the statistic is undefined.

use statrs::statistics::Statistics;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

pub fn population_std(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().population_std_dev())
}

pub fn sample_std(values: &[f64]) -> Option<f64> {
    (values.len() > 1).then(|| values.iter().std_dev())
}

/// Pearson correlation coefficient, clamped to [-1, 1].
///
/// `None` when the slices differ in length, hold fewer than two points, or
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 || is_constant(x) || is_constant(y) {
        return None;
    }
    let sx = x.iter().std_dev();
    let sy = y.iter().std_dev();
    if sx <= 0.0 || sy <= 0.0 {
        return None;
    }
    let r = x.iter().covariance(y.iter()) / (sx * sy);
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Exact equality check; the mean of identical values can round away from them.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Quantile of an ascending slice using linear interpolation between the
/// closest ranks (`q * (n - 1)`).
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}
