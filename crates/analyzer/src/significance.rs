use core_types::AnalysisError;
use core_types::stats::pearson;
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

/// Pearson correlation of two equal-length slices with its two-sided p-value.
pub fn correlate(x: &[f64], y: &[f64]) -> Result<(f64, f64), AnalysisError> {
    if x.len() < 3 {
        return Err(AnalysisError::insufficient("pearson correlation", 3, x.len()));
    }
    let r = pearson(x, y)
        .ok_or_else(|| AnalysisError::DegenerateInput("zero variance in correlation window".to_string()))?;
    let p = pearson_p_value(r, x.len())?;
    Ok((r, p))
}

/// Two-sided p-value of a Pearson coefficient under the null of no correlation,
/// using Student's t with `n - 2` degrees of freedom.
pub fn pearson_p_value(r: f64, n: usize) -> Result<f64, AnalysisError> {
    if n < 3 {
        return Err(AnalysisError::insufficient("pearson p-value", 3, n));
    }
    let denom = 1.0 - r * r;
    if denom <= 0.0 {
        return Ok(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / denom).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).map_err(|e| AnalysisError::NumericFailure(e.to_string()))?;
    let p = 2.0 * dist.sf(t.abs());
    finite_probability(p)
}

/// Upper-tail probability of an F statistic.
pub fn f_test_p_value(f: f64, df_num: usize, df_den: usize) -> Result<f64, AnalysisError> {
    if !f.is_finite() {
        return Err(AnalysisError::NumericFailure(format!("non-finite F statistic {f}")));
    }
    let dist = FisherSnedecor::new(df_num as f64, df_den as f64)
        .map_err(|e| AnalysisError::NumericFailure(e.to_string()))?;
    finite_probability(dist.sf(f.max(0.0)))
}

fn finite_probability(p: f64) -> Result<f64, AnalysisError> {
    if p.is_finite() {
        Ok(p.clamp(0.0, 1.0))
    } else {
        Err(AnalysisError::NumericFailure("p-value is not finite".to_string()))
    }
}
