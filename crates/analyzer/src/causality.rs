use crate::significance::f_test_p_value;
use configuration::Settings;
use core_types::{AlignedSeries, AnalysisError, CausalityRecord, Diagnostic};
use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::Serialize;

/// Granger tests of whether `cause` helps predict `effect`, one record per order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CausalityReport {
    pub cause: String,
    pub effect: String,
    /// Ascending lag order. Empty when the whole input was rejected.
    pub records: Vec<CausalityRecord>,
    pub min_p_value: Option<f64>,
    /// True when any order is significant.
    pub significant: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl CausalityReport {
    fn rejected(cause: &str, effect: &str, diagnostic: Diagnostic) -> Self {
        Self {
            cause: cause.to_string(),
            effect: effect.to_string(),
            records: Vec::new(),
            min_p_value: None,
            significant: false,
            diagnostics: vec![diagnostic],
        }
    }

    pub fn best_order(&self) -> Option<&CausalityRecord> {
        self.records
            .iter()
            .filter(|r| r.p_value.is_some())
            .min_by(|a, b| a.p_value.partial_cmp(&b.p_value).unwrap_or(std::cmp::Ordering::Equal))
    }
}

#[derive(Debug, Clone)]
pub struct CausalityTester {
    max_order: usize,
    min_series_obs: usize,
    significance: f64,
}

impl CausalityTester {
    pub fn new(max_order: usize, min_series_obs: usize, significance: f64) -> Self {
        Self {
            max_order,
            min_series_obs,
            significance,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.causality.max_order,
            settings.statistics.min_series_obs,
            settings.statistics.significance,
        )
    }

    /// Runs the F-test for every order in `1..=max_order`.
    ///
    /// Never fails: a rejected input yields an empty report with one diagnostic,
    /// and a failed order keeps its record with the p-value missing.
    #[tracing::instrument(name = "causality", skip(self, aligned))]
    pub fn test(&self, aligned: &AlignedSeries, cause: &str, effect: &str) -> CausalityReport {
        let (x, y) = match self.inputs(aligned, cause, effect) {
            Ok(inputs) => inputs,
            Err(e) => {
                let scope = format!("causality[{cause}->{effect}]");
                return CausalityReport::rejected(cause, effect, Diagnostic::from_error(scope, &e));
            }
        };

        // Orders beyond this bound cannot be fitted on `y.len()` rows.
        let highest = self.max_order.min(y.len() / 3 + 1);
        let outcomes: Vec<(CausalityRecord, Option<AnalysisError>)> = (1..=highest)
            .into_par_iter()
            .map(|order| match granger_f_test(x, y, order) {
                Ok(record) => (record, None),
                Err(e) => (failed_record(y.len(), order), Some(e)),
            })
            .collect();

        let mut records = Vec::with_capacity(outcomes.len());
        let mut diagnostics = Vec::new();
        for (record, error) in outcomes {
            if let Some(e) = error {
                let scope = format!("causality[{cause}->{effect},order={}]", record.lag_order);
                diagnostics.push(Diagnostic::from_error(scope, &e));
            }
            records.push(record);
        }

        let min_p_value = records
            .iter()
            .filter_map(|r| r.p_value)
            .min_by(|a, b| a.total_cmp(b));
        let significant = min_p_value.is_some_and(|p| p < self.significance);
        tracing::debug!(?min_p_value, significant, "Granger tests complete");

        CausalityReport {
            cause: cause.to_string(),
            effect: effect.to_string(),
            records,
            min_p_value,
            significant,
            diagnostics,
        }
    }

    fn inputs<'a>(
        &self,
        aligned: &'a AlignedSeries,
        cause: &str,
        effect: &str,
    ) -> Result<(&'a [f64], &'a [f64]), AnalysisError> {
        let x = aligned.require(cause)?;
        let y = aligned.require(effect)?;
        if aligned.len() < self.min_series_obs {
            return Err(AnalysisError::insufficient(
                format!("causality {cause} -> {effect}"),
                self.min_series_obs,
                aligned.len(),
            ));
        }
        if x.iter().chain(y).any(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidInput(
                format!("causality {cause} -> {effect}"),
                "non-finite value".to_string(),
            ));
        }
        Ok((x, y))
    }
}

fn failed_record(len: usize, order: usize) -> CausalityRecord {
    CausalityRecord {
        lag_order: order,
        p_value: None,
        f_statistic: None,
        df_num: order,
        df_den: denominator_df(len, order).unwrap_or(0),
    }
}

/// `n - 2p - 1` with `n = len - p`, or `None` when it is not positive.
fn denominator_df(len: usize, order: usize) -> Option<usize> {
    len.checked_sub(order)?
        .checked_sub(2 * order + 1)
        .filter(|df| *df > 0)
}

/// SSR-based F-test comparing `effect ~ own lags` with `effect ~ own lags + cause lags`.
fn granger_f_test(cause: &[f64], effect: &[f64], order: usize) -> Result<CausalityRecord, AnalysisError> {
    let df_den = denominator_df(effect.len(), order).ok_or_else(|| {
        AnalysisError::insufficient(format!("granger order {order}"), 3 * order + 2, effect.len())
    })?;
    let rows = effect.len() - order;

    let target = DVector::from_fn(rows, |r, _| effect[r + order]);
    let restricted = DMatrix::from_fn(rows, order + 1, |r, c| {
        let t = r + order;
        if c == 0 { 1.0 } else { effect[t - c] }
    });
    let unrestricted = DMatrix::from_fn(rows, 2 * order + 1, |r, c| {
        let t = r + order;
        match c {
            0 => 1.0,
            c if c <= order => effect[t - c],
            c => cause[t - (c - order)],
        }
    });

    let ssr_r = residual_sum_of_squares(restricted, &target)?;
    let ssr_u = residual_sum_of_squares(unrestricted, &target)?;
    if ssr_u <= 0.0 {
        return Err(AnalysisError::NumericFailure(format!(
            "non-positive residual variance at order {order}"
        )));
    }

    let f = ((ssr_r - ssr_u) / order as f64) / (ssr_u / df_den as f64);
    let p = f_test_p_value(f, order, df_den)?;
    tracing::debug!(order, f, p, "Granger order evaluated");

    Ok(CausalityRecord {
        lag_order: order,
        p_value: Some(p),
        f_statistic: Some(f),
        df_num: order,
        df_den,
    })
}

/// Ordinary least squares via SVD. Rank-deficient designs are rejected.
fn residual_sum_of_squares(design: DMatrix<f64>, target: &DVector<f64>) -> Result<f64, AnalysisError> {
    let (rows, cols) = design.shape();
    let svd = design.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    let tol = max_sv * rows.max(cols) as f64 * f64::EPSILON;

    if max_sv == 0.0 || svd.rank(tol) < cols {
        return Err(AnalysisError::NumericFailure("singular design matrix".to_string()));
    }

    let beta = svd
        .solve(target, tol)
        .map_err(|e| AnalysisError::NumericFailure(e.to_string()))?;
    let ssr = (target - design * beta).norm_squared();
    if ssr.is_finite() {
        Ok(ssr)
    } else {
        Err(AnalysisError::NumericFailure("non-finite residuals".to_string()))
    }
}
