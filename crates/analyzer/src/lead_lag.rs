use crate::significance::correlate;
use configuration::Settings;
use core_types::stats::{is_constant, mean, population_std};
use core_types::{AlignedSeries, AnalysisError, Diagnostic, LagResult, LeadLagDirection};
use rayon::prelude::*;
use serde::Serialize;

/// Absolute correlations closer than this are treated as equal when picking the best lag.
pub const TIE_TOLERANCE: f64 = 1e-12;

/// Cross-correlation of two series across `[-max_lag, +max_lag]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadLagReport {
    pub first: String,
    pub second: String,
    /// One entry per lag with a long enough window, in ascending lag order.
    pub results: Vec<LagResult>,
    pub best: Option<LagResult>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LeadLagReport {
    /// Human-readable reading of the best lag, e.g. "HY_IG_Spread leads SPY by 3 periods".
    pub fn summary(&self) -> Option<String> {
        self.best.as_ref().map(|best| {
            let periods = best.lag.unsigned_abs();
            match best.direction {
                LeadLagDirection::FirstLeads => {
                    format!("{} leads {} by {} periods", self.first, self.second, periods)
                }
                LeadLagDirection::SecondLeads => {
                    format!("{} leads {} by {} periods", self.second, self.first, periods)
                }
                LeadLagDirection::Contemporaneous => {
                    format!("{} and {} move contemporaneously", self.first, self.second)
                }
            }
        })
    }
}

/// Stateless lead-lag scanner configured with the lag range and window minimums.
#[derive(Debug, Clone)]
pub struct LeadLagAnalyzer {
    max_lag: u32,
    min_series_obs: usize,
    min_window_obs: usize,
}

impl LeadLagAnalyzer {
    pub fn new(max_lag: u32, min_series_obs: usize, min_window_obs: usize) -> Self {
        Self {
            max_lag,
            min_series_obs,
            min_window_obs,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.lead_lag.max_lag,
            settings.statistics.min_series_obs,
            settings.statistics.min_window_obs,
        )
    }

    /// Scans every lag and picks the one with the strongest correlation.
    ///
    /// Fails only on whole-input problems: too few rows or a constant series.
    /// Per-lag problems are skipped and reported in `diagnostics`.
    #[tracing::instrument(name = "lead_lag", skip(self, aligned))]
    pub fn analyze(
        &self,
        aligned: &AlignedSeries,
        first: &str,
        second: &str,
    ) -> Result<LeadLagReport, AnalysisError> {
        let x = aligned.require(first)?;
        let y = aligned.require(second)?;

        if aligned.len() < self.min_series_obs {
            return Err(AnalysisError::insufficient(
                format!("lead-lag {first} vs {second}"),
                self.min_series_obs,
                aligned.len(),
            ));
        }

        let x_std = standardize(x)
            .ok_or_else(|| AnalysisError::DegenerateInput(format!("{first} has zero variance")))?;
        let y_std = standardize(y)
            .ok_or_else(|| AnalysisError::DegenerateInput(format!("{second} has zero variance")))?;

        // Any lag past this leaves fewer than `min_window_obs` overlapping rows.
        let reach = aligned.len().saturating_sub(self.min_window_obs);
        let max_lag = i32::try_from((self.max_lag as usize).min(reach)).unwrap_or(i32::MAX);
        let lags: Vec<i32> = (-max_lag..=max_lag).collect();

        // `collect` on an indexed parallel iterator keeps the ascending lag order.
        let outcomes: Vec<(i32, Option<Result<LagResult, AnalysisError>>)> = lags
            .par_iter()
            .map(|&lag| (lag, self.evaluate_lag(&x_std, &y_std, lag)))
            .collect();

        let mut results = Vec::with_capacity(outcomes.len());
        let mut diagnostics = Vec::new();
        for (lag, outcome) in outcomes {
            match outcome {
                Some(Ok(result)) => results.push(result),
                Some(Err(e)) => diagnostics.push(Diagnostic::from_error(format!("lead_lag[lag={lag}]"), &e)),
                None => tracing::debug!(lag, "Lag window shorter than minimum, skipped"),
            }
        }

        let best = select_best(&results).cloned();
        if best.is_none() {
            diagnostics.push(Diagnostic::from_error(
                "lead_lag",
                &AnalysisError::insufficient(
                    format!("lead-lag {first} vs {second}: no lag produced a valid correlation"),
                    self.min_window_obs,
                    aligned.len(),
                ),
            ));
        }

        if let Some(best) = &best {
            tracing::info!(
                lag = best.lag,
                correlation = best.correlation,
                direction = %best.direction,
                "Best lead-lag relationship found"
            );
        }

        Ok(LeadLagReport {
            first: first.to_string(),
            second: second.to_string(),
            results,
            best,
            diagnostics,
        })
    }

    /// `None` when the shifted window is too short; that is a skip, not an error.
    fn evaluate_lag(&self, x: &[f64], y: &[f64], lag: i32) -> Option<Result<LagResult, AnalysisError>> {
        let (xs, ys) = shifted_pair(x, y, lag);
        if xs.len() < self.min_window_obs {
            return None;
        }
        Some(correlate(xs, ys).map(|(r, p)| LagResult::new(lag, r, p, xs.len())))
    }
}

/// Slices two equal-length series so that index `i` of the first slice is
/// compared with index `i` of the second at the given signed lag.
///
/// * `lag < 0`: `x` loses its last `|lag|` points, `y` its first `|lag|`, so
///   "x now" meets "y |lag| periods later" (x leads y).
/// * `lag > 0`: `x` loses its first `lag` points, `y` its last `lag` (y leads x).
/// * `lag == 0`: both unchanged.
pub fn shifted_pair<'a>(x: &'a [f64], y: &'a [f64], lag: i32) -> (&'a [f64], &'a [f64]) {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    let k = (lag.unsigned_abs() as usize).min(n);

    match LeadLagDirection::from_lag(lag) {
        LeadLagDirection::FirstLeads => (&x[..n - k], &y[k..]),
        LeadLagDirection::SecondLeads => (&x[k..], &y[..n - k]),
        LeadLagDirection::Contemporaneous => (x, y),
    }
}

/// Entry with the largest |correlation|; ties go to the smallest |lag|, then
/// to whichever comes first in ascending-lag order.
pub fn select_best(results: &[LagResult]) -> Option<&LagResult> {
    results.iter().fold(None, |best: Option<&LagResult>, candidate| match best {
        None => Some(candidate),
        Some(current) => {
            let challenger = candidate.correlation.abs();
            let incumbent = current.correlation.abs();
            let tied = (challenger - incumbent).abs() <= TIE_TOLERANCE;
            if (!tied && challenger > incumbent)
                || (tied && candidate.lag.unsigned_abs() < current.lag.unsigned_abs())
            {
                Some(candidate)
            } else {
                Some(current)
            }
        }
    })
}

fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    if is_constant(values) {
        return None;
    }
    let m = mean(values)?;
    let sd = population_std(values)?;
    if sd <= 0.0 || !sd.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| (v - m) / sd).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, NaiveDate};
    use core_types::{SeriesAligner, TimeSeries};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(1995, 1, 31).unwrap();
        (0..n)
            .map(|i| start.checked_add_months(Months::new(i as u32)).unwrap())
            .collect()
    }

    fn aligned(x: &[f64], y: &[f64]) -> AlignedSeries {
        let d = dates(x.len());
        let series = vec![TimeSeries::from_values("x", &d, x), TimeSeries::from_values("y", &d, y)];
        SeriesAligner::new(1).align(&series, &["x", "y"]).unwrap()
    }

    fn analyzer() -> LeadLagAnalyzer {
        LeadLagAnalyzer::from_settings(&Settings::default())
    }

    #[test]
    fn first_series_delayed_copy_gives_lag_minus_one() {
        let n = 60;
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..n).map(|t| if t == 0 { x[0] } else { x[t - 1] }).collect();

        let report = analyzer().analyze(&aligned(&x, &y), "x", "y").unwrap();
        let best = report.best.expect("a best lag");
        assert_eq!(best.lag, -1);
        assert_eq!(best.direction, LeadLagDirection::FirstLeads);
        assert!((best.correlation - 1.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_series_recovers_planted_lead() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 240;
        let x: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        // y follows x three periods later
        let y: Vec<f64> = (0..n)
            .map(|t| if t >= 3 { x[t - 3] } else { 0.0 } + 0.1 * rng.gen_range(-1.0..1.0))
            .collect();

        let report = analyzer().analyze(&aligned(&x, &y), "x", "y").unwrap();
        assert_eq!(report.best.as_ref().unwrap().lag, -3);

        // Swapping the roles must flip the sign of the best lag.
        let swapped = analyzer().analyze(&aligned(&y, &x), "x", "y").unwrap();
        assert_eq!(swapped.best.as_ref().unwrap().lag, 3);
        assert_eq!(swapped.best.unwrap().direction, LeadLagDirection::SecondLeads);
    }

    #[test]
    fn every_result_label_matches_its_sign() {
        let mut rng = StdRng::seed_from_u64(11);
        let x: Vec<f64> = (0..120).map(|_| rng.gen_range(0.0..5.0)).collect();
        let y: Vec<f64> = (0..120).map(|_| rng.gen_range(0.0..5.0)).collect();

        let report = analyzer().analyze(&aligned(&x, &y), "x", "y").unwrap();
        assert_eq!(report.results.len(), 25);
        for result in &report.results {
            let expected = match result.lag.signum() {
                -1 => "first series leads second",
                1 => "second series leads first",
                _ => "contemporaneous",
            };
            assert_eq!(result.label(), expected);
            assert!((-1.0..=1.0).contains(&result.correlation));
            assert!((0.0..=1.0).contains(&result.p_value));
            assert_eq!(result.n_obs, 120 - result.lag.unsigned_abs() as usize);
        }
        let lags: Vec<i32> = report.results.iter().map(|r| r.lag).collect();
        assert_eq!(lags, (-12..=12).collect::<Vec<_>>());
    }

    #[test]
    fn shifted_pair_slices_by_sign() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [10.0, 11.0, 12.0, 13.0, 14.0];
        assert_eq!(shifted_pair(&x, &y, -2), (&x[..3], &y[2..]));
        assert_eq!(shifted_pair(&x, &y, 2), (&x[2..], &y[..3]));
        assert_eq!(shifted_pair(&x, &y, 0), (&x[..], &y[..]));
        let (a, b) = shifted_pair(&x, &y, 9);
        assert!(a.is_empty() && b.is_empty());
    }

    #[test]
    fn short_windows_are_skipped_silently() {
        let mut rng = StdRng::seed_from_u64(3);
        let x: Vec<f64> = (0..50).map(|_| rng.gen_range(0.0..1.0)).collect();
        let y: Vec<f64> = (0..50).map(|_| rng.gen_range(0.0..1.0)).collect();

        let report = LeadLagAnalyzer::new(25, 50, 30).analyze(&aligned(&x, &y), "x", "y").unwrap();
        // |lag| <= 20 keeps at least 30 points
        assert_eq!(report.results.len(), 41);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn lag_range_stops_where_windows_run_out() {
        let mut rng = StdRng::seed_from_u64(5);
        let x: Vec<f64> = (0..60).map(|_| rng.gen_range(0.0..1.0)).collect();
        let y: Vec<f64> = (0..60).map(|_| rng.gen_range(0.0..1.0)).collect();

        let report = LeadLagAnalyzer::new(200_000_000, 50, 30)
            .analyze(&aligned(&x, &y), "x", "y")
            .unwrap();
        let lags: Vec<i32> = report.results.iter().map(|r| r.lag).collect();
        assert_eq!(lags, (-30..=30).collect::<Vec<_>>());
        assert!(report.results.iter().all(|r| r.n_obs >= 30));
    }

    #[test]
    fn too_short_input_fails_fast() {
        let x: Vec<f64> = (0..49).map(|i| i as f64).collect();
        let err = analyzer().analyze(&aligned(&x, &x), "x", "y").unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { required: 50, actual: 49, .. }));
    }

    #[test]
    fn constant_series_is_degenerate() {
        let x = vec![2.0; 60];
        let y: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let err = analyzer().analyze(&aligned(&x, &y), "x", "y").unwrap_err();
        assert!(matches!(err, AnalysisError::DegenerateInput(_)));
    }

    #[test]
    fn degenerate_sub_window_is_reported_and_skipped() {
        // x is constant except for its final point, so every window that drops
        // the tail is constant.
        let mut x = vec![1.0; 60];
        x[59] = 5.0;
        let y: Vec<f64> = (0..60).map(|i| (i as f64).sin()).collect();

        let report = analyzer().analyze(&aligned(&x, &y), "x", "y").unwrap();
        let lags: Vec<i32> = report.results.iter().map(|r| r.lag).collect();
        assert_eq!(lags, (0..=12).collect::<Vec<_>>());
        assert_eq!(report.diagnostics.len(), 12);
        assert!(report.diagnostics.iter().all(|d| d.kind == core_types::DiagnosticKind::DegenerateInput));
    }

    #[test]
    fn ties_prefer_smaller_absolute_lag() {
        let results = vec![
            LagResult::new(-2, 0.8, 0.01, 40),
            LagResult::new(-1, -0.8, 0.01, 40),
            LagResult::new(1, 0.8, 0.01, 40),
            LagResult::new(2, 0.3, 0.01, 40),
        ];
        assert_eq!(select_best(&results).unwrap().lag, -1);
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn summary_names_the_leader() {
        let report = LeadLagReport {
            first: "spread".into(),
            second: "spy".into(),
            results: vec![],
            best: Some(LagResult::new(-3, 0.4, 0.01, 100)),
            diagnostics: vec![],
        };
        assert_eq!(report.summary().unwrap(), "spread leads spy by 3 periods");
    }
}
