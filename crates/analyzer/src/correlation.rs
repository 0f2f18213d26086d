use crate::significance::correlate;
use configuration::Settings;
use core_types::{CorrelationRecord, Diagnostic, Panel};
use itertools::iproduct;
use rayon::prelude::*;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationReport {
    /// One record per requested pair, in `x`-major order.
    pub records: Vec<CorrelationRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CorrelationReport {
    pub fn significant_count(&self) -> usize {
        self.records.iter().filter(|r| r.significant == Some(true)).count()
    }

    pub fn find(&self, x: &str, y: &str) -> Option<&CorrelationRecord> {
        self.records.iter().find(|r| r.pair() == (x, y))
    }
}

/// Pairwise Pearson correlation with significance testing.
#[derive(Debug, Clone)]
pub struct CorrelationAnalyzer {
    significance: f64,
    min_pair_obs: usize,
}

impl CorrelationAnalyzer {
    pub fn new(significance: f64, min_pair_obs: usize) -> Self {
        Self {
            significance,
            min_pair_obs,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.statistics.significance, settings.statistics.min_window_obs)
    }

    /// Correlates every `x` column with every `y` column.
    ///
    /// Each pair only uses the rows where both of its columns are present. A
    /// failing pair keeps its slot with empty values and never affects the others.
    #[tracing::instrument(name = "correlation", skip_all, fields(pairs = x_cols.len() * y_cols.len()))]
    pub fn analyze(&self, panel: &Panel, x_cols: &[String], y_cols: &[String]) -> CorrelationReport {
        let pairs: Vec<(&String, &String)> = iproduct!(x_cols, y_cols).collect();

        let outcomes: Vec<(CorrelationRecord, Option<Diagnostic>)> = pairs
            .par_iter()
            .map(|(x, y)| self.correlate_pair(panel, x, y))
            .collect();

        let (records, diagnostics): (Vec<_>, Vec<_>) = outcomes.into_iter().unzip();
        let diagnostics = diagnostics.into_iter().flatten().collect();

        CorrelationReport { records, diagnostics }
    }

    fn correlate_pair(&self, panel: &Panel, x: &str, y: &str) -> (CorrelationRecord, Option<Diagnostic>) {
        let outcome = panel
            .complete_rows(&[x, y], self.min_pair_obs)
            .and_then(|aligned| {
                let n = aligned.len();
                let (r, p) = correlate(aligned.require(x)?, aligned.require(y)?)?;
                Ok((r, p, n))
            });

        match outcome {
            Ok((r, p, n)) => (
                CorrelationRecord {
                    x: x.to_string(),
                    y: y.to_string(),
                    correlation: Some(r),
                    p_value: Some(p),
                    significant: Some(p < self.significance),
                    n_obs: n,
                    diagnostic: None,
                },
                None,
            ),
            Err(e) => {
                let diagnostic = Diagnostic::from_error(format!("correlation[{x},{y}]"), &e);
                let record = CorrelationRecord {
                    x: x.to_string(),
                    y: y.to_string(),
                    correlation: None,
                    p_value: None,
                    significant: None,
                    n_obs: observed_pairs(panel, x, y),
                    diagnostic: Some(diagnostic.message.clone()),
                };
                (record, Some(diagnostic))
            }
        }
    }
}

fn observed_pairs(panel: &Panel, x: &str, y: &str) -> usize {
    match (panel.column(x), panel.column(y)) {
        (Some(a), Some(b)) => a.iter().zip(b).filter(|(a, b)| a.is_some() && b.is_some()).count(),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Months, NaiveDate};
    use core_types::{DiagnosticKind, SeriesAligner, TimeSeries};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn panel(columns: &[(&str, Vec<Option<f64>>)]) -> Panel {
        let start = NaiveDate::from_ymd_opt(2000, 1, 31).unwrap();
        let series: Vec<TimeSeries> = columns
            .iter()
            .map(|(name, values)| {
                TimeSeries::new(
                    *name,
                    values
                        .iter()
                        .enumerate()
                        .map(|(i, v)| (start.checked_add_months(Months::new(i as u32)).unwrap(), *v))
                        .collect(),
                )
            })
            .collect();
        let names: Vec<&str> = columns.iter().map(|(n, _)| *n).collect();
        SeriesAligner::new(1).join(&series, &names).unwrap()
    }

    fn random(seed: u64, n: usize) -> Vec<Option<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n).map(|_| Some(rng.gen_range(-2.0..2.0))).collect()
    }

    fn names(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn correlation_is_symmetric() {
        let p = panel(&[("a", random(1, 80)), ("b", random(2, 80))]);
        let analyzer = CorrelationAnalyzer::from_settings(&Settings::default());
        let ab = analyzer.analyze(&p, &names(&["a"]), &names(&["b"]));
        let ba = analyzer.analyze(&p, &names(&["b"]), &names(&["a"]));

        let ab = &ab.records[0];
        let ba = &ba.records[0];
        assert!((ab.correlation.unwrap() - ba.correlation.unwrap()).abs() < 1e-12);
        assert!((ab.p_value.unwrap() - ba.p_value.unwrap()).abs() < 1e-12);
        assert_eq!(ab.n_obs, 80);
    }

    #[test]
    fn pairs_use_only_rows_where_both_present() {
        let mut a = random(3, 60);
        let b = random(4, 60);
        for i in 0..10 {
            a[i * 5] = None;
        }
        let p = panel(&[("a", a), ("b", b)]);
        let report = CorrelationAnalyzer::new(0.05, 30).analyze(&p, &names(&["a"]), &names(&["b"]));
        assert_eq!(report.records[0].n_obs, 50);
    }

    #[test]
    fn failing_pair_does_not_abort_others() {
        let mut rng = StdRng::seed_from_u64(5);
        let x: Vec<Option<f64>> = (0..60).map(|_| Some(rng.gen_range(0.0..1.0))).collect();
        let y: Vec<Option<f64>> = x.iter().map(|v| v.map(|v| 3.0 * v + 0.01)).collect();
        let flat = vec![Some(1.0); 60];
        let short: Vec<Option<f64>> = (0..60).map(|i| (i < 10).then_some(i as f64)).collect();

        let p = panel(&[("x", x), ("flat", flat), ("short", short), ("y", y)]);
        let report = CorrelationAnalyzer::from_settings(&Settings::default()).analyze(
            &p,
            &names(&["x", "flat", "short", "missing"]),
            &names(&["y"]),
        );

        assert_eq!(report.records.len(), 4);
        let pairs: Vec<(&str, &str)> = report.records.iter().map(|r| r.pair()).collect();
        assert_eq!(pairs, vec![("x", "y"), ("flat", "y"), ("short", "y"), ("missing", "y")]);

        let good = report.find("x", "y").unwrap();
        assert!((good.correlation.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(good.significant, Some(true));

        assert!(report.find("flat", "y").unwrap().is_skipped());
        assert!(report.find("short", "y").unwrap().is_skipped());
        assert_eq!(report.find("short", "y").unwrap().n_obs, 10);
        assert!(report.find("missing", "y").unwrap().is_skipped());

        let kinds: Vec<DiagnosticKind> = report.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::DegenerateInput, DiagnosticKind::InsufficientData, DiagnosticKind::InvalidInput]
        );
        assert_eq!(report.significant_count(), 1);
    }
}
