use crate::bundle::{AnalysisBundle, AnalysisInputs};
use crate::error::PipelineError;
use analytics::{
    AnalyticsEngine, ConditionalPerformance, PerformanceReport, RegimeStats, SpreadBucketAnalysis,
    conditional_performance, regime_breakdown, spread_bucket_analysis,
};
use analyzer::{
    CausalityReport, CausalityTester, CorrelationAnalyzer, CorrelationReport, LeadLagAnalyzer, LeadLagReport,
    derive_series,
};
use backtester::{BacktestEngine, RateConditioning, RatePeriod, ReviewRecord, strategy_review};
use configuration::Settings;
use core_types::{BacktestRow, Diagnostic, DiagnosticKind, SeriesAligner, TimeSeries};

struct Relationships {
    lead_lag: Option<LeadLagReport>,
    correlations: CorrelationReport,
    causality: Vec<CausalityReport>,
    diagnostics: Vec<Diagnostic>,
}

#[derive(Default)]
struct Strategy {
    backtest: Vec<BacktestRow>,
    performance: Option<PerformanceReport>,
    regime_breakdown: Vec<RegimeStats>,
    spread_buckets: Option<SpreadBucketAnalysis>,
    conditional_performance: Vec<ConditionalPerformance>,
    rate_periods: Vec<RatePeriod>,
    strategy_review: Vec<ReviewRecord>,
    diagnostics: Vec<Diagnostic>,
}

/// Runs every analysis over `inputs` and collects one bundle.
///
/// Only an invalid configuration or a missing role series fails the run; any
/// later problem becomes a diagnostic next to an empty section.
#[tracing::instrument(name = "pipeline", skip_all, fields(series = inputs.series.len()))]
pub fn run(inputs: &AnalysisInputs, settings: &Settings) -> Result<AnalysisBundle, PipelineError> {
    settings.validate()?;
    check_roles(inputs)?;
    let engine = BacktestEngine::from_settings(settings)?;

    let series = with_derivatives(inputs, settings)?;
    tracing::info!(series = series.len(), "Inputs validated, starting analysis");

    let (relationships, strategy) = rayon::join(
        || relationships(&series, inputs, settings),
        || strategy(&series, inputs, settings, &engine),
    );

    let mut diagnostics = relationships.diagnostics;
    diagnostics.extend(strategy.diagnostics);
    tracing::info!(diagnostics = diagnostics.len(), "Analysis complete");

    Ok(AnalysisBundle {
        lead_lag: relationships.lead_lag,
        correlations: relationships.correlations,
        causality: relationships.causality,
        backtest: strategy.backtest,
        performance: strategy.performance,
        regime_breakdown: strategy.regime_breakdown,
        spread_buckets: strategy.spread_buckets,
        conditional_performance: strategy.conditional_performance,
        rate_periods: strategy.rate_periods,
        strategy_review: strategy.strategy_review,
        diagnostics,
    })
}

fn check_roles(inputs: &AnalysisInputs) -> Result<(), PipelineError> {
    let roles = [
        ("first", Some(&inputs.first)),
        ("second", Some(&inputs.second)),
        ("spread", Some(&inputs.spread)),
        ("asset_return", Some(&inputs.asset_return)),
        ("policy_rate", inputs.policy_rate.as_ref()),
    ];
    for (role, name) in roles.into_iter().filter_map(|(role, name)| Some((role, name?))) {
        if !inputs.series.iter().any(|s| &s.name == name) {
            return Err(PipelineError::MissingSeries {
                role: role.to_string(),
                name: name.clone(),
            });
        }
    }
    Ok(())
}

/// The input series followed by every requested derived series.
fn with_derivatives(inputs: &AnalysisInputs, settings: &Settings) -> Result<Vec<TimeSeries>, PipelineError> {
    let mut series = inputs.series.clone();
    for request in &inputs.derivatives {
        let source = inputs
            .series
            .iter()
            .find(|s| s.name == request.source)
            .ok_or_else(|| PipelineError::MissingSeries {
                role: "derivative source".to_string(),
                name: request.source.clone(),
            })?;
        series.extend(derive_series(source, &request.prefix, &settings.derivatives));
    }
    Ok(series)
}

fn relationships(series: &[TimeSeries], inputs: &AnalysisInputs, settings: &Settings) -> Relationships {
    let (first, second) = (inputs.first.as_str(), inputs.second.as_str());
    let mut diagnostics = Vec::new();

    let aligned = SeriesAligner::new(settings.statistics.min_series_obs).align(series, &[first, second]);
    let (lead_lag, causality) = match aligned {
        Ok(aligned) => {
            let lead_lag = match LeadLagAnalyzer::from_settings(settings).analyze(&aligned, first, second) {
                Ok(report) => {
                    diagnostics.extend(report.diagnostics.iter().cloned());
                    Some(report)
                }
                Err(e) => {
                    diagnostics.push(Diagnostic::from_error("lead_lag", &e));
                    None
                }
            };

            let tester = CausalityTester::from_settings(settings);
            let (reverse, forward) = rayon::join(
                || tester.test(&aligned, second, first),
                || tester.test(&aligned, first, second),
            );
            (lead_lag, vec![reverse, forward])
        }
        Err(e) => {
            diagnostics.push(Diagnostic::from_error(format!("align[{first},{second}]"), &e));
            (None, Vec::new())
        }
    };
    for report in &causality {
        diagnostics.extend(report.diagnostics.iter().cloned());
    }

    let correlations = correlations(series, inputs, settings);
    diagnostics.extend(correlations.diagnostics.iter().cloned());

    Relationships {
        lead_lag,
        correlations,
        causality,
        diagnostics,
    }
}

fn correlations(series: &[TimeSeries], inputs: &AnalysisInputs, settings: &Settings) -> CorrelationReport {
    // Absent columns still get a skipped record from the analyzer.
    let mut present: Vec<&str> = Vec::new();
    for name in inputs.correlation_x.iter().chain(&inputs.correlation_y) {
        if !present.contains(&name.as_str()) && series.iter().any(|s| &s.name == name) {
            present.push(name);
        }
    }

    let analyzer = CorrelationAnalyzer::from_settings(settings);
    match SeriesAligner::new(1).join(series, &present) {
        Ok(panel) => analyzer.analyze(&panel, &inputs.correlation_x, &inputs.correlation_y),
        Err(e) => CorrelationReport {
            records: Vec::new(),
            diagnostics: vec![Diagnostic::from_error("correlation", &e)],
        },
    }
}

fn strategy(
    series: &[TimeSeries],
    inputs: &AnalysisInputs,
    settings: &Settings,
    engine: &BacktestEngine,
) -> Strategy {
    let mut out = Strategy::default();

    let mut names = vec![inputs.spread.as_str(), inputs.asset_return.as_str()];
    if let Some(rate) = &inputs.policy_rate {
        names.push(rate);
    }
    let panel = match SeriesAligner::new(1).join(series, &names) {
        Ok(panel) => panel,
        Err(e) => {
            out.diagnostics.push(Diagnostic::from_error("backtest", &e));
            return out;
        }
    };

    let report = match engine.run_panel(&panel, &inputs.spread, &inputs.asset_return) {
        Ok(report) => report,
        Err(e) => {
            out.diagnostics.push(error_diagnostic("backtest", e.kind(), &e));
            return out;
        }
    };
    out.diagnostics.extend(report.diagnostics);
    let rows = report.rows;

    let analytics = AnalyticsEngine::from_settings(&settings.backtest);
    match analytics.report(&rows) {
        Ok(performance) => {
            out.diagnostics.extend(performance.diagnostics.iter().cloned());
            out.performance = Some(performance);
        }
        Err(e) => out.diagnostics.push(error_diagnostic("performance", e.kind(), &e)),
    }
    out.regime_breakdown = regime_breakdown(&rows, settings.backtest.periods_per_year);

    let buckets = spread_bucket_analysis(
        panel.timestamps(),
        &rows.iter().map(|r| r.spread).collect::<Vec<_>>(),
        &rows.iter().map(|r| r.asset_return).collect::<Vec<_>>(),
        settings.regime.static_buckets,
        settings.statistics.min_series_obs,
        settings.backtest.periods_per_year,
    );
    match buckets {
        Ok(buckets) => out.spread_buckets = Some(buckets),
        Err(e) => out.diagnostics.push(error_diagnostic("spread_buckets", e.kind(), &e)),
    }

    if let Some(rate) = inputs.policy_rate.as_deref().and_then(|name| panel.column(name)) {
        let conditioned = RateConditioning::from_settings(&settings.conditioning)
            .condition(panel.timestamps(), rate)
            .map_err(|e| error_diagnostic("rate_conditioning", e.kind(), &e))
            .and_then(|conditions| {
                let grouped = conditional_performance(
                    &analytics,
                    &rows,
                    &conditions.changes,
                    &conditions.levels,
                    settings.conditioning.rate_level_split,
                )
                .map_err(|e| error_diagnostic("conditional_performance", e.kind(), &e))?;
                Ok((conditions.periods, grouped))
            });
        match conditioned {
            Ok((periods, grouped)) => {
                out.rate_periods = periods;
                out.conditional_performance = grouped;
            }
            Err(diagnostic) => out.diagnostics.push(diagnostic),
        }
    }

    out.strategy_review = strategy_review(&rows, settings.review.lookback_months);
    out.backtest = rows;
    out
}

fn error_diagnostic(scope: &str, kind: DiagnosticKind, error: &dyn std::error::Error) -> Diagnostic {
    tracing::warn!(scope, ?kind, "{error}");
    Diagnostic::new(kind, scope, error.to_string())
}
