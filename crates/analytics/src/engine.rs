use crate::error::AnalyticsError;
use crate::report::{Outperformance, PerformanceReport, PerformanceSummary};
use configuration::BacktestSettings;
use core_types::stats::{mean, sample_std};
use core_types::{BacktestRow, Diagnostic, DiagnosticKind};

/// Fewer periods than this still produce numbers, flagged as unreliable.
pub const MIN_RELIABLE_PERIODS: usize = 12;

/// A stateless calculator for annualized risk and return statistics.
#[derive(Debug, Clone)]
pub struct AnalyticsEngine {
    periods_per_year: u32,
    risk_free_rate: f64,
}

impl AnalyticsEngine {
    pub fn new(periods_per_year: u32, risk_free_rate: f64) -> Self {
        Self {
            periods_per_year,
            risk_free_rate,
        }
    }

    pub fn from_settings(settings: &BacktestSettings) -> Self {
        Self::new(settings.periods_per_year, settings.risk_free_rate)
    }

    /// Measures the asset and the strategy over the rows that carry an asset return.
    pub fn report(&self, rows: &[BacktestRow]) -> Result<PerformanceReport, AnalyticsError> {
        let measured: Vec<&BacktestRow> = rows.iter().filter(|r| r.asset_return.is_some()).collect();

        let asset_returns: Vec<f64> = measured.iter().filter_map(|r| r.asset_return).collect();
        let asset_drawdowns: Vec<Option<f64>> = measured.iter().map(|r| r.asset_drawdown).collect();
        let strategy_returns: Vec<f64> = measured.iter().map(|r| r.strategy_return).collect();
        let strategy_drawdowns: Vec<Option<f64>> = measured.iter().map(|r| r.strategy_drawdown).collect();

        let (asset, mut diagnostics) = self.summarize("performance[asset]", &asset_returns, &asset_drawdowns)?;
        let (strategy, strategy_diagnostics) =
            self.summarize("performance[strategy]", &strategy_returns, &strategy_drawdowns)?;
        diagnostics.extend(strategy_diagnostics);

        tracing::info!(
            periods = asset.n_periods,
            asset_sharpe = asset.sharpe_ratio,
            strategy_sharpe = strategy.sharpe_ratio,
            "Performance measured"
        );

        Ok(PerformanceReport {
            outperformance: Outperformance::between(&strategy, &asset),
            asset,
            strategy,
            risk_free_rate: self.risk_free_rate,
            periods_per_year: self.periods_per_year,
            diagnostics,
        })
    }

    /// Computes the statistics of one percent-return series and its drawdowns.
    ///
    /// A `None` drawdown marks a period after the cumulative index became
    /// invalid; the maximum drawdown is then undefined and reported as such.
    pub fn summarize(
        &self,
        scope: &str,
        returns: &[f64],
        drawdowns: &[Option<f64>],
    ) -> Result<(PerformanceSummary, Vec<Diagnostic>), AnalyticsError> {
        let n = returns.len();
        let avg = mean(returns).ok_or_else(|| AnalyticsError::NotEnoughData(format!("{scope}: no returns")))?;

        let ppy = f64::from(self.periods_per_year);
        let annualizer = ppy.sqrt();

        let growth: f64 = returns.iter().map(|r| 1.0 + r / 100.0).product();
        let total_return = (growth - 1.0) * 100.0;
        if !total_return.is_finite() {
            return Err(AnalyticsError::Calculation(format!("{scope}: total return is not finite")));
        }

        let annualized_return = avg * ppy;
        let excess_return = annualized_return - self.risk_free_rate;
        let volatility = sample_std(returns).map_or(0.0, |s| s * annualizer);

        let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
        let downside_volatility = sample_std(&downside).map_or(0.0, |s| s * annualizer);

        let ratio = |denominator: f64| if denominator > 0.0 { excess_return / denominator } else { 0.0 };

        let summary = PerformanceSummary {
            total_return,
            annualized_return,
            excess_return,
            volatility,
            downside_volatility,
            sharpe_ratio: ratio(volatility),
            sortino_ratio: ratio(downside_volatility),
            max_drawdown: drawdowns
                .iter()
                .copied()
                .try_fold(0.0, |worst: f64, d| d.map(|d| worst.min(d))),
            win_rate: returns.iter().filter(|r| **r > 0.0).count() as f64 / n as f64,
            n_periods: n,
        };

        let mut diagnostics = Vec::new();
        if summary.max_drawdown.is_none() {
            tracing::warn!(scope, "Drawdown undefined after the cumulative index became invalid");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::InvalidState,
                scope,
                "cumulative index became invalid, maximum drawdown is undefined",
            ));
        }
        if n < MIN_RELIABLE_PERIODS {
            tracing::warn!(scope, periods = n, "Performance measured over too few periods to be reliable");
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::Reliability,
                scope,
                format!("only {n} periods, statistics need at least {MIN_RELIABLE_PERIODS} to be reliable"),
            ));
        }

        Ok((summary, diagnostics))
    }
}
