use core_types::Diagnostic;
use serde::{Deserialize, Serialize};

/// Risk and return statistics of one return series.
///
/// Returns and volatilities are in percent; `max_drawdown` is a fraction (<= 0)
/// and `win_rate` a fraction in [0, 1]. `max_drawdown` is `None` once the
/// cumulative index stopped being valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub annualized_return: f64,
    pub excess_return: f64,
    pub volatility: f64,
    pub downside_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub max_drawdown: Option<f64>,
    pub win_rate: f64,
    pub n_periods: usize,
}

/// Strategy minus asset for the headline statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Outperformance {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Positive when the strategy's worst drawdown was shallower.
    pub max_drawdown: Option<f64>,
}

impl Outperformance {
    pub fn between(strategy: &PerformanceSummary, asset: &PerformanceSummary) -> Self {
        Self {
            total_return: strategy.total_return - asset.total_return,
            annualized_return: strategy.annualized_return - asset.annualized_return,
            sharpe_ratio: strategy.sharpe_ratio - asset.sharpe_ratio,
            sortino_ratio: strategy.sortino_ratio - asset.sortino_ratio,
            max_drawdown: strategy.max_drawdown.zip(asset.max_drawdown).map(|(s, a)| s - a),
        }
    }
}

/// Asset and strategy measured over the same rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub asset: PerformanceSummary,
    pub strategy: PerformanceSummary,
    /// Annual, in percent.
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
    pub outperformance: Outperformance,
    pub diagnostics: Vec<Diagnostic>,
}
