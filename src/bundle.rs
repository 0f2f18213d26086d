use analytics::{ConditionalPerformance, PerformanceReport, RegimeStats, SpreadBucketAnalysis};
use analyzer::{CausalityReport, CorrelationReport, LeadLagReport};
use backtester::{RatePeriod, ReviewRecord};
use core_types::{BacktestRow, Diagnostic, TimeSeries};
use serde::{Deserialize, Serialize};

/// Builds the change, direction and z-score series of `source` under `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivativeRequest {
    pub source: String,
    pub prefix: String,
}

/// Everything one run needs: the raw series and the role each one plays.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisInputs {
    pub series: Vec<TimeSeries>,
    /// The lead-lag and causality pair.
    pub first: String,
    pub second: String,
    pub spread: String,
    /// Periodic asset returns in percent.
    pub asset_return: String,
    pub policy_rate: Option<String>,
    /// Correlation grid; derived series may be named here too.
    pub correlation_x: Vec<String>,
    pub correlation_y: Vec<String>,
    pub derivatives: Vec<DerivativeRequest>,
}

/// The complete result of one run.
///
/// Sections that could not be computed are empty or `None`, with the reason in
/// `diagnostics`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisBundle {
    pub lead_lag: Option<LeadLagReport>,
    pub correlations: CorrelationReport,
    /// `second -> first`, then `first -> second`.
    pub causality: Vec<CausalityReport>,
    pub backtest: Vec<BacktestRow>,
    pub performance: Option<PerformanceReport>,
    pub regime_breakdown: Vec<RegimeStats>,
    /// Asset returns grouped by full-sample spread buckets.
    pub spread_buckets: Option<SpreadBucketAnalysis>,
    pub conditional_performance: Vec<ConditionalPerformance>,
    pub rate_periods: Vec<RatePeriod>,
    pub strategy_review: Vec<ReviewRecord>,
    /// Every diagnostic of the run: relationship branch first, then the backtest branch.
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisBundle {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
