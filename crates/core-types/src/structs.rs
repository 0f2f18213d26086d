use crate::enums::{DiagnosticKind, LeadLagDirection, Regime};
use crate::error::AnalysisError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A non-fatal problem attached to a missing or weakened result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// What the problem belongs to, e.g. `lead_lag[lag=-3]` or `correlation[A,B]`.
    pub scope: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            scope: scope.into(),
            message: message.into(),
        }
    }

    /// Wraps a sub-computation failure and logs it at `warn`.
    pub fn from_error(scope: impl Into<String>, error: &AnalysisError) -> Self {
        let diagnostic = Self::new(error.kind(), scope, error.to_string());
        tracing::warn!(scope = %diagnostic.scope, kind = ?diagnostic.kind, "{}", diagnostic.message);
        diagnostic
    }
}

/// Cross-correlation of two series at one signed lag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagResult {
    pub lag: i32,
    pub correlation: f64,
    pub p_value: f64,
    pub n_obs: usize,
    pub direction: LeadLagDirection,
}

impl LagResult {
    pub fn new(lag: i32, correlation: f64, p_value: f64, n_obs: usize) -> Self {
        Self {
            lag,
            correlation,
            p_value,
            n_obs,
            direction: LeadLagDirection::from_lag(lag),
        }
    }

    pub fn label(&self) -> &'static str {
        self.direction.label()
    }
}

/// Pearson correlation of one column pair. A skipped pair keeps its row with
/// `None` values and the reason in `diagnostic`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRecord {
    pub x: String,
    pub y: String,
    pub correlation: Option<f64>,
    pub p_value: Option<f64>,
    pub significant: Option<bool>,
    pub n_obs: usize,
    pub diagnostic: Option<String>,
}

impl CorrelationRecord {
    pub fn pair(&self) -> (&str, &str) {
        (&self.x, &self.y)
    }

    pub fn is_skipped(&self) -> bool {
        self.correlation.is_none()
    }
}

/// Granger F-test outcome for one lag order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalityRecord {
    pub lag_order: usize,
    pub p_value: Option<f64>,
    pub f_statistic: Option<f64>,
    pub df_num: usize,
    pub df_den: usize,
}

/// Percentile thresholds of the trailing spread window for one period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeThresholds {
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p90: f64,
}

impl RegimeThresholds {
    /// Buckets a value using closed upper bounds at every threshold.
    pub fn classify(&self, value: f64) -> Regime {
        if value <= self.p25 {
            Regime::Low
        } else if value <= self.p50 {
            Regime::ModerateLow
        } else if value <= self.p75 {
            Regime::ModerateHigh
        } else if value <= self.p90 {
            Regime::High
        } else {
            Regime::VeryHigh
        }
    }
}

/// One simulated period of the regime strategy. Returns are in percent;
/// cumulative values are growth-of-1 indices; drawdowns are fractions (<= 0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRow {
    pub timestamp: NaiveDate,
    pub spread: Option<f64>,
    pub thresholds: Option<RegimeThresholds>,
    pub regime: Regime,
    pub position_size: f64,
    pub asset_return: Option<f64>,
    pub strategy_return: f64,
    pub asset_cumulative: Option<f64>,
    pub strategy_cumulative: Option<f64>,
    pub asset_drawdown: Option<f64>,
    pub strategy_drawdown: Option<f64>,
}
