use crate::error::BacktestError;
use chrono::NaiveDate;
use configuration::{PositionSizes, Settings};
use core_types::{BacktestRow, Diagnostic, DiagnosticKind, Panel};
use regime::RegimeClassifier;
use serde::Serialize;

/// The simulated history, one row per input period, plus anything that went
/// wrong while compounding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub rows: Vec<BacktestRow>,
    pub diagnostics: Vec<Diagnostic>,
}

impl BacktestReport {
    /// Rows that carry an asset return; both series are measured over these.
    pub fn measured_rows(&self) -> impl Iterator<Item = &BacktestRow> {
        self.rows.iter().filter(|r| r.asset_return.is_some())
    }
}

/// Growth-of-1 index with its running peak.
///
/// Once the index stops being a positive finite number the series is invalid
/// for the rest of the run.
#[derive(Debug, Clone, Copy)]
struct Compounder {
    level: f64,
    peak: f64,
    invalid: bool,
}

enum Step {
    Valid { cumulative: f64, drawdown: f64 },
    /// The step that broke the index, with the offending level.
    Invalidated(f64),
    Invalid,
}

impl Compounder {
    fn new() -> Self {
        Self {
            level: 1.0,
            peak: 0.0,
            invalid: false,
        }
    }

    fn advance(&mut self, return_pct: f64) -> Step {
        if self.invalid {
            return Step::Invalid;
        }
        self.level *= 1.0 + return_pct / 100.0;
        if !self.level.is_finite() || self.level <= 0.0 {
            self.invalid = true;
            return Step::Invalidated(self.level);
        }
        self.peak = self.peak.max(self.level);
        Step::Valid {
            cumulative: self.level,
            drawdown: self.level / self.peak - 1.0,
        }
    }
}

/// Simulates the regime strategy: hold `size_for(regime)` of the asset each
/// period and compare it with holding the asset outright.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    classifier: RegimeClassifier,
    sizes: PositionSizes,
}

impl BacktestEngine {
    pub fn new(classifier: RegimeClassifier, sizes: PositionSizes) -> Self {
        Self { classifier, sizes }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, BacktestError> {
        Ok(Self::new(
            RegimeClassifier::from_settings(&settings.regime)?,
            settings.backtest.position_sizes,
        ))
    }

    /// Runs the backtest over two columns of an outer-joined panel.
    pub fn run_panel(&self, panel: &Panel, spread: &str, asset_return: &str) -> Result<BacktestReport, BacktestError> {
        let column = |name: &str| {
            panel.column(name).ok_or_else(|| {
                core_types::AnalysisError::InvalidInput(name.to_string(), "series not present in panel".to_string())
            })
        };
        self.run(panel.timestamps(), column(spread)?, column(asset_return)?)
    }

    /// Simulates every period. Returns are in percent; a missing asset return
    /// earns nothing and leaves both indices where they were.
    #[tracing::instrument(name = "backtest", skip_all, fields(periods = timestamps.len()))]
    pub fn run(
        &self,
        timestamps: &[NaiveDate],
        spread: &[Option<f64>],
        asset_returns: &[Option<f64>],
    ) -> Result<BacktestReport, BacktestError> {
        if timestamps.is_empty() {
            return Err(BacktestError::EmptyInput);
        }
        for (column, len) in [("spread", spread.len()), ("asset_return", asset_returns.len())] {
            if len != timestamps.len() {
                return Err(BacktestError::LengthMismatch {
                    column: column.to_string(),
                    expected: timestamps.len(),
                    actual: len,
                });
            }
        }

        let classified = self.classifier.classify(spread);

        let mut asset_index = Compounder::new();
        let mut strategy_index = Compounder::new();
        let mut started = false;
        let mut rows = Vec::with_capacity(timestamps.len());
        let mut diagnostics = Vec::new();

        for (i, &timestamp) in timestamps.iter().enumerate() {
            let asset_return = asset_returns[i].filter(|r| r.is_finite());
            let regime = classified[i].regime;
            let position_size = self.sizes.size_for(regime);
            let strategy_return = asset_return.map_or(0.0, |r| position_size * r);

            started |= asset_return.is_some();
            let mut row = BacktestRow {
                timestamp,
                spread: spread[i],
                thresholds: classified[i].thresholds,
                regime,
                position_size,
                asset_return,
                strategy_return,
                asset_cumulative: None,
                strategy_cumulative: None,
                asset_drawdown: None,
                strategy_drawdown: None,
            };

            if started {
                let step = asset_index.advance(asset_return.unwrap_or(0.0));
                diagnostics.extend(apply_step(step, "asset", timestamp, &mut row.asset_cumulative, &mut row.asset_drawdown));
                let step = strategy_index.advance(strategy_return);
                diagnostics.extend(apply_step(
                    step,
                    "strategy",
                    timestamp,
                    &mut row.strategy_cumulative,
                    &mut row.strategy_drawdown,
                ));
            }
            rows.push(row);
        }

        tracing::info!(
            periods = rows.len(),
            asset = ?rows.last().and_then(|r| r.asset_cumulative),
            strategy = ?rows.last().and_then(|r| r.strategy_cumulative),
            "Backtest complete"
        );
        Ok(BacktestReport { rows, diagnostics })
    }
}

/// Writes a compounding step into a row, returning a diagnostic on the step
/// that invalidated the series.
fn apply_step(
    step: Step,
    series: &str,
    timestamp: NaiveDate,
    cumulative: &mut Option<f64>,
    drawdown: &mut Option<f64>,
) -> Option<Diagnostic> {
    match step {
        Step::Valid { cumulative: c, drawdown: d } => {
            *cumulative = Some(c);
            *drawdown = Some(d);
            None
        }
        Step::Invalidated(level) => {
            tracing::warn!(series, %timestamp, level, "Cumulative index left the valid range");
            Some(Diagnostic::new(
                DiagnosticKind::InvalidState,
                format!("backtest[{series}]"),
                format!("cumulative index reached {level} on {timestamp}; no values from here on"),
            ))
        }
        Step::Invalid => None,
    }
}
