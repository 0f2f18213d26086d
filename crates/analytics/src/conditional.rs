use crate::engine::AnalyticsEngine;
use crate::error::AnalyticsError;
use crate::report::PerformanceReport;
use core_types::{BacktestRow, RateChange};
use serde::Serialize;

/// The subset of backtest periods a conditional report covers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum RateCondition {
    Change(RateChange),
    RateAtOrAbove(f64),
    RateBelow(f64),
}

impl RateCondition {
    fn holds(&self, change: RateChange, level: Option<f64>) -> bool {
        match *self {
            RateCondition::Change(kind) => change == kind,
            RateCondition::RateAtOrAbove(split) => level.is_some_and(|l| l >= split),
            RateCondition::RateBelow(split) => level.is_some_and(|l| l < split),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalPerformance {
    pub condition: RateCondition,
    pub report: PerformanceReport,
}

/// Performance split by policy-rate move and by policy-rate level.
///
/// `changes` and `levels` run parallel to `rows`. Conditions that match no
/// measurable row are left out.
pub fn conditional_performance(
    engine: &AnalyticsEngine,
    rows: &[BacktestRow],
    changes: &[RateChange],
    levels: &[Option<f64>],
    rate_level_split: f64,
) -> Result<Vec<ConditionalPerformance>, AnalyticsError> {
    if changes.len() != rows.len() || levels.len() != rows.len() {
        return Err(AnalyticsError::Calculation(format!(
            "rate conditions cover {} and {} periods, backtest has {}",
            changes.len(),
            levels.len(),
            rows.len()
        )));
    }

    let conditions = [
        RateCondition::Change(RateChange::Increase),
        RateCondition::Change(RateChange::Decrease),
        RateCondition::Change(RateChange::None),
        RateCondition::RateAtOrAbove(rate_level_split),
        RateCondition::RateBelow(rate_level_split),
    ];

    let mut results = Vec::new();
    for condition in conditions {
        let subset: Vec<BacktestRow> = rows
            .iter()
            .zip(changes.iter().zip(levels))
            .filter(|(_, (change, level))| condition.holds(**change, **level))
            .map(|(row, _)| row.clone())
            .collect();

        match engine.report(&subset) {
            Ok(report) => results.push(ConditionalPerformance { condition, report }),
            Err(AnalyticsError::NotEnoughData(_)) => {
                tracing::debug!(?condition, "No measurable periods for condition, omitted");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(results)
}
