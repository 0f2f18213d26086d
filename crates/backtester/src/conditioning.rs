use crate::error::BacktestError;
use chrono::NaiveDate;
use configuration::ConditioningSettings;
use core_types::RateChange;
use serde::Serialize;

/// A run of consecutive periods with the same rate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatePeriod {
    pub kind: RateChange,
    pub start: NaiveDate,
    /// First period after the run, or the last timestamp if the run is still open.
    pub end: NaiveDate,
}

/// The policy-rate view of the backtest, aligned with its rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateConditions {
    /// Forward-filled rate level.
    pub levels: Vec<Option<f64>>,
    pub changes: Vec<RateChange>,
    pub periods: Vec<RatePeriod>,
}

/// Labels policy-rate increases and decreases larger than a threshold.
#[derive(Debug, Clone)]
pub struct RateConditioning {
    threshold: f64,
}

impl RateConditioning {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn from_settings(settings: &ConditioningSettings) -> Self {
        Self::new(settings.rate_change_threshold)
    }

    pub fn condition(&self, timestamps: &[NaiveDate], rate: &[Option<f64>]) -> Result<RateConditions, BacktestError> {
        if rate.len() != timestamps.len() {
            return Err(BacktestError::LengthMismatch {
                column: "policy_rate".to_string(),
                expected: timestamps.len(),
                actual: rate.len(),
            });
        }

        let levels = forward_fill(rate);
        if levels.iter().all(Option::is_none) {
            tracing::warn!("Policy rate has no observations; every period is unchanged");
        }

        let changes: Vec<RateChange> = std::iter::once(RateChange::None)
            .chain(levels.windows(2).map(|w| match (w[0], w[1]) {
                (Some(prev), Some(curr)) => self.label(curr - prev),
                _ => RateChange::None,
            }))
            .take(levels.len())
            .collect();

        let periods = group_periods(timestamps, &changes);
        tracing::debug!(periods = periods.len(), "Policy-rate periods identified");
        Ok(RateConditions {
            levels,
            changes,
            periods,
        })
    }

    fn label(&self, diff: f64) -> RateChange {
        if diff > self.threshold {
            RateChange::Increase
        } else if diff < -self.threshold {
            RateChange::Decrease
        } else {
            RateChange::None
        }
    }
}

fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut last = None;
    values
        .iter()
        .map(|v| {
            if let Some(v) = v.filter(|v| v.is_finite()) {
                last = Some(v);
            }
            last
        })
        .collect()
}

fn group_periods(timestamps: &[NaiveDate], changes: &[RateChange]) -> Vec<RatePeriod> {
    let mut periods = Vec::new();
    let mut open: Option<(RateChange, NaiveDate)> = None;

    for (&ts, &change) in timestamps.iter().zip(changes) {
        match open {
            Some((kind, _)) if kind == change => {}
            _ => {
                if let Some((kind, start)) = open.take() {
                    periods.push(RatePeriod { kind, start, end: ts });
                }
                if change != RateChange::None {
                    open = Some((change, ts));
                }
            }
        }
    }

    if let (Some((kind, start)), Some(&end)) = (open, timestamps.last()) {
        periods.push(RatePeriod { kind, start, end });
    }
    periods
}
