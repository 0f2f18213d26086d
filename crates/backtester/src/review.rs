use chrono::{Months, NaiveDate};
use core_types::{BacktestRow, Regime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewAction {
    #[serde(rename = "Increase Position")]
    IncreasePosition,
    #[serde(rename = "Decrease Position")]
    DecreasePosition,
    #[serde(rename = "Regime Change")]
    RegimeChange,
}

/// One recent period of the strategy, with what changed since the period before.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewRecord {
    pub date: NaiveDate,
    pub regime: Regime,
    pub spread: Option<f64>,
    pub position_size: f64,
    pub asset_return: Option<f64>,
    pub strategy_return: f64,
    pub action: Option<ReviewAction>,
}

/// The last `lookback_months` calendar months of the backtest, both ends included.
///
/// Actions compare each row with the row before it in the full history, so
/// the first reviewed row can still carry one.
pub fn strategy_review(rows: &[BacktestRow], lookback_months: u32) -> Vec<ReviewRecord> {
    let Some(last) = rows.last() else {
        return Vec::new();
    };
    let cutoff = last
        .timestamp
        .checked_sub_months(Months::new(lookback_months))
        .unwrap_or(NaiveDate::MIN);

    let first = rows.partition_point(|r| r.timestamp < cutoff);
    let records: Vec<ReviewRecord> = (first..rows.len())
        .map(|i| {
            let row = &rows[i];
            let action = i.checked_sub(1).and_then(|p| action_between(&rows[p], row));
            ReviewRecord {
                date: row.timestamp,
                regime: row.regime,
                spread: row.spread,
                position_size: row.position_size,
                asset_return: row.asset_return,
                strategy_return: row.strategy_return,
                action,
            }
        })
        .collect();

    tracing::debug!(
        records = records.len(),
        actions = records.iter().filter(|r| r.action.is_some()).count(),
        "Strategy review built"
    );
    records
}

fn action_between(previous: &BacktestRow, current: &BacktestRow) -> Option<ReviewAction> {
    if current.position_size > previous.position_size {
        Some(ReviewAction::IncreasePosition)
    } else if current.position_size < previous.position_size {
        Some(ReviewAction::DecreasePosition)
    } else if current.regime != previous.regime {
        Some(ReviewAction::RegimeChange)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(month: u32, regime: Regime, position_size: f64) -> BacktestRow {
        BacktestRow {
            timestamp: NaiveDate::from_ymd_opt(2023, 1, 31)
                .unwrap()
                .checked_add_months(Months::new(month))
                .unwrap(),
            spread: Some(3.0),
            thresholds: None,
            regime,
            position_size,
            asset_return: Some(1.0),
            strategy_return: position_size,
            asset_cumulative: None,
            strategy_cumulative: None,
            asset_drawdown: None,
            strategy_drawdown: None,
        }
    }

    #[test]
    fn keeps_lookback_window_inclusive() {
        let rows: Vec<BacktestRow> = (0..20).map(|m| row(m, Regime::Low, 1.0)).collect();
        let review = strategy_review(&rows, 12);
        assert_eq!(review.len(), 13);
        assert_eq!(review[0].date, rows[7].timestamp);
        assert!(review.iter().all(|r| r.action.is_none()));
    }

    #[test]
    fn actions_compare_with_previous_row() {
        let rows = vec![
            row(0, Regime::Low, 1.0),
            row(1, Regime::High, 0.25),
            row(2, Regime::Unknown, 0.5),
            row(3, Regime::ModerateHigh, 0.5),
            row(4, Regime::ModerateHigh, 0.5),
        ];
        let review = strategy_review(&rows, 3);
        let actions: Vec<Option<ReviewAction>> = review.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![
                Some(ReviewAction::DecreasePosition),
                Some(ReviewAction::IncreasePosition),
                Some(ReviewAction::RegimeChange),
                None
            ]
        );
    }

    #[test]
    fn first_row_of_history_has_no_action() {
        let rows = vec![row(0, Regime::Low, 1.0)];
        let review = strategy_review(&rows, 12);
        assert_eq!(review.len(), 1);
        assert_eq!(review[0].action, None);
        assert!(strategy_review(&[], 12).is_empty());
    }

    #[test]
    fn actions_serialize_as_labels() {
        let json = serde_json::to_string(&ReviewAction::RegimeChange).unwrap();
        assert_eq!(json, "\"Regime Change\"");
    }
}
