use core_types::stats::{mean, sample_std};
use core_types::{BacktestRow, Regime};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegimeStats {
    pub regime: Regime,
    pub count: usize,
    pub mean_strategy_return: f64,
    pub std_strategy_return: Option<f64>,
    pub mean_asset_return: f64,
    /// Annualized mean over deviation of the asset return while in this regime.
    pub asset_sharpe: Option<f64>,
}

/// Per-regime statistics over the rows with an asset return, in regime order.
pub fn regime_breakdown(rows: &[BacktestRow], periods_per_year: u32) -> Vec<RegimeStats> {
    let mut grouped: BTreeMap<Regime, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for row in rows {
        if let Some(asset_return) = row.asset_return {
            let (asset, strategy) = grouped.entry(row.regime).or_default();
            asset.push(asset_return);
            strategy.push(row.strategy_return);
        }
    }

    let annualizer = f64::from(periods_per_year).sqrt();
    grouped
        .into_iter()
        .filter_map(|(regime, (asset, strategy))| {
            let mean_asset_return = mean(&asset)?;
            let asset_sharpe = sample_std(&asset)
                .filter(|s| *s > 0.0)
                .map(|s| mean_asset_return / s * annualizer);
            Some(RegimeStats {
                regime,
                count: asset.len(),
                mean_strategy_return: mean(&strategy)?,
                std_strategy_return: sample_std(&strategy),
                mean_asset_return,
                asset_sharpe,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(regime: Regime, asset_return: Option<f64>, size: f64) -> BacktestRow {
        BacktestRow {
            timestamp: NaiveDate::from_ymd_opt(2020, 1, 31).unwrap(),
            spread: Some(4.0),
            thresholds: None,
            regime,
            position_size: size,
            asset_return,
            strategy_return: asset_return.map_or(0.0, |r| r * size),
            asset_cumulative: None,
            strategy_cumulative: None,
            asset_drawdown: None,
            strategy_drawdown: None,
        }
    }

    #[test]
    fn groups_in_regime_order() {
        let rows = vec![
            row(Regime::VeryHigh, Some(-4.0), 0.1),
            row(Regime::Low, Some(2.0), 1.0),
            row(Regime::Low, Some(4.0), 1.0),
            row(Regime::Unknown, None, 0.5),
            row(Regime::VeryHigh, Some(-2.0), 0.1),
        ];
        let stats = regime_breakdown(&rows, 12);

        let regimes: Vec<Regime> = stats.iter().map(|s| s.regime).collect();
        assert_eq!(regimes, vec![Regime::Low, Regime::VeryHigh]);

        let low = &stats[0];
        assert_eq!(low.count, 2);
        assert_eq!(low.mean_asset_return, 3.0);
        let expected = 3.0 / 2f64.sqrt() * 12f64.sqrt();
        assert!((low.asset_sharpe.unwrap() - expected).abs() < 1e-12);

        assert!((stats[1].mean_strategy_return + 0.3).abs() < 1e-12);
    }

    #[test]
    fn single_observation_has_no_deviation() {
        let stats = regime_breakdown(&[row(Regime::High, Some(1.0), 0.25)], 12);
        assert_eq!(stats[0].std_strategy_return, None);
        assert_eq!(stats[0].asset_sharpe, None);
    }
}
