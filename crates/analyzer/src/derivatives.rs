//! Change, direction and z-score series derived from a level series.

use configuration::DerivativeSettings;
use core_types::TimeSeries;
use core_types::stats::{mean, sample_std};

/// Horizons of the percentage-change series, in periods.
const CHANGE_HORIZONS: [(&str, usize); 3] = [("MoM", 1), ("QoQ", 3), ("YoY", 12)];

/// Builds `{prefix}_MoM`, `_QoQ`, `_YoY`, `_MoM_Dir`, `_YoY_Dir` and `_ZScore`
/// from `source`, in that order. Every output shares the source's timestamps.
pub fn derive_series(source: &TimeSeries, prefix: &str, settings: &DerivativeSettings) -> Vec<TimeSeries> {
    let mut points = source.points.clone();
    points.sort_by_key(|(ts, _)| *ts);
    let dates: Vec<_> = points.iter().map(|(ts, _)| *ts).collect();
    let values: Vec<Option<f64>> = points.iter().map(|(_, v)| v.filter(|v| v.is_finite())).collect();

    let with_dates = |name: String, column: Vec<Option<f64>>| {
        TimeSeries::new(name, dates.iter().copied().zip(column).collect())
    };

    let changes: Vec<Vec<Option<f64>>> = CHANGE_HORIZONS
        .iter()
        .map(|(_, periods)| pct_change(&values, *periods))
        .collect();

    let mut derived: Vec<TimeSeries> = CHANGE_HORIZONS
        .iter()
        .zip(&changes)
        .map(|((suffix, _), column)| with_dates(format!("{prefix}_{suffix}"), column.clone()))
        .collect();

    derived.push(with_dates(format!("{prefix}_MoM_Dir"), direction(&changes[0])));
    derived.push(with_dates(format!("{prefix}_YoY_Dir"), direction(&changes[2])));
    derived.push(with_dates(
        format!("{prefix}_ZScore"),
        rolling_zscore(&values, settings.zscore_window, settings.zscore_min_periods),
    ));

    tracing::debug!(source = %source.name, prefix, count = derived.len(), "Derived series built");
    derived
}

/// Percentage change against the value `periods` rows earlier.
pub fn pct_change(values: &[Option<f64>], periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let base = values.get(i.checked_sub(periods)?).copied().flatten()?;
            let current = values[i]?;
            if base == 0.0 {
                return None;
            }
            Some((current / base - 1.0) * 100.0)
        })
        .collect()
}

/// Sign of each change; a missing change counts as flat.
fn direction(changes: &[Option<f64>]) -> Vec<Option<f64>> {
    changes
        .iter()
        .map(|c| {
            let c = c.unwrap_or(0.0);
            Some(if c > 0.0 {
                1.0
            } else if c < 0.0 {
                -1.0
            } else {
                0.0
            })
        })
        .collect()
}

/// `(x - mean) / sample_std` over the trailing `window` rows, current row
/// included. Gaps inside the window are skipped and do not count toward
/// `min_periods`.
pub fn rolling_zscore(values: &[Option<f64>], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let current = values[i]?;
            let start = (i + 1).saturating_sub(window);
            let observed: Vec<f64> = values[start..=i].iter().flatten().copied().collect();
            if observed.len() < min_periods {
                return None;
            }
            let std = sample_std(&observed).filter(|s| *s > 0.0)?;
            Some((current - mean(&observed)?) / std)
        })
        .collect()
}
