use crate::error::AnalyticsError;
use chrono::NaiveDate;
use core_types::stats::{mean, quantile_sorted, sample_std};
use serde::Serialize;

/// Returns grouped by where the spread sits in its full-sample distribution.
///
/// Unlike the backtest regimes, the cut points are computed once over the whole
/// history, so every period is judged with hindsight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadBucketAnalysis {
    /// Ascending cut points; a spread equal to a cut point falls in the lower bucket.
    pub thresholds: Vec<f64>,
    /// Non-empty buckets, lowest spread first.
    pub buckets: Vec<SpreadBucketStats>,
    pub observations: Vec<BucketedObservation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadBucketStats {
    pub bucket: usize,
    pub label: String,
    pub count: usize,
    pub mean_return: f64,
    pub std_return: Option<f64>,
    /// Simple sum of the bucket's returns, in percent.
    pub total_return: f64,
    pub sharpe_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketedObservation {
    pub timestamp: NaiveDate,
    pub spread: f64,
    pub asset_return: f64,
    pub bucket: usize,
    /// Running sum of this bucket's returns up to and including this period.
    pub cumulative_return: f64,
}

fn cut_points(buckets: usize) -> Result<&'static [f64], AnalyticsError> {
    match buckets {
        3 => Ok(&[0.33, 0.67][..]),
        4 => Ok(&[0.25, 0.50, 0.75][..]),
        n => Err(AnalyticsError::Calculation(format!("{n} spread buckets, expected 3 or 4"))),
    }
}

fn label(buckets: usize, bucket: usize) -> &'static str {
    const TERCILES: [&str; 3] = ["Low Spread", "Medium Spread", "High Spread"];
    const QUARTILES: [&str; 4] = ["Q1 (Lowest)", "Q2", "Q3", "Q4 (Highest)"];
    if buckets == 3 { TERCILES[bucket] } else { QUARTILES[bucket] }
}

/// Buckets every period that has both a spread and an asset return and
/// summarizes the asset return per bucket.
pub fn spread_bucket_analysis(
    timestamps: &[NaiveDate],
    spread: &[Option<f64>],
    asset_returns: &[Option<f64>],
    buckets: usize,
    min_obs: usize,
    periods_per_year: u32,
) -> Result<SpreadBucketAnalysis, AnalyticsError> {
    if spread.len() != timestamps.len() || asset_returns.len() != timestamps.len() {
        return Err(AnalyticsError::Calculation(format!(
            "spread has {} and returns {} periods, expected {}",
            spread.len(),
            asset_returns.len(),
            timestamps.len()
        )));
    }
    let quantiles = cut_points(buckets)?;

    let complete: Vec<(NaiveDate, f64, f64)> = timestamps
        .iter()
        .zip(spread.iter().zip(asset_returns))
        .filter_map(|(&t, (s, r))| Some((t, (*s)?, (*r)?)))
        .filter(|(_, s, r)| s.is_finite() && r.is_finite())
        .collect();
    if complete.len() < min_obs.max(1) {
        return Err(AnalyticsError::NotEnoughData(format!(
            "spread buckets need {min_obs} complete periods, got {}",
            complete.len()
        )));
    }

    let mut sorted: Vec<f64> = complete.iter().map(|(_, s, _)| *s).collect();
    sorted.sort_by(f64::total_cmp);
    let thresholds: Vec<f64> = quantiles
        .iter()
        .filter_map(|q| quantile_sorted(&sorted, *q))
        .collect();

    let mut running = vec![0.0; buckets];
    let mut grouped: Vec<Vec<f64>> = vec![Vec::new(); buckets];
    let observations: Vec<BucketedObservation> = complete
        .iter()
        .map(|&(timestamp, spread, asset_return)| {
            let bucket = thresholds.iter().filter(|t| spread > **t).count();
            running[bucket] += asset_return;
            grouped[bucket].push(asset_return);
            BucketedObservation {
                timestamp,
                spread,
                asset_return,
                bucket,
                cumulative_return: running[bucket],
            }
        })
        .collect();

    let annualizer = f64::from(periods_per_year).sqrt();
    let stats: Vec<SpreadBucketStats> = grouped
        .iter()
        .enumerate()
        .filter_map(|(bucket, returns)| {
            let mean_return = mean(returns)?;
            let std_return = sample_std(returns);
            Some(SpreadBucketStats {
                bucket,
                label: label(buckets, bucket).to_string(),
                count: returns.len(),
                mean_return,
                std_return,
                total_return: returns.iter().sum(),
                sharpe_ratio: std_return.filter(|s| *s > 0.0).map(|s| mean_return / s * annualizer),
            })
        })
        .collect();

    tracing::debug!(?thresholds, buckets = stats.len(), "Spread buckets computed");
    Ok(SpreadBucketAnalysis {
        thresholds,
        buckets: stats,
        observations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Months;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2001, 1, 31).unwrap();
        (0..n)
            .map(|i| start.checked_add_months(Months::new(i as u32)).unwrap())
            .collect()
    }

    fn ramp(n: usize) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
        let spread: Vec<Option<f64>> = (0..n).map(|i| Some(i as f64)).collect();
        let returns: Vec<Option<f64>> = (0..n).map(|i| Some(i as f64 / 10.0)).collect();
        (spread, returns)
    }

    #[test]
    fn terciles_cut_at_33_and_67_percent() {
        let (spread, returns) = ramp(100);
        let out = spread_bucket_analysis(&dates(100), &spread, &returns, 3, 50, 12).unwrap();

        // 0.33 * 99 and 0.67 * 99
        assert!((out.thresholds[0] - 32.67).abs() < 1e-9);
        assert!((out.thresholds[1] - 66.33).abs() < 1e-9);

        let counts: Vec<usize> = out.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![33, 34, 33]);
        assert_eq!(out.buckets[0].label, "Low Spread");
        assert_eq!(out.buckets[2].label, "High Spread");

        // spreads 0..=32 earn 0.0..=3.2
        let low = &out.buckets[0];
        assert!((low.mean_return - 1.6).abs() < 1e-12);
        assert!((low.total_return - 52.8).abs() < 1e-9);
        let expected_std = (33.0f64 * 34.0 / 12.0).sqrt() / 10.0;
        assert!((low.std_return.unwrap() - expected_std).abs() < 1e-12);
        assert!((low.sharpe_ratio.unwrap() - 1.6 / expected_std * 12f64.sqrt()).abs() < 1e-9);

        assert!((out.observations[32].cumulative_return - 52.8).abs() < 1e-9);
        assert_eq!(out.observations[33].bucket, 1);
        assert!((out.observations[33].cumulative_return - 3.3).abs() < 1e-12);
    }

    #[test]
    fn quartiles_split_evenly() {
        let (spread, returns) = ramp(100);
        let out = spread_bucket_analysis(&dates(100), &spread, &returns, 4, 50, 12).unwrap();
        assert_eq!(out.thresholds, vec![24.75, 49.5, 74.25]);
        let counts: Vec<usize> = out.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![25, 25, 25, 25]);
        assert_eq!(out.buckets[3].label, "Q4 (Highest)");
    }

    #[test]
    fn value_on_a_cut_point_falls_in_the_lower_bucket() {
        // sorted 1..=5: quartile cuts 2, 3, 4
        let spread = [3.0, 1.0, 5.0, 2.0, 4.0].map(Some);
        let returns = [1.0, -1.0, 2.0, 0.5, -0.5].map(Some);
        let out = spread_bucket_analysis(&dates(5), &spread, &returns, 4, 5, 12).unwrap();
        let buckets: Vec<usize> = out.observations.iter().map(|o| o.bucket).collect();
        assert_eq!(buckets, vec![1, 0, 3, 0, 2]);
        assert_eq!(out.buckets[0].count, 2);
        // running sum follows time order within the bucket
        assert_eq!(out.observations[3].cumulative_return, -0.5);
    }

    #[test]
    fn gaps_are_dropped_before_counting() {
        let (mut spread, mut returns) = ramp(52);
        spread[3] = None;
        returns[7] = None;
        let err = spread_bucket_analysis(&dates(52), &spread, &returns, 3, 51, 12).unwrap_err();
        assert!(matches!(err, AnalyticsError::NotEnoughData(_)));

        let out = spread_bucket_analysis(&dates(52), &spread, &returns, 3, 50, 12).unwrap();
        assert_eq!(out.observations.len(), 50);
    }

    #[test]
    fn unsupported_bucket_count_is_rejected() {
        let (spread, returns) = ramp(60);
        let err = spread_bucket_analysis(&dates(60), &spread, &returns, 5, 50, 12).unwrap_err();
        assert!(matches!(err, AnalyticsError::Calculation(_)));
    }
}
