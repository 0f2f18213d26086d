use crate::error::RegimeError;
use crate::window::{SortedWindow, thresholds_from_sorted};
use configuration::RegimeSettings;
use core_types::{Regime, RegimeThresholds};
use serde::Serialize;

/// The regime of one period and the thresholds it was measured against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub thresholds: Option<RegimeThresholds>,
    pub regime: Regime,
}

impl Classification {
    fn new(value: Option<f64>, thresholds: Option<RegimeThresholds>) -> Self {
        let regime = match (value, thresholds) {
            (Some(v), Some(t)) => t.classify(v),
            _ => Regime::Unknown,
        };
        Self { thresholds, regime }
    }
}

/// Buckets each spread value against the percentiles of its own trailing window.
///
/// The window holds the last `window` periods including the current one.
/// Gaps are ignored, so a period needs `min_history` observed values in its
/// window before it gets thresholds.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    window: usize,
    min_history: usize,
}

impl RegimeClassifier {
    pub fn new(window: usize, min_history: usize) -> Result<Self, RegimeError> {
        if window == 0 {
            return Err(RegimeError::InvalidParameters("window must be at least 1".to_string()));
        }
        if min_history == 0 || min_history > window {
            return Err(RegimeError::InvalidParameters(format!(
                "min_history must be between 1 and the window ({window}), got {min_history}"
            )));
        }
        Ok(Self { window, min_history })
    }

    pub fn from_settings(settings: &RegimeSettings) -> Result<Self, RegimeError> {
        Self::new(settings.window, settings.min_history)
    }

    /// Classifies every period in one pass with a sliding sorted window.
    #[tracing::instrument(name = "regime", skip_all, fields(periods = spread.len()))]
    pub fn classify(&self, spread: &[Option<f64>]) -> Vec<Classification> {
        let mut window = SortedWindow::new(self.window);
        let classified: Vec<Classification> = spread
            .iter()
            .map(|value| {
                window.push(*value);
                let thresholds = thresholds_from_sorted(window.observed(), self.min_history);
                Classification::new(*value, thresholds)
            })
            .collect();

        let unknown = classified.iter().filter(|c| c.regime == Regime::Unknown).count();
        tracing::debug!(unknown, "Spread regimes classified");
        classified
    }

    /// Classifies a single period by sorting its window from scratch.
    pub fn classify_at(&self, spread: &[Option<f64>], index: usize) -> Result<Classification, RegimeError> {
        let value = *spread.get(index).ok_or(RegimeError::IndexOutOfRange {
            index,
            len: spread.len(),
        })?;

        let start = (index + 1).saturating_sub(self.window);
        let mut observed: Vec<f64> = spread[start..=index].iter().flatten().copied().collect();
        observed.sort_by(f64::total_cmp);

        Ok(Classification::new(value, thresholds_from_sorted(&observed, self.min_history)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn rejects_invalid_parameters() {
        assert!(RegimeClassifier::new(0, 1).is_err());
        assert!(RegimeClassifier::new(10, 0).is_err());
        assert!(RegimeClassifier::new(10, 11).is_err());
        assert!(RegimeClassifier::from_settings(&RegimeSettings::default()).is_ok());
    }

    #[test]
    fn early_periods_are_unknown() {
        let spread: Vec<Option<f64>> = (0..30).map(|v| Some(v as f64)).collect();
        let out = RegimeClassifier::new(60, 12).unwrap().classify(&spread);

        assert!(out[..11].iter().all(|c| c.regime == Regime::Unknown && c.thresholds.is_none()));
        assert!(out[11].thresholds.is_some());
        // an increasing series always sits at the top of its own window
        assert_eq!(out[11].regime, Regime::VeryHigh);
    }

    #[test]
    fn value_at_median_is_moderate_low() {
        // window of five: 1 2 3 4 5 with the median as the current value
        let spread = [Some(1.0), Some(5.0), Some(2.0), Some(4.0), Some(3.0)];
        let c = RegimeClassifier::new(5, 5).unwrap().classify_at(&spread, 4).unwrap();
        assert_eq!(c.thresholds.unwrap().p50, 3.0);
        assert_eq!(c.regime, Regime::ModerateLow);
    }

    #[test]
    fn gap_is_unknown_but_keeps_thresholds() {
        let mut spread: Vec<Option<f64>> = (0..20).map(|v| Some(v as f64)).collect();
        spread[15] = None;
        let out = RegimeClassifier::new(10, 5).unwrap().classify(&spread);
        assert_eq!(out[15].regime, Regime::Unknown);
        assert!(out[15].thresholds.is_some());
    }

    #[test]
    fn gaps_do_not_count_toward_history() {
        let spread = [Some(1.0), None, None, Some(2.0), Some(3.0)];
        let out = RegimeClassifier::new(5, 3).unwrap().classify(&spread);
        assert_eq!(out[3].regime, Regime::Unknown);
        assert_ne!(out[4].regime, Regime::Unknown);
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = RegimeClassifier::new(5, 1).unwrap().classify_at(&[Some(1.0)], 3);
        assert_eq!(err, Err(RegimeError::IndexOutOfRange { index: 3, len: 1 }));
    }

    #[test]
    fn bulk_matches_row_wise() {
        let mut rng = StdRng::seed_from_u64(42);
        let spread: Vec<Option<f64>> = (0..400)
            .map(|_| {
                if rng.gen_range(0.0..1.0) < 0.1 {
                    None
                } else {
                    // coarse values so ties hit the closed bounds
                    Some((rng.gen_range(0.0..8.0) * 4.0_f64).round() / 4.0)
                }
            })
            .collect();

        for (window, min_history) in [(60, 12), (7, 7), (25, 1)] {
            let classifier = RegimeClassifier::new(window, min_history).unwrap();
            let bulk = classifier.classify(&spread);
            for (i, expected) in bulk.iter().enumerate() {
                assert_eq!(classifier.classify_at(&spread, i).unwrap(), *expected, "period {i}");
            }
        }
    }
}
