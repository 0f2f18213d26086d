use crate::error::ConfigError;
use core_types::Regime;
use serde::{Deserialize, Serialize};

/// The root configuration structure for an analysis run.
///
/// Every section falls back to its defaults, so an empty file (or no file at
/// all) describes the standard monthly setup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub statistics: StatisticsSettings,
    pub lead_lag: LeadLagSettings,
    pub causality: CausalitySettings,
    pub regime: RegimeSettings,
    pub backtest: BacktestSettings,
    pub derivatives: DerivativeSettings,
    pub conditioning: ConditioningSettings,
    pub review: ReviewSettings,
}

/// Thresholds shared by the correlation, lead-lag and causality analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSettings {
    /// p-values strictly below this are significant.
    pub significance: f64,
    /// Minimum aligned length of a full two-series input.
    pub min_series_obs: usize,
    /// Minimum length of a shifted lag window or a correlation pair.
    pub min_window_obs: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadLagSettings {
    /// Lags from `-max_lag` to `+max_lag` are scanned.
    pub max_lag: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CausalitySettings {
    /// Granger orders `1..=max_order` are tested.
    pub max_order: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeSettings {
    /// Trailing window length, current period included.
    pub window: usize,
    /// Observations required in the window before thresholds are defined.
    pub min_history: usize,
    /// Full-sample spread buckets: 3 (terciles at 0.33/0.67) or 4 (quartiles).
    pub static_buckets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub position_sizes: PositionSizes,
    /// Annual risk-free rate in percent.
    pub risk_free_rate: f64,
    pub periods_per_year: u32,
}

/// Fraction of full exposure held in each regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSizes {
    pub low: f64,
    pub moderate_low: f64,
    pub moderate_high: f64,
    pub high: f64,
    pub very_high: f64,
    pub unknown: f64,
}

impl PositionSizes {
    pub fn size_for(&self, regime: Regime) -> f64 {
        match regime {
            Regime::Low => self.low,
            Regime::ModerateLow => self.moderate_low,
            Regime::ModerateHigh => self.moderate_high,
            Regime::High => self.high,
            Regime::VeryHigh => self.very_high,
            Regime::Unknown => self.unknown,
        }
    }
}

/// Rolling z-score parameters for derived series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DerivativeSettings {
    pub zscore_window: usize,
    pub zscore_min_periods: usize,
}

/// How the optional policy-rate series splits the backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningSettings {
    /// Absolute period-over-period move (rate points) that counts as a change.
    pub rate_change_threshold: f64,
    /// Rate level separating the "high" and "low" rate environments.
    pub rate_level_split: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSettings {
    pub lookback_months: u32,
}

// --- Default Implementations ---

impl Default for StatisticsSettings {
    fn default() -> Self {
        Self {
            significance: 0.05,
            min_series_obs: 50,
            min_window_obs: 30,
        }
    }
}

impl Default for LeadLagSettings {
    fn default() -> Self {
        Self { max_lag: 12 }
    }
}

impl Default for CausalitySettings {
    fn default() -> Self {
        Self { max_order: 6 }
    }
}

impl Default for RegimeSettings {
    fn default() -> Self {
        Self {
            window: 60,
            min_history: 12,
            static_buckets: 3,
        }
    }
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            position_sizes: PositionSizes::default(),
            risk_free_rate: 4.0,
            periods_per_year: 12,
        }
    }
}

impl Default for PositionSizes {
    fn default() -> Self {
        Self {
            low: 1.0,
            moderate_low: 0.75,
            moderate_high: 0.50,
            high: 0.25,
            very_high: 0.10,
            unknown: 0.50,
        }
    }
}

impl Default for DerivativeSettings {
    fn default() -> Self {
        Self {
            zscore_window: 60,
            zscore_min_periods: 12,
        }
    }
}

impl Default for ConditioningSettings {
    fn default() -> Self {
        Self {
            rate_change_threshold: 0.05,
            rate_level_split: 2.5,
        }
    }
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self { lookback_months: 12 }
    }
}

impl Settings {
    /// Parses settings from a TOML document, applying defaults for anything omitted.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    /// Rejects any parameter combination the analyses cannot run with.
    ///
    /// This is the only fatal check in a run and happens before any computation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let stats = &self.statistics;
        if !(stats.significance > 0.0 && stats.significance < 1.0) {
            return invalid(format!(
                "statistics.significance must lie in (0, 1), got {}",
                stats.significance
            ));
        }
        // Pearson p-values need at least one degree of freedom (n - 2).
        if stats.min_window_obs < 3 {
            return invalid(format!(
                "statistics.min_window_obs must be at least 3, got {}",
                stats.min_window_obs
            ));
        }
        if stats.min_series_obs < stats.min_window_obs {
            return invalid(format!(
                "statistics.min_series_obs ({}) must be >= statistics.min_window_obs ({})",
                stats.min_series_obs, stats.min_window_obs
            ));
        }

        if self.lead_lag.max_lag < 1 || self.lead_lag.max_lag > i32::MAX as u32 {
            return invalid(format!("lead_lag.max_lag must be >= 1, got {}", self.lead_lag.max_lag));
        }

        if self.causality.max_order < 1 {
            return invalid("causality.max_order must be >= 1".to_string());
        }

        let regime = &self.regime;
        if regime.window < 1 {
            return invalid("regime.window must be >= 1".to_string());
        }
        if regime.min_history < 1 || regime.min_history > regime.window {
            return invalid(format!(
                "regime.min_history must satisfy 1 <= min_history <= window ({}), got {}",
                regime.window, regime.min_history
            ));
        }
        if !matches!(regime.static_buckets, 3 | 4) {
            return invalid(format!(
                "regime.static_buckets must be 3 or 4, got {}",
                regime.static_buckets
            ));
        }

        let backtest = &self.backtest;
        for regime in Regime::ALL {
            let size = backtest.position_sizes.size_for(regime);
            if !(0.0..=1.0).contains(&size) {
                return invalid(format!(
                    "backtest.position_sizes for '{regime}' must lie in [0, 1], got {size}"
                ));
            }
        }
        if !backtest.risk_free_rate.is_finite() {
            return invalid("backtest.risk_free_rate must be finite".to_string());
        }
        if backtest.periods_per_year < 1 {
            return invalid("backtest.periods_per_year must be >= 1".to_string());
        }

        let derivatives = &self.derivatives;
        if derivatives.zscore_min_periods < 2 || derivatives.zscore_min_periods > derivatives.zscore_window {
            return invalid(format!(
                "derivatives.zscore_min_periods must satisfy 2 <= min_periods <= zscore_window ({}), got {}",
                derivatives.zscore_window, derivatives.zscore_min_periods
            ));
        }

        let conditioning = &self.conditioning;
        if !(conditioning.rate_change_threshold.is_finite() && conditioning.rate_change_threshold >= 0.0) {
            return invalid("conditioning.rate_change_threshold must be finite and >= 0".to_string());
        }
        if !conditioning.rate_level_split.is_finite() {
            return invalid("conditioning.rate_level_split must be finite".to_string());
        }

        if self.review.lookback_months < 1 {
            return invalid("review.lookback_months must be >= 1".to_string());
        }

        Ok(())
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    tracing::error!("{}", message);
    Err(ConfigError::Validation(message))
}
