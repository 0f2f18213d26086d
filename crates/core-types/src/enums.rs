use serde::{Deserialize, Serialize};
use std::fmt;

/// Market-state bucket derived from a spread value and its trailing percentiles.
///
/// The declaration order is the canonical reporting order (cheapest spread first,
/// `Unknown` last), which `Ord` follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Regime {
    #[serde(rename = "Low (Buy)")]
    Low,
    #[serde(rename = "Moderate-Low")]
    ModerateLow,
    #[serde(rename = "Moderate-High")]
    ModerateHigh,
    #[serde(rename = "High (Caution)")]
    High,
    #[serde(rename = "Very High (Reduce)")]
    VeryHigh,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Regime {
    pub const ALL: [Regime; 6] = [
        Regime::Low,
        Regime::ModerateLow,
        Regime::ModerateHigh,
        Regime::High,
        Regime::VeryHigh,
        Regime::Unknown,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Regime::Low => "Low (Buy)",
            Regime::ModerateLow => "Moderate-Low",
            Regime::ModerateHigh => "Moderate-High",
            Regime::High => "High (Caution)",
            Regime::VeryHigh => "Very High (Reduce)",
            Regime::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which of two series moves first at a given signed lag.
///
/// This is the single source of truth for the lag sign convention: the
/// cross-correlation slicing and the human-readable label both match on it.
///
/// * `lag < 0` => the first series leads the second.
/// * `lag > 0` => the second series leads the first.
/// * `lag == 0` => contemporaneous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadLagDirection {
    FirstLeads,
    SecondLeads,
    Contemporaneous,
}

impl LeadLagDirection {
    pub fn from_lag(lag: i32) -> Self {
        match lag {
            l if l < 0 => LeadLagDirection::FirstLeads,
            l if l > 0 => LeadLagDirection::SecondLeads,
            _ => LeadLagDirection::Contemporaneous,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeadLagDirection::FirstLeads => "first series leads second",
            LeadLagDirection::SecondLeads => "second series leads first",
            LeadLagDirection::Contemporaneous => "contemporaneous",
        }
    }
}

impl fmt::Display for LeadLagDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of a non-fatal problem recorded alongside a missing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    InsufficientData,
    DegenerateInput,
    NumericFailure,
    InvalidState,
    InvalidInput,
    /// The result exists but rests on too few observations to trust.
    Reliability,
}

/// Direction of a policy-rate move between consecutive periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateChange {
    Increase,
    Decrease,
    None,
}

impl RateChange {
    pub fn label(&self) -> &'static str {
        match self {
            RateChange::Increase => "increase",
            RateChange::Decrease => "decrease",
            RateChange::None => "none",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_follows_lag_sign() {
        for lag in -12..=12 {
            let direction = LeadLagDirection::from_lag(lag);
            let expected = match lag.signum() {
                -1 => "first series leads second",
                1 => "second series leads first",
                _ => "contemporaneous",
            };
            assert_eq!(direction.label(), expected, "lag {lag}");
        }
    }

    #[test]
    fn regime_serializes_to_label() {
        for regime in Regime::ALL {
            let json = serde_json::to_string(&regime).unwrap();
            assert_eq!(json, format!("\"{}\"", regime.label()));
        }
    }

    #[test]
    fn regime_order_is_reporting_order() {
        let mut shuffled = vec![Regime::Unknown, Regime::High, Regime::Low, Regime::VeryHigh];
        shuffled.sort();
        assert_eq!(
            shuffled,
            vec![Regime::Low, Regime::High, Regime::VeryHigh, Regime::Unknown]
        );
    }
}
