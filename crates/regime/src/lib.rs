//! # Spread regime classification
//!
//! Turns a spread series into one `Regime` per period by comparing each value
//! with the P25/P50/P75/P90 of its trailing window. `RegimeClassifier::classify`
//! is the bulk pass the backtester uses; `classify_at` answers the same
//! question for a single period.

pub mod classifier;
pub mod error;
pub mod window;

pub use classifier::{Classification, RegimeClassifier};
pub use error::RegimeError;
pub use window::{SortedWindow, thresholds_from_sorted};
