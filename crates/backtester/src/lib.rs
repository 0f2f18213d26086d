//! # Regime backtester
//!
//! Replays a spread-regime position-sizing rule over historical asset returns.
//!
//! - `BacktestEngine`: classifies the spread, sizes the position and compounds
//!   the asset and strategy indices with their drawdowns.
//! - `RateConditioning`: labels policy-rate moves and groups them into periods.
//! - `strategy_review`: the recent rows with the position changes they imply.
//!
//! This is a pure logic crate; performance statistics live in `analytics`.

pub mod conditioning;
pub mod engine;
pub mod error;
pub mod review;

pub use conditioning::{RateConditioning, RateConditions, RatePeriod};
pub use engine::{BacktestEngine, BacktestReport};
pub use error::BacktestError;
pub use review::{ReviewAction, ReviewRecord, strategy_review};
