//! # Spreadlab Analytics Engine
//!
//! Judges the regime strategy against simply holding the asset.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of external systems. It depends
//!   only on `core-types` and `configuration`.
//! - **Stateless Calculation:** The `AnalyticsEngine` takes backtest rows and
//!   produces a `PerformanceReport`, which makes it easy to test.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: annualized return, volatility, Sharpe, Sortino, drawdown and win rate.
//! - `regime_breakdown`: the same rows grouped by spread regime.
//! - `spread_bucket_analysis`: asset returns grouped by full-sample spread terciles or quartiles.
//! - `conditional_performance`: the same rows grouped by policy-rate move and level.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod breakdown;
pub mod buckets;
pub mod conditional;
pub mod engine;
pub mod error;
pub mod report;

pub use breakdown::{RegimeStats, regime_breakdown};
pub use buckets::{BucketedObservation, SpreadBucketAnalysis, SpreadBucketStats, spread_bucket_analysis};
pub use conditional::{ConditionalPerformance, RateCondition, conditional_performance};
pub use engine::{AnalyticsEngine, MIN_RELIABLE_PERIODS};
pub use error::AnalyticsError;
pub use report::{Outperformance, PerformanceReport, PerformanceSummary};
