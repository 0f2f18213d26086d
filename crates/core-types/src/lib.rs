//! Shared vocabulary for the spreadlab workspace: the input series, the
//! aligner that joins them, the value objects every component emits, and
//! the small set of descriptive statistics more than one crate needs.

pub mod enums;
pub mod error;
pub mod series;
pub mod stats;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{DiagnosticKind, LeadLagDirection, RateChange, Regime};
pub use error::AnalysisError;
pub use series::{AlignedSeries, Panel, SeriesAligner, TimeSeries};
pub use structs::{
    BacktestRow, CausalityRecord, CorrelationRecord, Diagnostic, LagResult, RegimeThresholds,
};
