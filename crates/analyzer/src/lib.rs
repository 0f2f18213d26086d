//! # Relationship analysis
//!
//! Answers "does one series move with, before, or because of another?" over an
//! already-aligned historical dataset.
//!
//! - `LeadLagAnalyzer`: signed cross-correlation across a lag window.
//! - `CorrelationAnalyzer`: pairwise Pearson correlation with significance.
//! - `CausalityTester`: Granger F-tests per lag order.
//! - `derivatives`: percentage-change, direction and z-score series built from a level.
//!
//! Every analysis isolates failures: a bad lag, pair or order becomes a missing
//! entry plus a `Diagnostic`, never an aborted run.

pub mod causality;
pub mod correlation;
pub mod derivatives;
pub mod lead_lag;
pub mod significance;

pub use causality::{CausalityReport, CausalityTester};
pub use correlation::{CorrelationAnalyzer, CorrelationReport};
pub use derivatives::derive_series;
pub use lead_lag::{LeadLagAnalyzer, LeadLagReport};
