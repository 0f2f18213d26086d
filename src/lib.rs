//! # Spreadlab
//!
//! A batch engine for two questions about historical market series:
//!
//! - **Relationships:** does one series lead, move with, or Granger-cause
//!   another? (`analyzer`)
//! - **Strategy:** how would sizing a position by the spread's trailing regime
//!   have performed against holding the asset? (`regime`, `backtester`, `analytics`)
//!
//! `pipeline::run` validates the `Settings`, runs both branches concurrently
//! and returns one serializable `AnalysisBundle`.

pub mod bundle;
pub mod error;
pub mod pipeline;
pub mod telemetry;

pub use bundle::{AnalysisBundle, AnalysisInputs, DerivativeRequest};
pub use error::PipelineError;
pub use pipeline::run;

pub use configuration::{Settings, load_config, load_config_from};
pub use core_types::TimeSeries;
