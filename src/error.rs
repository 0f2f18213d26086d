use thiserror::Error;

/// Errors that stop a run before any computation starts.
///
/// Everything that can go wrong once the run is under way ends up as a
/// `Diagnostic` in the bundle instead.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] configuration::ConfigError),

    #[error("The {role} series '{name}' is not among the inputs")]
    MissingSeries { role: String, name: String },

    #[error("Backtest setup error: {0}")]
    Backtest(#[from] backtester::BacktestError),
}
