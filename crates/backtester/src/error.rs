use core_types::DiagnosticKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BacktestError {
    #[error("The backtest received no periods to simulate.")]
    EmptyInput,

    #[error("Column '{column}' has {actual} values but the backtest spans {expected} periods.")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Regime classifier error: {0}")]
    Regime(#[from] regime::RegimeError),

    #[error("Backtest input error: {0}")]
    Input(#[from] core_types::AnalysisError),
}

impl BacktestError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            BacktestError::EmptyInput => DiagnosticKind::InsufficientData,
            BacktestError::LengthMismatch { .. } | BacktestError::Regime(_) => DiagnosticKind::InvalidInput,
            BacktestError::Input(e) => e.kind(),
        }
    }
}
