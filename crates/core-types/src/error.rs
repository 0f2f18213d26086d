use crate::enums::DiagnosticKind;
use thiserror::Error;

/// Failure of a single sub-computation (one lag, one pair, one causality order).
///
/// None of these abort a run; callers turn them into a [`crate::Diagnostic`]
/// next to a missing result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Insufficient data for {context}: {actual} observations, need at least {required}")]
    InsufficientData {
        context: String,
        required: usize,
        actual: usize,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Numeric failure: {0}")]
    NumericFailure(String),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}

impl AnalysisError {
    pub fn insufficient(context: impl Into<String>, required: usize, actual: usize) -> Self {
        AnalysisError::InsufficientData {
            context: context.into(),
            required,
            actual,
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            AnalysisError::InsufficientData { .. } => DiagnosticKind::InsufficientData,
            AnalysisError::DegenerateInput(_) => DiagnosticKind::DegenerateInput,
            AnalysisError::NumericFailure(_) => DiagnosticKind::NumericFailure,
            AnalysisError::InvalidInput(..) => DiagnosticKind::InvalidInput,
        }
    }
}
