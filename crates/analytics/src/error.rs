use core_types::DiagnosticKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Not enough data to perform calculation: {0}")]
    NotEnoughData(String),

    #[error("Error in calculation: {0}")]
    Calculation(String),
}

impl AnalyticsError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            AnalyticsError::NotEnoughData(_) => DiagnosticKind::InsufficientData,
            AnalyticsError::Calculation(_) => DiagnosticKind::NumericFailure,
        }
    }
}
