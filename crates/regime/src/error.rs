use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegimeError {
    #[error("Regime parameters from configuration are invalid: {0}")]
    InvalidParameters(String),

    #[error("Period {index} is outside a spread history of {len} periods.")]
    IndexOutOfRange { index: usize, len: usize },
}
