// error.rs - Error conditions surfaced by the spin-chain core

use thiserror::Error;

/// Every precondition failure the simulation can report.
///
/// All of these are raised before any state is touched, so a caller that
/// receives one can keep using the chain or controller as it was.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("site {site} is out of range for a chain of length {len}")]
    IndexOutOfRange { site: usize, len: usize },

    #[error("correlation requested before any snapshot was recorded")]
    InsufficientHistory,
}

impl SimError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

/// Reject anything that is not a strictly positive temperature (NaN included).
pub(crate) fn check_temperature(temperature: f64) -> Result<()> {
    if temperature > 0.0 {
        Ok(())
    } else {
        Err(SimError::config(format!(
            "temperature must be > 0, got {temperature}"
        )))
    }
}
