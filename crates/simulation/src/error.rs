use amm_hedge_domain::MathError;
use amm_hedge_domain::ports::{FeedError, GasPriceError, SinkError};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("arithmetic failure: {0}")]
    Math(#[from] MathError),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    GasPrice(#[from] GasPriceError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("snapshot at {current} does not follow {previous}")]
    NonMonotonicTimestamp {
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type SimulationResult<T> = Result<T, SimulationError>;
