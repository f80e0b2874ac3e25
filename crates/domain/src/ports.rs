//! Collaborators the simulation depends on but does not implement.

use crate::market::MarketSnapshot;
use crate::metrics::MetricPoint;
use chrono::NaiveDate;
use primitive_types::U256;
use thiserror::Error;

/// Failures of the snapshot feed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("snapshot feed returned no records")]
    EmptySequence,
    #[error("snapshot feed read failed: {0}")]
    Read(String),
    #[error("invalid snapshot at line {line}: field `{field}` {reason}")]
    Schema {
        line: u64,
        field: String,
        reason: String,
    },
}

/// Failures of the gas price lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GasPriceError {
    #[error("no gas price for {date}")]
    PriceNotFound { date: NaiveDate },
    #[error("could not load gas prices: {0}")]
    Load(String),
}

/// Failures of the metrics sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SinkError {
    #[error("could not write metric point: {0}")]
    Write(String),
}

/// A pull-based, ordered source of market snapshots.
pub trait SnapshotFeed: Iterator<Item = Result<MarketSnapshot, FeedError>> {}

impl<T> SnapshotFeed for T where T: Iterator<Item = Result<MarketSnapshot, FeedError>> {}

/// Resolves the gas price, in wei per gas unit, for a UTC calendar day.
pub trait GasPriceOracle {
    fn gas_price(&self, date: NaiveDate) -> Result<U256, GasPriceError>;
}

/// Destination for per-tick metric points.
pub trait MetricsSink {
    fn write(&mut self, point: &MetricPoint) -> Result<(), SinkError>;

    /// Flushes buffered points; called once at the end of a run.
    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<S: MetricsSink + ?Sized> MetricsSink for &mut S {
    fn write(&mut self, point: &MetricPoint) -> Result<(), SinkError> {
        (**self).write(point)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

impl<O: GasPriceOracle + ?Sized> GasPriceOracle for &O {
    fn gas_price(&self, date: NaiveDate) -> Result<U256, GasPriceError> {
        (**self).gas_price(date)
    }
}
