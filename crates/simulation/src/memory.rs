//! In-memory collaborators for tests and dry runs.

use amm_hedge_domain::metrics::MetricPoint;
use amm_hedge_domain::ports::{GasPriceError, GasPriceOracle, MetricsSink, SinkError};
use chrono::NaiveDate;
use primitive_types::U256;

/// Collects metric points in a vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    pub points: Vec<MetricPoint>,
}

impl MetricsSink for MemorySink {
    fn write(&mut self, point: &MetricPoint) -> Result<(), SinkError> {
        self.points.push(point.clone());
        Ok(())
    }
}

/// Discards every point.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl MetricsSink for NullSink {
    fn write(&mut self, _point: &MetricPoint) -> Result<(), SinkError> {
        Ok(())
    }
}

/// The same gas price, in wei, for every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedGasPrice(pub U256);

impl GasPriceOracle for FixedGasPrice {
    fn gas_price(&self, _date: NaiveDate) -> Result<U256, GasPriceError> {
        Ok(self.0)
    }
}
