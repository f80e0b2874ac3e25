//! Fixed-point market math and position accounting for AMM hedging backtests.
//!
//! This crate provides:
//! - Checked `U256` arithmetic at asset and Ray scales
//! - Lending-protocol compound interest
//! - Constant-product quoting and swap math
//! - Hold, pool and hedged position models
//! - Collaborator traits for feeds, gas prices and metric sinks

/// Strategy identifiers.
pub mod enums;
/// Arithmetic errors.
pub mod error;
/// Pool fee income.
pub mod fees;
/// Market snapshots.
pub mod market;
/// Fixed-point, interest and AMM math.
pub mod math;
/// Metric points.
pub mod metrics;
/// Feed, gas price and sink traits.
pub mod ports;
/// Position models.
pub mod positions;
/// Amount value objects.
pub mod value_objects;

pub use error::{MathError, MathResult};
