//! File-backed collaborators for the simulation.
//!
//! This crate provides:
//! - A streaming CSV reader of market snapshots
//! - A CSV gas price station keyed by day
//! - An InfluxDB line protocol metrics sink

/// Daily gas prices.
pub mod gas_station;
/// Line protocol sink.
pub mod line_protocol;
/// Snapshot feed.
pub mod snapshots;

pub use gas_station::GasStation;
pub use line_protocol::LineProtocolSink;
pub use snapshots::SnapshotReader;
