//! Deterministic backtest of hold, pool and hedged liquidity strategies.
//!
//! This crate provides:
//! - Run configuration with rate and gas schedules
//! - The rehedge state machine for the hedged position
//! - The snapshot-driven simulation loop
//! - Metric point construction and run summaries

/// Prelude module for convenient imports.
pub mod prelude;

/// Run configuration.
pub mod config;
/// Simulation loop.
pub mod engine;
/// Simulation errors.
pub mod error;
/// Simulation events.
pub mod event;
/// In-memory collaborators.
pub mod memory;
/// Rehedge state machine.
pub mod rehedge;
/// Metric points.
pub mod reporting;
/// Portfolio state and summaries.
pub mod state;
