//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use amm_hedge_simulation::prelude::*;
//! ```

// Configuration
pub use crate::config::{GasSchedule, RateSchedule, RayRates, SimulationConfig};

// Engine
pub use crate::engine::SimulationEngine;

// Errors
pub use crate::error::{SimulationError, SimulationResult};

// Events
pub use crate::event::{EventData, EventLog, SimulationEvent, SimulationEventType};

// In-memory collaborators
pub use crate::memory::{FixedGasPrice, MemorySink, NullSink};

// Rehedging
pub use crate::rehedge::{Adjustment, Exposure, Rehedge, RehedgeState};

// Reporting
pub use crate::reporting::{PointBuilder, band_label, size_bucket};

// State
pub use crate::state::{Portfolio, SimulationSummary, StrategySummary};
