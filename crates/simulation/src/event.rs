//! Simulation events for tracking what happens during a backtest.

use crate::rehedge::{Rehedge, RehedgeState};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::Serialize;

/// Types of events that can occur during simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEventType {
    /// Positions were opened at the first snapshot.
    PositionsOpened,
    /// Debt was decreased to rehedge an under-exposed position.
    DebtDecreased,
    /// Debt was increased to rehedge an over-exposed position.
    DebtIncreased,
}

/// A simulation event with full context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationEvent {
    /// Index of the snapshot, 0 being the opening one.
    pub step: u64,
    pub timestamp: DateTime<Utc>,
    pub event_type: SimulationEventType,
    /// Asset1 price in asset0 at the time of the event.
    pub price: Decimal,
    pub data: EventData,
}

/// Event-specific data payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    PositionsOpened {
        /// Input notional in whole asset0 units.
        size: u64,
        /// Gas price of the opening day, in wei.
        gas_price: U256,
    },
    Rehedge {
        /// Gap between the pooled asset1 and the debt.
        delta1: U256,
        /// Asset0 moved by the swap.
        swap0: U256,
        /// Debt repaid or borrowed.
        debt1: U256,
        /// Swap fee in asset0.
        fee0: U256,
        /// Gas cost in asset0.
        cost0: U256,
    },
}

impl SimulationEvent {
    /// Creates a positions opened event.
    #[must_use]
    pub fn positions_opened(
        timestamp: DateTime<Utc>,
        price: Decimal,
        size: u64,
        gas_price: U256,
    ) -> Self {
        Self {
            step: 0,
            timestamp,
            event_type: SimulationEventType::PositionsOpened,
            price,
            data: EventData::PositionsOpened { size, gas_price },
        }
    }

    /// Creates a rehedge event.
    #[must_use]
    pub fn rehedge(step: u64, timestamp: DateTime<Utc>, price: Decimal, rehedge: &Rehedge) -> Self {
        let adjustment = &rehedge.adjustment;
        let event_type = match adjustment.direction {
            RehedgeState::OverExposed => SimulationEventType::DebtIncreased,
            _ => SimulationEventType::DebtDecreased,
        };
        Self {
            step,
            timestamp,
            event_type,
            price,
            data: EventData::Rehedge {
                delta1: adjustment.delta1,
                swap0: adjustment.swap0,
                debt1: adjustment.debt1,
                fee0: adjustment.fee0,
                cost0: rehedge.cost0,
            },
        }
    }
}

/// Event log for collecting all events during simulation.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimulationEvent>,
}

impl EventLog {
    /// Creates a new empty event log.
    #[must_use]
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Records an event.
    pub fn record(&mut self, event: SimulationEvent) {
        self.events.push(event);
    }

    /// Returns all events.
    #[must_use]
    pub fn events(&self) -> &[SimulationEvent] {
        &self.events
    }

    /// Returns events of a specific type.
    #[must_use]
    pub fn events_of_type(&self, event_type: SimulationEventType) -> Vec<&SimulationEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Returns the count of events by type.
    #[must_use]
    pub fn count_by_type(&self, event_type: SimulationEventType) -> usize {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    /// Returns total rehedge count.
    #[must_use]
    pub fn rehedge_count(&self) -> usize {
        self.count_by_type(SimulationEventType::DebtDecreased)
            + self.count_by_type(SimulationEventType::DebtIncreased)
    }

    /// Clears all events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
