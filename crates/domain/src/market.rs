use crate::error::MathResult;
use crate::math::constant_product::quote;
use crate::math::fixed_point::{DECIMALS0, E18, mul};
use crate::value_objects::amount::Amount;
use chrono::{DateTime, NaiveDate, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool state observed at one point in time.
///
/// `reserve0`/`reserve1` are the pair balances at `timestamp`;
/// `volume0`/`volume1` are the amounts traded into the pool since the
/// previous snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub timestamp: DateTime<Utc>,
    pub reserve0: U256,
    pub reserve1: U256,
    pub volume0: U256,
    pub volume1: U256,
}

impl MarketSnapshot {
    pub fn new(
        timestamp: DateTime<Utc>,
        reserve0: U256,
        reserve1: U256,
        volume0: U256,
        volume1: U256,
    ) -> Self {
        Self {
            timestamp,
            reserve0,
            reserve1,
            volume0,
            volume1,
        }
    }

    /// Calendar day (UTC) used to key the gas price lookup.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// Converts an asset1 amount into asset0 at this snapshot's reserves.
    pub fn to_asset0(&self, amount1: U256) -> MathResult<U256> {
        quote(amount1, self.reserve1, self.reserve0)
    }

    /// Converts an asset0 amount into asset1 at this snapshot's reserves.
    pub fn to_asset1(&self, amount0: U256) -> MathResult<U256> {
        quote(amount0, self.reserve0, self.reserve1)
    }

    /// Prices `gas_units` at `gas_price` (wei per unit) and converts the
    /// resulting asset1 amount into asset0.
    pub fn gas_cost0(&self, gas_units: u64, gas_price: U256) -> MathResult<U256> {
        self.to_asset0(mul(U256::from(gas_units), gas_price)?)
    }

    /// Price of one whole unit of asset1 in asset0, for display only.
    pub fn price(&self) -> MathResult<Decimal> {
        Amount::new(self.to_asset0(E18)?, DECIMALS0).to_decimal()
    }
}
