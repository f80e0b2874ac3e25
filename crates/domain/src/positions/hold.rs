use crate::error::MathResult;
use crate::market::MarketSnapshot;
use crate::math::constant_product::quote;
use crate::math::fixed_point::{DECIMALS0, E6, RAY, add, mul, mul_div, sub};
use crate::value_objects::amount::SignedAmount;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// A 50/50 split of the input bought once and never touched again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldPosition {
    /// Input notional in whole asset0 units.
    pub size: u64,
    /// Asset0 kept (6 decimals).
    pub amount0: U256,
    /// Asset1 bought (18 decimals).
    pub amount1: U256,
    /// Swap fee paid on the bought half, in asset0.
    pub fees0: U256,
    /// Gas paid to enter, in asset0.
    pub cost0: U256,
}

impl HoldPosition {
    /// Splits `size` asset0 at the snapshot's reserves.
    ///
    /// The swap fee is charged on the half being sold; what remains is split
    /// evenly, with the volatile half converted through `quote`.
    pub fn open(
        size: u64,
        snapshot: &MarketSnapshot,
        swap_rate: U256,
        entry_gas: u64,
        gas_price: U256,
    ) -> MathResult<Self> {
        let input0 = mul(U256::from(size), E6)?;

        let fees0 = mul_div(input0 / 2, swap_rate, RAY)?;
        let amount0 = sub(input0, fees0)? / 2;
        let amount1 = snapshot.to_asset1(amount0)?;
        let cost0 = snapshot.gas_cost0(entry_gas, gas_price)?;

        Ok(Self {
            size,
            amount0,
            amount1,
            fees0,
            cost0,
        })
    }

    /// Value in asset0: `amount0 + quote(amount1) - fees0 - cost0`.
    pub fn value(&self, reserve0: U256, reserve1: U256) -> MathResult<SignedAmount> {
        let assets = add(self.amount0, quote(self.amount1, reserve1, reserve0)?)?;
        let overhead = add(self.fees0, self.cost0)?;
        Ok(SignedAmount::difference(assets, overhead, DECIMALS0))
    }
}
