use super::hold::HoldPosition;
use super::lp_value0;
use crate::error::MathResult;
use crate::fees::{FeeIncome, accrue_fee_income};
use crate::market::MarketSnapshot;
use crate::math::fixed_point::{DECIMALS0, add, mul};
use crate::value_objects::amount::SignedAmount;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Liquidity supplied to the pool with the hold split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolPosition {
    /// Input notional in whole asset0 units.
    pub size: u64,
    /// Invariant product `amount0 * amount1` of the position.
    pub liquidity: U256,
    /// Swap fee paid to split the input, in asset0.
    pub fees0: U256,
    /// Gas paid to enter, in asset0.
    pub cost0: U256,
    /// Cumulative asset0 fee income.
    pub profit0: U256,
    /// Cumulative asset1 fee income.
    pub profit1: U256,
}

impl PoolPosition {
    /// Deposits the hold split into the pool, paying for the extra
    /// position-creation transaction.
    pub fn open(
        hold: &HoldPosition,
        snapshot: &MarketSnapshot,
        create_gas: u64,
        gas_price: U256,
    ) -> MathResult<Self> {
        let create0 = snapshot.gas_cost0(create_gas, gas_price)?;
        Ok(Self {
            size: hold.size,
            liquidity: mul(hold.amount0, hold.amount1)?,
            fees0: hold.fees0,
            cost0: add(hold.cost0, create0)?,
            profit0: U256::zero(),
            profit1: U256::zero(),
        })
    }

    /// Reinvests this tick's share of the pool fees.
    pub fn accrue(&mut self, snapshot: &MarketSnapshot, fee_rate: U256) -> MathResult<FeeIncome> {
        let accrual = accrue_fee_income(self.liquidity, snapshot, fee_rate)?;
        self.liquidity = accrual.liquidity;
        self.profit0 = add(self.profit0, accrual.income.amount0)?;
        self.profit1 = add(self.profit1, accrual.income.amount1)?;
        Ok(accrual.income)
    }

    /// Value in asset0: `2 * sqrt(liquidity * reserve0 / reserve1) - fees0 - cost0`.
    pub fn value(&self, reserve0: U256, reserve1: U256) -> MathResult<SignedAmount> {
        let assets = lp_value0(self.liquidity, reserve0, reserve1)?;
        let overhead = add(self.fees0, self.cost0)?;
        Ok(SignedAmount::difference(assets, overhead, DECIMALS0))
    }

    /// Cumulative fee income expressed in asset0 at the snapshot's reserves.
    pub fn profit_value0(&self, snapshot: &MarketSnapshot) -> MathResult<U256> {
        add(self.profit0, snapshot.to_asset0(self.profit1)?)
    }
}
