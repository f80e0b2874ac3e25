use super::liquidity::PoolPosition;
use super::lp_value0;
use crate::error::MathResult;
use crate::fees::{FeeIncome, accrue_fee_income};
use crate::market::MarketSnapshot;
use crate::math::compound::accrue;
use crate::math::constant_product::{holdings, quote};
use crate::math::fixed_point::{DECIMALS0, E6, RAY, add, mul, mul_div, sub};
use crate::value_objects::amount::SignedAmount;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Rates applied when the flash loan opens the position, as Rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HedgeTerms {
    pub swap_rate: U256,
    pub flash_rate: U256,
    /// Tolerance around the total debt before a rehedge triggers.
    pub rehedge_band: U256,
}

/// Liquidity funded with a flash-borrowed volatile leg.
///
/// The pooled tokens back a loan of asset0 that earns `yield0`, while the
/// borrowed asset1 accrues `interest1`. Keeping the volatile holding close to
/// `debt1 + interest1` is what makes the position delta-neutral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HedgedPosition {
    pub size: u64,
    /// Band around the total debt, as a Ray (1% = 10^25).
    pub rehedge_band: U256,
    /// Invariant product `amount0 * amount1` of the pooled tokens.
    pub liquidity: U256,
    pub principal0: U256,
    pub yield0: U256,
    pub debt1: U256,
    pub interest1: U256,
    pub fees0: U256,
    pub cost0: U256,
    pub profit0: U256,
    pub profit1: U256,
    pub rehedge_count: u32,
}

impl HedgedPosition {
    /// Opens the position at the first snapshot.
    ///
    /// The whole input is paired with a flash loan of asset1 sized so that the
    /// input also covers the flash fee swapped back into asset1. `hedge_gas` is
    /// the gas spent on top of the plain liquidity position.
    pub fn open(
        pool: &PoolPosition,
        snapshot: &MarketSnapshot,
        terms: &HedgeTerms,
        hedge_gas: u64,
        gas_price: U256,
    ) -> MathResult<Self> {
        let input0 = mul(U256::from(pool.size), E6)?;
        let after_swap = sub(RAY, terms.swap_rate)?;

        let flash_cost = mul_div(terms.flash_rate, RAY, after_swap)?;
        let stake0 = mul_div(input0, RAY, add(RAY, flash_cost)?)?;
        let debt1 = snapshot.to_asset1(stake0)?;

        let fee1 = mul_div(debt1, terms.flash_rate, RAY)?;
        let fees0 = mul_div(snapshot.to_asset0(fee1)?, RAY, after_swap)?;
        let amount0 = sub(input0, fees0)?;

        let hedge0 = snapshot.gas_cost0(hedge_gas, gas_price)?;

        Ok(Self {
            size: pool.size,
            rehedge_band: terms.rehedge_band,
            liquidity: mul(amount0, debt1)?,
            principal0: add(amount0, snapshot.to_asset0(debt1)?)?,
            yield0: U256::zero(),
            debt1,
            interest1: U256::zero(),
            fees0,
            cost0: add(pool.cost0, hedge0)?,
            profit0: U256::zero(),
            profit1: U256::zero(),
            rehedge_count: 0,
        })
    }

    /// Compounds the lent collateral and the borrowed debt over `elapsed`
    /// seconds. Returns the `(yield0, interest1)` added.
    pub fn compound(
        &mut self,
        elapsed: u64,
        lend_rate: U256,
        borrow_rate: U256,
    ) -> MathResult<(U256, U256)> {
        let gain0 = accrue(add(self.principal0, self.yield0)?, lend_rate, elapsed)?;
        let loss1 = accrue(self.total_debt1()?, borrow_rate, elapsed)?;
        self.yield0 = add(self.yield0, gain0)?;
        self.interest1 = add(self.interest1, loss1)?;
        Ok((gain0, loss1))
    }

    /// Reinvests this tick's share of the pool fees.
    pub fn accrue(&mut self, snapshot: &MarketSnapshot, fee_rate: U256) -> MathResult<FeeIncome> {
        let accrual = accrue_fee_income(self.liquidity, snapshot, fee_rate)?;
        self.liquidity = accrual.liquidity;
        self.profit0 = add(self.profit0, accrual.income.amount0)?;
        self.profit1 = add(self.profit1, accrual.income.amount1)?;
        Ok(accrual.income)
    }

    pub fn total_debt1(&self) -> MathResult<U256> {
        add(self.debt1, self.interest1)
    }

    /// Pooled `(amount0, amount1)` at the given reserves.
    pub fn exposure(&self, reserve0: U256, reserve1: U256) -> MathResult<(U256, U256)> {
        holdings(self.liquidity, reserve0, reserve1)
    }

    /// Pays back `amount1` of debt, principal first.
    pub fn repay(&mut self, amount1: U256) -> MathResult<()> {
        if amount1 <= self.debt1 {
            self.debt1 = sub(self.debt1, amount1)?;
        } else {
            let rest = sub(amount1, self.debt1)?;
            self.debt1 = U256::zero();
            self.interest1 = sub(self.interest1, rest)?;
        }
        Ok(())
    }

    pub fn borrow(&mut self, amount1: U256) -> MathResult<()> {
        self.debt1 = add(self.debt1, amount1)?;
        Ok(())
    }

    /// Records a completed rebalance of the pooled tokens.
    pub fn rebalance(&mut self, liquidity: U256, fee0: U256, cost0: U256) -> MathResult<()> {
        self.liquidity = liquidity;
        self.fees0 = add(self.fees0, fee0)?;
        self.cost0 = add(self.cost0, cost0)?;
        self.rehedge_count += 1;
        Ok(())
    }

    /// Value in asset0: the pooled tokens plus yield, less the debt and its
    /// interest at current reserves, less fees and gas.
    pub fn value(&self, reserve0: U256, reserve1: U256) -> MathResult<SignedAmount> {
        let assets = add(lp_value0(self.liquidity, reserve0, reserve1)?, self.yield0)?;
        let debt0 = add(
            quote(self.debt1, reserve1, reserve0)?,
            quote(self.interest1, reserve1, reserve0)?,
        )?;
        let liabilities = add(add(debt0, self.fees0)?, self.cost0)?;
        Ok(SignedAmount::difference(assets, liabilities, DECIMALS0))
    }

    /// Cumulative fee income expressed in asset0 at the snapshot's reserves.
    pub fn profit_value0(&self, snapshot: &MarketSnapshot) -> MathResult<U256> {
        add(self.profit0, snapshot.to_asset0(self.profit1)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fixed_point::{E18, SECONDS_PER_YEAR, bps_to_ray};
    use crate::positions::hold::HoldPosition;
    use chrono::{TimeZone, Utc};

    fn snapshot() -> MarketSnapshot {
        MarketSnapshot::new(
            Utc.with_ymd_and_hms(2021, 10, 7, 0, 0, 0).unwrap(),
            U256::from(2_000_000u64) * E6,
            U256::from(1_000u64) * E18,
            U256::zero(),
            U256::zero(),
        )
    }

    fn terms(swap: u64, flash: u64) -> HedgeTerms {
        HedgeTerms {
            swap_rate: bps_to_ray(swap).unwrap(),
            flash_rate: bps_to_ray(flash).unwrap(),
            rehedge_band: bps_to_ray(100).unwrap(),
        }
    }

    fn open(s: &MarketSnapshot, t: &HedgeTerms) -> HedgedPosition {
        let hold = HoldPosition::open(1_000_000, s, t.swap_rate, 0, U256::zero()).unwrap();
        let pool = PoolPosition::open(&hold, s, 0, U256::zero()).unwrap();
        HedgedPosition::open(&pool, s, t, 0, U256::zero()).unwrap()
    }

    #[test]
    fn test_open_without_fees_doubles_exposure() {
        let s = snapshot();
        let hedged = open(&s, &terms(0, 0));

        // 1,000,000 asset0 paired with 500 borrowed asset1.
        assert_eq!(hedged.debt1, U256::from(500u64) * E18);
        assert!(hedged.fees0.is_zero());
        assert_eq!(hedged.principal0, U256::from(2_000_000u64) * E6);

        let (amount0, amount1) = hedged.exposure(s.reserve0, s.reserve1).unwrap();
        assert_eq!(amount0, U256::from(1_000_000u64) * E6);
        assert_eq!(amount1, hedged.debt1);

        // Pooled 2,000,000 less the 1,000,000 owed.
        let value = hedged.value(s.reserve0, s.reserve1).unwrap();
        assert_eq!(value.magnitude, U256::from(1_000_000u64) * E6);
    }

    #[test]
    fn test_open_charges_flash_fee() {
        let s = snapshot();
        let hedged = open(&s, &terms(30, 9));

        assert!(hedged.debt1 < U256::from(500u64) * E18);
        assert!(!hedged.fees0.is_zero());
        // The flash fee is a fraction of a percent of the input.
        assert!(hedged.fees0 < U256::from(1_000u64) * E6);
        assert_eq!(
            hedged.liquidity,
            (U256::from(1_000_000u64) * E6 - hedged.fees0) * hedged.debt1
        );
    }

    #[test]
    fn test_compound_accrues_both_sides() {
        let s = snapshot();
        let mut hedged = open(&s, &terms(0, 0));

        let (gain0, loss1) = hedged
            .compound(SECONDS_PER_YEAR, bps_to_ray(50).unwrap(), bps_to_ray(250).unwrap())
            .unwrap();

        // Roughly 0.5% on 2,000,000 and 2.5% on 500.
        assert!(gain0 > U256::from(10_000u64) * E6 && gain0 < U256::from(10_100u64) * E6);
        assert!(loss1 > U256::from(12_500u64) * E18 / 1_000);
        assert!(loss1 < U256::from(12_700u64) * E18 / 1_000);
        assert_eq!(hedged.yield0, gain0);
        assert_eq!(hedged.interest1, loss1);
    }

    #[test]
    fn test_compound_zero_elapsed_is_noop() {
        let s = snapshot();
        let mut hedged = open(&s, &terms(30, 9));
        let before = hedged.clone();
        hedged.compound(0, RAY, RAY).unwrap();
        assert_eq!(hedged, before);
    }

    #[test]
    fn test_repay_spills_into_interest() {
        let s = snapshot();
        let mut hedged = open(&s, &terms(0, 0));
        hedged.debt1 = U256::from(10u64);
        hedged.interest1 = U256::from(5u64);

        hedged.repay(U256::from(12u64)).unwrap();
        assert_eq!(hedged.debt1, U256::zero());
        assert_eq!(hedged.interest1, U256::from(3u64));

        assert!(hedged.repay(U256::from(4u64)).is_err());
    }

    #[test]
    fn test_rebalance_counts() {
        let s = snapshot();
        let mut hedged = open(&s, &terms(0, 0));
        hedged
            .rebalance(U256::from(9_025u64), U256::one(), U256::from(7u64))
            .unwrap();
        assert_eq!(hedged.liquidity, U256::from(9_025u64));
        assert_eq!(hedged.fees0, U256::one());
        assert_eq!(hedged.cost0, U256::from(7u64));
        assert_eq!(hedged.rehedge_count, 1);
    }
}
