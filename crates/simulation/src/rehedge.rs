//! Rebalancing of the hedged position's volatile exposure.
//!
//! After interest and fees have accrued for a tick, the asset1 held in the
//! pool is compared with the total asset1 owed. Outside the band the
//! position either sells asset0 to repay debt or borrows asset1 to sell it.
//! The debt moves by the gap plus the swap fee.

use crate::config::GasSchedule;
use amm_hedge_domain::{MathError, MathResult};
use amm_hedge_domain::market::MarketSnapshot;
use amm_hedge_domain::math::constant_product::{get_amount_in, get_amount_out, quote};
use amm_hedge_domain::math::fixed_point::{RAY, add, mul, mul_div, sub};
use amm_hedge_domain::positions::HedgedPosition;
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Position of the pooled asset1 relative to the debt band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RehedgeState {
    /// Within the band, inclusive of its bounds.
    Balanced,
    /// Pooled asset1 below the lower bound.
    UnderExposed,
    /// Pooled asset1 above the upper bound.
    OverExposed,
}

impl RehedgeState {
    /// Compares `position1` against `[debt * (1 - band), debt * (1 + band)]`,
    /// with `band` as a Ray.
    pub fn classify(position1: U256, total_debt1: U256, band: U256) -> MathResult<Self> {
        let lower = mul_div(total_debt1, sub(RAY, band)?, RAY)?;
        let upper = mul_div(total_debt1, add(RAY, band)?, RAY)?;
        Ok(if position1 < lower {
            RehedgeState::UnderExposed
        } else if position1 > upper {
            RehedgeState::OverExposed
        } else {
            RehedgeState::Balanced
        })
    }
}

/// Pooled holdings and debt of the hedged position at one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exposure {
    pub position0: U256,
    pub position1: U256,
    pub total_debt1: U256,
}

impl Exposure {
    pub fn of(position: &HedgedPosition, reserve0: U256, reserve1: U256) -> MathResult<Self> {
        let (position0, position1) = position.exposure(reserve0, reserve1)?;
        Ok(Self {
            position0,
            position1,
            total_debt1: position.total_debt1()?,
        })
    }

    pub fn state(&self, band: U256) -> MathResult<RehedgeState> {
        RehedgeState::classify(self.position1, self.total_debt1, band)
    }
}

/// Swap and debt change that move the exposure back towards the debt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub direction: RehedgeState,
    /// Gap between pooled asset1 and the debt.
    pub delta1: U256,
    /// Asset0 sold (down) or bought (up) by the swap.
    pub swap0: U256,
    /// Swap fee in asset1, withdrawn from (down) or added to (up) the pool.
    pub fee1: U256,
    /// Debt repaid (down) or borrowed (up): `delta1 + fee1`.
    pub debt1: U256,
    /// Invariant product after the adjustment.
    pub liquidity: U256,
    /// Swap fee paid, in asset0.
    pub fee0: U256,
}

impl Adjustment {
    /// Sizes the adjustment for a given state; `None` when balanced.
    pub fn plan(
        exposure: &Exposure,
        state: RehedgeState,
        reserve0: U256,
        reserve1: U256,
    ) -> MathResult<Option<Self>> {
        match state {
            RehedgeState::Balanced => Ok(None),
            RehedgeState::UnderExposed => {
                Self::down(exposure, reserve0, reserve1).map(Some)
            }
            RehedgeState::OverExposed => Self::up(exposure, reserve0, reserve1).map(Some),
        }
    }

    /// Sells pooled asset0 for the missing `delta1` and repays it together
    /// with the swap fee, the fee being withdrawn from the pooled asset1.
    fn down(exposure: &Exposure, reserve0: U256, reserve1: U256) -> MathResult<Self> {
        let delta1 = sub(exposure.total_debt1, exposure.position1)?;
        let swap0 = get_amount_in(delta1, reserve0, reserve1)?;
        let fee1 = sub(quote(swap0, reserve0, reserve1)?, delta1)?;

        if swap0 > exposure.position0 || fee1 > exposure.position1 {
            warn!(
                position0 = %exposure.position0,
                position1 = %exposure.position1,
                debt1 = %exposure.total_debt1,
                swap0 = %swap0,
                "pooled holdings cannot cover the debt repayment"
            );
            return Err(MathError::InsufficientLiquidity);
        }

        let liquidity = mul(
            sub(exposure.position0, swap0)?,
            sub(exposure.position1, fee1)?,
        )?;
        let fee0 = sub(swap0, quote(delta1, reserve1, reserve0)?)?;

        Ok(Self {
            direction: RehedgeState::UnderExposed,
            delta1,
            swap0,
            fee1,
            debt1: add(delta1, fee1)?,
            liquidity,
            fee0,
        })
    }

    /// Borrows the excess `delta1` plus the swap fee, sells `delta1` for
    /// asset0 and pools the proceeds with the borrowed fee.
    fn up(exposure: &Exposure, reserve0: U256, reserve1: U256) -> MathResult<Self> {
        let delta1 = sub(exposure.position1, exposure.total_debt1)?;
        let swap0 = get_amount_out(delta1, reserve1, reserve0)?;
        let fee1 = sub(delta1, quote(swap0, reserve0, reserve1)?)?;

        let liquidity = mul(
            add(exposure.position0, swap0)?,
            add(exposure.position1, fee1)?,
        )?;
        let fee0 = sub(quote(delta1, reserve1, reserve0)?, swap0)?;

        Ok(Self {
            direction: RehedgeState::OverExposed,
            delta1,
            swap0,
            fee1,
            debt1: add(delta1, fee1)?,
            liquidity,
            fee0,
        })
    }

    /// Applies the adjustment and its gas cost to the position.
    pub fn apply(&self, position: &mut HedgedPosition, cost0: U256) -> MathResult<()> {
        match self.direction {
            RehedgeState::UnderExposed => position.repay(self.debt1)?,
            RehedgeState::OverExposed => position.borrow(self.debt1)?,
            RehedgeState::Balanced => return Ok(()),
        }
        position.rebalance(self.liquidity, self.fee0, cost0)
    }
}

/// A rebalance carried out during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rehedge {
    pub adjustment: Adjustment,
    pub gas_units: u64,
    /// Gas cost in asset0.
    pub cost0: U256,
}

/// Evaluates the band and rebalances the position when it is breached.
pub fn rehedge(
    position: &mut HedgedPosition,
    snapshot: &MarketSnapshot,
    gas: &GasSchedule,
    gas_price: U256,
) -> MathResult<Option<Rehedge>> {
    let exposure = Exposure::of(position, snapshot.reserve0, snapshot.reserve1)?;
    let state = exposure.state(position.rehedge_band)?;

    debug!(
        timestamp = %snapshot.timestamp,
        position1 = %exposure.position1,
        debt1 = %exposure.total_debt1,
        state = ?state,
        "evaluated hedge"
    );

    let Some(adjustment) = Adjustment::plan(&exposure, state, snapshot.reserve0, snapshot.reserve1)?
    else {
        return Ok(None);
    };

    let gas_units = match adjustment.direction {
        RehedgeState::UnderExposed => gas.rehedge_down(),
        _ => gas.rehedge_up(),
    };
    let cost0 = snapshot.gas_cost0(gas_units, gas_price)?;
    adjustment.apply(position, cost0)?;

    info!(
        timestamp = %snapshot.timestamp,
        direction = ?adjustment.direction,
        delta1 = %adjustment.delta1,
        swap0 = %adjustment.swap0,
        debt1 = %position.debt1,
        rehedges = position.rehedge_count,
        "rehedged position"
    );

    Ok(Some(Rehedge {
        adjustment,
        gas_units,
        cost0,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amm_hedge_domain::math::fixed_point::{E6, E18, bps_to_ray};
    use chrono::{TimeZone, Utc};

    fn snapshot(reserve0: u64, reserve1: u64) -> MarketSnapshot {
        MarketSnapshot::new(
            Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
            U256::from(reserve0),
            U256::from(reserve1),
            U256::zero(),
            U256::zero(),
        )
    }

    fn position(liquidity: u64, debt1: u64) -> HedgedPosition {
        HedgedPosition {
            size: 1,
            rehedge_band: bps_to_ray(100).unwrap(),
            liquidity: U256::from(liquidity),
            principal0: U256::zero(),
            yield0: U256::zero(),
            debt1: U256::from(debt1),
            interest1: U256::zero(),
            fees0: U256::zero(),
            cost0: U256::zero(),
            profit0: U256::zero(),
            profit1: U256::zero(),
            rehedge_count: 0,
        }
    }

    #[test]
    fn test_classify_band() {
        let band = bps_to_ray(100).unwrap();
        let debt = U256::from(100u64);
        let state = |p: u64| RehedgeState::classify(U256::from(p), debt, band).unwrap();

        assert_eq!(state(98), RehedgeState::UnderExposed);
        assert_eq!(state(99), RehedgeState::Balanced);
        assert_eq!(state(100), RehedgeState::Balanced);
        assert_eq!(state(101), RehedgeState::Balanced);
        assert_eq!(state(102), RehedgeState::OverExposed);
    }

    #[test]
    fn test_under_exposed_repays_gap_and_fee() {
        // 98 of each asset pooled against 100 asset1 of debt, 1% band.
        let s = snapshot(1_000_000_000_000, 1_000_000_000_000);
        let mut p = position(9_604, 100);

        let done = rehedge(&mut p, &s, &GasSchedule::default(), U256::zero())
            .unwrap()
            .unwrap();

        let adjustment = done.adjustment;
        assert_eq!(adjustment.direction, RehedgeState::UnderExposed);
        assert_eq!(adjustment.delta1, U256::from(2u64));
        assert_eq!(adjustment.swap0, U256::from(3u64));
        assert_eq!(adjustment.fee1, U256::one());
        assert_eq!(adjustment.fee0, U256::one());
        assert_eq!(adjustment.debt1, U256::from(3u64));

        assert_eq!(p.rehedge_count, 1);
        assert_eq!(p.debt1, U256::from(97u64));
        assert_eq!(p.liquidity, U256::from(95u64 * 97));
        assert_eq!(p.fees0, U256::one());
        assert_eq!(done.gas_units, GasSchedule::default().rehedge_down());
    }

    #[test]
    fn test_over_exposed_borrows_gap_and_fee() {
        // 100 of each asset pooled against 90 asset1 of debt.
        let s = snapshot(1_000_000_000_000, 1_000_000_000_000);
        let mut p = position(10_000, 90);

        let done = rehedge(&mut p, &s, &GasSchedule::default(), U256::zero())
            .unwrap()
            .unwrap();

        let adjustment = done.adjustment;
        assert_eq!(adjustment.direction, RehedgeState::OverExposed);
        assert_eq!(adjustment.delta1, U256::from(10u64));
        // 10 * 997 / 1000 truncates to 9.
        assert_eq!(adjustment.swap0, U256::from(9u64));
        assert_eq!(adjustment.fee1, U256::one());
        assert_eq!(adjustment.fee0, U256::one());

        assert_eq!(p.debt1, U256::from(101u64));
        assert_eq!(p.liquidity, U256::from(109u64 * 101));
        assert_eq!(p.rehedge_count, 1);
        assert_eq!(done.gas_units, GasSchedule::default().rehedge_up());
    }

    #[test]
    fn test_rehedge_narrows_gap() {
        // 100,000 asset0 and 50 asset1 pooled at 2,000 against 55 asset1 of debt.
        let s = MarketSnapshot::new(
            Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
            U256::from(2_000_000u64) * E6,
            U256::from(1_000u64) * E18,
            U256::zero(),
            U256::zero(),
        );
        let mut p = position(0, 0);
        p.liquidity = U256::from(100_000u64) * E6 * U256::from(50u64) * E18;
        p.debt1 = U256::from(55u64) * E18;

        let done = rehedge(&mut p, &s, &GasSchedule::default(), U256::zero())
            .unwrap()
            .unwrap();
        let adjustment = done.adjustment;

        assert_eq!(
            p.debt1,
            U256::from(55u64) * E18 - adjustment.delta1 - adjustment.fee1
        );
        let after = Exposure::of(&p, s.reserve0, s.reserve1).unwrap();
        assert!(after.total_debt1 > after.position1);
        assert!(after.total_debt1 - after.position1 < adjustment.delta1);
    }

    #[test]
    fn test_repayment_beyond_holdings_fails() {
        // 1 of each asset pooled against 100 asset1 of debt.
        let s = snapshot(1_000_000_000_000, 1_000_000_000_000);
        let mut p = position(1, 100);
        let before = p.clone();

        assert_eq!(
            rehedge(&mut p, &s, &GasSchedule::default(), U256::zero()),
            Err(MathError::InsufficientLiquidity)
        );
        assert_eq!(p, before);
    }

    #[test]
    fn test_exact_boundary_is_untouched() {
        let s = snapshot(1_000_000_000_000, 1_000_000_000_000);
        let mut p = position(10_000, 100);
        let before = p.clone();

        assert!(rehedge(&mut p, &s, &GasSchedule::default(), U256::zero())
            .unwrap()
            .is_none());
        assert_eq!(p, before);
    }

    #[test]
    fn test_rehedge_charges_gas() {
        // 2,000 asset0 per asset1, 1 gwei gas.
        let s = MarketSnapshot::new(
            Utc.with_ymd_and_hms(2022, 3, 1, 0, 0, 0).unwrap(),
            U256::from(2_000_000u64) * E6,
            U256::from(1_000u64) * E18,
            U256::zero(),
            U256::zero(),
        );
        let mut p = position(0, 0);
        p.liquidity = U256::from(100_000_000u64) * U256::from(50_000_000_000_000_000u64);
        p.debt1 = U256::from(60_000_000_000_000_000u64);

        let done = rehedge(&mut p, &s, &GasSchedule::default(), U256::exp10(9))
            .unwrap()
            .unwrap();

        let expected = s
            .gas_cost0(GasSchedule::default().rehedge_down(), U256::exp10(9))
            .unwrap();
        assert_eq!(done.cost0, expected);
        assert_eq!(p.cost0, expected);
    }
}
