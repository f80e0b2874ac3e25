use crate::error::{MathError, MathResult};
use crate::market::MarketSnapshot;
use crate::math::constant_product::{holdings, pool_liquidity};
use crate::math::fixed_point::{RAY, add, mul, mul_div, sqrt};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Trading fees credited to a liquidity position over one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeIncome {
    /// Asset0 share of the fees (6 decimals).
    pub amount0: U256,
    /// Asset1 share of the fees (18 decimals).
    pub amount1: U256,
}

impl FeeIncome {
    pub fn is_zero(&self) -> bool {
        self.amount0.is_zero() && self.amount1.is_zero()
    }
}

/// Result of compounding fee income back into a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeAccrual {
    /// Invariant product after reinvesting the income.
    pub liquidity: U256,
    /// Income earned this tick.
    pub income: FeeIncome,
}

/// Credits a position with its pro-rata share of the snapshot's trade volume
/// and reinvests the fees into its invariant.
///
/// The share is `sqrt(liquidity) / sqrt(reserve0 * reserve1)`; each side earns
/// `volume * share * fee_rate` where `fee_rate` is a Ray. The invariant
/// product grows from `amount0 * amount1` to
/// `(amount0 + profit0) * (amount1 + profit1)`, with both holdings taken
/// before the income is added.
pub fn accrue_fee_income(
    liquidity: U256,
    snapshot: &MarketSnapshot,
    fee_rate: U256,
) -> MathResult<FeeAccrual> {
    let total = pool_liquidity(snapshot.reserve0, snapshot.reserve1)?;
    if total.is_zero() {
        return Err(MathError::InsufficientLiquidity);
    }
    let own = sqrt(liquidity);

    let profit0 = mul_div(mul_div(snapshot.volume0, own, total)?, fee_rate, RAY)?;
    let profit1 = mul_div(mul_div(snapshot.volume1, own, total)?, fee_rate, RAY)?;

    let (amount0, amount1) = holdings(liquidity, snapshot.reserve0, snapshot.reserve1)?;

    let growth = add(
        add(mul(amount0, profit1)?, mul(amount1, profit0)?)?,
        mul(profit0, profit1)?,
    )?;

    Ok(FeeAccrual {
        liquidity: add(liquidity, growth)?,
        income: FeeIncome {
            amount0: profit0,
            amount1: profit1,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::fixed_point::{E6, E18, bps_to_ray};
    use chrono::{TimeZone, Utc};

    fn snapshot(volume0: U256, volume1: U256) -> MarketSnapshot {
        MarketSnapshot::new(
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
            U256::from(4_000_000u64) * E6,
            U256::from(10_000u64) * E18,
            volume0,
            volume1,
        )
    }

    #[test]
    fn test_no_volume_keeps_liquidity() {
        let liquidity = U256::from(1_000_000u64) * E6 * U256::from(2_500u64) * E18;
        let accrual =
            accrue_fee_income(liquidity, &snapshot(U256::zero(), U256::zero()), bps_to_ray(30).unwrap())
                .unwrap();
        assert_eq!(accrual.liquidity, liquidity);
        assert!(accrual.income.is_zero());
    }

    #[test]
    fn test_fee_share_is_pro_rata() {
        // The position holds a quarter of each reserve.
        let amount0 = U256::from(1_000_000u64) * E6;
        let amount1 = U256::from(2_500u64) * E18;
        let liquidity = amount0 * amount1;

        // 400,000 asset0 and 100 asset1 traded, 0.3% fee, 25% share.
        let s = snapshot(U256::from(400_000u64) * E6, U256::from(100u64) * E18);
        let accrual = accrue_fee_income(liquidity, &s, bps_to_ray(30).unwrap()).unwrap();

        assert_eq!(accrual.income.amount0, U256::from(300u64) * E6);
        assert_eq!(accrual.income.amount1, U256::from(75u64) * E18 / 1_000);

        let expected = (amount0 + accrual.income.amount0) * (amount1 + accrual.income.amount1);
        assert_eq!(accrual.liquidity, expected);
    }

    #[test]
    fn test_empty_pool_fails() {
        let mut s = snapshot(U256::zero(), U256::zero());
        s.reserve0 = U256::zero();
        assert_eq!(
            accrue_fee_income(U256::one(), &s, RAY),
            Err(MathError::InsufficientLiquidity)
        );
    }
}
