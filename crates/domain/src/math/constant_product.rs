use super::fixed_point::{E3, add, mul, mul_div, sqrt, sub};
use crate::error::{MathError, MathResult};
use primitive_types::U256;

/// Numerator of the swap fee multiplier (0.3% fee).
pub const FEE_NUMERATOR: u64 = 997;

/// Returns the amount of asset B equivalent to `amount_a` at the current
/// reserve ratio, without any trading fee.
///
/// formula: amount_b = amount_a * reserve_b / reserve_a
pub fn quote(amount_a: U256, reserve_a: U256, reserve_b: U256) -> MathResult<U256> {
    if reserve_a.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    mul_div(amount_a, reserve_b, reserve_a)
}

/// Calculates the output amount for a given input amount in a constant
/// product pool (x * y = k), charging the 0.3% fee on the input.
///
/// formula: dy = dx * 997 * y / (x * 1000 + dx * 997)
pub fn get_amount_out(amount_in: U256, reserve_in: U256, reserve_out: U256) -> MathResult<U256> {
    if amount_in.is_zero() {
        return Ok(U256::zero());
    }
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(MathError::InsufficientLiquidity);
    }

    let amount_in_with_fee = mul(amount_in, U256::from(FEE_NUMERATOR))?;
    let denominator = add(mul(reserve_in, E3)?, amount_in_with_fee)?;

    mul_div(amount_in_with_fee, reserve_out, denominator)
}

/// Calculates the input amount required to receive `amount_out` from a
/// constant product pool, charging the 0.3% fee on the input.
///
/// formula: dx = x * dy * 1000 / ((y - dy) * 997) + 1
///
/// The trailing `+ 1` rounds up so the pool invariant never decreases.
pub fn get_amount_in(amount_out: U256, reserve_in: U256, reserve_out: U256) -> MathResult<U256> {
    if amount_out.is_zero() {
        return Ok(U256::zero());
    }
    if reserve_in.is_zero() || amount_out >= reserve_out {
        return Err(MathError::InsufficientLiquidity);
    }

    let numerator = mul(mul(reserve_in, amount_out)?, E3)?;
    let denominator = mul(sub(reserve_out, amount_out)?, U256::from(FEE_NUMERATOR))?;

    add(numerator / denominator, U256::one())
}

/// Calculates the pool invariant as the geometric mean of its reserves.
pub fn pool_liquidity(reserve0: U256, reserve1: U256) -> MathResult<U256> {
    Ok(sqrt(mul(reserve0, reserve1)?))
}

/// Returns the asset0 and asset1 holdings of a position whose invariant
/// product is `liquidity` at the current reserves.
///
/// amount0 = sqrt(liquidity * reserve0 / reserve1), amount1 = quote(amount0)
pub fn holdings(liquidity: U256, reserve0: U256, reserve1: U256) -> MathResult<(U256, U256)> {
    if reserve1.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let amount0 = sqrt(mul_div(liquidity, reserve0, reserve1)?);
    let amount1 = quote(amount0, reserve0, reserve1)?;
    Ok((amount0, amount1))
}
