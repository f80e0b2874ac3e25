//! Compound interest approximation at Ray precision.
//!
//! Mirrors the lending-pool `calculateCompoundedInterest` helper: a third-order
//! binomial expansion of `(1 + r/n)^t - 1` that avoids exponentiation.

use super::fixed_point::{RAY, SECONDS_PER_YEAR, add, div, mul, mul_div, ray_mul};
use crate::error::MathResult;
use primitive_types::U256;

/// Returns the fractional growth, in Ray, of a balance earning the per-year
/// Ray `rate` over `elapsed` seconds.
///
/// ```text
/// rps   = rate / SECONDS_PER_YEAR
/// term1 = t * rps
/// term2 = t * (t - 1) * rps^2 / 2
/// term3 = t * (t - 1) * max(t - 2, 0) * rps^3 / 6
/// ```
///
/// The result excludes the base: add `RAY` to obtain the growth factor.
pub fn calculate_compounded_interest(rate: U256, elapsed: u64) -> MathResult<U256> {
    if elapsed == 0 {
        return Ok(U256::zero());
    }

    let exp = U256::from(elapsed);
    let exp_minus_one = U256::from(elapsed - 1);
    let exp_minus_two = U256::from(elapsed.saturating_sub(2));

    let rate_per_second = div(rate, U256::from(SECONDS_PER_YEAR))?;
    let base_power_two = ray_mul(rate_per_second, rate_per_second)?;
    let base_power_three = ray_mul(base_power_two, rate_per_second)?;

    let first_term = mul(exp, rate_per_second)?;

    let second_term = mul(mul(exp, exp_minus_one)?, base_power_two)? / 2;

    let third_term = mul(mul(mul(exp, exp_minus_one)?, exp_minus_two)?, base_power_three)? / 6;

    add(add(first_term, second_term)?, third_term)
}

/// Returns the amount `balance` grows by at the per-year Ray `rate` over
/// `elapsed` seconds, truncated to the balance's own scale.
pub fn accrue(balance: U256, rate: U256, elapsed: u64) -> MathResult<U256> {
    let growth = calculate_compounded_interest(rate, elapsed)?;
    mul_div(balance, growth, RAY)
}
