//! Exact-integer decimal arithmetic.
//!
//! Every quantity is a `U256` carrying an implicit decimal scale: asset0
//! amounts use 6 decimals, asset1 amounts 18, and rates/growth factors use
//! Ray (27). All helpers are checked; division truncates toward zero unless
//! the name says otherwise.

use crate::error::{MathError, MathResult};
use primitive_types::{U256, U512};

/// 10^3, the denominator of the constant-product fee (997/1000).
pub const E3: U256 = U256([0x3e8, 0, 0, 0]);
/// 10^6, one whole unit of asset0.
pub const E6: U256 = U256([0xf4240, 0, 0, 0]);
/// 10^18, one whole unit of asset1.
pub const E18: U256 = U256([0x0de0_b6b3_a764_0000, 0, 0, 0]);
/// 10^23, converts a basis-point rate into a Ray.
pub const E23: U256 = U256([0x02c7_e14a_f680_0000, 0x152d, 0, 0]);
/// 10^27.
pub const E27: U256 = U256([0x9fd0_803c_e800_0000, 0x033b_2e3c, 0, 0]);
/// 10^30.
pub const E30: U256 = U256([0x4674_edea_4000_0000, 0x0000_000c_9f2c_9cd0, 0, 0]);

/// One Ray (1.0 at 27 decimals).
pub const RAY: U256 = E27;
/// Half a Ray, used for round-half-up Ray multiplication.
pub const HALF_RAY: U256 = U256([0x4fe8_401e_7400_0000, 0x019d_971e, 0, 0]);

/// 365 days of 24 hours of 3600 seconds.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 3600;

/// Decimals of asset0 (the stable asset).
pub const DECIMALS0: u8 = 6;
/// Decimals of asset1 (the volatile asset).
pub const DECIMALS1: u8 = 18;
/// Decimals of a Ray.
pub const RAY_DECIMALS: u8 = 27;

/// Returns `10^decimals`.
pub fn pow10(decimals: u8) -> MathResult<U256> {
    // 10^77 is the largest power of ten below 2^256.
    if decimals > 77 {
        return Err(MathError::Overflow);
    }
    Ok(U256::exp10(decimals as usize))
}

/// Checked addition.
pub fn add(a: U256, b: U256) -> MathResult<U256> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// Checked subtraction; a negative result is an error.
pub fn sub(a: U256, b: U256) -> MathResult<U256> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

/// Checked multiplication.
pub fn mul(a: U256, b: U256) -> MathResult<U256> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

/// Truncating division.
pub fn div(a: U256, b: U256) -> MathResult<U256> {
    if b.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    Ok(a / b)
}

/// Computes `a * b / c` with a 512-bit intermediate product, truncating.
pub fn mul_div(a: U256, b: U256, c: U256) -> MathResult<U256> {
    if c.is_zero() {
        return Err(MathError::DivisionByZero);
    }
    let product = a.full_mul(b);
    U256::try_from(product / U512::from(c)).map_err(|_| MathError::Overflow)
}

/// Multiplies two Ray values and rescales back to Ray, rounding half up.
pub fn ray_mul(a: U256, b: U256) -> MathResult<U256> {
    let product = a.full_mul(b) + U512::from(HALF_RAY);
    U256::try_from(product / U512::from(RAY)).map_err(|_| MathError::Overflow)
}

/// Truncating integer square root.
pub fn sqrt(a: U256) -> U256 {
    a.integer_sqrt()
}

/// Moves `x` from `from` decimals to `to` decimals, truncating when scaling down.
pub fn rescale(x: U256, from: u8, to: u8) -> MathResult<U256> {
    match from.cmp(&to) {
        std::cmp::Ordering::Equal => Ok(x),
        std::cmp::Ordering::Less => mul(x, pow10(to - from)?),
        std::cmp::Ordering::Greater => div(x, pow10(from - to)?),
    }
}

/// Converts a rate in basis points (1/10000) into a Ray.
pub fn bps_to_ray(bps: u64) -> MathResult<U256> {
    mul(U256::from(bps), E23)
}
