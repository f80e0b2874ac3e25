//! Run configuration.

use crate::error::SimulationError;
use amm_hedge_domain::MathResult;
use amm_hedge_domain::math::fixed_point::bps_to_ray;
use amm_hedge_domain::positions::HedgeTerms;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// One hundred percent in basis points.
const FULL_BPS: u64 = 10_000;

/// Fee and interest rates in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateSchedule {
    /// Pool swap fee.
    pub swap_bps: u64,
    /// Flash loan fee.
    pub flash_bps: u64,
    /// Yearly lending rate earned on the collateral.
    pub lend_bps: u64,
    /// Yearly borrowing rate paid on the debt.
    pub borrow_bps: u64,
}

impl Default for RateSchedule {
    fn default() -> Self {
        Self {
            swap_bps: 30,
            flash_bps: 9,
            lend_bps: 50,
            borrow_bps: 250,
        }
    }
}

/// The rate schedule converted to Rays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayRates {
    pub swap: U256,
    pub flash: U256,
    pub lend: U256,
    pub borrow: U256,
}

impl RateSchedule {
    pub fn to_ray(&self) -> MathResult<RayRates> {
        Ok(RayRates {
            swap: bps_to_ray(self.swap_bps)?,
            flash: bps_to_ray(self.flash_bps)?,
            lend: bps_to_ray(self.lend_bps)?,
            borrow: bps_to_ray(self.borrow_bps)?,
        })
    }
}

/// Gas units spent by each simulated on-chain operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasSchedule {
    /// Token transfer approval.
    pub approve: u64,
    /// Pool swap.
    pub swap: u64,
    /// Flash loan.
    pub flash: u64,
    /// Creating a liquidity position.
    pub create: u64,
    /// Adding liquidity.
    pub add: u64,
    /// Removing liquidity.
    pub remove: u64,
    /// Closing a liquidity position.
    pub close: u64,
    /// Lending the collateral.
    pub lend: u64,
    /// Claiming the loan back with its yield.
    pub claim: u64,
    /// Opening the borrow.
    pub borrow: u64,
    /// Increasing the debt.
    pub increase: u64,
    /// Decreasing the debt.
    pub decrease: u64,
    /// Repaying the full debt.
    pub repay: u64,
}

impl Default for GasSchedule {
    fn default() -> Self {
        Self {
            approve: 24_102,
            swap: 181_133,
            flash: 204_493,
            create: 157_880,
            add: 130_682,
            remove: 161_841,
            close: 207_111,
            lend: 217_479,
            claim: 333_793,
            borrow: 295_250,
            increase: 271_980,
            decrease: 193_729,
            repay: 188_929,
        }
    }
}

fn units(operations: &[u64]) -> u64 {
    operations.iter().fold(0, |total, op| total.saturating_add(*op))
}

impl GasSchedule {
    /// Approving and swapping half of the input.
    pub fn hold_entry(&self) -> u64 {
        units(&[self.approve, self.swap])
    }

    /// Creating the pool position on top of the hold split.
    pub fn pool_entry(&self) -> u64 {
        self.create
    }

    /// Flash loan, lending and borrowing on top of the pool position.
    pub fn hedge_entry(&self) -> u64 {
        units(&[self.approve, self.approve, self.flash, self.lend, self.borrow])
    }

    /// Selling pooled asset0 and paying down part of the debt.
    ///
    /// Partial repayments are priced as `decrease`; `repay` is the full
    /// repayment charged on exit.
    pub fn rehedge_down(&self) -> u64 {
        units(&[self.swap, self.decrease, self.remove])
    }

    /// Borrowing more asset1, selling it and adding to the pool.
    ///
    /// Extra borrowing is priced as `increase`; `borrow` is the opening loan.
    pub fn rehedge_up(&self) -> u64 {
        units(&[self.swap, self.increase, self.add])
    }

    pub fn hold_exit(&self) -> u64 {
        self.swap
    }

    pub fn pool_exit(&self) -> u64 {
        units(&[self.close, self.swap])
    }

    pub fn hedged_exit(&self) -> u64 {
        units(&[self.close, self.swap, self.repay, self.claim])
    }
}

/// Configuration for a backtest run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Input notional in whole asset0 units.
    pub size: u64,
    /// Tolerance around the total debt before rehedging, in basis points.
    pub rehedge_band_bps: u64,
    /// Fee and interest rates.
    pub rates: RateSchedule,
    /// Gas units per operation.
    pub gas: GasSchedule,
    /// Measurement name of emitted metric points.
    pub measurement: String,
    /// Chain tag of emitted metric points.
    pub chain: String,
}

impl SimulationConfig {
    /// Creates a new simulation config with defaults.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            rehedge_band_bps: 100, // 1%
            rates: RateSchedule::default(),
            gas: GasSchedule::default(),
            measurement: "uniswapv2".to_string(),
            chain: "ethereum".to_string(),
        }
    }

    /// Sets the rehedge band.
    #[must_use]
    pub fn with_rehedge_band(mut self, bps: u64) -> Self {
        self.rehedge_band_bps = bps;
        self
    }

    /// Sets the rate schedule.
    #[must_use]
    pub fn with_rates(mut self, rates: RateSchedule) -> Self {
        self.rates = rates;
        self
    }

    /// Sets the gas schedule.
    #[must_use]
    pub fn with_gas(mut self, gas: GasSchedule) -> Self {
        self.gas = gas;
        self
    }

    /// Sets the measurement name.
    #[must_use]
    pub fn with_measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = measurement.into();
        self
    }

    /// Sets the chain tag.
    #[must_use]
    pub fn with_chain(mut self, chain: impl Into<String>) -> Self {
        self.chain = chain.into();
        self
    }

    /// Checks the configuration for values the position math cannot handle.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.size == 0 {
            return Err(SimulationError::InvalidConfig(
                "size must be positive".to_string(),
            ));
        }
        if self.rehedge_band_bps >= FULL_BPS {
            return Err(SimulationError::InvalidConfig(format!(
                "rehedge band of {} bps must be below 100%",
                self.rehedge_band_bps
            )));
        }
        if self.rates.swap_bps >= FULL_BPS {
            return Err(SimulationError::InvalidConfig(format!(
                "swap rate of {} bps must be below 100%",
                self.rates.swap_bps
            )));
        }
        if self.measurement.is_empty() {
            return Err(SimulationError::InvalidConfig(
                "measurement name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Flash loan terms for opening the hedged position.
    pub fn hedge_terms(&self) -> MathResult<HedgeTerms> {
        let rates = self.rates.to_ray()?;
        Ok(HedgeTerms {
            swap_rate: rates.swap,
            flash_rate: rates.flash,
            rehedge_band: bps_to_ray(self.rehedge_band_bps)?,
        })
    }
}
