//! Simulation state management.
//!
//! The portfolio owns the three competing positions for the length of a
//! run; the summary captures where they ended.

use crate::config::{GasSchedule, RayRates, SimulationConfig};
use crate::rehedge::{Rehedge, rehedge};
use amm_hedge_domain::MathResult;
use amm_hedge_domain::enums::Strategy;
use amm_hedge_domain::market::MarketSnapshot;
use amm_hedge_domain::math::fixed_point::DECIMALS0;
use amm_hedge_domain::positions::{HedgedPosition, HoldPosition, PoolPosition};
use amm_hedge_domain::value_objects::{Amount, SignedAmount};
use chrono::{DateTime, Utc};
use primitive_types::U256;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

/// The hold, pool and hedged positions of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Portfolio {
    pub hold: HoldPosition,
    pub pool: PoolPosition,
    pub hedged: HedgedPosition,
}

impl Portfolio {
    /// Opens all three positions at the first snapshot.
    pub fn open(
        config: &SimulationConfig,
        snapshot: &MarketSnapshot,
        gas_price: U256,
    ) -> MathResult<Self> {
        let rates = config.rates.to_ray()?;
        let gas = &config.gas;

        let hold = HoldPosition::open(
            config.size,
            snapshot,
            rates.swap,
            gas.hold_entry(),
            gas_price,
        )?;
        let pool = PoolPosition::open(&hold, snapshot, gas.pool_entry(), gas_price)?;
        let hedged = HedgedPosition::open(
            &pool,
            snapshot,
            &config.hedge_terms()?,
            gas.hedge_entry(),
            gas_price,
        )?;

        Ok(Self { hold, pool, hedged })
    }

    /// Advances the positions over one snapshot: compounding first, then fee
    /// income, then the rehedge decision.
    pub fn tick(
        &mut self,
        snapshot: &MarketSnapshot,
        elapsed: u64,
        rates: &RayRates,
        gas: &GasSchedule,
        gas_price: U256,
    ) -> MathResult<Option<Rehedge>> {
        let (gain0, loss1) = self.hedged.compound(elapsed, rates.lend, rates.borrow)?;
        debug!(
            timestamp = %snapshot.timestamp,
            elapsed,
            gain0 = %gain0,
            loss1 = %loss1,
            "compounded yield and interest"
        );

        let pool_income = self.pool.accrue(snapshot, rates.swap)?;
        let hedged_income = self.hedged.accrue(snapshot, rates.swap)?;
        debug!(
            timestamp = %snapshot.timestamp,
            pool0 = %pool_income.amount0,
            pool1 = %pool_income.amount1,
            hedged0 = %hedged_income.amount0,
            hedged1 = %hedged_income.amount1,
            "accrued fee income"
        );

        rehedge(&mut self.hedged, snapshot, gas, gas_price)
    }

    /// Current values in asset0, in `Strategy::ALL` order.
    pub fn values(&self, snapshot: &MarketSnapshot) -> MathResult<[SignedAmount; 3]> {
        Ok([
            self.hold.value(snapshot.reserve0, snapshot.reserve1)?,
            self.pool.value(snapshot.reserve0, snapshot.reserve1)?,
            self.hedged.value(snapshot.reserve0, snapshot.reserve1)?,
        ])
    }
}

/// Final figures of one strategy, in whole asset0 units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategySummary {
    pub strategy: Strategy,
    /// Value at the last snapshot.
    pub value: Decimal,
    /// Value relative to the input, as a percentage.
    pub return_pct: Decimal,
    /// Gas to unwind the position at the last snapshot.
    pub exit_cost: Decimal,
    /// Value after unwinding.
    pub exit_value: Decimal,
    /// Fee income earned.
    pub profit: Decimal,
    /// Swap and flash loan fees paid.
    pub fees: Decimal,
    /// Gas paid so far.
    pub cost: Decimal,
    pub rehedges: u32,
}

/// Results from a completed simulation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Configuration used.
    pub config: SimulationConfig,
    /// Snapshots consumed, including the opening one.
    pub snapshots: u64,
    pub first_timestamp: DateTime<Utc>,
    pub last_timestamp: DateTime<Utc>,
    /// Asset1 price in asset0 at the first snapshot.
    pub entry_price: Decimal,
    /// Asset1 price in asset0 at the last snapshot.
    pub final_price: Decimal,
    pub strategies: Vec<StrategySummary>,
    /// Rehedges that decreased the debt.
    pub rehedges_down: usize,
    /// Rehedges that increased the debt.
    pub rehedges_up: usize,
}

impl SimulationSummary {
    /// Returns the summary of one strategy.
    #[must_use]
    pub fn strategy(&self, strategy: Strategy) -> Option<&StrategySummary> {
        self.strategies.iter().find(|s| s.strategy == strategy)
    }

    /// Returns the strategy with the highest exit value.
    #[must_use]
    pub fn best(&self) -> Option<&StrategySummary> {
        self.strategies.iter().max_by(|a, b| a.exit_value.cmp(&b.exit_value))
    }

    /// Returns the elapsed time in days.
    #[must_use]
    pub fn duration_days(&self) -> Decimal {
        let seconds = (self.last_timestamp - self.first_timestamp).num_seconds();
        Decimal::from(seconds) / Decimal::from(86_400)
    }
}

fn asset0(raw: U256) -> MathResult<Decimal> {
    Amount::new(raw, DECIMALS0).to_decimal()
}

/// Summarizes every strategy at the last snapshot.
pub fn summarize_strategies(
    config: &SimulationConfig,
    portfolio: &Portfolio,
    snapshot: &MarketSnapshot,
    gas_price: U256,
) -> MathResult<Vec<StrategySummary>> {
    let input = Decimal::from(config.size);
    let values = portfolio.values(snapshot)?;
    let gas = &config.gas;

    let exits = [gas.hold_exit(), gas.pool_exit(), gas.hedged_exit()];
    let profits = [
        U256::zero(),
        portfolio.pool.profit_value0(snapshot)?,
        portfolio.hedged.profit_value0(snapshot)?,
    ];
    let fees = [
        portfolio.hold.fees0,
        portfolio.pool.fees0,
        portfolio.hedged.fees0,
    ];
    let costs = [
        portfolio.hold.cost0,
        portfolio.pool.cost0,
        portfolio.hedged.cost0,
    ];

    let mut summaries = Vec::with_capacity(Strategy::ALL.len());
    for (i, strategy) in Strategy::ALL.into_iter().enumerate() {
        let value = values[i].to_decimal()?;
        let exit_cost = asset0(snapshot.gas_cost0(exits[i], gas_price)?)?;
        summaries.push(StrategySummary {
            strategy,
            value,
            return_pct: (value - input) / input * Decimal::ONE_HUNDRED,
            exit_cost,
            exit_value: value - exit_cost,
            profit: asset0(profits[i])?,
            fees: asset0(fees[i])?,
            cost: asset0(costs[i])?,
            rehedges: if strategy == Strategy::Hedged {
                portfolio.hedged.rehedge_count
            } else {
                0
            },
        });
    }
    Ok(summaries)
}
