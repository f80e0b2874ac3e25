//! Metric points emitted for every strategy at every snapshot.

use crate::config::SimulationConfig;
use crate::state::Portfolio;
use amm_hedge_domain::MathResult;
use amm_hedge_domain::enums::Strategy;
use amm_hedge_domain::market::MarketSnapshot;
use amm_hedge_domain::math::fixed_point::DECIMALS0;
use amm_hedge_domain::metrics::MetricPoint;
use amm_hedge_domain::positions::{HedgedPosition, HoldPosition, PoolPosition};
use amm_hedge_domain::value_objects::Amount;
use primitive_types::U256;
use rust_decimal::Decimal;

const SI_SUFFIXES: [&str; 7] = ["", "k", "M", "G", "T", "P", "E"];

/// Formats a notional with an SI suffix, e.g. `1M` or `2.5k`.
pub fn size_bucket(size: u64) -> String {
    let mut scaled = Decimal::from(size);
    let mut suffix = 0;
    let thousand = Decimal::from(1_000);
    while scaled >= thousand && suffix + 1 < SI_SUFFIXES.len() {
        scaled /= thousand;
        suffix += 1;
    }
    format!("{}{}", scaled.normalize(), SI_SUFFIXES[suffix])
}

/// Formats a band in basis points as a percentage, e.g. `1%`.
pub fn band_label(bps: u64) -> String {
    format!("{}%", Decimal::new(bps as i64, 2).normalize())
}

fn asset0(raw: U256) -> MathResult<Decimal> {
    Amount::new(raw, DECIMALS0).to_decimal()
}

/// Builds metric points tagged from a run configuration.
#[derive(Debug, Clone)]
pub struct PointBuilder {
    measurement: String,
    chain: String,
    size: String,
    rehedge: String,
}

impl PointBuilder {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            measurement: config.measurement.clone(),
            chain: config.chain.clone(),
            size: size_bucket(config.size),
            rehedge: band_label(config.rehedge_band_bps),
        }
    }

    fn point(&self, strategy: Strategy, snapshot: &MarketSnapshot) -> MetricPoint {
        MetricPoint::new(self.measurement.as_str(), snapshot.timestamp)
            .with_tag("strategy", strategy.as_str())
            .with_tag("chain", self.chain.as_str())
            .with_tag("size", self.size.as_str())
    }

    pub fn hold(&self, snapshot: &MarketSnapshot, hold: &HoldPosition) -> MathResult<MetricPoint> {
        let value = hold.value(snapshot.reserve0, snapshot.reserve1)?;
        Ok(self
            .point(Strategy::Hold, snapshot)
            .with_field("value", value.to_decimal()?)
            .with_field("fees", asset0(hold.fees0)?)
            .with_field("cost", asset0(hold.cost0)?))
    }

    pub fn pool(&self, snapshot: &MarketSnapshot, pool: &PoolPosition) -> MathResult<MetricPoint> {
        let value = pool.value(snapshot.reserve0, snapshot.reserve1)?;
        Ok(self
            .point(Strategy::Liquidity, snapshot)
            .with_field("value", value.to_decimal()?)
            .with_field("profit", asset0(pool.profit_value0(snapshot)?)?)
            .with_field("fees", asset0(pool.fees0)?)
            .with_field("cost", asset0(pool.cost0)?))
    }

    pub fn hedged(
        &self,
        snapshot: &MarketSnapshot,
        hedged: &HedgedPosition,
    ) -> MathResult<MetricPoint> {
        let value = hedged.value(snapshot.reserve0, snapshot.reserve1)?;
        Ok(self
            .point(Strategy::Hedged, snapshot)
            .with_tag("leverage", "2x")
            .with_tag("rehedge", self.rehedge.as_str())
            .with_field("value", value.to_decimal()?)
            .with_field("profit", asset0(hedged.profit_value0(snapshot)?)?)
            .with_field("fees", asset0(hedged.fees0)?)
            .with_field("cost", asset0(hedged.cost0)?)
            .with_field("principal", asset0(hedged.principal0)?)
            .with_field("yield", asset0(hedged.yield0)?)
            .with_field("debt", asset0(snapshot.to_asset0(hedged.debt1)?)?)
            .with_field("interest", asset0(snapshot.to_asset0(hedged.interest1)?)?)
            .with_field("rehedges", hedged.rehedge_count))
    }

    /// One point per strategy, in `Strategy::ALL` order.
    pub fn portfolio(
        &self,
        snapshot: &MarketSnapshot,
        portfolio: &Portfolio,
    ) -> MathResult<[MetricPoint; 3]> {
        Ok([
            self.hold(snapshot, &portfolio.hold)?,
            self.pool(snapshot, &portfolio.pool)?,
            self.hedged(snapshot, &portfolio.hedged)?,
        ])
    }
}
