//! The per-snapshot simulation loop.

use crate::config::SimulationConfig;
use crate::error::{SimulationError, SimulationResult};
use crate::event::{EventLog, SimulationEvent, SimulationEventType};
use crate::reporting::PointBuilder;
use crate::state::{Portfolio, SimulationSummary, summarize_strategies};
use amm_hedge_domain::market::MarketSnapshot;
use amm_hedge_domain::ports::{FeedError, GasPriceOracle, MetricsSink, SnapshotFeed};
use tracing::{debug, info};

/// Replays a snapshot feed through the three strategies.
///
/// The engine owns its gas price oracle and metrics sink for the length of
/// the run. Snapshots are pulled one at a time; each one is fully processed
/// and written before the next is read.
pub struct SimulationEngine<O, S> {
    config: SimulationConfig,
    oracle: O,
    sink: S,
    points: PointBuilder,
    events: EventLog,
}

impl<O, S> SimulationEngine<O, S>
where
    O: GasPriceOracle,
    S: MetricsSink,
{
    /// Creates an engine after validating the configuration.
    pub fn new(config: SimulationConfig, oracle: O, sink: S) -> SimulationResult<Self> {
        config.validate()?;
        Ok(Self {
            points: PointBuilder::new(&config),
            config,
            oracle,
            sink,
            events: EventLog::new(),
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Events recorded by the last run.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Runs the simulation over `feed`.
    ///
    /// The first snapshot opens the positions; every following one is a
    /// tick. Any feed, gas price, arithmetic or sink failure aborts the run.
    pub fn run<I>(&mut self, feed: I) -> SimulationResult<SimulationSummary>
    where
        I: IntoIterator,
        I::IntoIter: SnapshotFeed,
    {
        self.events.clear();
        let rates = self.config.rates.to_ray()?;
        let mut feed = feed.into_iter();

        let first = feed.next().ok_or(FeedError::EmptySequence)??;
        let mut gas_price = self.oracle.gas_price(first.date())?;
        let mut portfolio = Portfolio::open(&self.config, &first, gas_price)?;
        let entry_price = first.price()?;

        info!(
            timestamp = %first.timestamp,
            size = self.config.size,
            price = %entry_price,
            gas_price = %gas_price,
            "opened positions"
        );
        self.events.record(SimulationEvent::positions_opened(
            first.timestamp,
            entry_price,
            self.config.size,
            gas_price,
        ));
        self.emit(&first, &portfolio)?;

        let mut snapshots = 1u64;
        let mut last = first.clone();
        for next in feed {
            let snapshot = next?;
            if snapshot.timestamp <= last.timestamp {
                return Err(SimulationError::NonMonotonicTimestamp {
                    previous: last.timestamp,
                    current: snapshot.timestamp,
                });
            }
            let elapsed = u64::try_from((snapshot.timestamp - last.timestamp).num_seconds())
                .unwrap_or_default();
            gas_price = self.oracle.gas_price(snapshot.date())?;

            let rehedge = portfolio.tick(&snapshot, elapsed, &rates, &self.config.gas, gas_price)?;
            if let Some(rehedge) = rehedge {
                self.events.record(SimulationEvent::rehedge(
                    snapshots,
                    snapshot.timestamp,
                    snapshot.price()?,
                    &rehedge,
                ));
            }

            self.emit(&snapshot, &portfolio)?;
            snapshots += 1;
            last = snapshot;
        }
        self.sink.flush()?;

        let strategies = summarize_strategies(&self.config, &portfolio, &last, gas_price)?;
        let summary = SimulationSummary {
            config: self.config.clone(),
            snapshots,
            first_timestamp: first.timestamp,
            last_timestamp: last.timestamp,
            entry_price,
            final_price: last.price()?,
            strategies,
            rehedges_down: self.events.count_by_type(SimulationEventType::DebtDecreased),
            rehedges_up: self.events.count_by_type(SimulationEventType::DebtIncreased),
        };

        info!(
            snapshots,
            rehedges = self.events.rehedge_count(),
            last = %last.timestamp,
            "simulation complete"
        );
        Ok(summary)
    }

    fn emit(&mut self, snapshot: &MarketSnapshot, portfolio: &Portfolio) -> SimulationResult<()> {
        let points = self.points.portfolio(snapshot, portfolio)?;
        for point in &points {
            self.sink.write(point)?;
        }
        debug!(
            timestamp = %snapshot.timestamp,
            hold = ?points[0].field("value"),
            uniswap = ?points[1].field("value"),
            autohedge = ?points[2].field("value"),
            "updated position valuations"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FixedGasPrice, MemorySink};
    use amm_hedge_domain::enums::Strategy;
    use amm_hedge_domain::math::fixed_point::{E6, E18};
    use amm_hedge_domain::ports::{GasPriceError, SinkError};
    use amm_hedge_domain::metrics::MetricPoint;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use primitive_types::U256;

    fn snapshot(hours: i64, reserve0: u64) -> Result<MarketSnapshot, FeedError> {
        Ok(MarketSnapshot::new(
            Utc.with_ymd_and_hms(2021, 10, 7, 0, 0, 0).unwrap() + Duration::hours(hours),
            U256::from(reserve0) * E6,
            U256::from(1_000u64) * E18,
            U256::from(50_000u64) * E6,
            U256::from(25u64) * E18,
        ))
    }

    fn engine() -> SimulationEngine<FixedGasPrice, MemorySink> {
        SimulationEngine::new(
            SimulationConfig::new(1_000_000),
            FixedGasPrice(U256::exp10(10)),
            MemorySink::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_feed_fails() {
        let mut engine = engine();
        let result = engine.run(Vec::new());
        assert!(matches!(
            result,
            Err(SimulationError::Feed(FeedError::EmptySequence))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = SimulationEngine::new(
            SimulationConfig::new(0),
            FixedGasPrice(U256::one()),
            MemorySink::default(),
        );
        assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_emits_three_points_per_snapshot() {
        let mut engine = engine();
        let feed = vec![snapshot(0, 2_000_000), snapshot(1, 2_001_000), snapshot(2, 1_999_000)];
        let summary = engine.run(feed).unwrap();

        assert_eq!(summary.snapshots, 3);
        assert_eq!(engine.sink().points.len(), 9);
        assert_eq!(summary.strategies.len(), 3);
        assert!(summary.strategy(Strategy::Liquidity).unwrap().profit > rust_decimal::Decimal::ZERO);
        assert_eq!(
            engine.events().count_by_type(SimulationEventType::PositionsOpened),
            1
        );
    }

    #[test]
    fn test_non_monotonic_timestamp_fails() {
        let mut engine = engine();
        let feed = vec![snapshot(1, 2_000_000), snapshot(1, 2_000_000)];
        assert!(matches!(
            engine.run(feed),
            Err(SimulationError::NonMonotonicTimestamp { .. })
        ));
    }

    #[test]
    fn test_read_error_aborts() {
        let mut engine = engine();
        let feed = vec![
            snapshot(0, 2_000_000),
            Err(FeedError::Read("connection reset".to_string())),
            snapshot(2, 2_000_000),
        ];
        assert!(matches!(
            engine.run(feed),
            Err(SimulationError::Feed(FeedError::Read(_)))
        ));
        assert_eq!(engine.sink().points.len(), 3);
    }

    #[test]
    fn test_price_move_triggers_rehedge() {
        let mut engine = engine();
        // The volatile asset gains 10%, pushing pooled asset1 below the debt.
        let feed = vec![snapshot(0, 2_000_000), snapshot(1, 2_200_000)];
        let summary = engine.run(feed).unwrap();

        assert_eq!(summary.rehedges_down, 1);
        assert_eq!(summary.rehedges_up, 0);
        assert_eq!(summary.strategy(Strategy::Hedged).unwrap().rehedges, 1);
        assert_eq!(engine.events().rehedge_count(), 1);
    }

    fn replay_feed<F: SnapshotFeed>(feed: F) -> SimulationResult<SimulationSummary> {
        engine().run(feed)
    }

    #[test]
    fn test_runs_lazy_snapshot_feed() {
        let feed = (0..4).map(|hour| snapshot(hour, 2_000_000 + hour as u64 * 1_000));
        let summary = replay_feed(feed).unwrap();
        assert_eq!(summary.snapshots, 4);
    }

    struct MissingDay;

    impl GasPriceOracle for MissingDay {
        fn gas_price(&self, date: NaiveDate) -> Result<U256, GasPriceError> {
            if date == NaiveDate::from_ymd_opt(2021, 10, 7).unwrap() {
                Ok(U256::one())
            } else {
                Err(GasPriceError::PriceNotFound { date })
            }
        }
    }

    #[test]
    fn test_missing_gas_price_is_fatal() {
        let mut engine = SimulationEngine::new(
            SimulationConfig::new(1_000_000),
            MissingDay,
            MemorySink::default(),
        )
        .unwrap();
        let feed = vec![snapshot(0, 2_000_000), snapshot(30, 2_000_000)];
        assert!(matches!(
            engine.run(feed),
            Err(SimulationError::GasPrice(GasPriceError::PriceNotFound { .. }))
        ));
    }

    struct FailingSink;

    impl MetricsSink for FailingSink {
        fn write(&mut self, _point: &MetricPoint) -> Result<(), SinkError> {
            Err(SinkError::Write("disk full".to_string()))
        }
    }

    #[test]
    fn test_sink_failure_is_fatal() {
        let mut engine = SimulationEngine::new(
            SimulationConfig::new(1_000_000),
            FixedGasPrice(U256::one()),
            FailingSink,
        )
        .unwrap();
        assert!(matches!(
            engine.run(vec![snapshot(0, 2_000_000)]),
            Err(SimulationError::Sink(_))
        ));
    }
}
