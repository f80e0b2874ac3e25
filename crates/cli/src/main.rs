//! Command Line Interface for the AMM hedging backtester.
use amm_hedge_data::{GasStation, LineProtocolSink, SnapshotReader};
use amm_hedge_domain::ports::MetricsSink;
use amm_hedge_simulation::prelude::*;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use prettytable::{Table, row};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "amm-hedge")]
#[command(about = "Backtest hold, liquidity and auto-hedged strategies on a constant-product pool", long_about = None)]
struct Cli {
    /// Logging verbosity (trace, debug, info, warn, error)
    #[arg(short, long, global = true, env = "AMM_HEDGE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay pool snapshots through the three strategies
    Backtest(BacktestArgs),
    /// Print the snapshots a backtest would replay
    Snapshots {
        /// CSV file of pool snapshots
        #[arg(short = 'f', long, env = "AMM_HEDGE_SNAPSHOTS")]
        snapshots: PathBuf,

        #[command(flatten)]
        window: Window,

        /// Maximum rows to print
        #[arg(short = 'n', long, default_value_t = 24)]
        limit: usize,
    },
}

#[derive(Args)]
struct Window {
    /// Start timestamp for the backtest (RFC 3339)
    #[arg(short, long, env = "AMM_HEDGE_START_TIME", default_value = "2021-10-07T00:00:00Z", value_parser = parse_time)]
    start_time: DateTime<Utc>,

    /// End timestamp for the backtest (RFC 3339)
    #[arg(short, long, env = "AMM_HEDGE_END_TIME", default_value = "2022-10-07T23:59:59Z", value_parser = parse_time)]
    end_time: DateTime<Utc>,
}

#[derive(Args)]
struct BacktestArgs {
    /// CSV file of pool snapshots
    #[arg(short = 'f', long, env = "AMM_HEDGE_SNAPSHOTS")]
    snapshots: PathBuf,

    /// CSV file of average gas price per day
    #[arg(short, long, env = "AMM_HEDGE_GAS_PRICES", default_value = "gas-prices.csv")]
    gas_prices: PathBuf,

    /// Line protocol output for position metrics (`-` for stdout)
    #[arg(short, long, env = "AMM_HEDGE_OUTPUT")]
    output: Option<PathBuf>,

    /// JSON file for the run summary
    #[arg(long, env = "AMM_HEDGE_SUMMARY")]
    summary: Option<PathBuf>,

    #[command(flatten)]
    window: Window,

    /// Stable coin input amount
    #[arg(short, long, env = "AMM_HEDGE_INPUT_VALUE", default_value_t = 1_000_000)]
    input_value: u64,

    /// Band around the debt at which we rehedge (in 1/10000)
    #[arg(short, long, env = "AMM_HEDGE_REHEDGE_RATIO", default_value_t = 100)]
    rehedge_ratio: u64,

    /// Measurement name of the metric points
    #[arg(long, env = "AMM_HEDGE_MEASUREMENT", default_value = "uniswapv2")]
    measurement: String,

    /// Chain tag of the metric points
    #[arg(long, env = "AMM_HEDGE_CHAIN", default_value = "ethereum")]
    chain: String,

    #[command(flatten)]
    rates: RateArgs,

    #[command(flatten)]
    gas: GasArgs,
}

#[derive(Args)]
struct RateArgs {
    /// Fee rate for asset swap (in 1/10000)
    #[arg(long, env = "AMM_HEDGE_SWAP_RATE", default_value_t = 30)]
    swap_rate: u64,
    /// Fee rate for flash loan (in 1/10000)
    #[arg(long, env = "AMM_HEDGE_FLASH_RATE", default_value_t = 9)]
    flash_rate: u64,
    /// Interest rate for lending asset (in 1/10000)
    #[arg(long, env = "AMM_HEDGE_LEND_RATE", default_value_t = 50)]
    lend_rate: u64,
    /// Interest rate for borrowing asset (in 1/10000)
    #[arg(long, env = "AMM_HEDGE_BORROW_RATE", default_value_t = 250)]
    borrow_rate: u64,
}

#[derive(Args)]
struct GasArgs {
    /// Gas cost for transfer approval
    #[arg(long, default_value_t = 24_102)]
    approve_gas: u64,
    /// Gas cost for asset swap
    #[arg(long, default_value_t = 181_133)]
    swap_gas: u64,
    /// Gas cost for flash loan
    #[arg(long, default_value_t = 204_493)]
    flash_gas: u64,
    /// Gas cost for creating liquidity position
    #[arg(long, default_value_t = 157_880)]
    create_gas: u64,
    /// Gas cost for adding liquidity
    #[arg(long, default_value_t = 130_682)]
    add_gas: u64,
    /// Gas cost to remove liquidity
    #[arg(long, default_value_t = 161_841)]
    remove_gas: u64,
    /// Gas cost for closing liquidity position
    #[arg(long, default_value_t = 207_111)]
    close_gas: u64,
    /// Gas cost for lending asset
    #[arg(long, default_value_t = 217_479)]
    lend_gas: u64,
    /// Gas cost to claim back loan
    #[arg(long, default_value_t = 333_793)]
    claim_gas: u64,
    /// Gas cost for borrowing asset
    #[arg(long, default_value_t = 295_250)]
    borrow_gas: u64,
    /// Gas cost for increasing debt
    #[arg(long, default_value_t = 271_980)]
    increase_gas: u64,
    /// Gas cost for reducing debt
    #[arg(long, default_value_t = 193_729)]
    decrease_gas: u64,
    /// Gas cost to repay full debt
    #[arg(long, default_value_t = 188_929)]
    repay_gas: u64,
}

impl From<&RateArgs> for RateSchedule {
    fn from(args: &RateArgs) -> Self {
        Self {
            swap_bps: args.swap_rate,
            flash_bps: args.flash_rate,
            lend_bps: args.lend_rate,
            borrow_bps: args.borrow_rate,
        }
    }
}

impl From<&GasArgs> for GasSchedule {
    fn from(args: &GasArgs) -> Self {
        Self {
            approve: args.approve_gas,
            swap: args.swap_gas,
            flash: args.flash_gas,
            create: args.create_gas,
            add: args.add_gas,
            remove: args.remove_gas,
            close: args.close_gas,
            lend: args.lend_gas,
            claim: args.claim_gas,
            borrow: args.borrow_gas,
            increase: args.increase_gas,
            decrease: args.decrease_gas,
            repay: args.repay_gas,
        }
    }
}

fn parse_time(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp `{value}`: {e}"))
}

fn open_feed(path: &Path, window: &Window) -> Result<SnapshotReader<File>> {
    Ok(SnapshotReader::from_path(path)
        .with_context(|| format!("could not open snapshots {}", path.display()))?
        .with_bounds(Some(window.start_time), Some(window.end_time)))
}

fn open_sink(output: Option<&PathBuf>) -> Result<Box<dyn MetricsSink>> {
    Ok(match output {
        None => Box::new(NullSink),
        Some(path) if path.as_os_str() == "-" => {
            Box::new(LineProtocolSink::new(BufWriter::new(io::stdout())))
        }
        Some(path) => Box::new(
            LineProtocolSink::create(path)
                .with_context(|| format!("could not create output {}", path.display()))?,
        ),
    })
}

fn print_summary(summary: &SimulationSummary) {
    println!(
        "Replayed {} snapshots from {} to {} ({:.1} days)",
        summary.snapshots,
        summary.first_timestamp,
        summary.last_timestamp,
        summary.duration_days()
    );
    println!(
        "Price moved from {:.2} to {:.2}",
        summary.entry_price, summary.final_price
    );

    let mut table = Table::new();
    table.add_row(row![
        "Strategy", "Value", "Return %", "Exit value", "Profit", "Fees", "Cost", "Rehedges"
    ]);
    for s in &summary.strategies {
        table.add_row(row![
            s.strategy,
            format!("{:.2}", s.value),
            format!("{:.3}", s.return_pct),
            format!("{:.2}", s.exit_value),
            format!("{:.2}", s.profit),
            format!("{:.2}", s.fees),
            format!("{:.2}", s.cost),
            s.rehedges
        ]);
    }
    table.printstd();

    println!(
        "Rehedges: {} down, {} up",
        summary.rehedges_down, summary.rehedges_up
    );
    if let Some(best) = summary.best() {
        println!("Best after exit: {} ({:.2})", best.strategy, best.exit_value);
    }
}

fn backtest(args: &BacktestArgs) -> Result<()> {
    let config = SimulationConfig::new(args.input_value)
        .with_rehedge_band(args.rehedge_ratio)
        .with_rates(RateSchedule::from(&args.rates))
        .with_gas(GasSchedule::from(&args.gas))
        .with_measurement(args.measurement.as_str())
        .with_chain(args.chain.as_str());

    let station = GasStation::from_path(&args.gas_prices)
        .with_context(|| format!("could not create gas station from {}", args.gas_prices.display()))?;
    if let Some((first, last)) = station.range() {
        info!(days = station.len(), %first, %last, "loaded gas prices");
    }

    let feed = open_feed(&args.snapshots, &args.window)?;
    let mut sink = open_sink(args.output.as_ref())?;

    let mut engine = SimulationEngine::new(config, station, sink.as_mut())?;
    let summary = engine.run(feed).context("backtest aborted")?;

    print_summary(&summary);

    if let Some(path) = &args.summary {
        let file = File::create(path)
            .with_context(|| format!("could not create summary {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)
            .context("could not write summary")?;
        info!(path = %path.display(), "wrote summary");
    }
    Ok(())
}

fn snapshots(path: &Path, window: &Window, limit: usize) -> Result<()> {
    let feed = open_feed(path, window)?;

    let mut table = Table::new();
    table.add_row(row!["Time", "Price", "Reserve0", "Reserve1", "Volume0", "Volume1"]);
    let mut count = 0usize;
    for snapshot in feed {
        let snapshot = snapshot?;
        if count < limit {
            table.add_row(row![
                snapshot.timestamp.format("%Y-%m-%d %H:%M"),
                format!("{:.4}", snapshot.price()?),
                snapshot.reserve0,
                snapshot.reserve1,
                snapshot.volume0,
                snapshot.volume1
            ]);
        }
        count += 1;
    }
    table.printstd();
    println!("{count} snapshots in window");
    Ok(())
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let level = Level::from_str(&cli.log_level)
        .with_context(|| format!("invalid log level `{}`", cli.log_level))?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match &cli.command {
        Commands::Backtest(args) => backtest(args),
        Commands::Snapshots {
            snapshots: path,
            window,
            limit,
        } => snapshots(path, window, *limit),
    }
}
