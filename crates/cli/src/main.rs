mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use stampbot_brokers_bitstamp::{BitstampApi, Credentials};
use stampbot_core::{Exchange, SourceId};
use stampbot_engine::{EventBus, PriceLogger, PricePoller, StopReason, Supervisor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "stampbot")]
#[command(about = "Bitstamp trading process: signed REST calls and a supervised price poller")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// TOML settings file with [bitstamp] and [engine] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON file with CLIENT_ID, API_KEY and API_SECRET
    #[arg(long, env = "STAMPBOT_CREDENTIALS", default_value = "../credentials.json")]
    credentials: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the supervised price poller
    Run,

    /// Print the order book (no credentials needed)
    OrderBook,

    /// Print the ticker (no credentials needed)
    Ticker,

    /// Print account balances
    Balance,

    /// Print open orders
    OpenOrders,

    /// Print the account's transactions
    Transactions,

    /// Place a limit buy
    Buy {
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        price: Decimal,
    },

    /// Place a limit sell
    Sell {
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        price: Decimal,
    },

    /// Cancel an order
    Cancel {
        /// Exchange order id
        #[arg(long)]
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run => run(config, &cli.credentials).await?,
        Commands::OrderBook => {
            let api = BitstampApi::public(&config.bitstamp)?;
            print_json(&api.order_book().await?)?;
        }
        Commands::Ticker => {
            let api = BitstampApi::public(&config.bitstamp)?;
            print_json(&api.ticker().await?)?;
        }
        Commands::Balance => {
            let api = private_api(&config, &cli.credentials)?;
            print_json(&api.account_balance().await?)?;
        }
        Commands::OpenOrders => {
            let api = private_api(&config, &cli.credentials)?;
            print_json(&api.open_orders().await?)?;
        }
        Commands::Transactions => {
            let api = private_api(&config, &cli.credentials)?;
            print_json(&api.last_transactions().await?)?;
        }
        Commands::Buy { amount, price } => {
            let api = private_api(&config, &cli.credentials)?;
            print_json(&api.buy_limit_order(amount, price).await?)?;
        }
        Commands::Sell { amount, price } => {
            let api = private_api(&config, &cli.credentials)?;
            print_json(&api.sell_limit_order(amount, price).await?)?;
        }
        Commands::Cancel { id } => {
            let api = private_api(&config, &cli.credentials)?;
            print_json(&api.cancel_order(&id).await?)?;
        }
    }

    Ok(())
}

fn private_api(config: &AppConfig, credentials: &Path) -> Result<BitstampApi> {
    let credentials = Credentials::from_file(credentials)?;
    Ok(BitstampApi::new(&config.bitstamp, credentials)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(config: AppConfig, credentials: &Path) -> Result<()> {
    tracing::info!(
        pair = %config.bitstamp.currency_pair,
        poll_ms = config.engine.poll_interval_ms,
        "Starting trading process"
    );

    let api = Arc::new(private_api(&config, credentials).context("Cannot start without credentials")?);
    let bus = Arc::new(EventBus::new());
    let poller = PricePoller::new(
        SourceId::Bitstamp,
        api.clone(),
        bus,
        api.currency_pair(),
        &config.engine,
    );
    poller.register_observer(Arc::new(PriceLogger::new())).await;

    let mut supervisor = Supervisor::new(config.engine.liveness_check_interval());
    supervisor.add_worker(Box::new(poller));

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl+C, only a worker failure will stop the process");
            std::future::pending::<()>().await;
        }
    };

    match supervisor.run(interrupt).await {
        StopReason::Interrupted => {
            tracing::info!("All workers stopped, exiting");
            Ok(())
        }
        StopReason::WorkerDied(failure) => {
            tracing::error!(worker = %failure.worker, reason = %failure.reason, "Program will exit");
            Err(failure.into())
        }
    }
}
