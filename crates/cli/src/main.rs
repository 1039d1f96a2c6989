mod logging;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use investment_tracker_core::errors::CoreError;
use investment_tracker_core::models::holding::Holding;
use investment_tracker_core::models::price::to_quotes;
use investment_tracker_core::models::settings::Settings;
use investment_tracker_core::storage::json_file::JsonFileStore;
use investment_tracker_core::storage::memory::InMemoryInvestmentStore;
use investment_tracker_core::InvestmentTracker;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "investment-tracker")]
#[command(about = "Value crypto holdings against live Coinbase spot prices")]
struct Args {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current spot price of each asset
    Prices {
        /// Asset ids, e.g. BTC ETH SOL
        #[arg(required = true)]
        assets: Vec<String>,
    },

    /// Apply holdings for a user and print baseline, valuation and profit
    Value {
        /// User id the holdings belong to
        #[arg(short, long)]
        user: String,

        /// JSON store file, created if missing
        #[arg(short, long, default_value = "investments.json")]
        store: PathBuf,

        /// Holdings as ASSET=QUANTITY, e.g. BTC=0.5
        #[arg(long, num_args = 1..)]
        holdings: Vec<Holding>,

        /// Replace existing holdings instead of adding to them
        #[arg(long)]
        reset: bool,
    },
}

/// Write requested by the `value` command, if any.
#[derive(Debug, PartialEq)]
enum HoldingsChange {
    Merge(Vec<Holding>),
    Reset(Vec<Holding>),
}

impl HoldingsChange {
    /// `--reset` always writes, so `--reset` alone clears the portfolio.
    /// A merge with nothing to add is skipped.
    fn from_args(holdings: Vec<Holding>, reset: bool) -> Option<Self> {
        if reset {
            Some(Self::Reset(holdings))
        } else if holdings.is_empty() {
            None
        } else {
            Some(Self::Merge(holdings))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    logging::init(args.verbose)?;

    let settings = Settings::from_env()?;
    info!(currency = %settings.base_currency, "Starting investment tracker");

    match args.command {
        Command::Prices { assets } => {
            let store = Arc::new(InMemoryInvestmentStore::new());
            let tracker = InvestmentTracker::with_coinbase(store, settings);
            let prices = tracker.quote_assets(&assets).await?;
            for quote in to_quotes(&prices) {
                println!("{:<8} {}", quote.asset_id, quote.price);
            }
        }
        Command::Value {
            user,
            store,
            holdings,
            reset,
        } => {
            let store = Arc::new(JsonFileStore::open(&store).await?);
            let tracker = InvestmentTracker::with_coinbase(store, settings);

            match tracker.get_all_investments(&user).await {
                Ok(_) => {}
                Err(CoreError::NotFound(_)) => {
                    tracker.register_user(&user).await?;
                    info!(%user, "Registered new user");
                }
                Err(e) => return Err(e.into()),
            }

            if let Some(change) = HoldingsChange::from_args(holdings, reset) {
                let baseline = match change {
                    HoldingsChange::Reset(holdings) => {
                        tracker.reset_init_investment(&user, holdings).await?
                    }
                    HoldingsChange::Merge(holdings) => {
                        tracker.update_init_investment(&user, holdings).await?
                    }
                };
                println!("initial investment: {baseline}");
            }

            let valuation = tracker.valuate(&user).await?;
            println!("{}", serde_json::to_string_pretty(&valuation)?);

            let summary = tracker.profit_summary(&user).await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
