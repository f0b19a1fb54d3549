use clap::Args;
use serde_json::Value;
use std::time::Instant;

use stat_arb_core::backtest::engine::{self, BacktestInput};
use stat_arb_core::with_metadata;

use super::StrategyArgs;
use crate::input::{self, csv_in};

/// Arguments for a single-pair backtest
#[derive(Args)]
pub struct BacktestArgs {
    /// Path to JSON or YAML input file
    #[arg(long, conflicts_with = "prices")]
    pub input: Option<String>,

    /// Wide price CSV (date column, then one column per asset)
    #[arg(long)]
    pub prices: Option<String>,

    /// Dependent leg column name (default: first asset column)
    #[arg(long, requires = "prices")]
    pub asset1: Option<String>,

    /// Hedge leg column name (default: next asset column)
    #[arg(long, requires = "prices")]
    pub asset2: Option<String>,

    #[command(flatten)]
    pub strategy: StrategyArgs,
}

pub fn run_backtest(args: BacktestArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bt_input: BacktestInput = if let Some(ref path) = args.prices {
        let assets = csv_in::read_price_csv(path)?;
        BacktestInput {
            prices: csv_in::select_pair(assets, args.asset1.as_deref(), args.asset2.as_deref())?,
            params: args.strategy.params(),
        }
    } else {
        input::load(args.input.as_deref(), "backtest")?
    };

    let start = Instant::now();
    let result = engine::run_backtest(&bt_input)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let warnings = result.warnings.clone();
    let output = with_metadata(
        "Rolling OLS of log(asset1) on log(asset2); enter when the residual spread leaves \
         the k x stderr band, exit on mean reversion or after max_hold periods",
        &bt_input.params,
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
