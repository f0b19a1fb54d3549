use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Instant;

use stat_arb_core::sweep::grid::{self, SweepInput};
use stat_arb_core::with_metadata;

use crate::input::{self, csv_in};

/// Arguments for a parallel parameter sweep
#[derive(Args)]
pub struct SweepArgs {
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

    /// Comma-separated regression windows
    #[arg(long, value_delimiter = ',', default_value = "20,40,60")]
    pub window_sizes: Vec<usize>,

    /// Comma-separated entry band multipliers
    #[arg(long, value_delimiter = ',', default_value = "0.5,1.0,1.5,2.0")]
    pub ks: Vec<Decimal>,

    /// Comma-separated holding limits
    #[arg(long, value_delimiter = ',', default_value = "10,20")]
    pub max_holds: Vec<usize>,

    /// Capital committed to asset1 at each entry
    #[arg(long, default_value = "10000")]
    pub investment: Decimal,
}

pub fn run_sweep(args: SweepArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep_input: SweepInput = if let Some(ref path) = args.prices {
        let assets = csv_in::read_price_csv(path)?;
        SweepInput {
            prices: csv_in::select_pair(assets, args.asset1.as_deref(), args.asset2.as_deref())?,
            window_sizes: args.window_sizes,
            threshold_multipliers: args.ks,
            max_holds: args.max_holds,
            investment: args.investment,
        }
    } else {
        input::load(args.input.as_deref(), "parameter sweep")?
    };

    let start = Instant::now();
    let result = grid::run_sweep(&sweep_input)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let warnings: Vec<String> = result
        .results
        .iter()
        .filter_map(|r| {
            r.error.as_ref().map(|e| {
                format!(
                    "window={} k={} max_hold={}: {}",
                    r.params.window_size, r.params.threshold_multiplier, r.params.max_hold, e
                )
            })
        })
        .collect();
    let assumptions = json!({
        "pair": [&sweep_input.prices.asset1.name, &sweep_input.prices.asset2.name],
        "window_sizes": sweep_input.window_sizes,
        "threshold_multipliers": sweep_input.threshold_multipliers,
        "max_holds": sweep_input.max_holds,
        "investment": sweep_input.investment,
    });
    let output = with_metadata(
        "Independent backtests over the cartesian parameter grid, ranked by total profit",
        &assumptions,
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
