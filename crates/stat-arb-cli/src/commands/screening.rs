use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::time::Instant;

use stat_arb_core::screening::cointegration::{self, ScreeningInput};
use stat_arb_core::with_metadata;

use crate::input::{self, csv_in};

/// Arguments for cointegration screening of a basket
#[derive(Args)]
pub struct ScreenArgs {
    /// Path to JSON or YAML input file
    #[arg(long, conflicts_with = "prices")]
    pub input: Option<String>,

    /// Wide price CSV; every asset column enters the basket
    #[arg(long)]
    pub prices: Option<String>,

    /// Dickey-Fuller t-statistic threshold
    #[arg(long, allow_hyphen_values = true)]
    pub critical_value: Option<Decimal>,

    /// Minimum overlapping observations per pair
    #[arg(long)]
    pub min_observations: Option<usize>,
}

pub fn run_screen(args: ScreenArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut screen_input: ScreeningInput = if let Some(ref path) = args.prices {
        ScreeningInput {
            assets: csv_in::read_price_csv(path)?,
            critical_value: None,
            min_observations: None,
        }
    } else {
        input::load(args.input.as_deref(), "pair screening")?
    };
    // Flags override file values.
    if args.critical_value.is_some() {
        screen_input.critical_value = args.critical_value;
    }
    if args.min_observations.is_some() {
        screen_input.min_observations = args.min_observations;
    }

    let start = Instant::now();
    let result = cointegration::screen_pairs(&screen_input)?;
    let elapsed = start.elapsed().as_micros() as u64;

    let warnings: Vec<String> = result
        .skipped
        .iter()
        .map(|s| format!("{}/{} skipped: {}", s.asset1, s.asset2, s.reason))
        .collect();
    let assumptions = json!({
        "assets": screen_input.assets.iter().map(|a| a.name.as_str()).collect::<Vec<_>>(),
        "critical_value": result.critical_value,
        "min_observations": screen_input.min_observations,
    });
    let output = with_metadata(
        "Engle-Granger two-step: OLS of log prices, Dickey-Fuller t-statistic on the residuals",
        &assumptions,
        warnings,
        elapsed,
        result,
    );
    Ok(serde_json::to_value(output)?)
}
