use napi::Result as NapiResult;
use napi_derive::napi;
use std::time::Instant;

use stat_arb_core::with_metadata;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn elapsed_us(start: Instant) -> u64 {
    start.elapsed().as_micros() as u64
}

// ---------------------------------------------------------------------------
// Backtest
// ---------------------------------------------------------------------------

#[napi]
pub fn run_backtest(input_json: String) -> NapiResult<String> {
    let input: stat_arb_core::backtest::engine::BacktestInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let start = Instant::now();
    let result = stat_arb_core::backtest::engine::run_backtest(&input).map_err(to_napi_error)?;
    let warnings = result.warnings.clone();
    let output = with_metadata(
        "Rolling OLS hedge ratio on log prices with a k x stderr entry band",
        &input.params,
        warnings,
        elapsed_us(start),
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Screening
// ---------------------------------------------------------------------------

#[napi]
pub fn screen_pairs(input_json: String) -> NapiResult<String> {
    let input: stat_arb_core::screening::cointegration::ScreeningInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let start = Instant::now();
    let result =
        stat_arb_core::screening::cointegration::screen_pairs(&input).map_err(to_napi_error)?;
    let warnings = result
        .skipped
        .iter()
        .map(|s| format!("{}/{} skipped: {}", s.asset1, s.asset2, s.reason))
        .collect();
    let assumptions = serde_json::json!({
        "critical_value": result.critical_value,
        "min_observations": input.min_observations,
    });
    let output = with_metadata(
        "Engle-Granger two-step with a Dickey-Fuller test on the residuals",
        &assumptions,
        warnings,
        elapsed_us(start),
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Parameter sweep
// ---------------------------------------------------------------------------

#[napi]
pub fn run_parameter_sweep(input_json: String) -> NapiResult<String> {
    let input: stat_arb_core::sweep::grid::SweepInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let start = Instant::now();
    let result = stat_arb_core::sweep::grid::run_sweep(&input).map_err(to_napi_error)?;
    let warnings = result
        .results
        .iter()
        .filter_map(|r| r.error.clone())
        .collect();
    let assumptions = serde_json::json!({
        "window_sizes": input.window_sizes,
        "threshold_multipliers": input.threshold_multipliers,
        "max_holds": input.max_holds,
        "investment": input.investment,
    });
    let output = with_metadata(
        "Independent backtests over the cartesian parameter grid, ranked by total profit",
        &assumptions,
        warnings,
        elapsed_us(start),
        result,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}
