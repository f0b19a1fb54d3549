//! Parallel parameter sweep over independent backtests.
//!
//! Builds the cartesian product of window sizes, threshold multipliers and
//! holding limits, runs each combination through
//! [`run_backtest`](crate::backtest::engine::run_backtest) on its own
//! rayon task, and returns results in a deterministic order.

use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backtest::engine::{run_backtest, BacktestInput, BacktestParams};
use crate::backtest::performance::TradeSummary;
use crate::error::StatArbError;
use crate::types::{Money, PairPrices};
use crate::StatArbResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for a parameter sweep on one pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepInput {
    pub prices: PairPrices,
    pub window_sizes: Vec<usize>,
    pub threshold_multipliers: Vec<Decimal>,
    pub max_holds: Vec<usize>,
    pub investment: Money,
}

/// One combination's outcome. `summary` is `None` when the run failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub params: BacktestParams,
    pub summary: Option<TradeSummary>,
    pub error: Option<String>,
}

/// Output of a parameter sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    pub runs: usize,
    pub failed_runs: usize,
    /// Best total profit first
    pub results: Vec<SweepResult>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

pub fn parameter_grid(input: &SweepInput) -> Vec<BacktestParams> {
    let mut grid = Vec::with_capacity(
        input.window_sizes.len() * input.threshold_multipliers.len() * input.max_holds.len(),
    );
    for &window_size in &input.window_sizes {
        for &threshold_multiplier in &input.threshold_multipliers {
            for &max_hold in &input.max_holds {
                grid.push(BacktestParams {
                    window_size,
                    threshold_multiplier,
                    max_hold,
                    investment: input.investment,
                });
            }
        }
    }
    grid
}

/// Run every parameter combination as an independent backtest.
pub fn run_sweep(input: &SweepInput) -> StatArbResult<SweepOutput> {
    for (field, empty) in [
        ("window_sizes", input.window_sizes.is_empty()),
        ("threshold_multipliers", input.threshold_multipliers.is_empty()),
        ("max_holds", input.max_holds.is_empty()),
    ] {
        if empty {
            return Err(StatArbError::InvalidInput {
                field: field.into(),
                reason: "Sweep axis must contain at least one value".into(),
            });
        }
    }
    input.prices.validate()?;

    let grid = parameter_grid(input);
    let mut results: Vec<SweepResult> = grid
        .par_iter()
        .map(|params| {
            let run = BacktestInput {
                prices: input.prices.clone(),
                params: *params,
            };
            match run_backtest(&run) {
                Ok(out) => SweepResult {
                    params: *params,
                    summary: Some(out.summary),
                    error: None,
                },
                Err(e) => SweepResult {
                    params: *params,
                    summary: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    results.sort_by(|a, b| {
        let pa = a.summary.as_ref().map(|s| s.total_profit);
        let pb = b.summary.as_ref().map(|s| s.total_profit);
        // Failed runs (None) sort last.
        pb.cmp(&pa)
            .then_with(|| a.params.window_size.cmp(&b.params.window_size))
            .then_with(|| a.params.threshold_multiplier.cmp(&b.params.threshold_multiplier))
            .then_with(|| a.params.max_hold.cmp(&b.params.max_hold))
    });

    let failed_runs = results.iter().filter(|r| r.error.is_some()).count();
    info!(runs = results.len(), failed_runs, "parameter sweep complete");

    Ok(SweepOutput {
        runs: results.len(),
        failed_runs,
        results,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
