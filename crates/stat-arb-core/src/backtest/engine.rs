use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::performance::{self, BenchmarkSeries, TradeSummary};
use super::regression::{self, RegressionPoint, MIN_WINDOW};
use super::signal::{self, DiscardedCandidate, ScanInputs, ScanParams, Trade};
use super::spread;
use crate::error::StatArbError;
use crate::types::{Money, PairPrices};
use crate::StatArbResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Strategy parameters for one backtest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacktestParams {
    /// Rolling regression look-back, in simulation periods
    pub window_size: usize,
    /// Entry band multiplier `k` applied to the residual standard error
    pub threshold_multiplier: Decimal,
    /// Time stop in periods
    pub max_hold: usize,
    /// Capital committed to asset1 at each entry
    pub investment: Money,
}

impl BacktestParams {
    pub fn validate(&self) -> StatArbResult<()> {
        if self.window_size < MIN_WINDOW {
            return Err(StatArbError::InvalidInput {
                field: "window_size".into(),
                reason: format!(
                    "Window size must be at least {} to leave a residual degree of freedom",
                    MIN_WINDOW
                ),
            });
        }
        self.scan_params().validate()
    }

    fn scan_params(&self) -> ScanParams {
        ScanParams {
            threshold_multiplier: self.threshold_multiplier,
            max_hold: self.max_hold,
            investment: self.investment,
        }
    }
}

/// Input for a single-pair backtest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestInput {
    pub prices: PairPrices,
    #[serde(flatten)]
    pub params: BacktestParams,
}

/// Output of a single-pair backtest. Every series is index-aligned with
/// the input prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestOutput {
    pub asset1: String,
    pub asset2: String,
    pub index: Vec<NaiveDate>,
    pub regression: Vec<Option<RegressionPoint>>,
    pub spread: Vec<Option<Decimal>>,
    pub trades: Vec<Trade>,
    pub discarded: Vec<DiscardedCandidate>,
    /// +1 long spread, -1 short spread, 0 flat
    pub positions: Vec<i8>,
    pub realized_profit: Vec<Money>,
    pub cum_profit: Vec<Money>,
    pub summary: TradeSummary,
    pub benchmark: BenchmarkSeries,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Backtest the rolling-hedge-ratio spread strategy on one pair.
///
/// Pure function of its input. Only structural problems (misaligned
/// indices, invalid parameters) are errors; gaps and singular windows
/// degrade to "no signal" and are reported in `warnings`.
pub fn run_backtest(input: &BacktestInput) -> StatArbResult<BacktestOutput> {
    input.params.validate()?;
    let n = input.prices.validate()?;

    let a1 = &input.prices.asset1;
    let a2 = &input.prices.asset2;
    let params = &input.params;
    let mut warnings: Vec<String> = Vec::new();

    if n < params.window_size {
        warnings.push(
            StatArbError::InsufficientData(format!(
                "{} observations is fewer than the {}-period window; no regression points",
                n, params.window_size
            ))
            .to_string(),
        );
    }

    // ------------------------------------------------------------------
    // 1. Rolling hedge ratio on log prices
    // ------------------------------------------------------------------
    let log1 = regression::log_prices(&a1.prices);
    let log2 = regression::log_prices(&a2.prices);
    let regression = regression::rolling_regression(&log1, &log2, params.window_size)?;

    let fitted = regression.iter().filter(|r| r.is_some()).count();
    let eligible = n.saturating_sub(params.window_size - 1);
    if eligible > 0 && fitted < eligible {
        warnings.push(format!(
            "{} of {} regression windows undefined (missing prices or zero variance in {})",
            eligible - fitted,
            eligible,
            a2.name
        ));
    }

    // ------------------------------------------------------------------
    // 2. Spread
    // ------------------------------------------------------------------
    let spread = spread::build_spread(&log1, &log2, &regression);

    // ------------------------------------------------------------------
    // 3. Signal scan + settlement
    // ------------------------------------------------------------------
    let outcome = signal::scan_signals(
        ScanInputs {
            spread: &spread,
            regression: &regression,
            price1: &a1.prices,
            price2: &a2.prices,
        },
        params.scan_params(),
    )?;
    if !outcome.discarded.is_empty() {
        warnings.push(format!(
            "{} candidate trades discarded (exit beyond data or invalid price)",
            outcome.discarded.len()
        ));
    }

    // ------------------------------------------------------------------
    // 4. Positions, P&L series, summary, benchmarks
    // ------------------------------------------------------------------
    let positions = signal::position_series(&outcome.trades, n);
    let realized_profit = performance::realized_profit(&outcome.trades, n);
    let cum_profit = performance::cumulative(&realized_profit);
    let summary = performance::summarize(&outcome.trades, &cum_profit);

    let first_index = spread.iter().position(|s| s.is_some());
    let benchmark =
        performance::benchmarks(&a1.prices, &a2.prices, first_index, params.investment);

    info!(
        pair = %format!("{}/{}", a1.name, a2.name),
        observations = n,
        trades = summary.trade_count,
        total_profit = %summary.total_profit,
        "backtest complete"
    );

    Ok(BacktestOutput {
        asset1: a1.name.clone(),
        asset2: a2.name.clone(),
        index: a1.index.clone(),
        regression,
        spread,
        trades: outcome.trades,
        discarded: outcome.discarded,
        positions,
        realized_profit,
        cum_profit,
        summary,
        benchmark,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
