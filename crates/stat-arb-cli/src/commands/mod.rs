pub mod backtest;
pub mod screening;
pub mod sweep;

use clap::Args;
use rust_decimal::Decimal;

use stat_arb_core::backtest::engine::BacktestParams;

/// Strategy parameters used when prices come from `--prices`
#[derive(Args, Debug, Clone)]
pub struct StrategyArgs {
    /// Rolling regression window, in rows of the price file
    #[arg(long, default_value_t = 60)]
    pub window_size: usize,

    /// Entry band multiplier applied to the residual standard error
    #[arg(long, default_value = "1.0")]
    pub k: Decimal,

    /// Maximum holding period, in rows
    #[arg(long, default_value_t = 20)]
    pub max_hold: usize,

    /// Capital committed to asset1 at each entry
    #[arg(long, default_value = "10000")]
    pub investment: Decimal,
}

impl StrategyArgs {
    pub fn params(&self) -> BacktestParams {
        BacktestParams {
            window_size: self.window_size,
            threshold_multiplier: self.k,
            max_hold: self.max_hold,
            investment: self.investment,
        }
    }
}
