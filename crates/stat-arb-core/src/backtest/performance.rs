use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::signal::{SpreadSide, Trade};
use crate::types::{Money, Price, Rate};

/// Aggregate statistics over realized trades.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSummary {
    /// Trades emitted by the scanner
    pub trade_count: usize,
    pub long_trades: usize,
    pub short_trades: usize,
    /// Trades with profit > 0
    pub winning_trades: usize,
    /// Trades with profit < 0
    pub losing_trades: usize,
    pub total_profit: Money,
    /// Mean of non-zero profits
    pub mean_profit: Option<Money>,
    /// Sample standard deviation of non-zero profits
    pub std_profit: Option<Money>,
    pub min_profit: Option<Money>,
    pub max_profit: Option<Money>,
    /// Fraction of non-zero profits that are positive
    pub win_rate: Option<Rate>,
    pub mean_holding_periods: Option<Decimal>,
    /// Largest peak-to-trough fall of cumulative profit
    pub max_drawdown: Money,
}

/// Buy-and-hold P&L of each leg from the start of the tested interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkSeries {
    pub first_index: Option<usize>,
    pub asset1: Vec<Option<Money>>,
    pub asset2: Vec<Option<Money>>,
}

/// Profit booked at each trade's exit index.
pub fn realized_profit(trades: &[Trade], len: usize) -> Vec<Money> {
    let mut booked = vec![Decimal::ZERO; len];
    for trade in trades {
        if let Some(slot) = booked.get_mut(trade.exit_index) {
            *slot += trade.profit;
        }
    }
    booked
}

/// Running sum of a per-period profit series.
pub fn cumulative(values: &[Money]) -> Vec<Money> {
    values
        .iter()
        .scan(Decimal::ZERO, |acc, v| {
            *acc += *v;
            Some(*acc)
        })
        .collect()
}

/// Buy-and-hold P&L of `investment` placed at `prices[first_index]`.
/// Values outside the decimal range are left undefined.
pub fn buy_and_hold(prices: &[Price], first_index: Option<usize>, investment: Money) -> Vec<Option<Money>> {
    let mut out = vec![None; prices.len()];
    let Some(first) = first_index else {
        return out;
    };
    let base = match prices.get(first).copied().flatten() {
        Some(p) if p > Decimal::ZERO => p,
        _ => return out,
    };
    let Some(shares) = investment.checked_div(base) else {
        return out;
    };
    for (slot, price) in out.iter_mut().zip(prices.iter()).skip(first) {
        *slot = price.and_then(|p| shares.checked_mul(p - base));
    }
    out
}

pub fn benchmarks(
    price1: &[Price],
    price2: &[Price],
    first_index: Option<usize>,
    investment: Money,
) -> BenchmarkSeries {
    BenchmarkSeries {
        first_index,
        asset1: buy_and_hold(price1, first_index, investment),
        asset2: buy_and_hold(price2, first_index, investment),
    }
}

fn max_drawdown(cum_profit: &[Money]) -> Money {
    let mut peak = Decimal::ZERO;
    let mut worst = Decimal::ZERO;
    for value in cum_profit {
        if *value > peak {
            peak = *value;
        }
        let dd = peak - *value;
        if dd > worst {
            worst = dd;
        }
    }
    worst
}

pub fn summarize(trades: &[Trade], cum_profit: &[Money]) -> TradeSummary {
    let profits: Vec<Money> = trades
        .iter()
        .map(|t| t.profit)
        .filter(|p| !p.is_zero())
        .collect();

    let total_profit: Money = trades.iter().map(|t| t.profit).sum();
    let winning_trades = trades.iter().filter(|t| t.profit > Decimal::ZERO).count();
    let losing_trades = trades.iter().filter(|t| t.profit < Decimal::ZERO).count();
    let long_trades = trades
        .iter()
        .filter(|t| t.side == SpreadSide::LongSpread)
        .count();

    let n = profits.len();
    let n_dec = Decimal::from(n as i64);
    let mean_profit = (n > 0).then(|| profits.iter().copied().sum::<Decimal>() / n_dec);
    let std_profit = mean_profit.filter(|_| n > 1).map(|mean| {
        let var = profits
            .iter()
            .map(|p| {
                let d = *p - mean;
                d * d
            })
            .sum::<Decimal>()
            / (n_dec - Decimal::ONE);
        var.sqrt().unwrap_or(Decimal::ZERO)
    });
    let win_rate = (n > 0).then(|| {
        let wins = profits.iter().filter(|p| **p > Decimal::ZERO).count();
        Decimal::from(wins as i64) / n_dec
    });
    let mean_holding_periods = (!trades.is_empty()).then(|| {
        let held: usize = trades.iter().map(|t| t.holding_periods).sum();
        Decimal::from(held as i64) / Decimal::from(trades.len() as i64)
    });

    TradeSummary {
        trade_count: trades.len(),
        long_trades,
        short_trades: trades.len() - long_trades,
        winning_trades,
        losing_trades,
        total_profit,
        mean_profit,
        std_profit,
        min_profit: profits.iter().copied().min(),
        max_profit: profits.iter().copied().max(),
        win_rate,
        mean_holding_periods,
        max_drawdown: max_drawdown(cum_profit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backtest::signal::ExitReason;
    use rust_decimal_macros::dec;

    fn trade(entry: usize, exit: usize, side: SpreadSide, profit: Decimal) -> Trade {
        Trade {
            entry_index: entry,
            exit_index: exit,
            side,
            hedge_ratio_at_entry: Decimal::ONE,
            entry_spread: dec!(2),
            exit_spread: Some(Decimal::ZERO),
            holding_periods: exit - entry,
            exit_reason: ExitReason::MeanReversion,
            shares1: Decimal::ONE,
            shares2: Decimal::ONE,
            leg1_pnl: profit,
            leg2_pnl: Decimal::ZERO,
            profit,
        }
    }

    #[test]
    fn test_cumulative_profit_ends_at_total() {
        let trades = vec![
            trade(1, 3, SpreadSide::ShortSpread, dec!(10)),
            trade(4, 6, SpreadSide::LongSpread, dec!(-4)),
            trade(7, 9, SpreadSide::ShortSpread, dec!(7.5)),
        ];
        let cum = cumulative(&realized_profit(&trades, 10));
        assert_eq!(cum[2], Decimal::ZERO);
        assert_eq!(cum[3], dec!(10));
        assert_eq!(cum[6], dec!(6));
        assert_eq!(cum[9], dec!(13.5));
    }

    #[test]
    fn test_summary_ignores_zero_profits() {
        let trades = vec![
            trade(0, 1, SpreadSide::ShortSpread, dec!(10)),
            trade(1, 2, SpreadSide::LongSpread, Decimal::ZERO),
            trade(2, 3, SpreadSide::LongSpread, dec!(-5)),
            trade(3, 5, SpreadSide::ShortSpread, dec!(25)),
        ];
        let cum = cumulative(&realized_profit(&trades, 6));
        let s = summarize(&trades, &cum);
        assert_eq!(s.trade_count, 4);
        assert_eq!(s.long_trades, 2);
        assert_eq!(s.short_trades, 2);
        assert_eq!(s.total_profit, dec!(30));
        assert_eq!(s.mean_profit, Some(dec!(10)));
        assert_eq!(s.min_profit, Some(dec!(-5)));
        assert_eq!(s.max_profit, Some(dec!(25)));
        // 2 of 3 non-zero profits are wins
        let wr = s.win_rate.unwrap();
        assert!((wr - dec!(0.6666666667)).abs() < dec!(0.0000001));
        // deviations 0, -15, 15 -> var 225
        assert!((s.std_profit.unwrap() - dec!(15)).abs() < dec!(0.0000001));
        assert_eq!(s.max_drawdown, dec!(5));
        assert_eq!(s.mean_holding_periods, Some(dec!(1.25)));
    }

    #[test]
    fn test_summary_of_no_trades() {
        let s = summarize(&[], &[Decimal::ZERO; 3]);
        assert_eq!(s.trade_count, 0);
        assert!(s.mean_profit.is_none());
        assert!(s.std_profit.is_none());
        assert!(s.win_rate.is_none());
        assert_eq!(s.max_drawdown, Decimal::ZERO);
    }

    #[test]
    fn test_single_profit_has_no_std() {
        let trades = vec![trade(0, 1, SpreadSide::ShortSpread, dec!(3))];
        let s = summarize(&trades, &[Decimal::ZERO, dec!(3)]);
        assert_eq!(s.mean_profit, Some(dec!(3)));
        assert!(s.std_profit.is_none());
        assert_eq!(s.win_rate, Some(Decimal::ONE));
    }

    #[test]
    fn test_buy_and_hold_from_first_index() {
        let prices = vec![None, Some(dec!(50)), Some(dec!(55)), None, Some(dec!(40))];
        let bh = buy_and_hold(&prices, Some(1), dec!(1000));
        assert_eq!(
            bh,
            vec![None, Some(Decimal::ZERO), Some(dec!(100)), None, Some(dec!(-200))]
        );
    }

    #[test]
    fn test_buy_and_hold_overflow_is_undefined() {
        let tiny = vec![Some(Decimal::new(1, 22)), Some(Decimal::new(2, 22))];
        assert_eq!(buy_and_hold(&tiny, Some(0), dec!(10000000)), vec![None, None]);

        // Base fits, but the P&L on a huge move does not.
        let jump = vec![Some(dec!(0.0001)), Some(Decimal::MAX)];
        assert_eq!(buy_and_hold(&jump, Some(0), dec!(10000))[1], None);
    }

    #[test]
    fn test_buy_and_hold_undefined_base() {
        let prices = vec![Some(dec!(10)), None, Some(dec!(12))];
        assert!(buy_and_hold(&prices, Some(1), dec!(100)).iter().all(|v| v.is_none()));
        assert!(buy_and_hold(&prices, None, dec!(100)).iter().all(|v| v.is_none()));
    }
}
