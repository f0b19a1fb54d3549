use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stat_arb_core::backtest::accounting::{settle, Fill};
use stat_arb_core::backtest::engine::{run_backtest, BacktestInput, BacktestParams};
use stat_arb_core::backtest::regression::RegressionPoint;
use stat_arb_core::backtest::signal::{
    scan_signals, ExitReason, ScanInputs, ScanParams, ScanOutcome, SpreadSide,
};
use stat_arb_core::{AssetSeries, PairPrices, StatArbError};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn weekly_index(n: usize) -> Vec<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(2015, 1, 5).unwrap();
    (0..n)
        .map(|i| start + chrono::Duration::weeks(i as i64))
        .collect()
}

/// Two related price paths: asset2 drifts with a jagged increment pattern,
/// asset1 tracks 1.8x asset2 with a slow, irregular mean-reverting wobble.
fn related_prices(n: usize) -> (Vec<Option<Decimal>>, Vec<Option<Decimal>>) {
    let steps = [dec!(0.8), dec!(-0.5), dec!(1.1), dec!(-0.9), dec!(0.3), dec!(-0.2), dec!(0.6)];
    let wobble = [
        dec!(0.000), dec!(0.012), dec!(0.025), dec!(0.031), dec!(0.018),
        dec!(0.002), dec!(-0.015), dec!(-0.028), dec!(-0.034), dec!(-0.020),
        dec!(-0.006), dec!(0.009),
    ];
    let mut p2 = dec!(60);
    let mut a1 = Vec::with_capacity(n);
    let mut a2 = Vec::with_capacity(n);
    for i in 0..n {
        p2 += steps[i % steps.len()] + Decimal::from((i % 5) as i64) * dec!(0.05);
        let p1 = dec!(1.8) * p2 * (Decimal::ONE + wobble[(i * 5 / 3) % wobble.len()]);
        a1.push(Some(p1));
        a2.push(Some(p2));
    }
    (a1, a2)
}

fn backtest_input(
    p1: Vec<Option<Decimal>>,
    p2: Vec<Option<Decimal>>,
    params: BacktestParams,
) -> BacktestInput {
    let index = weekly_index(p1.len());
    BacktestInput {
        prices: PairPrices {
            asset1: AssetSeries {
                name: "GLD".into(),
                index: index.clone(),
                prices: p1,
            },
            asset2: AssetSeries {
                name: "GDX".into(),
                index,
                prices: p2,
            },
        },
        params,
    }
}

fn default_params() -> BacktestParams {
    BacktestParams {
        window_size: 20,
        threshold_multiplier: dec!(1.0),
        max_hold: 8,
        investment: dec!(10000),
    }
}

fn scan_with_spread(spread: &[Decimal], k: Decimal, max_hold: usize) -> ScanOutcome {
    let n = spread.len();
    let spread: Vec<Option<Decimal>> = spread.iter().copied().map(Some).collect();
    let regression = vec![
        Some(RegressionPoint {
            alpha: Decimal::ZERO,
            beta: dec!(0.5),
            stderr: Decimal::ONE,
        });
        n
    ];
    let price1 = vec![Some(dec!(100)); n];
    let price2 = vec![Some(dec!(50)); n];
    scan_signals(
        ScanInputs {
            spread: &spread,
            regression: &regression,
            price1: &price1,
            price2: &price2,
        },
        ScanParams {
            threshold_multiplier: k,
            max_hold,
            investment: dec!(1000),
        },
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Properties over a realistic run
// ---------------------------------------------------------------------------

#[test]
fn test_related_pair_produces_trades() {
    let (p1, p2) = related_prices(200);
    let out = run_backtest(&backtest_input(p1, p2, default_params())).unwrap();
    assert!(out.summary.trade_count > 0, "expected at least one trade");
    assert_eq!(out.summary.trade_count, out.trades.len());
}

#[test]
fn test_first_regression_point_at_window_minus_one() {
    let (p1, p2) = related_prices(120);
    for w in [3, 10, 20, 45] {
        let mut params = default_params();
        params.window_size = w;
        let out = run_backtest(&backtest_input(p1.clone(), p2.clone(), params)).unwrap();
        let first = out.regression.iter().position(|r| r.is_some());
        assert_eq!(first, Some(w - 1), "window {}", w);
        assert!(out.regression.iter().flatten().all(|r| r.stderr >= Decimal::ZERO));
    }
}

#[test]
fn test_trades_never_overlap() {
    let (p1, p2) = related_prices(200);
    let out = run_backtest(&backtest_input(p1, p2, default_params())).unwrap();
    for pair in out.trades.windows(2) {
        assert!(pair[0].entry_index < pair[0].exit_index);
        assert!(pair[0].exit_index <= pair[1].entry_index);
    }
}

#[test]
fn test_holding_period_bounded_by_max_hold() {
    let (p1, p2) = related_prices(200);
    for max_hold in [1, 2, 5] {
        let mut params = default_params();
        params.max_hold = max_hold;
        params.threshold_multiplier = dec!(0.5);
        let out = run_backtest(&backtest_input(p1.clone(), p2.clone(), params)).unwrap();
        for t in &out.trades {
            assert!(t.exit_index - t.entry_index <= max_hold);
        }
    }
}

#[test]
fn test_entry_sign_consistency() {
    let (p1, p2) = related_prices(200);
    let params = default_params();
    let out = run_backtest(&backtest_input(p1, p2, params)).unwrap();
    for t in &out.trades {
        let spread = out.spread[t.entry_index].unwrap();
        let band = params.threshold_multiplier * out.regression[t.entry_index].unwrap().stderr;
        match t.side {
            SpreadSide::ShortSpread => assert!(spread > band),
            SpreadSide::LongSpread => assert!(spread < -band),
        }
        assert_eq!(t.hedge_ratio_at_entry, out.regression[t.entry_index].unwrap().beta);
    }
}

#[test]
fn test_cumulative_profit_equals_trade_total() {
    let (p1, p2) = related_prices(200);
    let out = run_backtest(&backtest_input(p1, p2, default_params())).unwrap();
    let total: Decimal = out.trades.iter().map(|t| t.profit).sum();
    assert_eq!(*out.cum_profit.last().unwrap(), total);
    assert_eq!(out.summary.total_profit, total);
}

#[test]
fn test_position_series_matches_trades() {
    let (p1, p2) = related_prices(200);
    let out = run_backtest(&backtest_input(p1, p2, default_params())).unwrap();
    let open: usize = out.positions.iter().filter(|p| **p != 0).count();
    let held: usize = out.trades.iter().map(|t| t.holding_periods).sum();
    assert_eq!(open, held);
    for t in &out.trades {
        let marker = if t.side == SpreadSide::LongSpread { 1 } else { -1 };
        assert!(out.positions[t.entry_index..t.exit_index]
            .iter()
            .all(|p| *p == marker));
    }
}

#[test]
fn test_missing_prices_never_treated_as_zero() {
    let (mut p1, p2) = related_prices(120);
    p1[60] = None;
    let out = run_backtest(&backtest_input(p1, p2, default_params())).unwrap();
    // Every window covering index 60 is undefined.
    assert!(out.regression[60..80].iter().all(|r| r.is_none()));
    assert!(out.spread[60..80].iter().all(|s| s.is_none()));
    assert!(out.benchmark.asset1[60].is_none());
    assert!(out.trades.iter().all(|t| t.entry_index != 60 && t.exit_index != 60));
    assert!(!out.warnings.is_empty());
}

#[test]
fn test_misaligned_indices_abort_before_simulation() {
    let (p1, p2) = related_prices(50);
    let mut input = backtest_input(p1, p2, default_params());
    input.prices.asset2.index.truncate(49);
    input.prices.asset2.prices.truncate(49);
    assert!(matches!(
        run_backtest(&input),
        Err(StatArbError::MisalignedInput(_))
    ));
}

#[test]
fn test_benchmark_starts_at_tested_interval() {
    let (p1, p2) = related_prices(60);
    let base1 = p1[19].unwrap();
    let last1 = p1[59].unwrap();
    let out = run_backtest(&backtest_input(p1, p2, default_params())).unwrap();
    assert_eq!(out.benchmark.first_index, Some(19));
    assert!(out.benchmark.asset1[..19].iter().all(|b| b.is_none()));
    assert_eq!(out.benchmark.asset1[19], Some(Decimal::ZERO));
    let expected = dec!(10000) / base1 * (last1 - base1);
    assert_eq!(out.benchmark.asset1[59], Some(expected));
}

// ---------------------------------------------------------------------------
// Worked examples
// ---------------------------------------------------------------------------

#[test]
fn test_short_entry_exits_on_mean_reversion() {
    let out = scan_with_spread(
        &[dec!(0), dec!(0), dec!(1.5), dec!(1.5), dec!(-0.5), dec!(0), dec!(0)],
        Decimal::ONE,
        10,
    );
    assert_eq!(out.trades.len(), 1);
    let t = &out.trades[0];
    assert_eq!((t.entry_index, t.exit_index), (2, 4));
    assert_eq!(t.side, SpreadSide::ShortSpread);
    assert_eq!(t.exit_reason, ExitReason::MeanReversion);
}

#[test]
fn test_time_stop_closes_trade() {
    let out = scan_with_spread(
        &[dec!(0), dec!(1.2), dec!(0.9), dec!(0.4), dec!(0.7), dec!(0.2), dec!(0.8), dec!(0.3)],
        Decimal::ONE,
        3,
    );
    let t = &out.trades[0];
    assert_eq!(t.entry_index, 1);
    assert_eq!(t.exit_index, 4);
    assert_eq!(t.exit_reason, ExitReason::MaxHold);
}

#[test]
fn test_invalid_exit_price_rescans_from_next_index() {
    let spread: Vec<Option<Decimal>> = [dec!(0), dec!(2), dec!(2), dec!(2), dec!(2), dec!(-1), dec!(0)]
        .into_iter()
        .map(Some)
        .collect();
    let n = spread.len();
    let regression = vec![
        Some(RegressionPoint {
            alpha: Decimal::ZERO,
            beta: dec!(0.5),
            stderr: Decimal::ONE,
        });
        n
    ];
    let mut price1 = vec![Some(dec!(100)); n];
    price1[3] = None;
    let price2 = vec![Some(dec!(50)); n];
    let out = scan_signals(
        ScanInputs {
            spread: &spread,
            regression: &regression,
            price1: &price1,
            price2: &price2,
        },
        ScanParams {
            threshold_multiplier: Decimal::ONE,
            max_hold: 2,
            investment: dec!(1000),
        },
    )
    .unwrap();
    // Entry at 1 exits at 3 (missing price) and is dropped; the rescan
    // starts at 2, not at the abandoned exit.
    assert_eq!(out.discarded.len(), 1);
    assert_eq!(out.discarded[0].entry_index, 1);
    let spans: Vec<(usize, usize)> = out
        .trades
        .iter()
        .map(|t| (t.entry_index, t.exit_index))
        .collect();
    assert_eq!(spans, vec![(2, 4)]);
}

#[test]
fn test_identical_legs_have_zero_spread() {
    let (_, p2) = related_prices(80);
    let out = run_backtest(&backtest_input(p2.clone(), p2, default_params())).unwrap();
    for r in out.regression.iter().flatten() {
        assert_eq!(r.beta, Decimal::ONE);
        assert_eq!(r.alpha, Decimal::ZERO);
    }
    assert!(out.spread.iter().flatten().all(|s| s.is_zero()));
    assert!(out.trades.is_empty());
}

#[test]
fn test_settlement_arithmetic() {
    let entry = Fill {
        index: 0,
        price1: Some(dec!(100)),
        price2: Some(dec!(50)),
    };
    let exit = Fill {
        index: 1,
        price1: Some(dec!(90)),
        price2: Some(dec!(55)),
    };
    let s = settle(SpreadSide::ShortSpread, dec!(0.5), &entry, &exit, dec!(1000)).unwrap();
    assert_eq!(s.shares1, dec!(10));
    assert_eq!(s.leg1_pnl, dec!(100));
    assert_eq!(s.shares2, dec!(10));
    assert_eq!(s.leg2_pnl, dec!(50));
    assert_eq!(s.profit, dec!(150));
}

#[test]
fn test_threshold_exactly_at_band_does_not_enter() {
    let out = scan_with_spread(&[dec!(1), dec!(0), dec!(-1), dec!(0)], Decimal::ONE, 5);
    assert!(out.trades.is_empty());
}
