#![cfg(feature = "sweep")]

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use stat_arb_core::backtest::engine::{run_backtest, BacktestInput};
use stat_arb_core::sweep::grid::{parameter_grid, run_sweep, SweepInput};
use stat_arb_core::{AssetSeries, PairPrices, StatArbError};

fn pair(n: usize) -> PairPrices {
    let start = NaiveDate::from_ymd_opt(2020, 1, 6).unwrap();
    let index: Vec<NaiveDate> = (0..n)
        .map(|i| start + chrono::Duration::weeks(i as i64))
        .collect();
    let p2: Vec<Option<Decimal>> = (0..n)
        .map(|i| Some(dec!(25) + Decimal::from(((i * 7) % 13) as i64) + Decimal::from(i as i64) / dec!(4)))
        .collect();
    let tilt = [dec!(1.03), dec!(1.01), dec!(0.98), dec!(0.97), dec!(1.0), dec!(1.02)];
    let p1: Vec<Option<Decimal>> = p2
        .iter()
        .enumerate()
        .map(|(i, p)| p.map(|v| dec!(2.2) * v * tilt[i % tilt.len()]))
        .collect();
    PairPrices {
        asset1: AssetSeries {
            name: "EWA".into(),
            index: index.clone(),
            prices: p1,
        },
        asset2: AssetSeries {
            name: "EWC".into(),
            index,
            prices: p2,
        },
    }
}

fn input() -> SweepInput {
    SweepInput {
        prices: pair(150),
        window_sizes: vec![15, 30, 45],
        threshold_multipliers: vec![dec!(0.75), dec!(1.25)],
        max_holds: vec![4, 12],
        investment: dec!(10000),
    }
}

#[test]
fn test_best_run_reproduces_standalone() {
    let input = input();
    let out = run_sweep(&input).unwrap();
    assert_eq!(out.runs, parameter_grid(&input).len());
    let best = &out.results[0];
    let single = run_backtest(&BacktestInput {
        prices: input.prices.clone(),
        params: best.params,
    })
    .unwrap();
    assert_eq!(best.summary.as_ref().unwrap(), &single.summary);
    for r in &out.results {
        assert!(r.summary.as_ref().unwrap().total_profit <= single.summary.total_profit);
    }
}

#[test]
fn test_misaligned_prices_abort_sweep() {
    let mut input = input();
    input.prices.asset2.index[10] = NaiveDate::from_ymd_opt(1999, 1, 1).unwrap();
    assert!(matches!(
        run_sweep(&input),
        Err(StatArbError::MisalignedInput(_))
    ));
}

#[test]
fn test_sweep_input_from_json() {
    let mut json = serde_json::to_value(input()).unwrap();
    json["window_sizes"] = serde_json::json!([20]);
    let parsed: SweepInput = serde_json::from_value(json).unwrap();
    assert_eq!(parsed.window_sizes, vec![20]);
    let out = run_sweep(&parsed).unwrap();
    assert_eq!(out.runs, 4);
    assert_eq!(out.failed_runs, 0);
}
