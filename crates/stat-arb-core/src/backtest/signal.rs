use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::accounting::{self, Fill};
use super::regression::RegressionPoint;
use crate::error::StatArbError;
use crate::types::{Money, Price};
use crate::StatArbResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Direction of a spread position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpreadSide {
    /// Spread below `-k * stderr`: long asset1, short asset2
    LongSpread,
    /// Spread above `k * stderr`: short asset1, long asset2
    ShortSpread,
}

impl SpreadSide {
    /// Sign of the spread deviation that opens this side.
    pub fn deviation_sign(self) -> Decimal {
        match self {
            SpreadSide::ShortSpread => Decimal::ONE,
            SpreadSide::LongSpread => Decimal::NEGATIVE_ONE,
        }
    }

    /// Position marker: +1 long spread, -1 short spread.
    pub fn position(self) -> Decimal {
        -self.deviation_sign()
    }

    pub fn marker(self) -> i8 {
        match self {
            SpreadSide::LongSpread => 1,
            SpreadSide::ShortSpread => -1,
        }
    }

    /// The side whose entry rule fires for this spread, if any.
    /// Strict inequality: a spread exactly at the band never enters.
    fn entered_by(spread: Decimal, band: Decimal) -> Option<Self> {
        [SpreadSide::ShortSpread, SpreadSide::LongSpread]
            .into_iter()
            .find(|side| side.deviation_sign() * spread > band)
    }

    /// Whether the spread is still on the entry side of zero.
    fn still_deviated(self, spread: Option<Decimal>) -> bool {
        spread.is_some_and(|s| self.deviation_sign() * s > Decimal::ZERO)
    }
}

/// Why an open trade was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    /// Spread reached zero or crossed it
    MeanReversion,
    /// Holding period exhausted
    MaxHold,
    /// Spread became undefined while the trade was open
    SignalLost,
}

/// A closed, settled spread trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_index: usize,
    pub exit_index: usize,
    pub side: SpreadSide,
    /// Regression slope at the entry index
    pub hedge_ratio_at_entry: Decimal,
    pub entry_spread: Decimal,
    pub exit_spread: Option<Decimal>,
    pub holding_periods: usize,
    pub exit_reason: ExitReason,
    pub shares1: Decimal,
    pub shares2: Decimal,
    pub leg1_pnl: Money,
    pub leg2_pnl: Money,
    pub profit: Money,
}

/// Why a detected entry did not become a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiscardReason {
    /// Exit search ran past the last observation
    ExitOutOfRange,
    /// A leg price at entry or exit was missing or non-positive
    InvalidPrice,
}

/// A candidate entry rejected by the validity check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedCandidate {
    pub entry_index: usize,
    pub exit_index: Option<usize>,
    pub side: SpreadSide,
    pub reason: DiscardReason,
    pub detail: String,
}

/// Entry band multiplier and time stop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScanParams {
    /// `k`: enter when |spread| exceeds `k * stderr`
    pub threshold_multiplier: Decimal,
    /// Maximum periods a trade may stay open
    pub max_hold: usize,
    /// Capital committed to asset1 at each entry
    pub investment: Money,
}

impl ScanParams {
    /// Reject non-positive `k` or investment and a zero time stop.
    pub fn validate(&self) -> StatArbResult<()> {
        if self.threshold_multiplier <= Decimal::ZERO {
            return Err(StatArbError::InvalidInput {
                field: "threshold_multiplier".into(),
                reason: "Threshold multiplier k must be positive".into(),
            });
        }
        if self.max_hold == 0 {
            return Err(StatArbError::InvalidInput {
                field: "max_hold".into(),
                reason: "Maximum holding period must be at least 1".into(),
            });
        }
        if self.investment <= Decimal::ZERO {
            return Err(StatArbError::InvalidInput {
                field: "investment".into(),
                reason: "Investment must be positive".into(),
            });
        }
        Ok(())
    }
}

/// Series the scanner reads, all index-aligned.
#[derive(Debug, Clone, Copy)]
pub struct ScanInputs<'a> {
    pub spread: &'a [Option<Decimal>],
    pub regression: &'a [Option<RegressionPoint>],
    pub price1: &'a [Price],
    pub price2: &'a [Price],
}

/// Everything a scan produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub trades: Vec<Trade>,
    pub discarded: Vec<DiscardedCandidate>,
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    InTrade {
        side: SpreadSide,
        entry_index: usize,
        entry_spread: Decimal,
        hedge_ratio: Decimal,
    },
}

struct SignalScanner<'a> {
    inputs: ScanInputs<'a>,
    params: ScanParams,
    state: ScanState,
    cursor: usize,
    outcome: ScanOutcome,
}

impl<'a> SignalScanner<'a> {
    fn new(inputs: ScanInputs<'a>, params: ScanParams) -> Self {
        SignalScanner {
            inputs,
            params,
            state: ScanState::Scanning,
            cursor: 0,
            outcome: ScanOutcome::default(),
        }
    }

    fn len(&self) -> usize {
        self.inputs.spread.len()
    }

    fn run(mut self) -> ScanOutcome {
        while self.cursor < self.len() {
            self.state = match self.state {
                ScanState::Scanning => self.look_for_entry(),
                ScanState::InTrade {
                    side,
                    entry_index,
                    entry_spread,
                    hedge_ratio,
                } => self.close(side, entry_index, entry_spread, hedge_ratio),
            };
        }
        self.outcome
    }

    fn look_for_entry(&mut self) -> ScanState {
        let i = self.cursor;
        let spread = self.inputs.spread[i];
        let reg = self.inputs.regression.get(i).copied().flatten();
        if let (Some(s), Some(r)) = (spread, reg) {
            let band = self.params.threshold_multiplier * r.stderr;
            if let Some(side) = SpreadSide::entered_by(s, band) {
                return ScanState::InTrade {
                    side,
                    entry_index: i,
                    entry_spread: s,
                    hedge_ratio: r.beta,
                };
            }
        }
        self.cursor += 1;
        ScanState::Scanning
    }

    /// First index after `entry` where the spread is no longer deviated,
    /// the holding period runs out, or the data ends (returns `len`).
    fn find_exit(&self, side: SpreadSide, entry: usize) -> usize {
        let mut exit = entry + 1;
        while exit < self.len()
            && side.still_deviated(self.inputs.spread[exit])
            && exit - entry < self.params.max_hold
        {
            exit += 1;
        }
        exit
    }

    fn close(
        &mut self,
        side: SpreadSide,
        entry_index: usize,
        entry_spread: Decimal,
        hedge_ratio: Decimal,
    ) -> ScanState {
        let exit_index = self.find_exit(side, entry_index);
        match self.settle(side, entry_index, exit_index, entry_spread, hedge_ratio) {
            Ok(trade) => {
                trace!(
                    entry = trade.entry_index,
                    exit = trade.exit_index,
                    side = ?trade.side,
                    profit = %trade.profit,
                    "trade closed"
                );
                self.outcome.trades.push(trade);
                self.cursor = exit_index + 1;
            }
            Err(discarded) => {
                debug!(
                    entry = discarded.entry_index,
                    exit = ?discarded.exit_index,
                    reason = ?discarded.reason,
                    "{}",
                    discarded.detail
                );
                self.outcome.discarded.push(discarded);
                self.cursor = entry_index + 1;
            }
        }
        ScanState::Scanning
    }

    fn settle(
        &self,
        side: SpreadSide,
        entry_index: usize,
        exit_index: usize,
        entry_spread: Decimal,
        hedge_ratio: Decimal,
    ) -> Result<Trade, DiscardedCandidate> {
        let discard = |exit: Option<usize>, reason: DiscardReason, detail: String| {
            DiscardedCandidate {
                entry_index,
                exit_index: exit,
                side,
                reason,
                detail,
            }
        };

        if exit_index >= self.len() {
            return Err(discard(
                None,
                DiscardReason::ExitOutOfRange,
                format!("no exit before end of data for entry at {entry_index}"),
            ));
        }

        let exit_spread = self.inputs.spread[exit_index];

        let entry = Fill::at(entry_index, self.inputs.price1, self.inputs.price2);
        let exit = Fill::at(exit_index, self.inputs.price1, self.inputs.price2);
        let settlement =
            accounting::settle(side, hedge_ratio, &entry, &exit, self.params.investment)
                .map_err(|e| discard(Some(exit_index), DiscardReason::InvalidPrice, e.to_string()))?;

        let exit_reason = match exit_spread {
            None => ExitReason::SignalLost,
            Some(_) if !side.still_deviated(exit_spread) => ExitReason::MeanReversion,
            Some(_) => ExitReason::MaxHold,
        };

        Ok(Trade {
            entry_index,
            exit_index,
            side,
            hedge_ratio_at_entry: hedge_ratio,
            entry_spread,
            exit_spread,
            holding_periods: exit_index - entry_index,
            exit_reason,
            shares1: settlement.shares1,
            shares2: settlement.shares2,
            leg1_pnl: settlement.leg1_pnl,
            leg2_pnl: settlement.leg2_pnl,
            profit: settlement.profit,
        })
    }
}

/// Convert the spread into non-overlapping, time-ordered trades.
///
/// Scanning resumes strictly after each trade's exit. A candidate that
/// fails the validity check is recorded in `discarded` and scanning resumes
/// at the index after its entry.
pub fn scan_signals(inputs: ScanInputs<'_>, params: ScanParams) -> StatArbResult<ScanOutcome> {
    params.validate()?;
    let n = inputs.spread.len();
    if inputs.regression.len() != n || inputs.price1.len() != n || inputs.price2.len() != n {
        return Err(StatArbError::MisalignedInput(format!(
            "scanner inputs differ in length: spread {}, regression {}, price1 {}, price2 {}",
            n,
            inputs.regression.len(),
            inputs.price1.len(),
            inputs.price2.len()
        )));
    }
    Ok(SignalScanner::new(inputs, params).run())
}

/// Mark each index inside an open trade's `[entry, exit)` with its side.
pub fn position_series(trades: &[Trade], len: usize) -> Vec<i8> {
    let mut positions = vec![0i8; len];
    for trade in trades {
        let end = trade.exit_index.min(len);
        for slot in positions.iter_mut().take(end).skip(trade.entry_index) {
            *slot = trade.side.marker();
        }
    }
    positions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
