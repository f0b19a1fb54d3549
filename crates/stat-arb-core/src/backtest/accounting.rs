use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::signal::SpreadSide;
use crate::error::StatArbError;
use crate::types::{Money, Price};
use crate::StatArbResult;

/// Both leg prices observed at one time index.
#[derive(Debug, Clone, Copy)]
pub struct Fill {
    pub index: usize,
    pub price1: Price,
    pub price2: Price,
}

impl Fill {
    pub fn at(index: usize, price1: &[Price], price2: &[Price]) -> Self {
        Fill {
            index,
            price1: price1.get(index).copied().flatten(),
            price2: price2.get(index).copied().flatten(),
        }
    }

    fn checked(&self) -> StatArbResult<(Decimal, Decimal)> {
        Ok((
            require_positive(self.price1, self.index, "asset1")?,
            require_positive(self.price2, self.index, "asset2")?,
        ))
    }
}

/// Share counts and realized P&L of one round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// Units of asset1 traded
    pub shares1: Decimal,
    /// Units of asset2 traded, scaled by the hedge ratio at entry
    pub shares2: Decimal,
    /// P&L of the asset1 leg
    pub leg1_pnl: Money,
    /// P&L of the asset2 leg
    pub leg2_pnl: Money,
    /// Total realized profit
    pub profit: Money,
}

fn require_positive(price: Price, index: usize, asset: &str) -> StatArbResult<Decimal> {
    match price {
        Some(p) if p > Decimal::ZERO => Ok(p),
        Some(p) => Err(StatArbError::InvalidPrice {
            index,
            reason: format!("{asset} price {p} is not positive"),
        }),
        None => Err(StatArbError::InvalidPrice {
            index,
            reason: format!("{asset} price is missing"),
        }),
    }
}

/// Realize the profit of a spread trade.
///
/// `investment` buys (or sells) asset1 at entry; asset2 is sized so that its
/// notional equals asset1's notional times the hedge ratio. A short spread
/// sells asset1 and buys asset2; a long spread does the opposite. Sizes or
/// P&L outside the decimal range reject the fill as `InvalidPrice`.
pub fn settle(
    side: SpreadSide,
    hedge_ratio: Decimal,
    entry: &Fill,
    exit: &Fill,
    investment: Money,
) -> StatArbResult<Settlement> {
    let (p1_entry, p2_entry) = entry.checked()?;
    let (p1_exit, p2_exit) = exit.checked()?;
    let overflow = |index: usize, what: &str| StatArbError::InvalidPrice {
        index,
        reason: format!("{what} overflows decimal range"),
    };

    let shares1 = investment
        .checked_div(p1_entry)
        .ok_or_else(|| overflow(entry.index, "asset1 position size"))?;
    let shares2 = shares1
        .checked_mul(p1_entry)
        .and_then(|notional| notional.checked_mul(hedge_ratio))
        .and_then(|hedged| hedged.checked_div(p2_entry))
        .ok_or_else(|| overflow(entry.index, "asset2 position size"))?;

    // Long spread: long asset1, short asset2.
    let direction = side.position();
    let leg1_pnl = shares1
        .checked_mul(p1_exit - p1_entry)
        .map(|pnl| direction * pnl)
        .ok_or_else(|| overflow(exit.index, "asset1 P&L"))?;
    let leg2_pnl = shares2
        .checked_mul(p2_entry - p2_exit)
        .map(|pnl| direction * pnl)
        .ok_or_else(|| overflow(exit.index, "asset2 P&L"))?;
    let profit = leg1_pnl
        .checked_add(leg2_pnl)
        .ok_or_else(|| overflow(exit.index, "trade profit"))?;

    Ok(Settlement {
        shares1,
        shares2,
        leg1_pnl,
        leg2_pnl,
        profit,
    })
}
