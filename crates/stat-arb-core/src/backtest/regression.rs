use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StatArbError;
use crate::types::Price;
use crate::StatArbResult;

/// Smallest window that leaves one residual degree of freedom.
pub const MIN_WINDOW: usize = 3;

/// OLS fit of log-price(asset1) on log-price(asset2) over one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionPoint {
    /// Intercept
    pub alpha: Decimal,
    /// Slope, used as the hedge ratio
    pub beta: Decimal,
    /// Residual standard error, sqrt(RSS / (n - 2))
    pub stderr: Decimal,
}

/// Natural log of each price. Missing or non-positive prices map to `None`.
pub fn log_prices(prices: &[Price]) -> Vec<Option<Decimal>> {
    prices
        .iter()
        .map(|p| p.filter(|v| *v > Decimal::ZERO).and_then(|v| v.checked_ln()))
        .collect()
}

/// Ordinary least squares of `y` on `x` with an intercept.
///
/// `end_index` only labels a `SingularWindow` error. Requires at least
/// [`MIN_WINDOW`] observations.
pub fn fit_ols(y: &[Decimal], x: &[Decimal], end_index: usize) -> StatArbResult<RegressionPoint> {
    let n = y.len();
    if x.len() != n {
        return Err(StatArbError::InvalidInput {
            field: "x".into(),
            reason: format!("{} regressors for {} observations", x.len(), n),
        });
    }
    if n < MIN_WINDOW {
        return Err(StatArbError::InsufficientData(format!(
            "OLS needs at least {} observations, got {}",
            MIN_WINDOW, n
        )));
    }
    let n_dec = Decimal::from(n as i64);
    let mean_x: Decimal = x.iter().copied().sum::<Decimal>() / n_dec;
    let mean_y: Decimal = y.iter().copied().sum::<Decimal>() / n_dec;

    let mut sxx = Decimal::ZERO;
    let mut sxy = Decimal::ZERO;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = *xi - mean_x;
        sxx += dx * dx;
        sxy += dx * (*yi - mean_y);
    }

    if sxx.is_zero() {
        return Err(StatArbError::SingularWindow { index: end_index });
    }

    let beta = sxy / sxx;
    let alpha = mean_y - beta * mean_x;

    let rss: Decimal = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| {
            let e = *yi - alpha - beta * *xi;
            e * e
        })
        .sum();
    let dof = Decimal::from((n - 2) as i64);
    let stderr = if rss.is_zero() {
        Decimal::ZERO
    } else {
        (rss / dof).sqrt().unwrap_or(Decimal::ZERO)
    };

    Ok(RegressionPoint {
        alpha,
        beta,
        stderr,
    })
}

/// Rolling OLS over a trailing window.
///
/// The output is index-aligned with the inputs. Entry `i` is `None` when
/// `i < window_size - 1`, when any log-price inside the window is missing,
/// or when the window is singular.
pub fn rolling_regression(
    log_y: &[Option<Decimal>],
    log_x: &[Option<Decimal>],
    window_size: usize,
) -> StatArbResult<Vec<Option<RegressionPoint>>> {
    if window_size < MIN_WINDOW {
        return Err(StatArbError::InvalidInput {
            field: "window_size".into(),
            reason: format!("Window must hold at least {} observations", MIN_WINDOW),
        });
    }
    if log_y.len() != log_x.len() {
        return Err(StatArbError::MisalignedInput(format!(
            "{} dependent observations vs {} explanatory",
            log_y.len(),
            log_x.len()
        )));
    }

    let n = log_y.len();
    let mut out = vec![None; n];
    if n < window_size {
        return Ok(out);
    }

    let mut ys = Vec::with_capacity(window_size);
    let mut xs = Vec::with_capacity(window_size);
    for end in (window_size - 1)..n {
        let start = end + 1 - window_size;
        ys.clear();
        xs.clear();
        let complete = (start..=end).all(|j| match (log_y[j], log_x[j]) {
            (Some(y), Some(x)) => {
                ys.push(y);
                xs.push(x);
                true
            }
            _ => false,
        });
        if !complete {
            continue;
        }
        match fit_ols(&ys, &xs, end) {
            Ok(point) => out[end] = Some(point),
            Err(StatArbError::SingularWindow { index }) => {
                debug!(index, "singular regression window, no signal");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(out)
}
