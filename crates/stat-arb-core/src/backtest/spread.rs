use rust_decimal::Decimal;

use super::regression::RegressionPoint;

/// Deviation of log-price(asset1) from the rolling model's prediction:
/// `ln(p1) - alpha - beta * ln(p2)`.
///
/// Undefined wherever either log-price or the regression point is missing.
pub fn build_spread(
    log_price1: &[Option<Decimal>],
    log_price2: &[Option<Decimal>],
    regression: &[Option<RegressionPoint>],
) -> Vec<Option<Decimal>> {
    log_price1
        .iter()
        .zip(log_price2.iter())
        .zip(regression.iter())
        .map(|((y, x), reg)| match (y, x, reg) {
            (Some(y), Some(x), Some(r)) => Some(*y - r.alpha - r.beta * *x),
            _ => None,
        })
        .collect()
}
