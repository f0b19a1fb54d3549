use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::backtest::regression::{fit_ols, log_prices, MIN_WINDOW};
use crate::error::StatArbError;
use crate::types::{ensure_aligned, AssetSeries};
use crate::StatArbResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for screening a basket of assets for cointegrated pairs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningInput {
    /// Price series sharing one time index (at least 2)
    pub assets: Vec<AssetSeries>,
    /// Dickey-Fuller t-statistic below which a pair counts as cointegrated
    /// (default -3.34, two-variable Engle-Granger 5% level)
    #[serde(default)]
    pub critical_value: Option<Decimal>,
    /// Minimum rows with both prices defined (default 20)
    #[serde(default)]
    pub min_observations: Option<usize>,
}

/// Engle-Granger result for one ordered pair (asset1 regressed on asset2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairScreen {
    pub asset1: String,
    pub asset2: String,
    pub observations: usize,
    /// Pearson correlation of log prices
    pub correlation: Option<Decimal>,
    pub intercept: Decimal,
    pub hedge_ratio: Decimal,
    /// t-statistic of the lagged residual in the Dickey-Fuller regression
    pub adf_statistic: Decimal,
    pub is_cointegrated: bool,
}

/// A pair that could not be tested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedPair {
    pub asset1: String,
    pub asset2: String,
    pub reason: String,
}

/// Output of a basket screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningOutput {
    /// Tested pairs, strongest evidence of cointegration first
    pub pairs: Vec<PairScreen>,
    pub skipped: Vec<SkippedPair>,
    pub cointegrated_count: usize,
    pub critical_value: Decimal,
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const DEFAULT_CRITICAL_VALUE: Decimal = dec!(-3.34);
const DEFAULT_MIN_OBSERVATIONS: usize = 20;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Test every unordered pair in the basket for cointegration.
pub fn screen_pairs(input: &ScreeningInput) -> StatArbResult<ScreeningOutput> {
    if input.assets.len() < 2 {
        return Err(StatArbError::InvalidInput {
            field: "assets".into(),
            reason: format!(
                "At least 2 assets required to form a pair, got {}",
                input.assets.len()
            ),
        });
    }
    let refs: Vec<&AssetSeries> = input.assets.iter().collect();
    ensure_aligned(&refs)?;

    let critical_value = input.critical_value.unwrap_or(DEFAULT_CRITICAL_VALUE);
    let min_obs = input
        .min_observations
        .unwrap_or(DEFAULT_MIN_OBSERVATIONS)
        .max(MIN_WINDOW + 1);

    let logs: Vec<Vec<Option<Decimal>>> = input
        .assets
        .iter()
        .map(|a| log_prices(&a.prices))
        .collect();

    let mut pairs = Vec::new();
    let mut skipped = Vec::new();
    for i in 0..input.assets.len() {
        for j in (i + 1)..input.assets.len() {
            let a = &input.assets[i];
            let b = &input.assets[j];
            match test_pair(&logs[i], &logs[j], min_obs) {
                Ok(stats) => pairs.push(PairScreen {
                    asset1: a.name.clone(),
                    asset2: b.name.clone(),
                    observations: stats.observations,
                    correlation: stats.correlation,
                    intercept: stats.intercept,
                    hedge_ratio: stats.hedge_ratio,
                    adf_statistic: stats.adf_statistic,
                    is_cointegrated: stats.adf_statistic < critical_value,
                }),
                Err(e) => {
                    debug!(asset1 = %a.name, asset2 = %b.name, "pair skipped: {}", e);
                    skipped.push(SkippedPair {
                        asset1: a.name.clone(),
                        asset2: b.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    pairs.sort_by(|x, y| {
        x.adf_statistic
            .cmp(&y.adf_statistic)
            .then_with(|| x.asset1.cmp(&y.asset1))
            .then_with(|| x.asset2.cmp(&y.asset2))
    });
    let cointegrated_count = pairs.iter().filter(|p| p.is_cointegrated).count();

    Ok(ScreeningOutput {
        pairs,
        skipped,
        cointegrated_count,
        critical_value,
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct PairStats {
    observations: usize,
    correlation: Option<Decimal>,
    intercept: Decimal,
    hedge_ratio: Decimal,
    adf_statistic: Decimal,
}

fn test_pair(
    log_y: &[Option<Decimal>],
    log_x: &[Option<Decimal>],
    min_obs: usize,
) -> StatArbResult<PairStats> {
    let (ys, xs): (Vec<Decimal>, Vec<Decimal>) = log_y
        .iter()
        .zip(log_x.iter())
        .filter_map(|(y, x)| Some(((*y)?, (*x)?)))
        .unzip();
    if ys.len() < min_obs {
        return Err(StatArbError::InsufficientData(format!(
            "{} usable observations, need {}",
            ys.len(),
            min_obs
        )));
    }

    let fit = fit_ols(&ys, &xs, ys.len() - 1)?;
    let residuals: Vec<Decimal> = ys
        .iter()
        .zip(xs.iter())
        .map(|(y, x)| *y - fit.alpha - fit.beta * *x)
        .collect();

    Ok(PairStats {
        observations: ys.len(),
        correlation: pearson_correlation(&xs, &ys),
        intercept: fit.alpha,
        hedge_ratio: fit.beta,
        adf_statistic: dickey_fuller_statistic(&residuals)?,
    })
}

/// Dickey-Fuller regression with constant: dS_t = a + b * S_{t-1} + e_t.
/// Returns the t-statistic of `b`; more negative means more evidence of
/// stationarity.
pub fn dickey_fuller_statistic(series: &[Decimal]) -> StatArbResult<Decimal> {
    if series.len() < MIN_WINDOW + 1 {
        return Err(StatArbError::InsufficientData(format!(
            "Dickey-Fuller regression needs at least {} observations",
            MIN_WINDOW + 1
        )));
    }
    let lags = &series[..series.len() - 1];
    let diffs: Vec<Decimal> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let fit = fit_ols(&diffs, lags, series.len() - 1)?;

    let m_dec = Decimal::from(lags.len() as i64);
    let mean_lag: Decimal = lags.iter().copied().sum::<Decimal>() / m_dec;
    let sxx: Decimal = lags
        .iter()
        .map(|l| {
            let d = *l - mean_lag;
            d * d
        })
        .sum();
    let root_sxx = sxx.sqrt().unwrap_or(Decimal::ZERO);
    if fit.stderr.is_zero() || root_sxx.is_zero() {
        return Err(StatArbError::DivisionByZero {
            context: "Dickey-Fuller standard error: residuals fit exactly".into(),
        });
    }
    let se_beta = fit.stderr / root_sxx;
    Ok(fit.beta / se_beta)
}

/// Pearson correlation coefficient; `None` when either series is flat.
fn pearson_correlation(x: &[Decimal], y: &[Decimal]) -> Option<Decimal> {
    let n_dec = Decimal::from(x.len() as i64);
    let mean_x: Decimal = x.iter().copied().sum::<Decimal>() / n_dec;
    let mean_y: Decimal = y.iter().copied().sum::<Decimal>() / n_dec;

    let mut cov = Decimal::ZERO;
    let mut var_x = Decimal::ZERO;
    let mut var_y = Decimal::ZERO;
    for (xi, yi) in x.iter().zip(y.iter()) {
        let dx = *xi - mean_x;
        let dy = *yi - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    let denom = var_x.sqrt()? * var_y.sqrt()?;
    if denom.is_zero() {
        return None;
    }
    Some(cov / denom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
