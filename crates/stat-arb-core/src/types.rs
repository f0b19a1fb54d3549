use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::StatArbError;
use crate::StatArbResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Quoted asset price. `None` marks a missing observation.
pub type Price = Option<Decimal>;

/// A gap-filled price history for one asset on a shared time index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSeries {
    pub name: String,
    pub index: Vec<NaiveDate>,
    pub prices: Vec<Price>,
}

impl AssetSeries {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Check that every time point carries exactly one price slot.
    pub fn validate(&self) -> StatArbResult<()> {
        if self.prices.len() != self.index.len() {
            return Err(StatArbError::InvalidInput {
                field: format!("{}.prices", self.name),
                reason: format!(
                    "{} prices for {} time points, must be equal",
                    self.prices.len(),
                    self.index.len()
                ),
            });
        }
        Ok(())
    }
}

/// The two legs of a candidate pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairPrices {
    pub asset1: AssetSeries,
    pub asset2: AssetSeries,
}

impl PairPrices {
    /// Validate both legs and confirm they share an identical time index.
    /// Returns the number of aligned observations.
    pub fn validate(&self) -> StatArbResult<usize> {
        ensure_aligned(&[&self.asset1, &self.asset2])
    }
}

/// Confirm that every series is well-formed and sits on the same index as
/// the first one.
pub fn ensure_aligned(series: &[&AssetSeries]) -> StatArbResult<usize> {
    let Some(first) = series.first() else {
        return Ok(0);
    };
    for s in series {
        s.validate()?;
    }
    for s in &series[1..] {
        if s.index.len() != first.index.len() {
            return Err(StatArbError::MisalignedInput(format!(
                "'{}' has {} time points but '{}' has {}",
                s.name,
                s.index.len(),
                first.name,
                first.index.len()
            )));
        }
        if let Some(pos) = s
            .index
            .iter()
            .zip(first.index.iter())
            .position(|(a, b)| a != b)
        {
            return Err(StatArbError::MisalignedInput(format!(
                "'{}' and '{}' diverge at position {}: {} vs {}",
                s.name, first.name, pos, s.index[pos], first.index[pos]
            )));
        }
    }
    Ok(first.index.len())
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
