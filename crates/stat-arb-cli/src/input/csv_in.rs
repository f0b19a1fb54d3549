use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::io;
use std::str::FromStr;
use tracing::debug;

use stat_arb_core::{AssetSeries, PairPrices};

use super::file::resolve_path;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Read a wide price CSV: a date column followed by one column per asset.
pub fn read_price_csv(path: &str) -> Result<Vec<AssetSeries>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let file = std::fs::File::open(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    parse_price_csv(file).map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
}

/// Parse a wide price table. Empty cells become missing prices.
pub fn parse_price_csv<R: io::Read>(reader: R) -> Result<Vec<AssetSeries>, Box<dyn std::error::Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    if headers.len() < 2 {
        return Err("price CSV needs a date column and at least one asset column".into());
    }
    let mut assets: Vec<AssetSeries> = headers
        .iter()
        .skip(1)
        .map(|name| AssetSeries {
            name: name.to_string(),
            index: Vec::new(),
            prices: Vec::new(),
        })
        .collect();

    for (row_no, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = row_no + 2;
        let raw_date = record.get(0).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT)
            .map_err(|e| format!("line {}: bad date '{}': {}", line, raw_date, e))?;

        for (col, asset) in assets.iter_mut().enumerate() {
            let cell = record.get(col + 1).unwrap_or_default();
            let price = if cell.is_empty() {
                None
            } else {
                Some(Decimal::from_str(cell).map_err(|e| {
                    format!("line {}: bad price '{}' for {}: {}", line, cell, asset.name, e)
                })?)
            };
            asset.index.push(date);
            asset.prices.push(price);
        }
    }

    debug!(
        assets = assets.len(),
        rows = assets.first().map_or(0, |a| a.len()),
        "price file loaded"
    );
    Ok(assets)
}

/// Pick two named columns, or the first two when no names are provided.
pub fn select_pair(
    assets: Vec<AssetSeries>,
    asset1: Option<&str>,
    asset2: Option<&str>,
) -> Result<PairPrices, Box<dyn std::error::Error>> {
    let find = |name: &str| -> Result<AssetSeries, Box<dyn std::error::Error>> {
        assets
            .iter()
            .find(|a| a.name == name)
            .cloned()
            .ok_or_else(|| format!("asset '{}' not found in price file", name).into())
    };
    let positional = |pos: usize| -> Result<AssetSeries, Box<dyn std::error::Error>> {
        assets
            .get(pos)
            .cloned()
            .ok_or_else(|| "price file needs at least two asset columns".into())
    };

    let first = match asset1 {
        Some(name) => find(name)?,
        None => positional(0)?,
    };
    let second = match asset2 {
        Some(name) => find(name)?,
        None => {
            // Default to the first column that is not asset1.
            let name = assets
                .iter()
                .map(|a| a.name.as_str())
                .find(|n| *n != first.name)
                .ok_or("price file needs at least two asset columns")?
                .to_string();
            find(&name)?
        }
    };
    Ok(PairPrices {
        asset1: first,
        asset2: second,
    })
}
