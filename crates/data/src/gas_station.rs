//! Daily gas prices loaded from CSV.
//!
//! The first row is a header. Column 0 holds the UTC day as `M/D/YYYY` or
//! `YYYY-MM-DD`; column 2 holds the average gas price in wei.

use amm_hedge_domain::ports::{GasPriceError, GasPriceOracle};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use primitive_types::U256;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

/// Gas prices keyed by calendar day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GasStation {
    prices: BTreeMap<NaiveDate, U256>,
}

impl GasStation {
    pub fn new(prices: BTreeMap<NaiveDate, U256>) -> Self {
        Self { prices }
    }

    /// Loads prices from a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, GasPriceError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GasPriceError::Load(format!("could not read {}: {e}", path.display()))
        })?;
        Self::from_reader(file)
    }

    /// Loads prices from CSV data.
    pub fn from_reader<R: Read>(source: R) -> Result<Self, GasPriceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source);

        let mut prices = BTreeMap::new();
        for result in reader.records() {
            let record = result.map_err(|e| GasPriceError::Load(e.to_string()))?;
            let line = record.position().map_or(0, |p| p.line());

            let raw_date = record.get(0).unwrap_or_default();
            let date = parse_date(raw_date).ok_or_else(|| {
                GasPriceError::Load(format!("line {line}: could not parse date `{raw_date}`"))
            })?;

            let raw_price = record.get(2).ok_or_else(|| {
                GasPriceError::Load(format!("line {line}: missing gas price column"))
            })?;
            let price = U256::from_dec_str(raw_price).map_err(|e| {
                GasPriceError::Load(format!("line {line}: could not parse gas price `{raw_price}`: {e:?}"))
            })?;

            prices.insert(date, price);
        }

        debug!(days = prices.len(), "loaded gas prices");
        Ok(Self { prices })
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// First and last day covered.
    pub fn range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.prices.keys().next()?;
        let last = self.prices.keys().next_back()?;
        Some((*first, *last))
    }
}

impl GasPriceOracle for GasStation {
    fn gas_price(&self, date: NaiveDate) -> Result<U256, GasPriceError> {
        self.prices
            .get(&date)
            .copied()
            .ok_or(GasPriceError::PriceNotFound { date })
    }
}
