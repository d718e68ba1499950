//! CSV file data adapter.
//!
//! Price rows and fundamentals rows come from two header-named CSV files;
//! columns map onto [`PriceRow`] and [`FundamentalsRow`] by name and absent
//! optional columns are treated as empty.

use crate::domain::error::ScanError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::PriceRow;
use crate::ports::data_port::DataPort;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub struct CsvAdapter {
    prices_path: PathBuf,
    fundamentals_path: Option<PathBuf>,
}

impl CsvAdapter {
    pub fn new(prices_path: PathBuf, fundamentals_path: Option<PathBuf>) -> Self {
        Self {
            prices_path,
            fundamentals_path,
        }
    }
}

fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ScanError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| ScanError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

    let mut records = Vec::new();
    for (line, result) in rdr.deserialize().enumerate() {
        let record = result.map_err(|e| ScanError::Database {
            reason: format!("CSV parse error in {} record {}: {}", path.display(), line + 1, e),
        })?;
        records.push(record);
    }
    Ok(records)
}

impl DataPort for CsvAdapter {
    fn fetch_price_rows(&self) -> Result<Vec<PriceRow>, ScanError> {
        let mut rows: Vec<PriceRow> = read_records(&self.prices_path)?;
        rows.sort_by_key(|r| (r.instrument_id, r.date));
        Ok(rows)
    }

    fn fetch_fundamentals(&self) -> Result<Vec<FundamentalsRow>, ScanError> {
        let path = self
            .fundamentals_path
            .as_deref()
            .ok_or_else(|| ScanError::ConfigMissing {
                section: "data".into(),
                key: "fundamentals_path".into(),
            })?;
        read_records(path)
    }
}
