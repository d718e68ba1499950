//! Data access port trait.

use crate::domain::error::ScanError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::PriceRow;

pub trait DataPort {
    /// Every price row, sorted by `(instrument_id, date)`.
    fn fetch_price_rows(&self) -> Result<Vec<PriceRow>, ScanError>;

    /// Price rows belonging to the given groups, sorted like [`DataPort::fetch_price_rows`].
    fn fetch_price_rows_for_groups(&self, groups: &[i64]) -> Result<Vec<PriceRow>, ScanError> {
        let rows = self.fetch_price_rows()?;
        Ok(rows
            .into_iter()
            .filter(|r| r.group_id.is_some_and(|g| groups.contains(&g)))
            .collect())
    }

    fn fetch_fundamentals(&self) -> Result<Vec<FundamentalsRow>, ScanError>;
}
