#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use std::cell::RefCell;
use stocksignals::domain::batch::BatchReport;
use stocksignals::domain::error::ScanError;
use stocksignals::domain::fundamentals::{FundamentalsResult, FundamentalsRow};
pub use stocksignals::domain::ohlcv::PriceRow;
use stocksignals::ports::data_port::DataPort;
use stocksignals::ports::report_port::ReportPort;

pub struct MockDataPort {
    pub prices: Vec<PriceRow>,
    pub fundamentals: Vec<FundamentalsRow>,
    pub error: Option<String>,
    pub group_requests: RefCell<Vec<Vec<i64>>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: Vec::new(),
            fundamentals: Vec::new(),
            error: None,
            group_requests: RefCell::new(Vec::new()),
        }
    }

    pub fn with_rows(mut self, rows: Vec<PriceRow>) -> Self {
        self.prices.extend(rows);
        self
    }

    pub fn with_fundamentals(mut self, row: FundamentalsRow) -> Self {
        self.fundamentals.push(row);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }

    fn check(&self) -> Result<(), ScanError> {
        match &self.error {
            Some(reason) => Err(ScanError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_price_rows(&self) -> Result<Vec<PriceRow>, ScanError> {
        self.check()?;
        let mut rows = self.prices.clone();
        rows.sort_by_key(|r| (r.instrument_id, r.date));
        Ok(rows)
    }

    fn fetch_price_rows_for_groups(&self, groups: &[i64]) -> Result<Vec<PriceRow>, ScanError> {
        self.group_requests.borrow_mut().push(groups.to_vec());
        let rows = self.fetch_price_rows()?;
        Ok(rows
            .into_iter()
            .filter(|r| r.group_id.is_some_and(|g| groups.contains(&g)))
            .collect())
    }

    fn fetch_fundamentals(&self) -> Result<Vec<FundamentalsRow>, ScanError> {
        self.check()?;
        Ok(self.fundamentals.clone())
    }
}

pub struct MockReportPort {
    pub scans: RefCell<Vec<(BatchReport, Option<String>)>>,
    pub fundamentals: RefCell<Vec<(Vec<FundamentalsResult>, Option<String>)>>,
}

impl MockReportPort {
    pub fn new() -> Self {
        Self {
            scans: RefCell::new(Vec::new()),
            fundamentals: RefCell::new(Vec::new()),
        }
    }
}

impl ReportPort for MockReportPort {
    fn write_scan(&self, report: &BatchReport, output_path: Option<&str>) -> Result<(), ScanError> {
        self.scans
            .borrow_mut()
            .push((report.clone(), output_path.map(str::to_string)));
        Ok(())
    }

    fn write_fundamentals(
        &self,
        rows: &[FundamentalsResult],
        output_path: Option<&str>,
    ) -> Result<(), ScanError> {
        self.fundamentals
            .borrow_mut()
            .push((rows.to_vec(), output_path.map(str::to_string)));
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_row(instrument_id: i64, date: NaiveDate, close: f64) -> PriceRow {
    PriceRow {
        instrument_id,
        group_id: None,
        date,
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: None,
        symbol: Some(format!("SYM{instrument_id}")),
        company_name: Some(format!("Company {instrument_id} Ltd")),
        industry: Some("Materials".to_string()),
        short_name: Some(format!("Co{instrument_id}")),
    }
}

/// Closes rising by one per day from `start_price`; high/low one point
/// either side and no volume.
pub fn linear_rows(instrument_id: i64, count: usize, start_price: f64) -> Vec<PriceRow> {
    let start = date(2024, 1, 1);
    (0..count)
        .map(|i| make_row(instrument_id, start + Days::new(i as u64), start_price + i as f64))
        .collect()
}

/// An oscillating series with a mild drift and varying volume.
pub fn wave_rows(instrument_id: i64, count: usize) -> Vec<PriceRow> {
    let start = date(2023, 6, 1);
    (0..count)
        .map(|i| {
            let t = i as f64;
            let close = 75.0 + (t * 0.35).sin() * 6.0 + t * 0.05;
            let mut row = make_row(instrument_id, start + Days::new(i as u64), close);
            row.open = close - (t * 0.7).cos();
            row.high = close.max(row.open) + 0.9;
            row.low = close.min(row.open) - 0.9;
            row.volume = Some(10_000.0 + (t * 1.3).cos().abs() * 5_000.0);
            row
        })
        .collect()
}

pub fn in_group(mut rows: Vec<PriceRow>, group_id: i64) -> Vec<PriceRow> {
    for row in &mut rows {
        row.group_id = Some(group_id);
    }
    rows
}

pub fn fundamentals_row(group_id: i64, instrument_id: i64) -> FundamentalsRow {
    FundamentalsRow {
        group_id,
        instrument_id: Some(instrument_id),
        symbol: Some(format!("SYM{instrument_id}")),
        company_name: Some(format!("Company {instrument_id} Ltd")),
        industry: Some("Materials".to_string()),
        market_cap: Some(12_500.0),
        pe_ratio: Some(14.2),
        roe: Some(18.9),
        ..FundamentalsRow::default()
    }
}
