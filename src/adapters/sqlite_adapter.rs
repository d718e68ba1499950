//! SQLite data adapter.
//!
//! Daily bars live in `stock_prices`, descriptive fields in `company`; the
//! two are joined on `instrument_id` when fetching. Fundamentals come from
//! their own `fundamentals` table.

use crate::domain::error::ScanError;
use crate::domain::fundamentals::FundamentalsRow;
use crate::domain::ohlcv::PriceRow;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Row, params, params_from_iter};

const PRICE_COLUMNS: &str = "p.instrument_id, p.group_id, p.date, p.open, p.high, p.low, p.close,
     p.volume, c.symbol, c.company_name, c.industry, c.short_name";

const FUNDAMENTAL_COLUMNS: &str = "group_id, instrument_id, symbol, company_name, industry,
     short_name, market_cap, current_price, high_52w, low_52w, eps, eps_growth,
     dividend_yield, pe_ratio, pb_ratio, roe, roce, debt_to_equity, core_ebitda,
     core_ebitda_margin, pat_margin, asset_turnover";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> ScanError {
    ScanError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ScanError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ScanError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| ScanError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ScanError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| ScanError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ScanError> {
        self.pool.get().map_err(|e: r2d2::Error| ScanError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), ScanError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS company (
                    instrument_id INTEGER PRIMARY KEY,
                    symbol TEXT,
                    company_name TEXT,
                    industry TEXT,
                    short_name TEXT
                );
                CREATE TABLE IF NOT EXISTS stock_prices (
                    instrument_id INTEGER NOT NULL,
                    group_id INTEGER,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL,
                    PRIMARY KEY (instrument_id, date)
                );
                CREATE INDEX IF NOT EXISTS idx_stock_prices_group ON stock_prices(group_id);
                CREATE TABLE IF NOT EXISTS fundamentals (
                    group_id INTEGER PRIMARY KEY,
                    instrument_id INTEGER,
                    symbol TEXT,
                    company_name TEXT,
                    industry TEXT,
                    short_name TEXT,
                    market_cap REAL,
                    current_price REAL,
                    high_52w REAL,
                    low_52w REAL,
                    eps REAL,
                    eps_growth REAL,
                    dividend_yield REAL,
                    pe_ratio REAL,
                    pb_ratio REAL,
                    roe REAL,
                    roce REAL,
                    debt_to_equity REAL,
                    core_ebitda REAL,
                    core_ebitda_margin REAL,
                    pat_margin REAL,
                    asset_turnover REAL
                );",
            )
            .map_err(query_err)
    }

    /// Inserts price rows, upserting the company row from the first row
    /// that names each instrument.
    pub fn insert_price_rows(&self, rows: &[PriceRow]) -> Result<(), ScanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for row in rows {
            tx.execute(
                "INSERT OR REPLACE INTO stock_prices
                    (instrument_id, group_id, date, open, high, low, close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    row.instrument_id,
                    row.group_id,
                    row.date.format("%Y-%m-%d").to_string(),
                    row.open,
                    row.high,
                    row.low,
                    row.close,
                    row.volume
                ],
            )
            .map_err(query_err)?;

            if row.symbol.is_some() || row.company_name.is_some() {
                tx.execute(
                    "INSERT OR IGNORE INTO company
                        (instrument_id, symbol, company_name, industry, short_name)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        row.instrument_id,
                        row.symbol,
                        row.company_name,
                        row.industry,
                        row.short_name
                    ],
                )
                .map_err(query_err)?;
            }
        }

        tx.commit().map_err(query_err)
    }

    pub fn insert_fundamentals(&self, rows: &[FundamentalsRow]) -> Result<(), ScanError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for row in rows {
            tx.execute(
                &format!(
                    "INSERT OR REPLACE INTO fundamentals ({FUNDAMENTAL_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                             ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
                ),
                params![
                    row.group_id,
                    row.instrument_id,
                    row.symbol,
                    row.company_name,
                    row.industry,
                    row.short_name,
                    row.market_cap,
                    row.current_price,
                    row.high_52w,
                    row.low_52w,
                    row.eps,
                    row.eps_growth,
                    row.dividend_yield,
                    row.pe_ratio,
                    row.pb_ratio,
                    row.roe,
                    row.roce,
                    row.debt_to_equity,
                    row.core_ebitda,
                    row.core_ebitda_margin,
                    row.pat_margin,
                    row.asset_turnover
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }

    fn query_price_rows(
        &self,
        filter: &str,
        args: &[i64],
    ) -> Result<Vec<PriceRow>, ScanError> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT {PRICE_COLUMNS}
             FROM stock_prices p
             LEFT JOIN company c ON c.instrument_id = p.instrument_id
             {filter}
             ORDER BY p.instrument_id ASC, p.date ASC"
        );

        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), price_row)
            .map_err(query_err)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(query_err)?);
        }
        Ok(out)
    }
}

fn price_row(row: &Row<'_>) -> rusqlite::Result<PriceRow> {
    let date_str: String = row.get(2)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            date_str.len(),
            rusqlite::types::Type::Text,
            Box::new(e),
        )
    })?;
    Ok(PriceRow {
        instrument_id: row.get(0)?,
        group_id: row.get(1)?,
        date,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        close: row.get(6)?,
        volume: row.get(7)?,
        symbol: row.get(8)?,
        company_name: row.get(9)?,
        industry: row.get(10)?,
        short_name: row.get(11)?,
    })
}

fn fundamentals_row(row: &Row<'_>) -> rusqlite::Result<FundamentalsRow> {
    Ok(FundamentalsRow {
        group_id: row.get(0)?,
        instrument_id: row.get(1)?,
        symbol: row.get(2)?,
        company_name: row.get(3)?,
        industry: row.get(4)?,
        short_name: row.get(5)?,
        market_cap: row.get(6)?,
        current_price: row.get(7)?,
        high_52w: row.get(8)?,
        low_52w: row.get(9)?,
        eps: row.get(10)?,
        eps_growth: row.get(11)?,
        dividend_yield: row.get(12)?,
        pe_ratio: row.get(13)?,
        pb_ratio: row.get(14)?,
        roe: row.get(15)?,
        roce: row.get(16)?,
        debt_to_equity: row.get(17)?,
        core_ebitda: row.get(18)?,
        core_ebitda_margin: row.get(19)?,
        pat_margin: row.get(20)?,
        asset_turnover: row.get(21)?,
    })
}

impl DataPort for SqliteAdapter {
    fn fetch_price_rows(&self) -> Result<Vec<PriceRow>, ScanError> {
        self.query_price_rows("", &[])
    }

    fn fetch_price_rows_for_groups(&self, groups: &[i64]) -> Result<Vec<PriceRow>, ScanError> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; groups.len()].join(", ");
        self.query_price_rows(&format!("WHERE p.group_id IN ({placeholders})"), groups)
    }

    fn fetch_fundamentals(&self) -> Result<Vec<FundamentalsRow>, ScanError> {
        let conn = self.conn()?;
        let query = format!("SELECT {FUNDAMENTAL_COLUMNS} FROM fundamentals ORDER BY group_id");

        let mut stmt = conn.prepare(&query).map_err(query_err)?;
        let rows = stmt.query_map([], fundamentals_row).map_err(query_err)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(query_err)?);
        }
        Ok(out)
    }
}
