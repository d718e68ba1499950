//! OHLCV bars, data-source rows and the per-instrument price series.

use crate::domain::error::SkipReason;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Volume used when the data source has none (or reports zero).
pub const DEFAULT_VOLUME: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

/// One row as delivered by the data source: a bar plus instrument identity.
///
/// Rows arrive sorted by `(instrument_id, date)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRow {
    pub instrument_id: i64,
    /// Shared key linking price rows to fundamentals rows.
    #[serde(default)]
    pub group_id: Option<i64>,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
}

impl PriceRow {
    pub fn to_bar(&self) -> OhlcvBar {
        OhlcvBar {
            date: self.date,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: effective_volume(self.volume),
        }
    }
}

/// Missing or zero volume counts as [`DEFAULT_VOLUME`].
pub fn effective_volume(volume: Option<f64>) -> f64 {
    match volume {
        Some(v) if v != 0.0 => v,
        _ => DEFAULT_VOLUME,
    }
}

/// Descriptive fields carried through to the result record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstrumentIdentity {
    pub instrument_id: i64,
    pub symbol: String,
    pub company_name: String,
    pub industry: Option<String>,
    pub short_name: Option<String>,
}

impl InstrumentIdentity {
    /// Symbol and company name are required and must not be blank.
    pub fn new(
        instrument_id: i64,
        symbol: Option<&str>,
        company_name: Option<&str>,
        industry: Option<String>,
        short_name: Option<String>,
    ) -> Result<Self, SkipReason> {
        let symbol = non_blank(symbol).ok_or(SkipReason::IdentityMissing { field: "symbol" })?;
        let company_name = non_blank(company_name).ok_or(SkipReason::IdentityMissing {
            field: "company_name",
        })?;
        Ok(Self {
            instrument_id,
            symbol,
            company_name,
            industry,
            short_name,
        })
    }

    /// Identity from the first row of a group.
    pub fn from_row(row: &PriceRow) -> Result<Self, SkipReason> {
        Self::new(
            row.instrument_id,
            row.symbol.as_deref(),
            row.company_name.as_deref(),
            row.industry.clone(),
            row.short_name.clone(),
        )
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parallel columns for one instrument, ascending by date.
///
/// Construction checks that every column has the same length, every price
/// is finite and dates strictly increase.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    dates: Vec<NaiveDate>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        dates: Vec<NaiveDate>,
        open: Vec<f64>,
        high: Vec<f64>,
        low: Vec<f64>,
        close: Vec<f64>,
        volume: Vec<f64>,
    ) -> Result<Self, SkipReason> {
        let n = close.len();
        let columns = [
            ("dates", dates.len()),
            ("open", open.len()),
            ("high", high.len()),
            ("low", low.len()),
            ("volume", volume.len()),
        ];
        for (name, len) in columns {
            if len != n {
                return Err(SkipReason::MalformedSeries {
                    reason: format!("{name} has {len} entries, close has {n}"),
                });
            }
        }

        for (name, column) in [
            ("open", &open),
            ("high", &high),
            ("low", &low),
            ("close", &close),
            ("volume", &volume),
        ] {
            if let Some(i) = column.iter().position(|v| !v.is_finite()) {
                return Err(SkipReason::MalformedSeries {
                    reason: format!("non-finite {name} at index {i}"),
                });
            }
        }

        if let Some(i) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SkipReason::MalformedSeries {
                reason: format!("dates not strictly ascending at index {}", i + 1),
            });
        }

        Ok(Self {
            dates,
            open,
            high,
            low,
            close,
            volume,
        })
    }

    pub fn from_bars(bars: &[OhlcvBar]) -> Result<Self, SkipReason> {
        Self::new(
            bars.iter().map(|b| b.date).collect(),
            bars.iter().map(|b| b.open).collect(),
            bars.iter().map(|b| b.high).collect(),
            bars.iter().map(|b| b.low).collect(),
            bars.iter().map(|b| b.close).collect(),
            bars.iter().map(|b| b.volume).collect(),
        )
    }

    pub fn from_rows(rows: &[PriceRow]) -> Result<Self, SkipReason> {
        let bars: Vec<OhlcvBar> = rows.iter().map(PriceRow::to_bar).collect();
        Self::from_bars(&bars)
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn open(&self) -> &[f64] {
        &self.open
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn close(&self) -> &[f64] {
        &self.close
    }

    pub fn volume(&self) -> &[f64] {
        &self.volume
    }

    pub fn bar(&self, i: usize) -> Option<OhlcvBar> {
        (i < self.len()).then(|| OhlcvBar {
            date: self.dates[i],
            open: self.open[i],
            high: self.high[i],
            low: self.low[i],
            close: self.close[i],
            volume: self.volume[i],
        })
    }

    pub fn last_bar(&self) -> Option<OhlcvBar> {
        self.len().checked_sub(1).and_then(|i| self.bar(i))
    }

    /// Close `back` bars before the latest one (`back = 0` is the latest close).
    pub fn close_back(&self, back: usize) -> Option<f64> {
        self.len()
            .checked_sub(back + 1)
            .map(|i| self.close[i])
    }

    pub fn typical_prices(&self) -> Vec<f64> {
        (0..self.len())
            .filter_map(|i| self.bar(i))
            .map(|bar| bar.typical_price())
            .collect()
    }
}
