//! Fundamentals rows merged with per-group technicals.
//!
//! Price rows are grouped by their shared `group_id`; each fundamentals row
//! takes its identity from itself and its technicals from its group's price
//! history. A row is never dropped: when the group has no usable history
//! its technicals are `null` and the skip reason is reported alongside.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::domain::error::SkipReason;
use crate::domain::ohlcv::{InstrumentIdentity, PriceRow, PriceSeries};
use crate::domain::pipeline::{self, PipelineConfig, Validated};
use crate::domain::scan_result::Technicals;

/// Valuation and profitability metrics for one company, as supplied by the
/// data source. Every metric is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsRow {
    #[serde(rename = "fincode", alias = "group_id")]
    pub group_id: i64,
    #[serde(rename = "scripcode", alias = "instrument_id", default)]
    pub instrument_id: Option<i64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(rename = "s_name", alias = "short_name", default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub high_52w: Option<f64>,
    #[serde(default)]
    pub low_52w: Option<f64>,
    #[serde(default)]
    pub eps: Option<f64>,
    #[serde(default)]
    pub eps_growth: Option<f64>,
    #[serde(default)]
    pub dividend_yield: Option<f64>,
    #[serde(default)]
    pub pe_ratio: Option<f64>,
    #[serde(default)]
    pub pb_ratio: Option<f64>,
    #[serde(default)]
    pub roe: Option<f64>,
    #[serde(default)]
    pub roce: Option<f64>,
    #[serde(default)]
    pub debt_to_equity: Option<f64>,
    #[serde(default)]
    pub core_ebitda: Option<f64>,
    #[serde(default)]
    pub core_ebitda_margin: Option<f64>,
    #[serde(default)]
    pub pat_margin: Option<f64>,
    #[serde(default)]
    pub asset_turnover: Option<f64>,
}

impl FundamentalsRow {
    fn identity(&self) -> Result<InstrumentIdentity, SkipReason> {
        InstrumentIdentity::new(
            self.instrument_id.unwrap_or(self.group_id),
            self.symbol.as_deref(),
            self.company_name.as_deref(),
            self.industry.clone(),
            self.short_name.clone(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalsResult {
    #[serde(flatten)]
    pub fundamentals: FundamentalsRow,
    pub technicals: Option<Technicals>,
    #[serde(rename = "skipReason")]
    pub skip_reason: Option<String>,
}

/// Price rows keyed by `group_id`; rows without one cannot be merged.
pub fn group_by_group_id(rows: Vec<PriceRow>) -> BTreeMap<i64, Vec<PriceRow>> {
    let mut groups: BTreeMap<i64, Vec<PriceRow>> = BTreeMap::new();
    let mut orphans = 0usize;
    for row in rows {
        match row.group_id {
            Some(group) => groups.entry(group).or_default().push(row),
            None => orphans += 1,
        }
    }
    if orphans > 0 {
        debug!(orphans, "price rows without group id ignored");
    }
    groups
}

/// Technicals for one fundamentals row.
pub fn technicals_for(
    row: &FundamentalsRow,
    prices: &[PriceRow],
    config: &PipelineConfig,
) -> Result<Technicals, SkipReason> {
    let identity = row.identity()?;
    let series = PriceSeries::from_rows(prices)?;
    if series.is_empty() {
        return Err(SkipReason::MalformedSeries {
            reason: "no price history".into(),
        });
    }
    pipeline::check_coverage(&series, config)?;
    let computed = Validated { identity, series }.compute(config)?;
    Ok(computed.technicals(&config.selection))
}

/// Merges every fundamentals row with its group's technicals, in input order.
pub fn merge_fundamentals(
    fundamentals: Vec<FundamentalsRow>,
    prices: Vec<PriceRow>,
    config: &PipelineConfig,
) -> Vec<FundamentalsResult> {
    let groups = group_by_group_id(prices);
    let merged: Vec<FundamentalsResult> = fundamentals
        .into_par_iter()
        .map(|row| {
            let history = groups.get(&row.group_id).map(Vec::as_slice).unwrap_or(&[]);
            match technicals_for(&row, history, config) {
                Ok(technicals) => FundamentalsResult {
                    fundamentals: row,
                    technicals: Some(technicals),
                    skip_reason: None,
                },
                Err(reason) => {
                    warn!(group = row.group_id, "no technicals: {reason}");
                    FundamentalsResult {
                        fundamentals: row,
                        technicals: None,
                        skip_reason: Some(reason.to_string()),
                    }
                }
            }
        })
        .collect();

    info!(
        rows = merged.len(),
        with_technicals = merged.iter().filter(|r| r.technicals.is_some()).count(),
        "fundamentals merge complete"
    );
    merged
}
