//! Per-instrument pipeline.
//!
//! Raw rows are validated into a [`Validated`] instrument, every registry
//! indicator is computed into a [`Computed`] instrument, and the computed
//! state is emitted as an [`InstrumentResult`]. Any stage can stop with a
//! [`SkipReason`] instead.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::aggregate::{self, Selection};
use crate::domain::decision::{Decision, MarketContext};
use crate::domain::error::{IndicatorError, IndicatorScope, SkipReason};
use crate::domain::indicator::params::IndicatorParams;
use crate::domain::indicator::{IndicatorKind, IndicatorValue};
use crate::domain::indicator_helpers::{self, Series};
use crate::domain::ohlcv::{InstrumentIdentity, PriceRow, PriceSeries};
use crate::domain::registry::REGISTRY;
use crate::domain::scan_result::{InstrumentResult, LatestValues, Technicals, round2, round_series};

/// How much history an instrument needs before it is computed at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineMode {
    /// Every indicator must be computable: the series must reach
    /// [`IndicatorParams::full_coverage_bars`].
    #[default]
    Full,
    /// No up-front gate; indicators short of their own minimum are
    /// unavailable, but critical ones still skip the instrument.
    Lenient,
}

impl fmt::Display for PipelineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineMode::Full => write!(f, "full"),
            PipelineMode::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for PipelineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(PipelineMode::Full),
            "lenient" => Ok(PipelineMode::Lenient),
            other => Err(format!("unknown pipeline mode {other}")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineConfig {
    pub params: IndicatorParams,
    pub selection: Selection,
    pub mode: PipelineMode,
}

/// Identity resolved and series checked; nothing computed yet.
#[derive(Debug, Clone)]
pub struct Validated {
    pub identity: InstrumentIdentity,
    pub series: PriceSeries,
}

/// All indicators attempted; decisions available where they could be made.
#[derive(Debug, Clone)]
pub struct Computed {
    pub identity: InstrumentIdentity,
    pub series: PriceSeries,
    pub readings: BTreeMap<IndicatorKind, IndicatorValue>,
    pub decisions: BTreeMap<IndicatorKind, Option<Decision>>,
    pub unavailable: BTreeMap<IndicatorKind, String>,
    pub ema_history: Series,
    pub sma_history: Series,
}

/// Runs one instrument's rows through every stage.
pub fn evaluate(rows: &[PriceRow], config: &PipelineConfig) -> Result<InstrumentResult, SkipReason> {
    let validated = validate(rows, config)?;
    let computed = validated.compute(config)?;
    Ok(computed.emit(&config.selection))
}

/// Identity first, then the series shape, then the full-coverage gate.
pub fn validate(rows: &[PriceRow], config: &PipelineConfig) -> Result<Validated, SkipReason> {
    let first = rows.first().ok_or_else(|| SkipReason::MalformedSeries {
        reason: "no rows".into(),
    })?;
    let identity = InstrumentIdentity::from_row(first)?;

    if let Some(other) = rows.iter().find(|r| r.instrument_id != first.instrument_id) {
        return Err(SkipReason::MalformedSeries {
            reason: format!(
                "row for instrument {} mixed into {}",
                other.instrument_id, first.instrument_id
            ),
        });
    }

    let series = PriceSeries::from_rows(rows)?;
    check_coverage(&series, config)?;

    Ok(Validated { identity, series })
}

/// The full-coverage gate; a no-op in lenient mode.
pub fn check_coverage(series: &PriceSeries, config: &PipelineConfig) -> Result<(), SkipReason> {
    if config.mode == PipelineMode::Full {
        let need = config.params.full_coverage_bars();
        if series.len() < need {
            return Err(SkipReason::InsufficientData {
                indicator: IndicatorScope::FullCoverage,
                need,
                have: series.len(),
            });
        }
    }
    Ok(())
}

impl Validated {
    pub fn compute(self, config: &PipelineConfig) -> Result<Computed, SkipReason> {
        let params = &config.params;
        let close = self.series.close();

        let ema_history = indicator_helpers::ema(close, params.ema_period).ok();
        let sma_history = indicator_helpers::sma(close, params.sma_period).ok();

        let ctx = MarketContext {
            price: self.series.close_back(0).unwrap_or_default(),
            prev_close: self.series.close_back(1),
            ema: ema_history.as_deref().and_then(indicator_helpers::latest),
        };

        let mut readings = BTreeMap::new();
        let mut decisions = BTreeMap::new();
        let mut unavailable = BTreeMap::new();

        for spec in &REGISTRY {
            match spec.evaluate(&self.series, params, &ctx) {
                Ok((value, decision)) => {
                    if decision.is_none() {
                        warn!(
                            instrument = self.identity.instrument_id,
                            indicator = %spec.kind,
                            "decision unavailable: latest value incomplete"
                        );
                        unavailable.insert(spec.kind, "latest value incomplete".to_string());
                    }
                    readings.insert(spec.kind, value);
                    decisions.insert(spec.kind, decision);
                }
                Err(e) if spec.critical => {
                    return Err(critical_failure(spec.kind, e));
                }
                Err(e) => {
                    warn!(
                        instrument = self.identity.instrument_id,
                        indicator = %spec.kind,
                        "indicator unavailable: {e}"
                    );
                    unavailable.insert(spec.kind, e.to_string());
                    decisions.insert(spec.kind, None);
                }
            }
        }

        let len = self.series.len();
        Ok(Computed {
            identity: self.identity,
            series: self.series,
            readings,
            decisions,
            unavailable,
            ema_history: ema_history.unwrap_or_else(|| vec![None; len]),
            sma_history: sma_history.unwrap_or_else(|| vec![None; len]),
        })
    }
}

fn critical_failure(kind: IndicatorKind, e: IndicatorError) -> SkipReason {
    match e {
        IndicatorError::InsufficientData { need, have } => SkipReason::InsufficientData {
            indicator: IndicatorScope::Indicator(kind),
            need,
            have,
        },
        other => SkipReason::ComputationFailed {
            indicator: kind,
            reason: other.to_string(),
        },
    }
}

impl Computed {
    /// Technicals only, without the identity fields.
    pub fn technicals(&self, selection: &Selection) -> Technicals {
        let score = aggregate::score(selection, &self.decisions);
        let decision = aggregate::overall(selection, score);
        debug!(
            instrument = self.identity.instrument_id,
            symbol = %self.identity.symbol,
            score,
            %decision,
            "aggregated {} selected indicators",
            selection.len()
        );

        let last = self.series.last_bar();
        Technicals {
            latest_price: last.as_ref().map_or(0.0, |b| round2(b.close)),
            latest_open: last.as_ref().map_or(0.0, |b| round2(b.open)),
            latest_date: last.map_or(NaiveDate::MIN, |b| b.date),
            latest: LatestValues::from_readings(&self.readings),
            decision,
            score: round2(score),
            indicator_decisions: self.decisions.clone(),
            unavailable: self.unavailable.clone(),
            selected_indicators: selection.iter().collect(),
            dates: self.series.dates().to_vec(),
            closes: self.series.close().iter().copied().map(round2).collect(),
            ema9: round_series(&self.ema_history),
            sma20: round_series(&self.sma_history),
        }
    }

    pub fn emit(self, selection: &Selection) -> InstrumentResult {
        let technicals = self.technicals(selection);
        InstrumentResult {
            instrument_id: self.identity.instrument_id,
            symbol: self.identity.symbol,
            company_name: self.identity.company_name,
            industry: self.identity.industry,
            short_name: self.identity.short_name,
            technicals,
        }
    }
}
