//! Result records emitted per instrument.
//!
//! Field names and the two-decimal rounding are part of the output
//! contract; unavailable values serialize as `null`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::decision::Decision;
use crate::domain::indicator::{IndicatorKind, IndicatorValue};
use crate::domain::indicator_helpers::Series;

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round2_opt(value: Option<f64>) -> Option<f64> {
    value.map(round2)
}

/// One record per instrument that made it through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentResult {
    #[serde(rename = "scripcode")]
    pub instrument_id: i64,
    pub symbol: String,
    pub company_name: String,
    pub industry: Option<String>,
    #[serde(rename = "s_name")]
    pub short_name: Option<String>,
    #[serde(flatten)]
    pub technicals: Technicals,
}

/// Latest prices, indicator values and decisions for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technicals {
    pub latest_price: f64,
    pub latest_open: f64,
    pub latest_date: NaiveDate,
    #[serde(flatten)]
    pub latest: LatestValues,
    pub decision: Decision,
    pub score: f64,
    pub indicator_decisions: BTreeMap<IndicatorKind, Option<Decision>>,
    /// Why each unavailable indicator has no decision.
    pub unavailable: BTreeMap<IndicatorKind, String>,
    pub selected_indicators: Vec<IndicatorKind>,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub ema9: Series,
    pub sma20: Series,
}

/// Latest indicator values, rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LatestValues {
    #[serde(rename = "latestRSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "latestEMA9")]
    pub ema: Option<f64>,
    #[serde(rename = "latestSMA20")]
    pub sma: Option<f64>,
    #[serde(rename = "latestMACD")]
    pub macd: Option<f64>,
    #[serde(rename = "latestSignal")]
    pub macd_signal: Option<f64>,
    #[serde(rename = "latestHistogram")]
    pub macd_histogram: Option<f64>,
    #[serde(rename = "latestADX")]
    pub adx: Option<f64>,
    #[serde(rename = "latestPlusDI")]
    pub plus_di: Option<f64>,
    #[serde(rename = "latestMinusDI")]
    pub minus_di: Option<f64>,
    #[serde(rename = "latestSupertrend")]
    pub supertrend: Option<f64>,
    #[serde(rename = "latestSupertrendDirection")]
    pub supertrend_direction: Option<i8>,
    #[serde(rename = "latestUpperBand")]
    pub upper_band: Option<f64>,
    #[serde(rename = "latestMiddleBand")]
    pub middle_band: Option<f64>,
    #[serde(rename = "latestLowerBand")]
    pub lower_band: Option<f64>,
    #[serde(rename = "latestVWAP")]
    pub vwap: Option<f64>,
    #[serde(rename = "latestWilliamsR")]
    pub williams_r: Option<f64>,
    #[serde(rename = "latestPSAR")]
    pub psar: Option<f64>,
    #[serde(rename = "latestTenkanSen")]
    pub tenkan_sen: Option<f64>,
    #[serde(rename = "latestKijunSen")]
    pub kijun_sen: Option<f64>,
    #[serde(rename = "latestSenkouSpanA")]
    pub senkou_span_a: Option<f64>,
    #[serde(rename = "latestSenkouSpanB")]
    pub senkou_span_b: Option<f64>,
    #[serde(rename = "latestChikouSpan")]
    pub chikou_span: Option<f64>,
    #[serde(rename = "latestATR")]
    pub atr: Option<f64>,
}

impl LatestValues {
    pub fn from_readings(readings: &BTreeMap<IndicatorKind, IndicatorValue>) -> Self {
        let mut latest = LatestValues::default();
        for (kind, value) in readings {
            match (*kind, value) {
                (IndicatorKind::Rsi, IndicatorValue::Simple(v)) => latest.rsi = Some(round2(*v)),
                (IndicatorKind::Ema, IndicatorValue::Simple(v)) => latest.ema = Some(round2(*v)),
                (IndicatorKind::Sma, IndicatorValue::Simple(v)) => latest.sma = Some(round2(*v)),
                (
                    IndicatorKind::Macd,
                    IndicatorValue::Macd {
                        line,
                        signal,
                        histogram,
                    },
                ) => {
                    latest.macd = Some(round2(*line));
                    latest.macd_signal = Some(round2(*signal));
                    latest.macd_histogram = Some(round2(*histogram));
                }
                (
                    IndicatorKind::Adx,
                    IndicatorValue::Adx {
                        adx,
                        plus_di,
                        minus_di,
                    },
                ) => {
                    latest.adx = Some(round2(*adx));
                    latest.plus_di = Some(round2(*plus_di));
                    latest.minus_di = Some(round2(*minus_di));
                }
                (IndicatorKind::Supertrend, IndicatorValue::Supertrend { line, direction }) => {
                    latest.supertrend = Some(round2(*line));
                    latest.supertrend_direction = Some(direction.as_i8());
                }
                (
                    IndicatorKind::BollingerBands,
                    IndicatorValue::Bollinger {
                        upper,
                        middle,
                        lower,
                    },
                ) => {
                    latest.upper_band = Some(round2(*upper));
                    latest.middle_band = Some(round2(*middle));
                    latest.lower_band = Some(round2(*lower));
                }
                (IndicatorKind::Vwap, IndicatorValue::Vwap { vwap, .. }) => {
                    latest.vwap = Some(round2(*vwap));
                }
                (IndicatorKind::WilliamsR, IndicatorValue::Simple(v)) => {
                    latest.williams_r = Some(round2(*v));
                }
                (IndicatorKind::Psar, IndicatorValue::Simple(v)) => latest.psar = Some(round2(*v)),
                (
                    IndicatorKind::Ichimoku,
                    IndicatorValue::Ichimoku {
                        conversion,
                        base,
                        span_a,
                        span_b,
                        lagging,
                        ..
                    },
                ) => {
                    latest.tenkan_sen = Some(round2(*conversion));
                    latest.kijun_sen = Some(round2(*base));
                    latest.senkou_span_a = round2_opt(*span_a);
                    latest.senkou_span_b = round2_opt(*span_b);
                    latest.chikou_span = round2_opt(*lagging);
                }
                (IndicatorKind::Atr, IndicatorValue::Simple(v)) => latest.atr = Some(round2(*v)),
                _ => {}
            }
        }
        latest
    }
}

/// Rounds every defined entry of a history line.
pub fn round_series(series: &[Option<f64>]) -> Series {
    series.iter().map(|v| round2_opt(*v)).collect()
}
