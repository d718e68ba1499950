//! Technical indicator implementations.
//!
//! This module provides the types shared by all indicators:
//! - `IndicatorKind`: the twelve indicators the scanner knows about
//! - `IndicatorValue`: the latest value(s) of one indicator, per output shape
//! - `MaKind`: moving-average flavour selectable for MACD and Bollinger Bands
//! - `TrendDirection`: Supertrend state
//!
//! Each submodule computes full aligned series; the latest values are pulled
//! out by the registry.

pub mod adx;
pub mod bollinger;
pub mod ichimoku;
pub mod macd;
pub mod params;
pub mod psar;
pub mod rsi;
pub mod supertrend;
pub mod vwap;
pub mod williams_r;

use crate::domain::error::IndicatorError;
use crate::domain::indicator_helpers::{self, Series};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "EMA")]
    Ema,
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "ADX")]
    Adx,
    Supertrend,
    BollingerBands,
    #[serde(rename = "VWAP")]
    Vwap,
    WilliamsR,
    #[serde(rename = "PSAR")]
    Psar,
    Ichimoku,
    #[serde(rename = "ATR")]
    Atr,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 12] = [
        IndicatorKind::Rsi,
        IndicatorKind::Ema,
        IndicatorKind::Sma,
        IndicatorKind::Macd,
        IndicatorKind::Adx,
        IndicatorKind::Supertrend,
        IndicatorKind::BollingerBands,
        IndicatorKind::Vwap,
        IndicatorKind::WilliamsR,
        IndicatorKind::Psar,
        IndicatorKind::Ichimoku,
        IndicatorKind::Atr,
    ];

    /// Name used in requests and result records.
    pub fn name(self) -> &'static str {
        match self {
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Ema => "EMA",
            IndicatorKind::Sma => "SMA",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::Adx => "ADX",
            IndicatorKind::Supertrend => "Supertrend",
            IndicatorKind::BollingerBands => "BollingerBands",
            IndicatorKind::Vwap => "VWAP",
            IndicatorKind::WilliamsR => "WilliamsR",
            IndicatorKind::Psar => "PSAR",
            IndicatorKind::Ichimoku => "Ichimoku",
            IndicatorKind::Atr => "ATR",
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown indicator: {0}")]
pub struct UnknownIndicator(pub String);

impl FromStr for IndicatorKind {
    type Err = UnknownIndicator;

    /// Case-insensitive match on [`IndicatorKind::name`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        IndicatorKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownIndicator(trimmed.to_string()))
    }
}

/// Supertrend state: price trading above (`Up`) or below (`Down`) the trailing band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    /// +1 for `Up`, -1 for `Down`.
    pub fn as_i8(self) -> i8 {
        match self {
            TrendDirection::Up => 1,
            TrendDirection::Down => -1,
        }
    }
}

/// Moving-average flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaKind {
    Sma,
    Ema,
    /// Wilder's running average (also called SMMA).
    Rma,
    Wma,
}

impl MaKind {
    pub fn apply(self, values: &[f64], period: usize) -> Result<Series, IndicatorError> {
        match self {
            MaKind::Sma => indicator_helpers::sma(values, period),
            MaKind::Ema => indicator_helpers::ema(values, period),
            MaKind::Rma => indicator_helpers::rma(values, period),
            MaKind::Wma => indicator_helpers::wma(values, period),
        }
    }

    /// Same as [`MaKind::apply`] over the defined suffix of a derived line.
    pub fn apply_defined(self, series: &[Option<f64>], period: usize) -> Result<Series, IndicatorError> {
        let primitive: fn(&[f64], usize) -> Result<Series, IndicatorError> = match self {
            MaKind::Sma => indicator_helpers::sma,
            MaKind::Ema => indicator_helpers::ema,
            MaKind::Rma => indicator_helpers::rma,
            MaKind::Wma => indicator_helpers::wma,
        };
        indicator_helpers::on_defined(series, period, primitive)
    }
}

impl fmt::Display for MaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MaKind::Sma => "SMA",
            MaKind::Ema => "EMA",
            MaKind::Rma => "RMA",
            MaKind::Wma => "WMA",
        };
        f.write_str(name)
    }
}

impl FromStr for MaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SMA" => Ok(MaKind::Sma),
            "EMA" => Ok(MaKind::Ema),
            "RMA" | "SMMA" => Ok(MaKind::Rma),
            "WMA" => Ok(MaKind::Wma),
            other => Err(format!("unknown moving average {other}")),
        }
    }
}

/// Latest value(s) of one indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    /// RSI, EMA, SMA, Williams %R, Parabolic SAR and ATR.
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
    Adx {
        adx: f64,
        plus_di: f64,
        minus_di: f64,
    },
    Supertrend {
        line: f64,
        direction: TrendDirection,
    },
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Vwap {
        vwap: f64,
        /// (upper, lower) per band tier; absent on the first bar.
        bands: Option<[(f64, f64); 3]>,
    },
    /// Cloud and lagging-span values are read at the displaced reference
    /// bar and are `None` when the history does not reach back that far.
    Ichimoku {
        conversion: f64,
        base: f64,
        span_a: Option<f64>,
        span_b: Option<f64>,
        lagging: Option<f64>,
        lagging_reference: Option<f64>,
    },
}

impl IndicatorValue {
    /// The single value of a `Simple` reading.
    pub fn simple(&self) -> Option<f64> {
        match self {
            IndicatorValue::Simple(v) => Some(*v),
            _ => None,
        }
    }
}
