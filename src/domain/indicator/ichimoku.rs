//! Ichimoku Cloud.
//!
//! - Conversion line (Tenkan-sen): Donchian midpoint over `conversion` bars
//! - Base line (Kijun-sen): Donchian midpoint over `base` bars
//! - Leading span A (Senkou A): (conversion + base) / 2
//! - Leading span B (Senkou B): Donchian midpoint over `span_b` bars
//! - Lagging span (Chikou): close plotted `displacement - 1` bars back
//!
//! All lines are indexed by the bar they are computed on. The leading spans
//! are drawn `displacement` bars ahead, so the cloud under the latest bar is
//! the one computed at bar `len - displacement`. With the default lengths
//! span B first exists at bar 51, so the cloud is available from 77 bars on.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::IndicatorValue;
use crate::domain::indicator_helpers::{self, Series, check_same_len, latest};

#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuOutput {
    pub conversion: Series,
    pub base: Series,
    pub span_a: Series,
    pub span_b: Series,
    pub lagging: Series,
}

pub fn calculate_ichimoku(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    conversion: usize,
    base: usize,
    span_b: usize,
    displacement: usize,
) -> Result<IchimokuOutput, IndicatorError> {
    check_same_len(high.len(), close.len())?;
    IndicatorError::positive_period("ichimoku displacement", displacement)?;
    IndicatorError::require(conversion.max(base).max(span_b), high.len())?;

    let conversion_line = indicator_helpers::donchian_midpoint(high, low, conversion)?;
    let base_line = indicator_helpers::donchian_midpoint(high, low, base)?;
    let span_a = conversion_line
        .iter()
        .zip(&base_line)
        .map(|(c, b)| Some(((*c)? + (*b)?) / 2.0))
        .collect();
    let span_b = indicator_helpers::donchian_midpoint(high, low, span_b)?;

    let shift = displacement - 1;
    let lagging = (0..close.len())
        .map(|i| i.checked_sub(shift).map(|src| close[src]))
        .collect();

    Ok(IchimokuOutput {
        conversion: conversion_line,
        base: base_line,
        span_a,
        span_b,
        lagging,
    })
}

impl IchimokuOutput {
    /// Latest reading with the cloud taken from the displaced reference bar.
    ///
    /// `lagging_reference` is the close one bar before the lagging span's
    /// source bar, the price the lagging span is compared against.
    pub fn reading(&self, close: &[f64], displacement: usize) -> Option<IndicatorValue> {
        let conversion = latest(&self.conversion)?;
        let base = latest(&self.base)?;
        let reference = close.len().checked_sub(displacement);
        let at_reference = |series: &Series| reference.and_then(|i| series.get(i).copied().flatten());
        let lagging_reference = close
            .len()
            .checked_sub(displacement + 1)
            .map(|i| close[i]);

        Some(IndicatorValue::Ichimoku {
            conversion,
            base,
            span_a: at_reference(&self.span_a),
            span_b: at_reference(&self.span_b),
            lagging: latest(&self.lagging),
            lagging_reference,
        })
    }
}
