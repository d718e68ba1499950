//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = MA(fast) - MA(slow)
//! Signal Line = MA(signal) of the defined part of the MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! The source and signal averages are independently SMA or EMA (any
//! [`MaKind`] is accepted). Default parameters: fast=12, slow=26, signal=9.
//! Minimum length: slow + signal.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::MaKind;
use crate::domain::indicator_helpers::Series;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct MacdOutput {
    pub macd: Series,
    pub signal: Series,
    pub histogram: Series,
}

pub fn calculate_macd(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
    source_ma: MaKind,
    signal_ma: MaKind,
) -> Result<MacdOutput, IndicatorError> {
    IndicatorError::positive_period("macd fast", fast)?;
    IndicatorError::positive_period("macd slow", slow)?;
    IndicatorError::positive_period("macd signal", signal_period)?;
    IndicatorError::require(fast.max(slow) + signal_period, closes.len())?;

    let fast_ma = source_ma.apply(closes, fast)?;
    let slow_ma = source_ma.apply(closes, slow)?;

    let macd: Series = fast_ma
        .iter()
        .zip(&slow_ma)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();
    let signal = signal_ma.apply_defined(&macd, signal_period)?;
    let histogram = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    Ok(MacdOutput {
        macd,
        signal,
        histogram,
    })
}
