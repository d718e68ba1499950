//! Supertrend.
//!
//! Basic bands are `hl2 ± factor * ATR`. The final upper band only moves
//! down (and the final lower band only up) while price stays on the same
//! side of it; a close through the active band flips the direction.
//! The line is the lower band in an uptrend and the upper band in a
//! downtrend. The first value, at bar `atr_period`, starts as an uptrend.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::TrendDirection;
use crate::domain::indicator_helpers::{self, Series};

#[derive(Debug, Clone, PartialEq)]
pub struct SupertrendOutput {
    pub line: Series,
    pub direction: Vec<Option<TrendDirection>>,
}

pub fn calculate_supertrend(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    atr_period: usize,
    factor: f64,
) -> Result<SupertrendOutput, IndicatorError> {
    if !(factor.is_finite() && factor > 0.0) {
        return Err(IndicatorError::InvalidParameter {
            name: "supertrend factor",
            reason: format!("must be positive, got {factor}"),
        });
    }
    let atr = indicator_helpers::atr(high, low, close, atr_period)?;

    let len = close.len();
    let mut line = vec![None; len];
    let mut direction = vec![None; len];

    let mut final_upper = 0.0;
    let mut final_lower = 0.0;
    let mut trend = TrendDirection::Up;

    for i in atr_period..len {
        let Some(atr) = atr[i] else { continue };
        let mid = (high[i] + low[i]) / 2.0;
        let upper = mid + factor * atr;
        let lower = mid - factor * atr;

        if i == atr_period {
            final_upper = upper;
            final_lower = lower;
        } else {
            let prev_close = close[i - 1];
            if upper < final_upper || prev_close > final_upper {
                final_upper = upper;
            }
            if lower > final_lower || prev_close < final_lower {
                final_lower = lower;
            }
            trend = match trend {
                TrendDirection::Up if close[i] < final_lower => TrendDirection::Down,
                TrendDirection::Down if close[i] > final_upper => TrendDirection::Up,
                unchanged => unchanged,
            };
        }

        line[i] = Some(match trend {
            TrendDirection::Up => final_lower,
            TrendDirection::Down => final_upper,
        });
        direction[i] = Some(trend);
    }

    Ok(SupertrendOutput { line, direction })
}
