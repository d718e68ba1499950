//! RSI (Relative Strength Index).
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - Seed: simple mean of the gains/losses over the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! The seed itself is not reported: the first value appears one smoothing
//! step later, at bar index n+1, so at least n+2 closes are required.

use crate::domain::error::IndicatorError;
use crate::domain::indicator_helpers::Series;

pub fn calculate_rsi(closes: &[f64], period: usize) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("rsi period", period)?;
    IndicatorError::require(period + 2, closes.len())?;

    let mut gains = 0.0;
    let mut losses = 0.0;
    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            gains += change;
        } else {
            losses -= change;
        }
    }

    let n = period as f64;
    let mut avg_gain = gains / n;
    let mut avg_loss = losses / n;

    let mut values = vec![None; closes.len()];
    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        avg_gain = (avg_gain * (n - 1.0) + gain) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss) / n;

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        };
        values[i] = Some(rsi);
    }

    Ok(values)
}
