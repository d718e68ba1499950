//! Parabolic SAR.
//!
//! Starts in an uptrend with SAR and the extreme point at the first low.
//! Each bar the SAR moves `af * (ep - sar)` toward the extreme point.
//! Penetration by the current bar flips the trend: the SAR jumps to the old
//! extreme point, the extreme point resets to the current bar and `af`
//! returns to `start`. Otherwise a new extreme raises `af` by `increment`
//! up to `max`, and the SAR is clamped so it never enters the current or
//! previous bar's range.

use crate::domain::error::IndicatorError;
use crate::domain::indicator_helpers::check_same_len;

pub fn calculate_psar(
    high: &[f64],
    low: &[f64],
    start: f64,
    increment: f64,
    max: f64,
) -> Result<Vec<f64>, IndicatorError> {
    check_same_len(high.len(), low.len())?;
    validate_factors(start, increment, max)?;
    IndicatorError::require(2, high.len())?;

    let mut sar = Vec::with_capacity(high.len());
    let mut ep = low[0];
    let mut af = start;
    let mut uptrend = true;
    sar.push(low[0]);

    for i in 1..high.len() {
        let prev = sar[i - 1];
        let mut next = prev + af * (ep - prev);
        if uptrend {
            if next > low[i] {
                uptrend = false;
                next = ep;
                ep = high[i];
                af = start;
            } else {
                if high[i] > ep {
                    ep = high[i];
                    af = (af + increment).min(max);
                }
                next = next.min(low[i]).min(low[i - 1]);
            }
        } else if next < high[i] {
            uptrend = true;
            next = ep;
            ep = low[i];
            af = start;
        } else {
            if low[i] < ep {
                ep = low[i];
                af = (af + increment).min(max);
            }
            next = next.max(high[i]).max(high[i - 1]);
        }
        sar.push(next);
    }

    Ok(sar)
}

fn validate_factors(start: f64, increment: f64, max: f64) -> Result<(), IndicatorError> {
    let invalid = |name, reason: &str| IndicatorError::InvalidParameter {
        name,
        reason: reason.to_string(),
    };
    if !(start.is_finite() && start > 0.0) {
        return Err(invalid("psar start", "must be positive"));
    }
    if !(increment.is_finite() && increment >= 0.0) {
        return Err(invalid("psar increment", "must not be negative"));
    }
    if !(max.is_finite() && max >= start) {
        return Err(invalid("psar max", "must be at least the start factor"));
    }
    Ok(())
}
