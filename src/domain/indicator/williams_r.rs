//! Williams %R.
//!
//! %R = 100 * (close - highest high) / (highest high - lowest low) over the
//! trailing window, current bar included; 0 when the range is 0.
//! Values lie in [-100, 0].

use crate::domain::error::IndicatorError;
use crate::domain::indicator_helpers::{self, Series, check_same_len};

pub fn calculate_williams_r(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    length: usize,
) -> Result<Series, IndicatorError> {
    check_same_len(high.len(), close.len())?;
    let hh = indicator_helpers::highest(high, length)?;
    let ll = indicator_helpers::lowest(low, length)?;

    Ok(close
        .iter()
        .zip(hh.iter().zip(&ll))
        .map(|(c, (h, l))| {
            let (h, l) = ((*h)?, (*l)?);
            Some(if h == l { 0.0 } else { 100.0 * (c - h) / (h - l) })
        })
        .collect())
}
