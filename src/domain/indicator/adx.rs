//! ADX (Average Directional Index) with +DI / -DI.
//!
//! TR, +DM and -DM are Wilder-smoothed over `di_length`:
//! +DI = 100 * smoothed(+DM) / smoothed(TR), likewise -DI.
//! DX = 100 * |+DI - -DI| / (+DI + -DI), 0 when the sum is 0.
//! ADX = Wilder average of DX over `adx_length`.
//!
//! DI lines are first defined at bar `di_length`; ADX at bar
//! `di_length + adx_length - 1`.

use crate::domain::error::IndicatorError;
use crate::domain::indicator_helpers::{self, Series};

#[derive(Debug, Clone, PartialEq)]
pub struct AdxOutput {
    pub plus_di: Series,
    pub minus_di: Series,
    pub adx: Series,
}

pub fn calculate_adx(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    di_length: usize,
    adx_length: usize,
) -> Result<AdxOutput, IndicatorError> {
    IndicatorError::positive_period("adx di length", di_length)?;
    IndicatorError::positive_period("adx length", adx_length)?;
    IndicatorError::require(di_length + adx_length, high.len())?;

    let tr = indicator_helpers::true_range(high, low, close)?;
    let (plus_dm, minus_dm) = indicator_helpers::directional_movement(high, low)?;

    let smoothed_tr = indicator_helpers::rma(&tr, di_length)?;
    let smoothed_plus = indicator_helpers::rma(&plus_dm, di_length)?;
    let smoothed_minus = indicator_helpers::rma(&minus_dm, di_length)?;

    // Pair-based series start one bar late.
    let mut plus_di: Series = vec![None];
    let mut minus_di: Series = vec![None];
    for i in 0..tr.len() {
        let (Some(tr), Some(p), Some(m)) = (smoothed_tr[i], smoothed_plus[i], smoothed_minus[i])
        else {
            plus_di.push(None);
            minus_di.push(None);
            continue;
        };
        if tr == 0.0 {
            plus_di.push(Some(0.0));
            minus_di.push(Some(0.0));
        } else {
            plus_di.push(Some(p / tr * 100.0));
            minus_di.push(Some(m / tr * 100.0));
        }
    }

    let dx: Series = plus_di
        .iter()
        .zip(&minus_di)
        .map(|(p, m)| {
            let (p, m) = ((*p)?, (*m)?);
            let sum = p + m;
            Some(if sum == 0.0 {
                0.0
            } else {
                (p - m).abs() / sum * 100.0
            })
        })
        .collect();
    let adx = indicator_helpers::on_defined(&dx, adx_length, indicator_helpers::rma)?;

    Ok(AdxOutput {
        plus_di,
        minus_di,
        adx,
    })
}
