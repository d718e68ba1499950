//! Rolling-window series primitives shared by the indicators.
//!
//! Every windowed output is aligned to its input: index `i` of the result
//! belongs to input index `i`, and positions where the window has not yet
//! filled hold `None`. The only exceptions are [`true_range`] and
//! [`directional_movement`], which are defined on consecutive pairs and so
//! return one value fewer than their input.

use crate::domain::error::IndicatorError;

/// An indicator line aligned to its input; `None` until the window fills.
pub type Series = Vec<Option<f64>>;

/// Last element of a series, if it is defined.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Number of defined (non-`None`) entries.
pub fn defined_len(series: &[Option<f64>]) -> usize {
    series.iter().filter(|v| v.is_some()).count()
}

pub(crate) fn check_same_len(expected: usize, found: usize) -> Result<(), IndicatorError> {
    if expected != found {
        Err(IndicatorError::LengthMismatch { expected, found })
    } else {
        Ok(())
    }
}

/// Simple moving average. Running sum: add the entering element, drop the leaving one.
pub fn sma(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("period", period)?;
    IndicatorError::require(period, values.len())?;

    let mut out = vec![None; values.len()];
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    Ok(out)
}

/// Exponential moving average, alpha = 2/(n+1), seeded with the SMA of the first n values.
pub fn ema(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    let alpha = 2.0 / (period as f64 + 1.0);
    seeded_recurrence(values, period, |prev, x| alpha * x + (1.0 - alpha) * prev)
}

/// Wilder's running moving average: rma[i] = (rma[i-1]*(n-1) + x[i]) / n.
pub fn rma(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    let n = period as f64;
    seeded_recurrence(values, period, |prev, x| (prev * (n - 1.0) + x) / n)
}

fn seeded_recurrence(
    values: &[f64],
    period: usize,
    step: impl Fn(f64, f64) -> f64,
) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("period", period)?;
    IndicatorError::require(period, values.len())?;

    let mut out = vec![None; values.len()];
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);
    for i in period..values.len() {
        current = step(current, values[i]);
        out[i] = Some(current);
    }
    Ok(out)
}

/// Linearly weighted moving average, newest value weighted n.
///
/// O(n) sliding window: shifting the window subtracts the plain window sum
/// from the weighted sum before the new value enters with weight n.
pub fn wma(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("period", period)?;
    IndicatorError::require(period, values.len())?;

    let divisor = (period * (period + 1)) as f64 / 2.0;
    let mut out = vec![None; values.len()];
    let mut weighted_sum = 0.0;
    let mut window_sum = 0.0;

    for (i, &x) in values.iter().enumerate() {
        if i < period {
            weighted_sum += (i + 1) as f64 * x;
            window_sum += x;
        } else {
            weighted_sum += period as f64 * x - window_sum;
            window_sum += x - values[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(weighted_sum / divisor);
        }
    }
    Ok(out)
}

/// Applies a primitive to the defined suffix of `series` and realigns the result.
///
/// Used to smooth a derived line (MACD, DX) whose leading entries are still
/// warming up. A gap after the first defined value is reported as
/// [`IndicatorError::NonFinite`].
pub fn on_defined(
    series: &[Option<f64>],
    period: usize,
    primitive: fn(&[f64], usize) -> Result<Series, IndicatorError>,
) -> Result<Series, IndicatorError> {
    let start = series.iter().position(Option::is_some).unwrap_or(series.len());
    let defined: Vec<f64> = series[start..]
        .iter()
        .map(|v| v.ok_or(IndicatorError::NonFinite))
        .collect::<Result<_, _>>()?;

    let smoothed = primitive(&defined, period)?;
    let mut out = vec![None; start];
    out.extend(smoothed);
    Ok(out)
}

/// Population standard deviation of each trailing window around `means[i]`.
pub fn window_stddev(
    values: &[f64],
    means: &[Option<f64>],
    period: usize,
) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("period", period)?;
    check_same_len(values.len(), means.len())?;

    Ok(means
        .iter()
        .enumerate()
        .map(|(i, mean)| {
            let mean = (*mean)?;
            if i + 1 < period {
                return None;
            }
            let window = &values[i + 1 - period..=i];
            let variance = window
                .iter()
                .map(|x| {
                    let diff = x - mean;
                    diff * diff
                })
                .sum::<f64>()
                / period as f64;
            Some(variance.sqrt())
        })
        .collect())
}

/// max(high[i]-low[i], |high[i]-close[i-1]|, |low[i]-close[i-1]|) for i >= 1.
pub fn true_range(high: &[f64], low: &[f64], close: &[f64]) -> Result<Vec<f64>, IndicatorError> {
    check_same_len(high.len(), low.len())?;
    check_same_len(high.len(), close.len())?;
    IndicatorError::require(2, high.len())?;

    Ok((1..high.len())
        .map(|i| {
            let hl = high[i] - low[i];
            let hc = (high[i] - close[i - 1]).abs();
            let lc = (low[i] - close[i - 1]).abs();
            hl.max(hc).max(lc)
        })
        .collect())
}

/// +DM and -DM for each consecutive pair of bars.
pub fn directional_movement(
    high: &[f64],
    low: &[f64],
) -> Result<(Vec<f64>, Vec<f64>), IndicatorError> {
    check_same_len(high.len(), low.len())?;
    IndicatorError::require(2, high.len())?;

    Ok((1..high.len())
        .map(|i| {
            let up = high[i] - high[i - 1];
            let down = low[i - 1] - low[i];
            let plus = if up > down && up > 0.0 { up } else { 0.0 };
            let minus = if down > up && down > 0.0 { down } else { 0.0 };
            (plus, minus)
        })
        .unzip())
}

/// Average true range aligned to the bars; first defined at index `period`.
///
/// Seeded with the plain mean of the first `period` true ranges, then Wilder-smoothed.
pub fn atr(
    high: &[f64],
    low: &[f64],
    close: &[f64],
    period: usize,
) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("period", period)?;
    IndicatorError::require(period + 1, high.len())?;

    let tr = true_range(high, low, close)?;
    let smoothed = rma(&tr, period)?;
    let mut out = vec![None];
    out.extend(smoothed);
    Ok(out)
}

/// Highest value of each trailing window (inclusive of the current element).
pub fn highest(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    rolling(values, period, f64::max)
}

/// Lowest value of each trailing window (inclusive of the current element).
pub fn lowest(values: &[f64], period: usize) -> Result<Series, IndicatorError> {
    rolling(values, period, f64::min)
}

fn rolling(
    values: &[f64],
    period: usize,
    pick: fn(f64, f64) -> f64,
) -> Result<Series, IndicatorError> {
    IndicatorError::positive_period("period", period)?;
    IndicatorError::require(period, values.len())?;

    Ok((0..values.len())
        .map(|i| {
            (i + 1 >= period).then(|| {
                values[i + 1 - period..=i]
                    .iter()
                    .copied()
                    .reduce(pick)
                    .unwrap_or(values[i])
            })
        })
        .collect())
}

/// (highest high + lowest low) / 2 over each trailing window.
pub fn donchian_midpoint(
    high: &[f64],
    low: &[f64],
    period: usize,
) -> Result<Series, IndicatorError> {
    check_same_len(high.len(), low.len())?;
    let hh = highest(high, period)?;
    let ll = lowest(low, period)?;
    Ok(hh
        .iter()
        .zip(&ll)
        .map(|(h, l)| Some((h.as_ref()? + l.as_ref()?) / 2.0))
        .collect())
}
