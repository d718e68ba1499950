//! Bollinger Bands.
//!
//! Middle Band = MA(close, length) for the chosen [`MaKind`]
//! Upper Band = Middle + mult * StdDev
//! Lower Band = Middle - mult * StdDev
//!
//! StdDev is the population standard deviation of the trailing window
//! (current bar included) around the middle band.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::MaKind;
use crate::domain::indicator_helpers::{self, Series};

#[derive(Debug, Clone, PartialEq)]
pub struct BollingerOutput {
    pub upper: Series,
    pub middle: Series,
    pub lower: Series,
}

pub fn calculate_bollinger(
    closes: &[f64],
    length: usize,
    ma: MaKind,
    mult: f64,
) -> Result<BollingerOutput, IndicatorError> {
    if !(mult.is_finite() && mult > 0.0) {
        return Err(IndicatorError::InvalidParameter {
            name: "bollinger mult",
            reason: format!("must be positive, got {mult}"),
        });
    }
    let middle = ma.apply(closes, length)?;
    let stddev = indicator_helpers::window_stddev(closes, &middle, length)?;

    let (upper, lower) = middle
        .iter()
        .zip(&stddev)
        .map(|(m, sd)| match (m, sd) {
            (Some(m), Some(sd)) => (Some(m + mult * sd), Some(m - mult * sd)),
            _ => (None, None),
        })
        .unzip();

    Ok(BollingerOutput {
        upper,
        middle,
        lower,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator_helpers::defined_len;
    use approx::assert_relative_eq;

    #[test]
    fn bollinger_warmup_and_length() {
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let out = calculate_bollinger(&closes, 20, MaKind::Sma, 2.0).unwrap();
        assert_eq!(out.upper.len(), 25);
        assert!(out.middle[18].is_none());
        assert!(out.middle[19].is_some());
        assert_eq!(defined_len(&out.lower), 25 - 19);
    }

    #[test]
    fn bollinger_constant_prices_collapse_bands() {
        let closes = vec![50.0; 20];
        let out = calculate_bollinger(&closes, 20, MaKind::Sma, 2.0).unwrap();
        assert_eq!(out.upper[19], Some(50.0));
        assert_eq!(out.middle[19], Some(50.0));
        assert_eq!(out.lower[19], Some(50.0));
    }

    #[test]
    fn bollinger_known_values() {
        // mean 20, population variance 200/3
        let closes = [10.0, 20.0, 30.0];
        let out = calculate_bollinger(&closes, 3, MaKind::Sma, 2.0).unwrap();
        let sd = (200.0_f64 / 3.0).sqrt();
        assert_relative_eq!(out.upper[2].unwrap(), 20.0 + 2.0 * sd);
        assert_relative_eq!(out.lower[2].unwrap(), 20.0 - 2.0 * sd);
    }

    #[test]
    fn bollinger_bands_are_symmetric() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        for ma in [MaKind::Sma, MaKind::Ema, MaKind::Rma, MaKind::Wma] {
            let out = calculate_bollinger(&closes, 10, ma, 2.0).unwrap();
            for i in 9..30 {
                let (u, m, l) = (out.upper[i].unwrap(), out.middle[i].unwrap(), out.lower[i].unwrap());
                assert_relative_eq!(u - m, m - l, epsilon = 1e-9);
                assert!(u >= m && m >= l);
            }
        }
    }

    #[test]
    fn ema_middle_band_seeded_with_window_average() {
        let out = calculate_bollinger(&[1.0, 2.0, 3.0, 10.0], 3, MaKind::Ema, 2.0).unwrap();
        assert_eq!(out.middle[1], None);
        assert_relative_eq!(out.middle[2].unwrap(), 2.0);
        // alpha = 2 / (3 + 1)
        assert_relative_eq!(out.middle[3].unwrap(), 0.5 * 10.0 + 0.5 * 2.0);
    }

    #[test]
    fn bollinger_insufficient_data() {
        assert_eq!(
            calculate_bollinger(&[1.0, 2.0], 20, MaKind::Sma, 2.0),
            Err(IndicatorError::InsufficientData { need: 20, have: 2 })
        );
    }
}
