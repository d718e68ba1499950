//! Cumulative VWAP with three band tiers.
//!
//! VWAP[i] = Σ(typical price * volume) / Σ volume over bars 0..=i.
//! From the second bar on, each tier k has bands `vwap ± basis * mult[k]`
//! where basis is either the population standard deviation of the typical
//! prices so far around the current VWAP, or 1% of the VWAP.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::IndicatorError;
use crate::domain::indicator_helpers::{Series, check_same_len};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VwapBandMode {
    #[default]
    StandardDeviation,
    Percent,
}

impl fmt::Display for VwapBandMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VwapBandMode::StandardDeviation => write!(f, "stdev"),
            VwapBandMode::Percent => write!(f, "percent"),
        }
    }
}

impl FromStr for VwapBandMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdev" | "standard deviation" => Ok(VwapBandMode::StandardDeviation),
            "percent" | "percentage" => Ok(VwapBandMode::Percent),
            other => Err(format!("unknown VWAP band mode {other}")),
        }
    }
}

/// Upper and lower line of one band tier.
#[derive(Debug, Clone, PartialEq)]
pub struct VwapBand {
    pub upper: Series,
    pub lower: Series,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VwapOutput {
    pub vwap: Vec<f64>,
    pub bands: [VwapBand; 3],
}

pub fn calculate_vwap(
    typical_prices: &[f64],
    volumes: &[f64],
    mode: VwapBandMode,
    mults: [f64; 3],
) -> Result<VwapOutput, IndicatorError> {
    check_same_len(typical_prices.len(), volumes.len())?;
    IndicatorError::require(1, typical_prices.len())?;

    let len = typical_prices.len();
    let mut vwap = Vec::with_capacity(len);
    let mut bands: [VwapBand; 3] = std::array::from_fn(|_| VwapBand {
        upper: vec![None; len],
        lower: vec![None; len],
    });

    let mut cum_pv = 0.0;
    let mut cum_volume = 0.0;
    let mut sum_p = 0.0;
    let mut sum_p2 = 0.0;

    for (i, (&p, &v)) in typical_prices.iter().zip(volumes).enumerate() {
        cum_pv += p * v;
        cum_volume += v;
        sum_p += p;
        sum_p2 += p * p;
        if cum_volume == 0.0 {
            return Err(IndicatorError::NonFinite);
        }
        let mean = cum_pv / cum_volume;
        vwap.push(mean);

        if i == 0 {
            continue;
        }
        let basis = match mode {
            VwapBandMode::StandardDeviation => {
                let n = (i + 1) as f64;
                // Σ(p - m)² expanded; clamp rounding noise below zero
                let variance = (sum_p2 - 2.0 * mean * sum_p + n * mean * mean) / n;
                variance.max(0.0).sqrt()
            }
            VwapBandMode::Percent => mean * 0.01,
        };
        for (band, mult) in bands.iter_mut().zip(mults) {
            band.upper[i] = Some(mean + basis * mult);
            band.lower[i] = Some(mean - basis * mult);
        }
    }

    Ok(VwapOutput { vwap, bands })
}
