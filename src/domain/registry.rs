//! Static indicator registry.
//!
//! One entry per [`IndicatorKind`], in [`IndicatorKind::ALL`] order, carrying
//! the aggregation weight, whether a failure skips the whole instrument,
//! the computation and the decision rule. Callers iterate the table; nothing
//! is looked up by display name.

use crate::domain::decision::{self, Decision, IchimokuSignals, MarketContext};
use crate::domain::error::IndicatorError;
use crate::domain::indicator::params::IndicatorParams;
use crate::domain::indicator::{
    IndicatorKind, IndicatorValue, adx, bollinger, ichimoku, macd, psar, rsi, supertrend, vwap,
    williams_r,
};
use crate::domain::indicator_helpers::{self, Series};
use crate::domain::ohlcv::PriceSeries;

pub type ComputeFn = fn(&PriceSeries, &IndicatorParams) -> Result<IndicatorValue, IndicatorError>;
pub type DecideFn = fn(&IndicatorValue, &MarketContext) -> Option<Decision>;

pub struct IndicatorSpec {
    pub kind: IndicatorKind,
    pub weight: f64,
    /// A failed critical indicator skips the instrument instead of
    /// leaving its decision unavailable.
    pub critical: bool,
    pub compute: ComputeFn,
    pub decide: DecideFn,
}

impl IndicatorSpec {
    pub fn evaluate(
        &self,
        series: &PriceSeries,
        params: &IndicatorParams,
        ctx: &MarketContext,
    ) -> Result<(IndicatorValue, Option<Decision>), IndicatorError> {
        let value = (self.compute)(series, params)?;
        let decision = (self.decide)(&value, ctx);
        Ok((value, decision))
    }
}

impl std::fmt::Debug for IndicatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndicatorSpec")
            .field("kind", &self.kind)
            .field("weight", &self.weight)
            .field("critical", &self.critical)
            .finish_non_exhaustive()
    }
}

pub static REGISTRY: [IndicatorSpec; 12] = [
    IndicatorSpec {
        kind: IndicatorKind::Rsi,
        weight: 1.0,
        critical: true,
        compute: compute_rsi,
        decide: decide_rsi,
    },
    IndicatorSpec {
        kind: IndicatorKind::Ema,
        weight: 1.5,
        critical: false,
        compute: compute_ema,
        decide: decide_trend,
    },
    IndicatorSpec {
        kind: IndicatorKind::Sma,
        weight: 1.5,
        critical: false,
        compute: compute_sma,
        decide: decide_trend,
    },
    IndicatorSpec {
        kind: IndicatorKind::Macd,
        weight: 1.0,
        critical: true,
        compute: compute_macd,
        decide: decide_macd,
    },
    IndicatorSpec {
        kind: IndicatorKind::Adx,
        weight: 1.0,
        critical: true,
        compute: compute_adx,
        decide: decide_adx,
    },
    IndicatorSpec {
        kind: IndicatorKind::Supertrend,
        weight: 1.5,
        critical: true,
        compute: compute_supertrend,
        decide: decide_supertrend,
    },
    IndicatorSpec {
        kind: IndicatorKind::BollingerBands,
        weight: 1.0,
        critical: false,
        compute: compute_bollinger,
        decide: decide_bollinger,
    },
    IndicatorSpec {
        kind: IndicatorKind::Vwap,
        weight: 1.0,
        critical: false,
        compute: compute_vwap,
        decide: decide_vwap,
    },
    IndicatorSpec {
        kind: IndicatorKind::WilliamsR,
        weight: 1.0,
        critical: false,
        compute: compute_williams_r,
        decide: decide_williams_r,
    },
    IndicatorSpec {
        kind: IndicatorKind::Psar,
        weight: 1.0,
        critical: false,
        compute: compute_psar,
        decide: decide_psar,
    },
    IndicatorSpec {
        kind: IndicatorKind::Ichimoku,
        weight: 1.5,
        critical: false,
        compute: compute_ichimoku,
        decide: decide_ichimoku,
    },
    IndicatorSpec {
        kind: IndicatorKind::Atr,
        weight: 1.0,
        critical: false,
        compute: compute_atr,
        decide: decide_atr,
    },
];

/// Registry entry for `kind`.
pub fn spec(kind: IndicatorKind) -> &'static IndicatorSpec {
    &REGISTRY[kind as usize]
}

fn last_defined(series: &Series) -> Result<f64, IndicatorError> {
    indicator_helpers::latest(series).ok_or(IndicatorError::NonFinite)
}

fn compute_rsi(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let series = rsi::calculate_rsi(s.close(), p.rsi_period)?;
    Ok(IndicatorValue::Simple(last_defined(&series)?))
}

fn compute_ema(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let series = indicator_helpers::ema(s.close(), p.ema_period)?;
    Ok(IndicatorValue::Simple(last_defined(&series)?))
}

fn compute_sma(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let series = indicator_helpers::sma(s.close(), p.sma_period)?;
    Ok(IndicatorValue::Simple(last_defined(&series)?))
}

fn compute_macd(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let out = macd::calculate_macd(
        s.close(),
        p.macd_fast,
        p.macd_slow,
        p.macd_signal,
        p.macd_source_ma,
        p.macd_signal_ma,
    )?;
    Ok(IndicatorValue::Macd {
        line: last_defined(&out.macd)?,
        signal: last_defined(&out.signal)?,
        histogram: last_defined(&out.histogram)?,
    })
}

fn compute_adx(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let out = adx::calculate_adx(s.high(), s.low(), s.close(), p.adx_di_length, p.adx_length)?;
    Ok(IndicatorValue::Adx {
        adx: last_defined(&out.adx)?,
        plus_di: last_defined(&out.plus_di)?,
        minus_di: last_defined(&out.minus_di)?,
    })
}

fn compute_supertrend(
    s: &PriceSeries,
    p: &IndicatorParams,
) -> Result<IndicatorValue, IndicatorError> {
    let out = supertrend::calculate_supertrend(
        s.high(),
        s.low(),
        s.close(),
        p.supertrend_atr_period,
        p.supertrend_factor,
    )?;
    let direction = out
        .direction
        .last()
        .copied()
        .flatten()
        .ok_or(IndicatorError::NonFinite)?;
    Ok(IndicatorValue::Supertrend {
        line: last_defined(&out.line)?,
        direction,
    })
}

fn compute_bollinger(
    s: &PriceSeries,
    p: &IndicatorParams,
) -> Result<IndicatorValue, IndicatorError> {
    let out = bollinger::calculate_bollinger(
        s.close(),
        p.bollinger_length,
        p.bollinger_ma,
        p.bollinger_mult,
    )?;
    Ok(IndicatorValue::Bollinger {
        upper: last_defined(&out.upper)?,
        middle: last_defined(&out.middle)?,
        lower: last_defined(&out.lower)?,
    })
}

fn compute_vwap(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let out = vwap::calculate_vwap(
        &s.typical_prices(),
        s.volume(),
        p.vwap_band_mode,
        p.vwap_band_mults,
    )?;
    let last = out.vwap.len() - 1;
    let vwap = out.vwap[last];
    let bands = out
        .bands
        .iter()
        .map(|band| Some((band.upper[last]?, band.lower[last]?)))
        .collect::<Option<Vec<_>>>()
        .and_then(|tiers| <[(f64, f64); 3]>::try_from(tiers).ok());
    Ok(IndicatorValue::Vwap { vwap, bands })
}

fn compute_williams_r(
    s: &PriceSeries,
    p: &IndicatorParams,
) -> Result<IndicatorValue, IndicatorError> {
    let series = williams_r::calculate_williams_r(s.high(), s.low(), s.close(), p.williams_length)?;
    Ok(IndicatorValue::Simple(last_defined(&series)?))
}

fn compute_psar(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let sar = psar::calculate_psar(s.high(), s.low(), p.psar_start, p.psar_increment, p.psar_max)?;
    sar.last()
        .copied()
        .map(IndicatorValue::Simple)
        .ok_or(IndicatorError::NonFinite)
}

fn compute_ichimoku(
    s: &PriceSeries,
    p: &IndicatorParams,
) -> Result<IndicatorValue, IndicatorError> {
    let out = ichimoku::calculate_ichimoku(
        s.high(),
        s.low(),
        s.close(),
        p.ichimoku_conversion,
        p.ichimoku_base,
        p.ichimoku_span_b,
        p.ichimoku_displacement,
    )?;
    out.reading(s.close(), p.ichimoku_displacement)
        .ok_or(IndicatorError::NonFinite)
}

fn compute_atr(s: &PriceSeries, p: &IndicatorParams) -> Result<IndicatorValue, IndicatorError> {
    let series = indicator_helpers::atr(s.high(), s.low(), s.close(), p.atr_period)?;
    Ok(IndicatorValue::Simple(last_defined(&series)?))
}

fn decide_rsi(value: &IndicatorValue, _: &MarketContext) -> Option<Decision> {
    value.simple().map(decision::rsi)
}

fn decide_trend(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    let ma = value.simple()?;
    Some(decision::price_vs_level(ctx.price, ma, decision::TREND_BANDS))
}

fn decide_macd(value: &IndicatorValue, _: &MarketContext) -> Option<Decision> {
    match *value {
        IndicatorValue::Macd { line, signal, .. } => Some(decision::macd(line, signal)),
        _ => None,
    }
}

fn decide_adx(value: &IndicatorValue, _: &MarketContext) -> Option<Decision> {
    match *value {
        IndicatorValue::Adx {
            adx,
            plus_di,
            minus_di,
        } => Some(decision::adx(adx, plus_di, minus_di)),
        _ => None,
    }
}

fn decide_supertrend(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    match *value {
        IndicatorValue::Supertrend { line, direction } => {
            Some(decision::supertrend(ctx.price, line, direction))
        }
        _ => None,
    }
}

fn decide_bollinger(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    match *value {
        IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
        } => Some(decision::bollinger(ctx.price, upper, middle, lower)),
        _ => None,
    }
}

fn decide_vwap(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    match *value {
        IndicatorValue::Vwap { vwap, .. } => Some(decision::price_vs_level(
            ctx.price,
            vwap,
            decision::VWAP_BANDS,
        )),
        _ => None,
    }
}

fn decide_williams_r(value: &IndicatorValue, _: &MarketContext) -> Option<Decision> {
    value.simple().map(decision::williams_r)
}

fn decide_psar(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    let sar = value.simple()?;
    Some(decision::psar(ctx.price, sar, ctx.prev_close?))
}

fn decide_ichimoku(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    match *value {
        IndicatorValue::Ichimoku {
            conversion,
            base,
            span_a,
            span_b,
            lagging,
            lagging_reference,
        } => Some(decision::ichimoku(
            ctx.price,
            IchimokuSignals {
                conversion,
                base,
                span_a: span_a?,
                span_b: span_b?,
                lagging: lagging?,
                lagging_reference,
            },
        )),
        _ => None,
    }
}

fn decide_atr(value: &IndicatorValue, ctx: &MarketContext) -> Option<Decision> {
    let atr = value.simple()?;
    Some(decision::atr(ctx.price, atr, ctx.ema?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::TrendDirection;

    #[test]
    fn registry_follows_kind_order() {
        for (entry, kind) in REGISTRY.iter().zip(IndicatorKind::ALL) {
            assert_eq!(entry.kind, kind);
            assert_eq!(spec(kind).kind, kind);
        }
    }

    #[test]
    fn weights() {
        let heavy: Vec<_> = REGISTRY
            .iter()
            .filter(|s| s.weight == 1.5)
            .map(|s| s.kind)
            .collect();
        assert_eq!(
            heavy,
            vec![
                IndicatorKind::Ema,
                IndicatorKind::Sma,
                IndicatorKind::Supertrend,
                IndicatorKind::Ichimoku
            ]
        );
        assert!(REGISTRY.iter().all(|s| s.weight == 1.0 || s.weight == 1.5));
    }

    #[test]
    fn critical_set() {
        let critical: Vec<_> = REGISTRY
            .iter()
            .filter(|s| s.critical)
            .map(|s| s.kind)
            .collect();
        assert_eq!(
            critical,
            vec![
                IndicatorKind::Rsi,
                IndicatorKind::Macd,
                IndicatorKind::Adx,
                IndicatorKind::Supertrend
            ]
        );
    }

    #[test]
    fn context_dependent_rules_are_unavailable_without_context() {
        let ctx = MarketContext {
            price: 100.0,
            prev_close: None,
            ema: None,
        };
        let simple = IndicatorValue::Simple(3.0);
        assert_eq!((spec(IndicatorKind::Psar).decide)(&simple, &ctx), None);
        assert_eq!((spec(IndicatorKind::Atr).decide)(&simple, &ctx), None);
    }

    #[test]
    fn ichimoku_without_cloud_is_unavailable() {
        let ctx = MarketContext {
            price: 100.0,
            prev_close: Some(99.0),
            ema: Some(98.0),
        };
        let value = IndicatorValue::Ichimoku {
            conversion: 101.0,
            base: 99.0,
            span_a: Some(95.0),
            span_b: None,
            lagging: Some(100.0),
            lagging_reference: Some(90.0),
        };
        assert_eq!((spec(IndicatorKind::Ichimoku).decide)(&value, &ctx), None);
    }

    #[test]
    fn mismatched_value_shape_is_unavailable() {
        let ctx = MarketContext {
            price: 100.0,
            prev_close: None,
            ema: None,
        };
        let value = IndicatorValue::Supertrend {
            line: 90.0,
            direction: TrendDirection::Up,
        };
        assert_eq!((spec(IndicatorKind::Macd).decide)(&value, &ctx), None);
        assert_eq!(
            (spec(IndicatorKind::Supertrend).decide)(&value, &ctx),
            Some(Decision::Buy)
        );
    }
}
