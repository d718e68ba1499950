//! Indicator parameters and the data length each indicator needs.

use crate::domain::indicator::vwap::VwapBandMode;
use crate::domain::indicator::{IndicatorKind, MaKind};

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub rsi_period: usize,
    pub ema_period: usize,
    pub sma_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub macd_source_ma: MaKind,
    pub macd_signal_ma: MaKind,
    pub adx_di_length: usize,
    pub adx_length: usize,
    pub supertrend_atr_period: usize,
    pub supertrend_factor: f64,
    pub bollinger_length: usize,
    pub bollinger_ma: MaKind,
    pub bollinger_mult: f64,
    pub vwap_band_mode: VwapBandMode,
    pub vwap_band_mults: [f64; 3],
    pub williams_length: usize,
    pub psar_start: f64,
    pub psar_increment: f64,
    pub psar_max: f64,
    pub ichimoku_conversion: usize,
    pub ichimoku_base: usize,
    pub ichimoku_span_b: usize,
    pub ichimoku_displacement: usize,
    pub atr_period: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            rsi_period: 14,
            ema_period: 9,
            sma_period: 20,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            macd_source_ma: MaKind::Ema,
            macd_signal_ma: MaKind::Ema,
            adx_di_length: 14,
            adx_length: 14,
            supertrend_atr_period: 10,
            supertrend_factor: 3.0,
            bollinger_length: 20,
            bollinger_ma: MaKind::Sma,
            bollinger_mult: 2.0,
            vwap_band_mode: VwapBandMode::StandardDeviation,
            vwap_band_mults: [1.0, 2.0, 3.0],
            williams_length: 14,
            psar_start: 0.02,
            psar_increment: 0.02,
            psar_max: 0.2,
            ichimoku_conversion: 9,
            ichimoku_base: 26,
            ichimoku_span_b: 52,
            ichimoku_displacement: 26,
            atr_period: 14,
        }
    }
}

impl IndicatorParams {
    /// Fewest bars for which `kind` produces a latest value.
    pub fn minimum_bars(&self, kind: IndicatorKind) -> usize {
        match kind {
            IndicatorKind::Rsi => self.rsi_period + 2,
            IndicatorKind::Ema => self.ema_period,
            IndicatorKind::Sma => self.sma_period,
            IndicatorKind::Macd => self.macd_fast.max(self.macd_slow) + self.macd_signal,
            IndicatorKind::Adx => self.adx_di_length + self.adx_length,
            IndicatorKind::Supertrend => self.supertrend_atr_period + 1,
            IndicatorKind::BollingerBands => self.bollinger_length,
            IndicatorKind::Vwap => 1,
            IndicatorKind::WilliamsR => self.williams_length,
            IndicatorKind::Psar => 2,
            IndicatorKind::Ichimoku => self
                .ichimoku_conversion
                .max(self.ichimoku_base)
                .max(self.ichimoku_span_b),
            IndicatorKind::Atr => self.atr_period + 1,
        }
    }

    /// Bars needed for every indicator to compute (52 with the defaults).
    pub fn full_coverage_bars(&self) -> usize {
        IndicatorKind::ALL
            .into_iter()
            .map(|kind| self.minimum_bars(kind))
            .max()
            .unwrap_or(0)
    }
}
