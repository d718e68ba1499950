//! Decision rules: latest indicator values to a five-level signal.
//!
//! Every rule is a pure function of already-extracted values. Thresholds
//! are strict comparisons; a value sitting exactly on a threshold falls
//! through to the next tier.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::indicator::TrendDirection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    #[serde(rename = "Strong Buy")]
    StrongBuy,
    Buy,
    Neutral,
    Sell,
    #[serde(rename = "Strong Sell")]
    StrongSell,
}

impl Decision {
    /// Signed score: +2 for Strong Buy down to -2 for Strong Sell.
    pub fn score(self) -> i8 {
        match self {
            Decision::StrongBuy => 2,
            Decision::Buy => 1,
            Decision::Neutral => 0,
            Decision::Sell => -1,
            Decision::StrongSell => -2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Decision::StrongBuy => "Strong Buy",
            Decision::Buy => "Buy",
            Decision::Neutral => "Neutral",
            Decision::Sell => "Sell",
            Decision::StrongSell => "Strong Sell",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Price context shared by the rules that compare against the market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketContext {
    pub price: f64,
    pub prev_close: Option<f64>,
    /// Latest EMA of the configured trend period, used by the ATR rule.
    pub ema: Option<f64>,
}

/// Price distance bands around a moving level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelBands {
    pub strong_above: f64,
    pub strong_below: f64,
}

pub const TREND_BANDS: LevelBands = LevelBands {
    strong_above: 1.05,
    strong_below: 0.95,
};

pub const VWAP_BANDS: LevelBands = LevelBands {
    strong_above: 1.03,
    strong_below: 0.97,
};

pub fn rsi(rsi: f64) -> Decision {
    if rsi < 20.0 {
        Decision::StrongBuy
    } else if rsi < 30.0 {
        Decision::Buy
    } else if rsi > 80.0 {
        Decision::StrongSell
    } else if rsi > 70.0 {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}

/// Price against a moving level (EMA, SMA, VWAP).
pub fn price_vs_level(price: f64, level: f64, bands: LevelBands) -> Decision {
    if price > level * bands.strong_above {
        Decision::StrongBuy
    } else if price > level {
        Decision::Buy
    } else if price < level * bands.strong_below {
        Decision::StrongSell
    } else if price < level {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}

pub fn macd(line: f64, signal: f64) -> Decision {
    let diff = line - signal;
    if line > signal && line > 0.0 && diff > line.abs() * 0.1 {
        Decision::StrongBuy
    } else if line > signal {
        Decision::Buy
    } else if line < signal && line < 0.0 && diff.abs() > line.abs() * 0.1 {
        Decision::StrongSell
    } else if line < signal {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}

pub fn adx(adx: f64, plus_di: f64, minus_di: f64) -> Decision {
    if adx > 40.0 && plus_di > minus_di {
        Decision::StrongBuy
    } else if adx > 25.0 && plus_di > minus_di {
        Decision::Buy
    } else if adx > 40.0 && minus_di > plus_di {
        Decision::StrongSell
    } else if adx > 25.0 && minus_di > plus_di {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}

pub fn supertrend(price: f64, line: f64, direction: TrendDirection) -> Decision {
    match direction {
        TrendDirection::Up if price > line => Decision::Buy,
        TrendDirection::Down if price < line => Decision::Sell,
        _ => Decision::Neutral,
    }
}

pub fn bollinger(price: f64, upper: f64, middle: f64, lower: f64) -> Decision {
    if price < lower {
        Decision::StrongBuy
    } else if price > upper {
        Decision::StrongSell
    } else if price < middle {
        Decision::Sell
    } else if price > middle {
        Decision::Buy
    } else {
        Decision::Neutral
    }
}

pub fn williams_r(r: f64) -> Decision {
    if r > -20.0 {
        Decision::StrongSell
    } else if r > -30.0 {
        Decision::Sell
    } else if r < -80.0 {
        Decision::StrongBuy
    } else if r < -70.0 {
        Decision::Buy
    } else {
        Decision::Neutral
    }
}

pub fn psar(price: f64, sar: f64, prev_close: f64) -> Decision {
    if price > sar && sar < prev_close {
        Decision::Buy
    } else if price < sar && sar > prev_close {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}

/// Values the Ichimoku rule reads, all taken at the latest bar except the
/// cloud, which comes from the displaced reference bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IchimokuSignals {
    pub conversion: f64,
    pub base: f64,
    pub span_a: f64,
    pub span_b: f64,
    pub lagging: f64,
    /// Close the lagging span is confirmed against; absent on short histories.
    pub lagging_reference: Option<f64>,
}

pub fn ichimoku(price: f64, s: IchimokuSignals) -> Decision {
    let cloud_top = s.span_a.max(s.span_b);
    let cloud_bottom = s.span_a.min(s.span_b);
    let lagging_above = s.lagging_reference.is_some_and(|r| s.lagging > r);
    let lagging_below = s.lagging_reference.is_some_and(|r| s.lagging < r);

    if price > cloud_top && s.conversion > s.base {
        if lagging_above {
            Decision::StrongBuy
        } else {
            Decision::Buy
        }
    } else if price < cloud_bottom && s.conversion < s.base {
        if lagging_below {
            Decision::StrongSell
        } else {
            Decision::Sell
        }
    } else {
        Decision::Neutral
    }
}

/// Volatility filtered by trend: quiet markets are neutral, volatile ones
/// follow the side of the EMA the price is on.
pub fn atr(price: f64, atr: f64, ema: f64) -> Decision {
    if atr < price * 0.01 {
        Decision::Neutral
    } else if price > ema && atr > price * 0.02 {
        Decision::Buy
    } else if price < ema && atr > price * 0.02 {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_scores() {
        assert_eq!(Decision::StrongBuy.score(), 2);
        assert_eq!(Decision::Neutral.score(), 0);
        assert_eq!(Decision::StrongSell.score(), -2);
    }

    #[test]
    fn decision_serializes_with_spaces() {
        assert_eq!(
            serde_json::to_string(&Decision::StrongBuy).unwrap(),
            "\"Strong Buy\""
        );
        let parsed: Decision = serde_json::from_str("\"Strong Sell\"").unwrap();
        assert_eq!(parsed, Decision::StrongSell);
    }

    #[test]
    fn rsi_thresholds() {
        assert_eq!(rsi(19.9), Decision::StrongBuy);
        assert_eq!(rsi(20.0), Decision::Buy);
        assert_eq!(rsi(30.0), Decision::Neutral);
        assert_eq!(rsi(70.0), Decision::Neutral);
        assert_eq!(rsi(70.1), Decision::Sell);
        assert_eq!(rsi(80.0), Decision::Sell);
        assert_eq!(rsi(100.0), Decision::StrongSell);
    }

    #[test]
    fn trend_bands() {
        assert_eq!(price_vs_level(106.0, 100.0, TREND_BANDS), Decision::StrongBuy);
        assert_eq!(price_vs_level(105.0, 100.0, TREND_BANDS), Decision::Buy);
        assert_eq!(price_vs_level(100.0, 100.0, TREND_BANDS), Decision::Neutral);
        assert_eq!(price_vs_level(96.0, 100.0, TREND_BANDS), Decision::Sell);
        assert_eq!(price_vs_level(94.0, 100.0, TREND_BANDS), Decision::StrongSell);
    }

    #[test]
    fn vwap_bands_are_tighter() {
        assert_eq!(price_vs_level(104.0, 100.0, VWAP_BANDS), Decision::StrongBuy);
        assert_eq!(price_vs_level(104.0, 100.0, TREND_BANDS), Decision::Buy);
        assert_eq!(price_vs_level(96.0, 100.0, VWAP_BANDS), Decision::StrongSell);
    }

    #[test]
    fn macd_strength_needs_ten_percent_gap() {
        assert_eq!(macd(2.0, 1.0), Decision::StrongBuy);
        assert_eq!(macd(2.0, 1.9), Decision::Buy);
        // above signal but negative line is never strong
        assert_eq!(macd(-1.0, -2.0), Decision::Buy);
        assert_eq!(macd(-2.0, -1.0), Decision::StrongSell);
        assert_eq!(macd(-2.0, -1.9), Decision::Sell);
        assert_eq!(macd(1.0, 2.0), Decision::Sell);
        assert_eq!(macd(1.0, 1.0), Decision::Neutral);
    }

    #[test]
    fn adx_needs_trend_strength() {
        assert_eq!(adx(45.0, 30.0, 10.0), Decision::StrongBuy);
        assert_eq!(adx(30.0, 30.0, 10.0), Decision::Buy);
        assert_eq!(adx(45.0, 10.0, 30.0), Decision::StrongSell);
        assert_eq!(adx(30.0, 10.0, 30.0), Decision::Sell);
        assert_eq!(adx(20.0, 30.0, 10.0), Decision::Neutral);
        assert_eq!(adx(45.0, 20.0, 20.0), Decision::Neutral);
    }

    #[test]
    fn supertrend_rule() {
        assert_eq!(supertrend(110.0, 100.0, TrendDirection::Up), Decision::Buy);
        assert_eq!(supertrend(90.0, 100.0, TrendDirection::Down), Decision::Sell);
        assert_eq!(supertrend(90.0, 100.0, TrendDirection::Up), Decision::Neutral);
    }

    #[test]
    fn bollinger_rule() {
        assert_eq!(bollinger(89.0, 110.0, 100.0, 90.0), Decision::StrongBuy);
        assert_eq!(bollinger(111.0, 110.0, 100.0, 90.0), Decision::StrongSell);
        assert_eq!(bollinger(95.0, 110.0, 100.0, 90.0), Decision::Sell);
        assert_eq!(bollinger(105.0, 110.0, 100.0, 90.0), Decision::Buy);
        assert_eq!(bollinger(100.0, 110.0, 100.0, 90.0), Decision::Neutral);
    }

    #[test]
    fn williams_r_rule() {
        assert_eq!(williams_r(-10.0), Decision::StrongSell);
        assert_eq!(williams_r(-25.0), Decision::Sell);
        assert_eq!(williams_r(-50.0), Decision::Neutral);
        assert_eq!(williams_r(-75.0), Decision::Buy);
        assert_eq!(williams_r(-90.0), Decision::StrongBuy);
    }

    #[test]
    fn psar_rule_checks_previous_close() {
        assert_eq!(psar(110.0, 100.0, 105.0), Decision::Buy);
        assert_eq!(psar(110.0, 100.0, 95.0), Decision::Neutral);
        assert_eq!(psar(90.0, 100.0, 95.0), Decision::Sell);
    }

    #[test]
    fn ichimoku_two_tiers() {
        let bullish = IchimokuSignals {
            conversion: 105.0,
            base: 100.0,
            span_a: 95.0,
            span_b: 90.0,
            lagging: 110.0,
            lagging_reference: Some(100.0),
        };
        assert_eq!(ichimoku(120.0, bullish), Decision::StrongBuy);
        let unconfirmed = IchimokuSignals {
            lagging_reference: None,
            ..bullish
        };
        assert_eq!(ichimoku(120.0, unconfirmed), Decision::Buy);
        // inside the cloud
        assert_eq!(ichimoku(92.0, bullish), Decision::Neutral);

        let bearish = IchimokuSignals {
            conversion: 95.0,
            base: 100.0,
            span_a: 110.0,
            span_b: 105.0,
            lagging: 80.0,
            lagging_reference: Some(90.0),
        };
        assert_eq!(ichimoku(90.0, bearish), Decision::StrongSell);
    }

    #[test]
    fn atr_rule() {
        assert_eq!(atr(100.0, 0.5, 90.0), Decision::Neutral);
        assert_eq!(atr(100.0, 3.0, 90.0), Decision::Buy);
        assert_eq!(atr(100.0, 3.0, 110.0), Decision::Sell);
        assert_eq!(atr(100.0, 1.5, 90.0), Decision::Neutral);
    }
}
