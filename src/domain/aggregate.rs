//! Weighted aggregation of per-indicator decisions.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::domain::decision::Decision;
use crate::domain::indicator::IndicatorKind;
use crate::domain::registry;

/// Indicators that take part in the overall score.
///
/// Order and duplicates carry no meaning; names that do not match a known
/// indicator are dropped when parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection(BTreeSet<IndicatorKind>);

impl Selection {
    pub fn all() -> Self {
        Self(IndicatorKind::ALL.into_iter().collect())
    }

    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = IndicatorKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut kinds = BTreeSet::new();
        for name in names {
            match name.parse::<IndicatorKind>() {
                Ok(kind) => {
                    kinds.insert(kind);
                }
                Err(e) => debug!("ignoring selection entry: {e}"),
            }
        }
        Self(kinds)
    }

    /// Comma-separated indicator names, e.g. `"RSI, MACD,psar"`.
    pub fn parse_list(list: &str) -> Self {
        Self::from_names(list.split(',').map(str::trim).filter(|s| !s.is_empty()))
    }

    pub fn contains(&self, kind: IndicatorKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = IndicatorKind> + '_ {
        self.0.iter().copied()
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::all()
    }
}

/// Σ weight × signed score over the selected indicators; unavailable counts 0.
pub fn score(selection: &Selection, decisions: &BTreeMap<IndicatorKind, Option<Decision>>) -> f64 {
    selection
        .iter()
        .map(|kind| {
            let signed = decisions
                .get(&kind)
                .copied()
                .flatten()
                .map_or(0, Decision::score);
            registry::spec(kind).weight * f64::from(signed)
        })
        .sum()
}

/// Overall decision for a score; an empty selection is always neutral.
pub fn overall(selection: &Selection, score: f64) -> Decision {
    if selection.is_empty() {
        Decision::Neutral
    } else if score >= 1.5 {
        Decision::StrongBuy
    } else if score >= 0.5 {
        Decision::Buy
    } else if score <= -1.5 {
        Decision::StrongSell
    } else if score <= -0.5 {
        Decision::Sell
    } else {
        Decision::Neutral
    }
}
