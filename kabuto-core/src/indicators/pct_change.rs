//! Percentage change of the close, daily and over fixed horizons.

use super::window::shift;
use super::{no_signals, Indicator, IndicatorValues, Prices};
use std::collections::BTreeMap;

pub const DEFAULT_HORIZONS: [usize; 5] = [1, 5, 10, 20, 30];

#[derive(Debug, Clone)]
pub struct PctChange {
    horizons: Vec<usize>,
}

impl PctChange {
    pub fn new(horizons: Vec<usize>) -> Self {
        Self { horizons }
    }
}

impl Default for PctChange {
    fn default() -> Self {
        Self::new(DEFAULT_HORIZONS.to_vec())
    }
}

/// `values[t] / values[t - periods] - 1`.
pub fn pct_change(values: &[f64], periods: usize) -> Vec<f64> {
    values
        .iter()
        .zip(shift(values, periods))
        .map(|(v, prev)| v / prev - 1.0)
        .collect()
}

impl Indicator for PctChange {
    fn name(&self) -> &str {
        "pct_change"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        self.horizons
            .iter()
            .enumerate()
            .map(|(i, h)| (format!("horizon_{i}"), *h as f64))
            .collect()
    }

    fn processed_columns(&self) -> Vec<String> {
        vec!["pct_change".into()]
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        values.insert("pct_change", pct_change(&prices.close, 1));
        values.insert_signals(no_signals(prices.len()));
        values
    }

    /// One `pct_change_{h}` per horizon the history is long enough for.
    fn parameterize(&self, prices: &Prices, _values: &IndicatorValues) -> BTreeMap<String, f64> {
        let close = &prices.close;
        let Some(&latest) = close.last() else {
            return BTreeMap::new();
        };
        self.horizons
            .iter()
            .filter(|&&h| h > 0 && h < close.len())
            .map(|&h| {
                let base = close[close.len() - 1 - h];
                (format!("pct_change_{h}"), latest / base - 1.0)
            })
            .collect()
    }
}
