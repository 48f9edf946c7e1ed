//! Simple Moving Average triple (short / medium / long).
//!
//! Signals fire when `sma_long - sma_short` crosses zero. The first valid
//! value of each column is at index `term - 1`.

use super::window::{rolling_mean, tail_mean};
use super::{Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use crate::signal::cross;
use std::collections::BTreeMap;

const PARAM_TAIL: usize = 3;

#[derive(Debug, Clone)]
pub struct Sma {
    short_term: usize,
    medium_term: usize,
    long_term: usize,
}

impl Sma {
    pub fn new(short_term: usize, medium_term: usize, long_term: usize) -> Self {
        Self {
            short_term,
            medium_term,
            long_term,
        }
    }
}

impl Default for Sma {
    fn default() -> Self {
        Self::new(5, 21, 70)
    }
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        "sma"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("short_term".into(), self.short_term as f64),
            ("medium_term".into(), self.medium_term as f64),
            ("long_term".into(), self.long_term as f64),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        vec!["sma_short".into(), "sma_medium".into(), "sma_long".into()]
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let short = rolling_mean(&prices.close, self.short_term);
        let medium = rolling_mean(&prices.close, self.medium_term);
        let long = rolling_mean(&prices.close, self.long_term);
        let spread: Vec<f64> = long.iter().zip(&short).map(|(l, s)| l - s).collect();

        let mut values = IndicatorValues::new();
        values.insert("sma_short", short);
        values.insert("sma_medium", medium);
        values.insert("sma_long", long);
        values.insert_signals(cross(&spread).into_signals());
        values
    }

    fn parameterize(&self, prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        let column = |name: &str| values.get_series(name).unwrap_or_default();
        let (short, medium, long) = (column("sma_short"), column("sma_medium"), column("sma_long"));

        // (a - b) / a, row by row
        let relative = |a: &[f64], b: &[f64]| -> Vec<f64> {
            a.iter().zip(b).map(|(a, b)| (a - b) / a).collect()
        };

        BTreeMap::from([
            ("sma_short_diff".into(), tail_mean(&relative(short, &prices.close), PARAM_TAIL)),
            ("sma_medium_diff".into(), tail_mean(&relative(medium, &prices.close), PARAM_TAIL)),
            ("sma_long_diff".into(), tail_mean(&relative(long, &prices.close), PARAM_TAIL)),
            ("sma_long_short".into(), tail_mean(&relative(long, short), PARAM_TAIL)),
            ("sma_long_medium".into(), tail_mean(&relative(long, medium), PARAM_TAIL)),
        ])
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::In,
            lines: vec![
                PlotLine::line("sma_long", format!("sma({})", self.long_term)),
                PlotLine::line("sma_medium", format!("sma({})", self.medium_term)),
                PlotLine::line("sma_short", format!("sma({})", self.short_term)),
            ],
        })
    }
}
