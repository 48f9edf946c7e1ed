//! Momentum: the close shifted back `shift` rows and its rolling mean.
//!
//! Rows with no shifted value read as 0. Signals fire when `sma_momentum` crosses zero.

use super::window::{rolling_mean, shift};
use super::{Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use crate::signal::cross;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Momentum {
    term: usize,
    shift: usize,
}

impl Momentum {
    pub fn new(term: usize, shift: usize) -> Self {
        Self { term, shift }
    }
}

impl Default for Momentum {
    fn default() -> Self {
        Self::new(25, 10)
    }
}

impl Indicator for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("term".into(), self.term as f64),
            ("shift".into(), self.shift as f64),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        vec!["momentum".into(), "sma_momentum".into()]
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let momentum: Vec<f64> = shift(&prices.close, self.shift)
            .into_iter()
            .map(|v| if v.is_nan() { 0.0 } else { v })
            .collect();
        let sma_momentum = rolling_mean(&momentum, self.term);
        let signals = cross(&sma_momentum).into_signals();

        let mut values = IndicatorValues::new();
        values.insert("momentum", momentum);
        values.insert("sma_momentum", sma_momentum);
        values.insert_signals(signals);
        values
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::Lower,
            lines: vec![
                PlotLine::line("momentum", "momentum"),
                PlotLine::line("sma_momentum", "sma_momentum"),
            ],
        })
    }
}
