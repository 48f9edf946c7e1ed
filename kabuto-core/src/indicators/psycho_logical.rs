//! Psychological line: the share of up-days over the trailing `psycho_term` rows.
//!
//! Above `upper_threshold` the market has bought too much (sell); below
//! `lower_threshold` it has sold too much (buy).

use super::window::{diff, rolling_sum, tail_mean};
use super::{signals_where, Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct PsychoLogical {
    psycho_term: usize,
    upper_threshold: f64,
    lower_threshold: f64,
}

impl PsychoLogical {
    pub fn new(psycho_term: usize, upper_threshold: f64, lower_threshold: f64) -> Self {
        Self {
            psycho_term,
            upper_threshold,
            lower_threshold,
        }
    }
}

impl Default for PsychoLogical {
    fn default() -> Self {
        Self::new(12, 0.75, 0.25)
    }
}

impl Indicator for PsychoLogical {
    fn name(&self) -> &str {
        "psycho_logical"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("psycho_term".into(), self.psycho_term as f64),
            ("upper_threshold".into(), self.upper_threshold),
            ("lower_threshold".into(), self.lower_threshold),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        vec![
            "psycho_line".into(),
            "bought_too_much".into(),
            "sold_too_much".into(),
        ]
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let is_raise: Vec<f64> = diff(&prices.close)
            .into_iter()
            .map(|d| if d > 0.0 { 1.0 } else { 0.0 })
            .collect();
        let term = self.psycho_term as f64;
        let psycho_line: Vec<f64> = rolling_sum(&is_raise, self.psycho_term)
            .into_iter()
            .map(|s| s / term)
            .collect();

        let (bought_too_much, sold_too_much) = signals_where(
            psycho_line.len(),
            |i| psycho_line[i] > self.upper_threshold,
            |i| psycho_line[i] < self.lower_threshold,
        );

        let mut values = IndicatorValues::new();
        values.insert("psycho_line", psycho_line);
        values.insert("bought_too_much", bought_too_much.clone());
        values.insert("sold_too_much", sold_too_much.clone());
        values.insert_signals((sold_too_much, bought_too_much));
        values
    }

    fn parameterize(&self, _prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        let line = values.get_series("psycho_line").unwrap_or_default();
        BTreeMap::from([("psycho_line".into(), tail_mean(line, 3))])
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::Lower,
            lines: vec![PlotLine::line("psycho_line", "psycho_line")],
        })
    }
}
