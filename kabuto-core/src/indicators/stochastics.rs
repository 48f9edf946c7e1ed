//! Stochastics %K / %D / slow %D.
//!
//! K  = 100 * (close - min_low_k) / (max_high_k - min_low_k)
//! D  = 100 * sum_d(close - min_low_k) / sum_d(max_high_k - min_low_k)
//! SD = rolling mean of D over `sd_term`
//!
//! A zero range yields 50. Buy when K, D and SD are all at or below 20 and K
//! crosses above D; sell when all are at or above 80 and K crosses below D.

use super::window::{rolling_max, rolling_mean, rolling_min, rolling_sum, tail_mean};
use super::{signals_where, Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use crate::signal::cross;
use std::collections::BTreeMap;

const OVERSOLD: f64 = 20.0;
const OVERBOUGHT: f64 = 80.0;
const NEUTRAL: f64 = 50.0;

#[derive(Debug, Clone)]
pub struct Stochastics {
    k_term: usize,
    d_term: usize,
    sd_term: usize,
}

impl Stochastics {
    pub fn new(k_term: usize, d_term: usize, sd_term: usize) -> Self {
        Self {
            k_term,
            d_term,
            sd_term,
        }
    }
}

impl Default for Stochastics {
    fn default() -> Self {
        Self::new(9, 3, 3)
    }
}

fn percent(numerator: f64, range: f64) -> f64 {
    if numerator.is_nan() || range.is_nan() {
        f64::NAN
    } else if range == 0.0 {
        NEUTRAL
    } else {
        numerator / range * 100.0
    }
}

impl Indicator for Stochastics {
    fn name(&self) -> &str {
        "stochastics"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("k_term".into(), self.k_term as f64),
            ("d_term".into(), self.d_term as f64),
            ("sd_term".into(), self.sd_term as f64),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        vec!["K".into(), "D".into(), "SD".into()]
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let min_low = rolling_min(&prices.low, self.k_term);
        let max_high = rolling_max(&prices.high, self.k_term);
        let above_low: Vec<f64> = prices.close.iter().zip(&min_low).map(|(c, l)| c - l).collect();
        let range: Vec<f64> = max_high.iter().zip(&min_low).map(|(h, l)| h - l).collect();

        let k: Vec<f64> = above_low.iter().zip(&range).map(|(n, r)| percent(*n, *r)).collect();
        let d: Vec<f64> = rolling_sum(&above_low, self.d_term)
            .iter()
            .zip(&rolling_sum(&range, self.d_term))
            .map(|(n, r)| percent(*n, *r))
            .collect();
        let sd = rolling_mean(&d, self.sd_term);

        let spread: Vec<f64> = k.iter().zip(&d).map(|(k, d)| k - d).collect();
        let crossing = cross(&spread);
        let signals = signals_where(
            prices.len(),
            |i| {
                k[i] <= OVERSOLD && d[i] <= OVERSOLD && sd[i] <= OVERSOLD && crossing.to_plus[i] > 0.0
            },
            |i| {
                k[i] >= OVERBOUGHT
                    && d[i] >= OVERBOUGHT
                    && sd[i] >= OVERBOUGHT
                    && crossing.to_minus[i] > 0.0
            },
        );

        let mut values = IndicatorValues::new();
        values.insert("K", k);
        values.insert("D", d);
        values.insert("SD", sd);
        values.insert_signals(signals);
        values
    }

    fn parameterize(&self, _prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        [("stochastics_k", "K"), ("stochastics_d", "D"), ("stochastics_sd", "SD")]
            .into_iter()
            .map(|(key, column)| {
                let series = values.get_series(column).unwrap_or_default();
                (key.to_string(), tail_mean(series, 3))
            })
            .collect()
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::Lower,
            lines: vec![
                PlotLine::line("K", "%K"),
                PlotLine::line("D", "%D"),
                PlotLine::line("SD", "slow %D"),
            ],
        })
    }
}
