//! MACD: EMA(short) - EMA(long), its EMA signal line and the histogram.
//!
//! Signals fire when the histogram crosses zero.

use super::window::{ewm_mean, tail_mean};
use super::{Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use crate::signal::cross;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Macd {
    short_term: usize,
    long_term: usize,
    macd_span: usize,
}

impl Macd {
    pub fn new(short_term: usize, long_term: usize, macd_span: usize) -> Self {
        Self {
            short_term,
            long_term,
            macd_span,
        }
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new(12, 26, 9)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        "macd"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("short_term".into(), self.short_term as f64),
            ("long_term".into(), self.long_term as f64),
            ("macd_span".into(), self.macd_span as f64),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        ["ema_short", "ema_long", "macd", "signal", "histogram"]
            .map(String::from)
            .to_vec()
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let ema_short = ewm_mean(&prices.close, self.short_term as f64);
        let ema_long = ewm_mean(&prices.close, self.long_term as f64);
        let macd: Vec<f64> = ema_short.iter().zip(&ema_long).map(|(s, l)| s - l).collect();
        let signal = ewm_mean(&macd, self.macd_span as f64);
        let histogram: Vec<f64> = macd.iter().zip(&signal).map(|(m, s)| m - s).collect();
        let signals = cross(&histogram).into_signals();

        let mut values = IndicatorValues::new();
        values.insert("ema_short", ema_short);
        values.insert("ema_long", ema_long);
        values.insert("macd", macd);
        values.insert("signal", signal);
        values.insert("histogram", histogram);
        values.insert_signals(signals);
        values
    }

    fn parameterize(&self, _prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        ["signal", "histogram"]
            .into_iter()
            .map(|name| {
                let series = values.get_series(name).unwrap_or_default();
                (name.to_string(), tail_mean(series, 3))
            })
            .collect()
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::Lower,
            lines: vec![
                PlotLine::line("macd", "macd"),
                PlotLine::line("signal", "signal"),
                PlotLine::bar("histogram", "histogram"),
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_prices, DEFAULT_EPSILON};

    #[test]
    fn flat_series_has_zero_macd() {
        let values = Macd::default().compute(&make_prices(&[100.0; 40]));
        for v in values.get_series("histogram").unwrap() {
            assert_approx(*v, 0.0, DEFAULT_EPSILON);
        }
        let buy: f64 = values.get_series("buy_signal").unwrap().iter().sum();
        assert_eq!(buy, 0.0);
    }

    #[test]
    fn ema_starts_at_first_close() {
        let values = Macd::default().compute(&make_prices(&[10.0, 20.0]));
        assert_approx(values.get("ema_short", 0).unwrap(), 10.0, DEFAULT_EPSILON);
        assert!(values.get("macd", 1).unwrap() > 0.0);
    }

    #[test]
    fn parameters_are_tail_means() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let prices = make_prices(&closes);
        let macd = Macd::default();
        let values = macd.compute(&prices);
        let params = macd.parameterize(&prices, &values);
        let hist = values.get_series("histogram").unwrap();
        assert_approx(params["histogram"], (hist[47] + hist[48] + hist[49]) / 3.0, 1e-9);
    }
}
