//! ADX / DMI: directional movement over rolling sums.
//!
//! Steps:
//! 1. +DM = high - prev_high, -DM = prev_low - low; each is kept only when
//!    positive and larger than the other, else 0
//! 2. True range, rolling sums of TR, +DM and -DM over `term`
//! 3. ±DI = 100 * sum(±DM) / sum(TR) (0 when the TR sum is 0)
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI) (0 when both are 0)
//! 5. ADX, ADXR = rolling means of DX over `adx_term`, `adxr_term`
//!
//! Buy when ADX is trending up and +DI crosses above -DI; sell when ADX is
//! trending down and +DI crosses below -DI. Evaluated row by row.

use super::window::{rolling_mean, rolling_sum, tail_mean};
use super::{signals_where, Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use crate::signal::{cross, trend};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Adx {
    term: usize,
    adx_term: usize,
    adxr_term: usize,
}

impl Adx {
    pub fn new(term: usize, adx_term: usize, adxr_term: usize) -> Self {
        Self {
            term,
            adx_term,
            adxr_term,
        }
    }
}

impl Default for Adx {
    fn default() -> Self {
        Self::new(14, 14, 28)
    }
}

/// True range; the first row has no previous close and uses high - low.
pub fn true_range(prices: &Prices) -> Vec<f64> {
    (0..prices.len())
        .map(|i| {
            let (h, l) = (prices.high[i], prices.low[i]);
            if i == 0 {
                return h - l;
            }
            let pc = prices.close[i - 1];
            (h - l).max(h - pc).max(pc - l)
        })
        .collect()
}

/// Directional movement pair, each zeroed unless it dominates.
fn directional_movement(prices: &Prices) -> (Vec<f64>, Vec<f64>) {
    let n = prices.len();
    let mut plus = vec![0.0; n];
    let mut minus = vec![0.0; n];
    for i in 1..n {
        let up = prices.high[i] - prices.high[i - 1];
        let down = prices.low[i - 1] - prices.low[i];
        if up > 0.0 && up > down {
            plus[i] = up;
        }
        if down > 0.0 && down > up {
            minus[i] = down;
        }
    }
    (plus, minus)
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if numerator.is_nan() || denominator.is_nan() {
        f64::NAN
    } else if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        "adx"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("term".into(), self.term as f64),
            ("adx_term".into(), self.adx_term as f64),
            ("adxr_term".into(), self.adxr_term as f64),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        ["plus_di", "minus_di", "DX", "ADX", "ADXR"]
            .map(String::from)
            .to_vec()
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let (plus_dm, minus_dm) = directional_movement(prices);
        let sum_tr = rolling_sum(&true_range(prices), self.term);
        let sum_plus = rolling_sum(&plus_dm, self.term);
        let sum_minus = rolling_sum(&minus_dm, self.term);

        let plus_di: Vec<f64> = sum_plus.iter().zip(&sum_tr).map(|(p, t)| ratio_or_zero(*p, *t)).collect();
        let minus_di: Vec<f64> = sum_minus.iter().zip(&sum_tr).map(|(m, t)| ratio_or_zero(*m, *t)).collect();
        let dx: Vec<f64> = plus_di
            .iter()
            .zip(&minus_di)
            .map(|(p, m)| ratio_or_zero((p - m).abs(), p + m))
            .collect();
        let adx = rolling_mean(&dx, self.adx_term);
        let adxr = rolling_mean(&dx, self.adxr_term);

        let spread: Vec<f64> = plus_di.iter().zip(&minus_di).map(|(p, m)| p - m).collect();
        let crossing = cross(&spread);
        let adx_trend = trend(&adx);
        let signals = signals_where(
            prices.len(),
            |i| adx_trend[i] > 0.0 && crossing.to_plus[i] > 0.0,
            |i| adx_trend[i] < 0.0 && crossing.to_minus[i] > 0.0,
        );

        let mut values = IndicatorValues::new();
        values.insert("plus_di", plus_di);
        values.insert("minus_di", minus_di);
        values.insert("DX", dx);
        values.insert("ADX", adx);
        values.insert("ADXR", adxr);
        values.insert_signals(signals);
        values
    }

    fn parameterize(&self, _prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        [("adx_dx", "DX"), ("adx_adx", "ADX"), ("adx_adxr", "ADXR")]
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
                PlotLine::line("plus_di", "+DI"),
                PlotLine::line("minus_di", "-DI"),
                PlotLine::line("ADX", "ADX"),
                PlotLine::line("ADXR", "ADXR"),
            ],
        })
    }
}
