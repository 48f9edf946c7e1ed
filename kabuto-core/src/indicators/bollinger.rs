//! Bollinger Bands: rolling mean +/- 1, 2 and 3 sample standard deviations.
//!
//! Buy when the close is above the +2σ band, sell when below the -2σ band.
//! The continuity columns count such closes over the trailing `continuity_term` rows.

use super::window::{rolling_mean, rolling_std, rolling_sum, tail_mean};
use super::{signals_where, Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use std::collections::BTreeMap;

const SIGMAS: [u8; 3] = [1, 2, 3];

#[derive(Debug, Clone)]
pub struct BollingerBands {
    band_term: usize,
    continuity_term: usize,
}

impl BollingerBands {
    pub fn new(band_term: usize, continuity_term: usize) -> Self {
        Self {
            band_term,
            continuity_term,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new(12, 10)
    }
}

impl Indicator for BollingerBands {
    fn name(&self) -> &str {
        "bollinger_bands"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("band_term".into(), self.band_term as f64),
            ("continuity_term".into(), self.continuity_term as f64),
        ])
    }

    fn processed_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = SIGMAS
            .iter()
            .flat_map(|k| [format!("upper_{k}_sigma"), format!("lower_{k}_sigma")])
            .collect();
        columns.push("over_upper_continuity".into());
        columns.push("over_lower_continuity".into());
        columns
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let close = &prices.close;
        let mean = rolling_mean(close, self.band_term);
        let std = rolling_std(close, self.band_term);
        let band = |k: f64| -> Vec<f64> { mean.iter().zip(&std).map(|(m, s)| m + s * k).collect() };

        let mut values = IndicatorValues::new();
        for k in SIGMAS {
            values.insert(format!("upper_{k}_sigma"), band(f64::from(k)));
            values.insert(format!("lower_{k}_sigma"), band(-f64::from(k)));
        }

        let upper_2 = band(2.0);
        let lower_2 = band(-2.0);
        // NaN comparisons are false, so warmup rows never signal
        let (over_upper, over_lower) =
            signals_where(close.len(), |i| close[i] > upper_2[i], |i| close[i] < lower_2[i]);

        values.insert(
            "over_upper_continuity",
            rolling_sum(&over_upper, self.continuity_term),
        );
        values.insert(
            "over_lower_continuity",
            rolling_sum(&over_lower, self.continuity_term),
        );
        values.insert_signals((over_upper, over_lower));
        values
    }

    fn parameterize(&self, _prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        ["upper_1_sigma", "lower_1_sigma", "upper_2_sigma", "lower_2_sigma"]
            .into_iter()
            .map(|name| {
                let series = values.get_series(name).unwrap_or_default();
                (name.to_string(), tail_mean(series, 3))
            })
            .collect()
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::In,
            lines: SIGMAS
                .iter()
                .flat_map(|k| {
                    [
                        PlotLine::line(&format!("upper_{k}_sigma"), format!("+{k}s")),
                        PlotLine::line(&format!("lower_{k}_sigma"), format!("-{k}s")),
                    ]
                })
                .collect(),
        })
    }
}
