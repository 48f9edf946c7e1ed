//! Volatility: rolling sample std of daily returns, plus the close's coefficient of variation.

use super::pct_change::pct_change;
use super::window::{last_valid, rolling_std, sample_std};
use super::{no_signals, Indicator, IndicatorValues, Prices};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Volatility {
    term: usize,
}

impl Volatility {
    pub fn new(term: usize) -> Self {
        Self { term }
    }
}

impl Default for Volatility {
    fn default() -> Self {
        Self::new(20)
    }
}

impl Indicator for Volatility {
    fn name(&self) -> &str {
        "volatility"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([("term".into(), self.term as f64)])
    }

    fn processed_columns(&self) -> Vec<String> {
        vec!["volatility".into()]
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        values.insert(
            "volatility",
            rolling_std(&pct_change(&prices.close, 1), self.term),
        );
        values.insert_signals(no_signals(prices.len()));
        values
    }

    fn parameterize(&self, prices: &Prices, values: &IndicatorValues) -> BTreeMap<String, f64> {
        let close: Vec<f64> = prices.close.iter().copied().filter(|v| !v.is_nan()).collect();
        let mean = close.iter().sum::<f64>() / close.len() as f64;
        BTreeMap::from([
            (
                "volatility".into(),
                last_valid(values.get_series("volatility").unwrap_or_default()),
            ),
            ("close_volatility".into(), sample_std(&close) / mean),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_prices, DEFAULT_EPSILON};

    #[test]
    fn constant_growth_has_zero_volatility() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let values = Volatility::new(5).compute(&make_prices(&closes));
        assert_approx(values.get("volatility", 29).unwrap(), 0.0, 1e-9);
        assert!(values.get("volatility", 4).unwrap().is_nan());
    }

    #[test]
    fn coefficient_of_variation() {
        let prices = make_prices(&[9.0, 11.0, 9.0, 11.0]);
        let method = Volatility::new(2);
        let params = method.parameterize(&prices, &method.compute(&prices));
        let std = sample_std(&[9.0, 11.0, 9.0, 11.0]);
        assert_approx(params["close_volatility"], std / 10.0, DEFAULT_EPSILON);
    }
}
