//! Baseline method: no columns, no signals, the latest close and volume as parameters.

use super::window::last_valid;
use super::{no_signals, Indicator, IndicatorValues, Prices};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Basic;

impl Indicator for Basic {
    fn name(&self) -> &str {
        "basic"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }

    fn processed_columns(&self) -> Vec<String> {
        Vec::new()
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let mut values = IndicatorValues::new();
        values.insert_signals(no_signals(prices.len()));
        values
    }

    fn parameterize(&self, prices: &Prices, _values: &IndicatorValues) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("basic_close".into(), last_valid(&prices.close)),
            ("basic_volume".into(), last_valid(&prices.volume)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_prices;

    #[test]
    fn reports_latest_values() {
        let prices = make_prices(&[10.0, 11.0, 12.5]);
        let params = Basic.parameterize(&prices, &Basic.compute(&prices));
        assert_eq!(params["basic_close"], 12.5);
        assert_eq!(params["basic_volume"], 1000.0);
        assert!(Basic.visualize_hint().is_none());
    }
}
