//! Look-ahead contamination tests for every windowed indicator.
//!
//! Invariant: no indicator value at row t may depend on prices from row t+1 or later.
//!
//! Method: compute on a truncated history (rows 0..100) and the full history
//! (rows 0..200). Rows 0..100 must be identical between both runs. The
//! polynomial fit is excluded: it fits the whole window on purpose.

use chrono::NaiveDate;
use kabuto_core::data::synthetic_recordset;
use kabuto_core::indicators::*;

fn prices(n: usize) -> Prices {
    let start = NaiveDate::from_ymd_opt(2022, 1, 4).unwrap();
    let recordset = synthetic_recordset("9999", start, n, 42).unwrap();
    let df = recordset.to_df(true, false, None).unwrap();
    Prices::from_df(&df).unwrap()
}

fn truncate(p: &Prices, n: usize) -> Prices {
    Prices {
        dt: p.dt[..n].to_vec(),
        open: p.open[..n].to_vec(),
        high: p.high[..n].to_vec(),
        low: p.low[..n].to_vec(),
        close: p.close[..n].to_vec(),
        volume: p.volume[..n].to_vec(),
    }
}

fn same(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || (a - b).abs() < 1e-9
}

fn assert_no_lookahead(indicator: &dyn Indicator, full: &Prices, truncated_len: usize) {
    let full_result = indicator.compute(full);
    let truncated_result = indicator.compute(&truncate(full, truncated_len));

    for (name, truncated_values) in truncated_result.iter() {
        assert_eq!(
            truncated_values.len(),
            truncated_len,
            "{}: {} has the wrong length",
            indicator.name(),
            name
        );
        let full_values = full_result.get_series(name).unwrap();
        for t in 0..truncated_len {
            assert!(
                same(truncated_values[t], full_values[t]),
                "{}: {}[{}] differs: truncated={} full={}",
                indicator.name(),
                name,
                t,
                truncated_values[t],
                full_values[t]
            );
        }
    }
}

#[test]
fn windowed_indicators_do_not_look_ahead() {
    let full = prices(200);
    let methods: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::default()),
        Box::new(Macd::default()),
        Box::new(Stochastics::default()),
        Box::new(Adx::default()),
        Box::new(BollingerBands::default()),
        Box::new(Momentum::default()),
        Box::new(PsychoLogical::default()),
        Box::new(Basic),
        Box::new(PctChange::default()),
        Box::new(Volatility::default()),
    ];
    for method in &methods {
        assert_no_lookahead(method.as_ref(), &full, 100);
    }
}

#[test]
fn short_parameters_do_not_look_ahead() {
    let full = prices(120);
    assert_no_lookahead(&Sma::new(2, 3, 4), &full, 10);
    assert_no_lookahead(&Adx::new(2, 2, 3), &full, 10);
    assert_no_lookahead(&Stochastics::new(2, 2, 2), &full, 10);
}
