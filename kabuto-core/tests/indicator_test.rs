//! Indicator integration tests over full price tables.
//!
//! Each test builds a gap-free single-code table and runs an indicator through
//! `Indicator::process`, the same path the aggregate uses.

use chrono::NaiveDate;
use kabuto_core::data::synthetic_recordset;
use kabuto_core::domain::calendar::business_days_from;
use kabuto_core::domain::{RawRow, Recordset};
use kabuto_core::fingerprint::ComponentConfig;
use kabuto_core::indicators::*;
use kabuto_core::signal::{DEFAULT_INFLUENCE, DEFAULT_TAIL};
use polars::prelude::DataFrame;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 4).unwrap()
}

/// A smooth wave so every crossing-based indicator has something to cross.
fn wave_table(n: usize) -> DataFrame {
    let rows: Vec<RawRow> = business_days_from(start(), n)
        .into_iter()
        .enumerate()
        .map(|(i, dt)| {
            let close = 1000.0 + 80.0 * (i as f64 / 9.0).sin() + i as f64;
            [
                ("code", "1375".to_string()),
                ("dt", dt.to_string()),
                ("open", format!("{:.1}", close - 2.0)),
                ("high", format!("{:.1}", close + 6.0)),
                ("low", format!("{:.1}", close - 6.0)),
                ("close", format!("{close:.1}")),
                ("volume", format!("{}", 10_000 + 37 * i)),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
        })
        .collect();
    Recordset::from_rows(&rows)
        .unwrap()
        .to_df(false, false, None)
        .unwrap()
}

fn null_count(df: &DataFrame, column: &str) -> usize {
    df.column(column).unwrap().null_count()
}

// ── SMA end to end ──

#[test]
fn sma_90_rows_is_complete_after_longest_window() {
    let df = wave_table(90);
    let processed = Sma::new(5, 21, 70).process(&df).unwrap();

    assert_eq!(processed.code, "1375");
    assert_eq!(processed.applied_method_name, "sma");
    assert_eq!(processed.df.height(), 90);

    let tail = processed.df.slice(70, 20);
    for column in ["sma_short", "sma_medium", "sma_long", "buy_signal", "sell_signal"] {
        assert_eq!(null_count(&tail, column), 0, "{column} has nulls from row 70");
    }
    // The long window first fills at row 69.
    assert_eq!(null_count(&processed.df, "sma_long"), 69);

    for key in ["sma_short_diff", "sma_medium_diff", "sma_long_diff"] {
        let value = processed.parameters.get(key).copied();
        assert!(value.is_some_and(f64::is_finite), "{key} missing or NaN");
    }
}

#[test]
fn processed_table_keeps_base_columns() {
    let df = wave_table(60);
    let processed = Macd::default().process(&df).unwrap();
    for column in ["code", "dt", "open", "high", "low", "close", "volume", "macd", "signal", "histogram"] {
        assert!(
            processed.required_columns.iter().any(|c| c == column),
            "{column} not required"
        );
    }
    assert!(processed.df.column("name").is_ok());
}

// ── Every default method ──

#[test]
fn default_methods_process_a_real_length_table() {
    let df = synthetic_recordset("7203", start(), 200, 5)
        .unwrap()
        .to_df(false, false, None)
        .unwrap();
    for method in default_methods() {
        let processed = method.process(&df).unwrap();
        assert_eq!(processed.df.height(), 200, "{}", method.name());
        let impact = processed.get_impact(DEFAULT_INFLUENCE, DEFAULT_TAIL);
        assert!(impact.is_finite(), "{} impact {impact}", method.name());
    }
}

#[test]
fn silent_methods_have_zero_impact() {
    let df = wave_table(80);
    for method in [
        Box::new(Basic) as Box<dyn Indicator>,
        Box::new(PctChange::default()),
        Box::new(Volatility::default()),
        Box::new(Fitting),
    ] {
        let processed = method.process(&df).unwrap();
        assert_eq!(
            processed.get_impact(DEFAULT_INFLUENCE, DEFAULT_TAIL),
            0.0,
            "{}",
            method.name()
        );
    }
}

#[test]
fn crossing_methods_signal_on_a_wave() {
    let df = wave_table(150);
    for method in [
        Box::new(Sma::default()) as Box<dyn Indicator>,
        Box::new(Macd::default()),
    ] {
        let processed = method.process(&df).unwrap();
        let buy = processed.df.column("buy_signal").unwrap().as_materialized_series().sum::<f64>().unwrap();
        let sell = processed.df.column("sell_signal").unwrap().as_materialized_series().sum::<f64>().unwrap();
        assert!(buy + sell > 0.0, "{} never signals", method.name());
    }
}

// ── Factory ──

#[test]
fn factory_builds_from_config() {
    let config = ComponentConfig::new("sma")
        .with_param("short_term", 3.0)
        .with_param("medium_term", 8.0)
        .with_param("long_term", 20.0);
    let method = create_indicator(&config).unwrap();
    assert_eq!(method.params().get("long_term"), Some(&20.0));

    let processed = method.process(&wave_table(40)).unwrap();
    assert_eq!(null_count(&processed.df, "sma_long"), 19);
}

#[test]
fn factory_rejects_unknown_and_invalid() {
    assert!(matches!(
        create_indicator(&ComponentConfig::new("ichimoku")),
        Err(FactoryError::UnknownIndicator(_))
    ));
    assert!(matches!(
        create_indicator(&ComponentConfig::new("sma").with_param("short_term", 0.0)),
        Err(FactoryError::InvalidParam { .. })
    ));
}

#[test]
fn multi_code_table_is_rejected() {
    let mut rows = synthetic_recordset("1375", start(), 30, 1).unwrap().records().to_vec();
    rows.extend(synthetic_recordset("7203", start(), 30, 1).unwrap().records().iter().cloned());
    let brands = [kabuto_core::domain::Brand::new("1375"), kabuto_core::domain::Brand::new("7203")]
        .into_iter()
        .collect();
    let df = Recordset::new(brands, rows).unwrap().to_df(true, false, None).unwrap();
    assert!(Sma::default().process(&df).is_err());
}
