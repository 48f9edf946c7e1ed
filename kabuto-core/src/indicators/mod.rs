//! Technical indicators over one code's daily prices.
//!
//! Indicators are pure: a price history in, named `f64` columns out. Every
//! indicator emits its processed columns plus `buy_signal` / `sell_signal`
//! (0 or 1). Warmup rows are NaN here and null once stacked onto a frame.
//!
//! # Look-ahead guard
//! No value at row t may depend on rows after t. All window math goes through
//! [`window`], which only reads trailing windows. The polynomial fit is the
//! one exception: it fits the whole window and emits no signal.

pub mod adx;
pub mod basic;
pub mod bollinger;
pub mod factory;
pub mod fitting;
pub mod macd;
pub mod momentum;
pub mod pct_change;
pub mod psycho_logical;
pub mod sma;
pub mod stochastics;
pub mod volatility;
pub mod window;

pub use adx::Adx;
pub use basic::Basic;
pub use bollinger::BollingerBands;
pub use factory::{create_indicator, default_methods, FactoryError};
pub use fitting::Fitting;
pub use macd::Macd;
pub use momentum::Momentum;
pub use pct_change::PctChange;
pub use psycho_logical::PsychoLogical;
pub use sma::Sma;
pub use stochastics::Stochastics;
pub use volatility::Volatility;

use crate::data::frame::{column_dates, column_f64, distinct_text, f64_column, has_column};
use crate::domain::processed::ProcessedTable;
use crate::error::{EntityError, KabutoError};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

/// Sorted daily prices of one code.
#[derive(Debug, Clone, Default)]
pub struct Prices {
    pub dt: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<f64>,
}

impl Prices {
    /// Read the price columns of a frame already sorted by `dt`. A missing volume reads as NaN.
    pub fn from_df(df: &DataFrame) -> Result<Self, KabutoError> {
        let volume = if has_column(df, "volume") {
            column_f64(df, "volume")?
        } else {
            vec![f64::NAN; df.height()]
        };
        Ok(Self {
            dt: column_dates(df, "dt")?,
            open: column_f64(df, "open")?,
            high: column_f64(df, "high")?,
            low: column_f64(df, "low")?,
            close: column_f64(df, "close")?,
            volume,
        })
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}

/// Named output columns of one indicator, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct IndicatorValues {
    series: Vec<(String, Vec<f64>)>,
}

impl IndicatorValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a named series, replacing any series of the same name in place.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        let name = name.into();
        match self.series.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = values,
            None => self.series.push((name, values)),
        }
    }

    /// Insert a buy/sell signal pair.
    pub fn insert_signals(&mut self, (buy, sell): (Vec<f64>, Vec<f64>)) {
        self.insert("buy_signal", buy);
        self.insert("sell_signal", sell);
    }

    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.get_series(name).and_then(|v| v.get(index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.series.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Series as nullable frame columns.
    pub fn to_columns(&self) -> Vec<Column> {
        self.iter().map(|(name, values)| f64_column(name, values)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotPosition {
    /// Overlaid on the candlestick chart.
    In,
    /// Separate panel below the chart.
    Lower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlotKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotLine {
    pub column: String,
    pub label: String,
    pub kind: PlotKind,
}

impl PlotLine {
    pub fn line(column: &str, label: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            label: label.into(),
            kind: PlotKind::Line,
        }
    }

    pub fn bar(column: &str, label: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            label: label.into(),
            kind: PlotKind::Bar,
        }
    }
}

/// How an external renderer should draw an indicator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualizeHint {
    pub position: PlotPosition,
    pub lines: Vec<PlotLine>,
}

/// A technical indicator.
pub trait Indicator: Send + Sync {
    /// Method name, e.g. "sma". Used as the key of its impact.
    fn name(&self) -> &str;

    /// Numeric parameters the indicator was built with.
    fn params(&self) -> BTreeMap<String, f64>;

    /// Columns this indicator adds besides the signals.
    fn processed_columns(&self) -> Vec<String>;

    /// Processed columns plus `buy_signal` and `sell_signal`, each as long as `prices`.
    fn compute(&self, prices: &Prices) -> IndicatorValues;

    /// Scalar summaries of the computed columns.
    fn parameterize(&self, _prices: &Prices, _values: &IndicatorValues) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        None
    }

    /// Run over a single-code table and validate the result.
    fn process(&self, df: &DataFrame) -> Result<ProcessedTable, KabutoError> {
        let code = single_code(df)?.ok_or_else(|| EntityError::MissingField("code".to_string()))?;

        let mut sorted = df.sort(["dt"], SortMultipleOptions::default())?;
        let prices = Prices::from_df(&sorted)?;
        let (Some(&start_at), Some(&end_at)) = (prices.dt.first(), prices.dt.last()) else {
            return Err(EntityError::EmptyRecordset.into());
        };

        let values = self.compute(&prices);
        for (name, _) in values.iter() {
            if has_column(&sorted, name) {
                sorted = sorted.drop(name)?;
            }
        }
        let stacked = sorted.hstack(&values.to_columns())?;
        let parameters = self.parameterize(&prices, &values);

        Ok(ProcessedTable::new(
            code,
            (start_at, end_at),
            self.name(),
            stacked,
            &self.processed_columns(),
            parameters,
        )?)
    }
}

/// Build the 0/1 signal pair from row predicates.
pub(crate) fn signals_where(
    n: usize,
    buy: impl Fn(usize) -> bool,
    sell: impl Fn(usize) -> bool,
) -> (Vec<f64>, Vec<f64>) {
    let flag = |b: bool| if b { 1.0 } else { 0.0 };
    (
        (0..n).map(|i| flag(buy(i))).collect(),
        (0..n).map(|i| flag(sell(i))).collect(),
    )
}

/// All-zero signal pair for methods that never signal.
pub(crate) fn no_signals(n: usize) -> (Vec<f64>, Vec<f64>) {
    (vec![0.0; n], vec![0.0; n])
}

/// The one code a price table holds. `None` when the table has no `code` column.
///
/// Fails with `MultipleCodes` when rows of several codes are mixed together.
pub fn single_code(df: &DataFrame) -> Result<Option<String>, KabutoError> {
    if !has_column(df, "code") {
        return Ok(None);
    }
    let codes = distinct_text(df, "code")?;
    match codes.as_slice() {
        [code] => Ok(Some(code.clone())),
        [] => Err(EntityError::EmptyRecordset.into()),
        _ => Err(EntityError::MultipleCodes { codes }.into()),
    }
}

/// Synthetic prices from closes for testing.
///
/// open = previous close (or close on the first row), high = max(open, close) + 1,
/// low = min(open, close) - 1, volume = 1000. Dates are consecutive business days.
#[cfg(test)]
pub fn make_prices(closes: &[f64]) -> Prices {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 4).unwrap();
    let dt = crate::domain::calendar::business_days_from(start, closes.len());
    let open: Vec<f64> = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| if i == 0 { c } else { closes[i - 1] })
        .collect();
    let high = open.iter().zip(closes).map(|(o, c)| o.max(*c) + 1.0).collect();
    let low = open.iter().zip(closes).map(|(o, c)| o.min(*c) - 1.0).collect();
    Prices {
        dt,
        open,
        high,
        low,
        close: closes.to_vec(),
        volume: vec![1000.0; closes.len()],
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
