//! Zero-crossing detection, trend and the buy/sell impact score.
//!
//! Every indicator turns its output into `buy_signal` / `sell_signal` columns
//! of 0/1 values; `get_impact` collapses those two histories into one scalar.

use crate::data::frame::{column_f64, has_column};
use crate::indicators::window::{diff, ewm_mean, rolling_sum};
use polars::prelude::DataFrame;

pub const DEFAULT_INFLUENCE: usize = 2;
pub const DEFAULT_TAIL: usize = 5;

const TREND_WINDOW: usize = 5;

/// Upward and downward zero crossings of a series, as 0/1 values.
#[derive(Debug, Clone, PartialEq)]
pub struct Cross {
    pub to_plus: Vec<f64>,
    pub to_minus: Vec<f64>,
}

impl Cross {
    /// `(buy_signal, sell_signal)`.
    pub fn into_signals(self) -> (Vec<f64>, Vec<f64>) {
        (self.to_plus, self.to_minus)
    }
}

/// Detect sign changes between consecutive values.
///
/// Row 0 never crosses, and neither does any pair with a NaN.
pub fn cross(series: &[f64]) -> Cross {
    let n = series.len();
    let mut to_plus = vec![0.0; n];
    let mut to_minus = vec![0.0; n];
    for t in 1..n {
        let (prev, cur) = (series[t - 1], series[t]);
        if prev.is_nan() || cur.is_nan() || cur * prev >= 0.0 {
            continue;
        }
        if cur > prev {
            to_plus[t] = 1.0;
        } else if cur < prev {
            to_minus[t] = 1.0;
        }
    }
    Cross { to_plus, to_minus }
}

/// Rolling 5-period sum of the first difference.
pub fn trend(series: &[f64]) -> Vec<f64> {
    rolling_sum(&diff(series), TREND_WINDOW)
}

/// Decayed sum of recent buy activity minus recent sell activity, rounded to 5 places.
pub fn impact_from_signals(buy: &[f64], sell: &[f64], influence: usize, tail: usize) -> f64 {
    let decayed_tail = |signal: &[f64]| -> f64 {
        let filled: Vec<f64> = signal
            .iter()
            .map(|v| if v.is_nan() { 0.0 } else { *v })
            .collect();
        let ewm = ewm_mean(&filled, influence as f64);
        let start = ewm.len().saturating_sub(tail);
        ewm[start..].iter().filter(|v| !v.is_nan()).sum()
    };
    round_to(decayed_tail(buy) - decayed_tail(sell), 5)
}

/// Impact of a table holding `buy_signal` and `sell_signal`.
///
/// Returns exactly 0.0 when either column is absent or unreadable; never fails.
pub fn get_impact(df: &DataFrame, influence: usize, tail: usize) -> f64 {
    if !has_column(df, "buy_signal") || !has_column(df, "sell_signal") {
        return 0.0;
    }
    match (column_f64(df, "buy_signal"), column_f64(df, "sell_signal")) {
        (Ok(buy), Ok(sell)) => impact_from_signals(&buy, &sell, influence, tail),
        _ => 0.0,
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // normalize -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
