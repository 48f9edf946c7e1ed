//! Least-squares polynomial fits (degree 1, 2, 3) of the close over the whole window.
//!
//! x is the row index. The fit runs on x scaled to [0, 1] for conditioning and
//! the coefficients are mapped back to raw x. No signals.

use super::{no_signals, Indicator, IndicatorValues, PlotLine, PlotPosition, Prices, VisualizeHint};
use std::collections::BTreeMap;

const DEGREES: [(usize, &str); 3] = [(1, "linear"), (2, "square"), (3, "cube")];

#[derive(Debug, Clone, Default)]
pub struct Fitting;

/// Polynomial coefficients, highest degree first, or `None` when the system is singular.
pub fn polyfit(ys: &[f64], degree: usize) -> Option<Vec<f64>> {
    let n = ys.len();
    if n <= degree || ys.iter().any(|y| y.is_nan()) {
        return None;
    }
    let scale = (n - 1) as f64;
    let size = degree + 1;

    // normal equations on u = x / scale; column j holds u^j
    let mut a = vec![vec![0.0; size + 1]; size];
    for (i, &y) in ys.iter().enumerate() {
        let u = i as f64 / scale;
        let powers: Vec<f64> = (0..=2 * degree).map(|p| u.powi(p as i32)).collect();
        for r in 0..size {
            for c in 0..size {
                a[r][c] += powers[r + c];
            }
            a[r][size] += powers[r] * y;
        }
    }

    let scaled = solve(a)?;
    Some(
        scaled
            .iter()
            .enumerate()
            .map(|(j, c)| c / scale.powi(j as i32))
            .rev()
            .collect(),
    )
}

/// Gauss-Jordan elimination with partial pivoting on an augmented matrix.
fn solve(mut a: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let size = a.len();
    for col in 0..size {
        let pivot = (col..size).max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        for row in 0..size {
            if row == col {
                continue;
            }
            let factor = a[row][col] / a[col][col];
            for k in col..=size {
                a[row][k] -= factor * a[col][k];
            }
        }
    }
    Some((0..size).map(|r| a[r][size] / a[r][r]).collect())
}

fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().fold(0.0, |acc, c| acc * x + c)
}

impl Indicator for Fitting {
    fn name(&self) -> &str {
        "fitting"
    }

    fn params(&self) -> BTreeMap<String, f64> {
        BTreeMap::new()
    }

    fn processed_columns(&self) -> Vec<String> {
        DEGREES.iter().map(|(_, name)| format!("{name}_fitting")).collect()
    }

    fn compute(&self, prices: &Prices) -> IndicatorValues {
        let n = prices.len();
        let mut values = IndicatorValues::new();
        for (degree, name) in DEGREES {
            let fitted = match polyfit(&prices.close, degree) {
                Some(coefficients) => (0..n).map(|x| evaluate(&coefficients, x as f64)).collect(),
                None => vec![f64::NAN; n],
            };
            values.insert(format!("{name}_fitting"), fitted);
        }
        values.insert_signals(no_signals(n));
        values
    }

    /// Non-intercept coefficients, highest degree first: `close_{name}_{i}`.
    fn parameterize(&self, prices: &Prices, _values: &IndicatorValues) -> BTreeMap<String, f64> {
        let mut params = BTreeMap::new();
        for (degree, name) in DEGREES {
            let coefficients = polyfit(&prices.close, degree).unwrap_or_else(|| vec![f64::NAN; degree + 1]);
            for (i, c) in coefficients.iter().take(degree).enumerate() {
                params.insert(format!("close_{name}_{i}"), *c);
            }
        }
        params
    }

    fn visualize_hint(&self) -> Option<VisualizeHint> {
        Some(VisualizeHint {
            position: PlotPosition::In,
            lines: vec![
                PlotLine::line("linear_fitting", "linear"),
                PlotLine::line("square_fitting", "square"),
                PlotLine::line("cube_fitting", "cube"),
            ],
        })
    }
}
