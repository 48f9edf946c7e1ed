//! Trailing window primitives over `f64` series.
//!
//! NaN marks a missing value. A rolling statistic is NaN until its window is
//! full and whenever the window contains a NaN. Nothing here reads past index t
//! when producing the value at t.

/// Apply `f` to every full trailing window of `values`.
fn rolling_by(values: &[f64], window: usize, f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if window == 0 {
        return out;
    }
    for end in window..=values.len() {
        let slice = &values[end - window..end];
        if slice.iter().any(|v| v.is_nan()) {
            continue;
        }
        out[end - 1] = f(slice);
    }
    out
}

pub fn rolling_sum(values: &[f64], window: usize) -> Vec<f64> {
    rolling_by(values, window, |w| w.iter().sum())
}

pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling_by(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Sample standard deviation (ddof = 1). A window of one yields NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling_by(values, window, sample_std)
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<f64> {
    rolling_by(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<f64> {
    rolling_by(values, window, |w| {
        w.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    })
}

pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    var.sqrt()
}

/// Adjusted exponentially weighted mean with `alpha = 2 / (span + 1)`.
///
/// Weights decay across NaN positions; a NaN input repeats the previous mean.
/// Output is NaN until the first observation.
pub fn ewm_mean(values: &[f64], span: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    let Some(&first) = values.first() else {
        return out;
    };
    let alpha = 2.0 / (span + 1.0);
    let decay = 1.0 - alpha;

    let mut weighted = first;
    let mut old_weight = 1.0;
    out[0] = weighted;
    for (i, &current) in values.iter().enumerate().skip(1) {
        let observed = !current.is_nan();
        if !weighted.is_nan() {
            old_weight *= decay;
            if observed {
                if weighted != current {
                    weighted = (old_weight * weighted + current) / (old_weight + 1.0);
                }
                old_weight += 1.0;
            }
        } else if observed {
            weighted = current;
        }
        out[i] = weighted;
    }
    out
}

/// Shift forward by `periods`: `out[t] = values[t - periods]`, NaN at the head.
pub fn shift(values: &[f64], periods: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if periods < n {
        out[periods..].copy_from_slice(&values[..n - periods]);
    }
    out
}

/// First difference: `out[t] = values[t] - values[t - 1]`.
pub fn diff(values: &[f64]) -> Vec<f64> {
    let prev = shift(values, 1);
    values.iter().zip(&prev).map(|(v, p)| v - p).collect()
}

/// Mean of the last `n` values (NaN skipped). NaN when nothing is left.
pub fn tail_mean(values: &[f64], n: usize) -> f64 {
    let start = values.len().saturating_sub(n);
    let tail: Vec<f64> = values[start..].iter().copied().filter(|v| !v.is_nan()).collect();
    if tail.is_empty() {
        return f64::NAN;
    }
    tail.iter().sum::<f64>() / tail.len() as f64
}

/// Last non-NaN value.
pub fn last_valid(values: &[f64]) -> f64 {
    values
        .iter()
        .rev()
        .copied()
        .find(|v| !v.is_nan())
        .unwrap_or(f64::NAN)
}
