//! Deterministic synthetic price history.
//!
//! A seeded random walk over Japanese business days. Used when no real data is
//! at hand: the `read_synthetic` block, tests and benches.

use crate::domain::calendar::business_days_from;
use crate::domain::record::{Brand, DailyPriceRecord};
use crate::domain::recordset::Recordset;
use crate::error::EntityError;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;

const START_PRICE: f64 = 1_000.0;

/// `days` business days of prices for `code`, starting at the first business day on or after `start`.
///
/// The same `(code, seed)` pair always yields the same series.
pub fn synthetic_recordset(
    code: &str,
    start: NaiveDate,
    days: usize,
    seed: u64,
) -> Result<Recordset, EntityError> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(code.as_bytes());
    hasher.update(&seed.to_le_bytes());
    let mut rng = StdRng::from_seed(*hasher.finalize().as_bytes());

    let mut price = START_PRICE;
    let records = business_days_from(start, days)
        .into_iter()
        .map(|dt| {
            let daily_return: f64 = rng.gen_range(-0.03..0.03);
            let open = price;
            let close = price * (1.0 + daily_return);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(10_000..1_000_000u64) as f64;
            price = close;
            DailyPriceRecord {
                code: code.to_string(),
                dt,
                open: round1(open),
                high: round1(high),
                low: round1(low),
                close: round1(close),
                volume,
            }
        })
        .collect();

    Recordset::new(BTreeSet::from([Brand::new(code)]), records)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
