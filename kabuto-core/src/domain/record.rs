//! Per-day price rows and per-code brand metadata.

use crate::domain::coerce::{coerce_f64, coerce_i64, normalize_code};
use crate::error::EntityError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// One decoded row: column name to raw display text.
pub type RawRow = BTreeMap<String, String>;

/// The three mutually exclusive date column conventions.
pub const DATE_COLUMNS: [&str; 3] = ["date", "dt", "crawl_datetime"];

const REIT_MARKET: &str = "東証REIT";

/// One stock, one trading day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPriceRecord {
    pub code: String,
    pub dt: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl DailyPriceRecord {
    /// Build a record from a decoded row, coercing every numeric field.
    pub fn from_row(row: &RawRow) -> Result<Self, EntityError> {
        Ok(Self {
            code: normalize_code(required(row, "code")?),
            dt: row_date(row)?,
            open: coerce_f64(required(row, "open")?)?,
            high: coerce_f64(required(row, "high")?)?,
            low: coerce_f64(required(row, "low")?)?,
            close: coerce_f64(required(row, "close")?)?,
            volume: coerce_f64(required(row, "volume")?)?,
        })
    }

    /// Any OHLC value is the zero placeholder.
    pub fn is_outlier(&self) -> bool {
        self.open == 0.0 || self.high == 0.0 || self.low == 0.0 || self.close == 0.0
    }

    /// Open, high and low are all the placeholder: the page no longer quotes the code.
    pub fn is_delisting(&self) -> bool {
        self.open == 0.0 && self.high == 0.0 && self.low == 0.0
    }
}

/// Descriptive metadata for one code. Identity is the code alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Brand {
    pub code: String,
    pub unit: Option<i64>,
    pub market: Option<String>,
    pub name: Option<String>,
    pub industry_type: Option<String>,
    pub market_capitalization: Option<String>,
    pub issued_shares: Option<String>,
    pub is_delisting: bool,
}

impl Brand {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    pub fn from_row(row: &RawRow) -> Result<Self, EntityError> {
        let unit = match optional(row, "unit") {
            Some(raw) => Some(coerce_i64(raw)?),
            None => None,
        };
        let is_delisting = optional(row, "is_delisting")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);
        Ok(Self {
            code: normalize_code(required(row, "code")?),
            unit,
            market: optional(row, "market").map(str::to_string),
            name: optional(row, "name").map(str::to_string),
            industry_type: optional(row, "industry_type").map(str::to_string),
            market_capitalization: optional(row, "market_capitalization").map(str::to_string),
            issued_shares: optional(row, "issued_shares").map(str::to_string),
            is_delisting,
        })
    }

    pub fn is_reit(&self) -> bool {
        self.market.as_deref() == Some(REIT_MARKET)
    }
}

impl PartialEq for Brand {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Brand {}

impl Hash for Brand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl PartialOrd for Brand {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Brand {
    fn cmp(&self, other: &Self) -> Ordering {
        self.code.cmp(&other.code)
    }
}

// ─── Row helpers ────────────────────────────────────────────────────

/// A non-empty cell value.
fn optional<'a>(row: &'a RawRow, key: &str) -> Option<&'a str> {
    row.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn required<'a>(row: &'a RawRow, key: &str) -> Result<&'a str, EntityError> {
    optional(row, key).ok_or_else(|| EntityError::MissingField(key.to_string()))
}

/// Resolve the row's trading date from exactly one of the date columns.
pub fn row_date(row: &RawRow) -> Result<NaiveDate, EntityError> {
    let present: Vec<&str> = DATE_COLUMNS
        .iter()
        .copied()
        .filter(|c| optional(row, c).is_some())
        .collect();

    match present.as_slice() {
        [] => Err(EntityError::MissingDateColumn),
        [column] => {
            let raw = optional(row, column).unwrap_or_default();
            if *column == "crawl_datetime" {
                parse_datetime_date(raw)
            } else {
                parse_date(raw)
            }
        }
        many => Err(EntityError::AmbiguousDateColumns(
            many.iter().map(|c| c.to_string()).collect(),
        )),
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, EntityError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| EntityError::InvalidDate(raw.to_string()))
}

/// Date part of an ISO-8601 timestamp (with or without offset).
fn parse_datetime_date(raw: &str) -> Result<NaiveDate, EntityError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.date());
        }
    }
    parse_date(raw)
}
