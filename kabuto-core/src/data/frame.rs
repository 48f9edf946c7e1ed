//! Conversions between polars frames and plain vectors.
//!
//! Indicator math runs on `Vec<f64>` with NaN as the missing marker; frames
//! carry nulls instead. Every crossing between the two goes through here.

use crate::domain::record::parse_date;
use crate::error::KabutoError;
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|n| n.as_str().to_string())
        .collect()
}

/// Numeric column as `f64`; nulls become NaN.
pub fn column_f64(df: &DataFrame, name: &str) -> PolarsResult<Vec<f64>> {
    let series = df
        .column(name)?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}

/// Any column rendered as text. Dates render as `YYYY-MM-DD`.
pub fn column_text(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<String>>> {
    let column = df.column(name)?;
    if column.dtype() == &DataType::Date {
        let days = column.as_materialized_series().cast(&DataType::Int32)?;
        return Ok(days
            .i32()?
            .into_iter()
            .map(|d| d.and_then(date_from_epoch_days).map(|d| d.to_string()))
            .collect());
    }
    let series = column.as_materialized_series().cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Date column (either a polars `Date` or ISO text).
pub fn column_dates(df: &DataFrame, name: &str) -> Result<Vec<NaiveDate>, KabutoError> {
    column_text(df, name)?
        .into_iter()
        .map(|v| {
            let raw = v.unwrap_or_default();
            parse_date(&raw).map_err(KabutoError::from)
        })
        .collect()
}

/// `f64` values as a nullable column; NaN becomes null.
pub fn f64_column(name: &str, values: &[f64]) -> Column {
    let values: Vec<Option<f64>> = values
        .iter()
        .map(|v| if v.is_nan() { None } else { Some(*v) })
        .collect();
    Series::new(name.into(), values).into_column()
}

pub fn text_column(name: &str, values: Vec<Option<String>>) -> Column {
    Series::new(name.into(), values).into_column()
}

pub fn date_column(name: &str, dates: &[NaiveDate]) -> PolarsResult<Column> {
    let days: Vec<i32> = dates
        .iter()
        .map(|d| d.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
        .collect();
    Ok(Series::new(name.into(), days)
        .cast(&DataType::Date)?
        .into_column())
}

/// Keep the rows where `mask` is true.
pub fn filter_rows(df: &DataFrame, mask: &[bool]) -> PolarsResult<DataFrame> {
    let mask = BooleanChunked::from_slice("mask".into(), mask);
    df.filter(&mask)
}

/// Distinct non-null values of a text column, sorted.
pub fn distinct_text(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let mut values: Vec<String> = column_text(df, name)?.into_iter().flatten().collect();
    values.sort();
    values.dedup();
    Ok(values)
}

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + EPOCH_DAYS_FROM_CE)
}
