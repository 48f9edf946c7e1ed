//! ProcessedTable: one indicator's output over one code.

use crate::data::frame::has_column;
use crate::error::EntityError;
use crate::signal::get_impact;
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use std::collections::BTreeMap;

/// Columns every processed table carries regardless of method.
pub const BASE_REQUIRED_COLUMNS: [&str; 7] =
    ["dt", "open", "close", "high", "low", "buy_signal", "sell_signal"];

#[derive(Debug, Clone)]
pub struct ProcessedTable {
    pub code: String,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
    pub applied_method_name: String,
    pub df: DataFrame,
    pub required_columns: Vec<String>,
    pub parameters: BTreeMap<String, f64>,
}

impl ProcessedTable {
    /// Validate that `df` holds the base columns plus `processed_columns`.
    pub fn new(
        code: impl Into<String>,
        (start_at, end_at): (NaiveDate, NaiveDate),
        applied_method_name: impl Into<String>,
        df: DataFrame,
        processed_columns: &[String],
        parameters: BTreeMap<String, f64>,
    ) -> Result<Self, EntityError> {
        let applied_method_name = applied_method_name.into();
        let required_columns: Vec<String> = BASE_REQUIRED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(processed_columns.iter().cloned())
            .collect();

        if let Some(missing) = required_columns.iter().find(|c| !has_column(&df, c)) {
            return Err(EntityError::MissingProcessedColumn {
                method: applied_method_name,
                column: missing.clone(),
            });
        }

        Ok(Self {
            code: code.into(),
            start_at,
            end_at,
            applied_method_name,
            df,
            required_columns,
            parameters,
        })
    }

    pub fn get_impact(&self, influence: usize, tail: usize) -> f64 {
        get_impact(&self.df, influence, tail)
    }
}
