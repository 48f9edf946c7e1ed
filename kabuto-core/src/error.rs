//! Error taxonomy for the core.
//!
//! - `EntityError`: malformed or under-specified input data.
//! - `BlockContractError`: a block's prerequisites or the pipeline contract are violated.
//! - `LookupError`: a requested column was never produced by any block.
//!
//! `KabutoError` wraps all of them plus the table engine, repository and factory errors so
//! pipeline code can propagate with `?`.

use crate::data::repository::RepositoryError;
use crate::indicators::FactoryError;
use chrono::NaiveDate;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Malformed or under-specified input data.
#[derive(Debug, Error)]
pub enum EntityError {
    #[error("recordset must contain at least one record")]
    EmptyRecordset,

    #[error("exactly one code is required, found {}: {codes:?}", codes.len())]
    MultipleCodes { codes: Vec<String> },

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("only one of the date columns [date, dt, crawl_datetime] may be present, found {0:?}")]
    AmbiguousDateColumns(Vec<String>),

    #[error("none of the date columns [date, dt, crawl_datetime] is present")]
    MissingDateColumn,

    #[error("invalid date '{0}'")]
    InvalidDate(String),

    #[error("cannot convert '{value}' to {target}")]
    NotNumeric { value: String, target: &'static str },

    #[error("some stock data lacks: start_at ({actual}) must be equal to {expected}")]
    IncompleteBusinessDays { expected: NaiveDate, actual: NaiveDate },

    #[error("could not derive {n} business days ending at {end}")]
    CalendarExhausted { end: NaiveDate, n: usize },

    #[error("processed table of '{method}' lacks required column '{column}'")]
    MissingProcessedColumn { method: String, column: String },

    #[error("unknown method '{0}'")]
    UnknownMethod(String),

    #[error("unknown estimate filter '{0}'")]
    UnknownEstimateFilter(String),

    #[error("method '{0}' has no visualization")]
    NoVisualization(String),

    #[error("table length {length} is shorter than window {window}")]
    WindowTooLarge { length: usize, window: usize },

    #[error("estimate filter '{filter}' rejected its input: {reason}")]
    InvalidEstimateInput { filter: String, reason: String },
}

/// Violations of the block/glue/flow contract.
#[derive(Debug, Error)]
pub enum BlockContractError {
    #[error("block '{block}' requires a glue series, but none is set")]
    MissingSeries { block: String },

    #[error("block '{block}' requires the output of '{required}'")]
    MissingOutput { block: String, required: String },

    #[error("block '{block}' requires params from '{required}', but they are absent")]
    MissingParams { block: String, required: String },

    #[error("block '{block}' requires param '{key}'")]
    MissingParam { block: String, key: String },

    #[error("block '{block}' received invalid params: {reason}")]
    InvalidParams { block: String, reason: String },

    #[error("unknown block name '{0}'")]
    UnknownBlock(String),

    #[error("block type '{0}' must be named with a 'Block' suffix")]
    NamingConvention(String),

    #[error("execution orders must be unique among series outputs, duplicated: {orders:?}")]
    DuplicateExecutionOrder { orders: Vec<usize> },

    #[error("block '{block}' received a series of {actual} rows, expected {expected}")]
    MisalignedSeries {
        block: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid flow definition: {0}")]
    InvalidFlow(String),
}

/// Lookup failures during column reconstruction.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("column '{0}' was not produced by any block")]
    ColumnNotFound(String),
}

/// Umbrella error for pipeline and aggregate operations.
#[derive(Debug, Error)]
pub enum KabutoError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Block(#[from] BlockContractError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("table error: {0}")]
    Table(#[from] PolarsError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Factory(#[from] FactoryError),
}
