//! Read blocks: bring a single-code price table into the flow.

use super::{block_config, Block, BlockContractError, BlockKind, BlockResult, Glue, Params};
use crate::data::repository::{CsvRecordsetRepository, RecordsetRepository};
use crate::data::synthetic::synthetic_recordset;
use crate::domain::Recordset;
use crate::error::KabutoError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Narrow to `code` when given, then require exactly one complete code.
fn single_code_result(recordset: Recordset, code: Option<&str>) -> Result<BlockResult, KabutoError> {
    let recordset = match code {
        Some(code) => recordset.to_single_code(code)?,
        None => recordset,
    };
    let status = recordset.get_single_code_recordset_status()?;
    let df = recordset.to_df(false, false, None)?;
    Ok(BlockResult::Both(
        df,
        Params::from([("code".to_string(), Value::String(status.code))]),
    ))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadCsvConfig {
    pub path: Option<String>,
    pub code: Option<String>,
}

/// Read one code from a CSV written by [`CsvRecordsetRepository`].
#[derive(Debug, Clone)]
pub struct ReadCsvBlock {
    path: String,
    code: Option<String>,
}

impl Block for ReadCsvBlock {
    const NAME: &'static str = "read_csv";
    const KIND: BlockKind = BlockKind::Read;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        let config: ReadCsvConfig = block_config(glue, Self::NAME)?;
        let path = config.path.ok_or_else(|| BlockContractError::MissingParam {
            block: Self::NAME.to_string(),
            key: "path".to_string(),
        })?;
        Ok(Self {
            path,
            code: config.code,
        })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        let recordset = CsvRecordsetRepository::new(&self.path).read()?;
        single_code_result(recordset, self.code.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadSyntheticConfig {
    pub code: String,
    pub days: usize,
    pub seed: u64,
    pub start: NaiveDate,
}

impl Default for ReadSyntheticConfig {
    fn default() -> Self {
        Self {
            code: "0000".to_string(),
            days: 120,
            seed: 7,
            start: NaiveDate::from_ymd_opt(2023, 1, 4).unwrap_or_default(),
        }
    }
}

/// Deterministic random-walk prices; the example source when no data is at hand.
#[derive(Debug, Clone)]
pub struct ReadSyntheticBlock {
    config: ReadSyntheticConfig,
}

impl Block for ReadSyntheticBlock {
    const NAME: &'static str = "read_synthetic";
    const KIND: BlockKind = BlockKind::Read;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        Ok(Self {
            config: block_config(glue, Self::NAME)?,
        })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        let c = &self.config;
        let recordset = synthetic_recordset(&c.code, c.start, c.days, c.seed)?;
        single_code_result(recordset, None)
    }
}
