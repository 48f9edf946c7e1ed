//! Extract block: decoded rows (from crawled pages or any other producer) into a table.

use super::{block_config, Block, BlockKind, BlockResult, Glue, Params};
use crate::domain::{RawRow, Recordset};
use crate::error::KabutoError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractRecordsConfig {
    pub records: Vec<BTreeMap<String, Value>>,
    pub code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ExtractRecordsBlock {
    rows: Vec<RawRow>,
    code: Option<String>,
}

/// JSON scalars as raw text; nulls are dropped so they read as absent.
fn to_raw_row(record: &BTreeMap<String, Value>) -> RawRow {
    record
        .iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((k.clone(), text))
        })
        .collect()
}

impl Block for ExtractRecordsBlock {
    const NAME: &'static str = "extract_records";
    const KIND: BlockKind = BlockKind::Extract;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        let config: ExtractRecordsConfig = block_config(glue, Self::NAME)?;
        Ok(Self {
            rows: config.records.iter().map(to_raw_row).collect(),
            code: config.code,
        })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        let mut recordset = Recordset::from_rows(&self.rows)?;
        if let Some(code) = &self.code {
            recordset = recordset.to_single_code(code)?;
        }
        let df = recordset.to_df(false, false, None)?;
        let codes: Vec<Value> = recordset.get_code_list().into_iter().map(Value::String).collect();
        Ok(BlockResult::Both(
            df,
            Params::from([("codes".to_string(), Value::Array(codes))]),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EntityError;
    use serde_json::json;

    fn glue(params: Value) -> Glue {
        Glue::initialize(serde_json::from_value(params).unwrap())
    }

    #[test]
    fn numbers_and_strings_both_coerce() {
        let params = json!({"extract_records": {"records": [
            {"code": 1375, "dt": "2024-01-04", "open": "1,000", "high": 1010, "low": 990, "close": 1005, "volume": 1200},
            {"code": "1375", "dt": "2024-01-05", "open": 1005, "high": 1020, "low": 1000, "close": 1019.5, "volume": 800, "name": null}
        ]}});
        let g = ExtractRecordsBlock::glue(&glue(params)).unwrap();
        let out = g.output("extract_records").unwrap();
        assert_eq!(out.series.as_ref().unwrap().height(), 2);
        assert_eq!(out.params.as_ref().unwrap()["codes"], json!(["1375"]));
    }

    #[test]
    fn no_records_is_empty_recordset() {
        let err = ExtractRecordsBlock::glue(&glue(json!({}))).unwrap_err();
        assert!(matches!(err, KabutoError::Entity(EntityError::EmptyRecordset)));
    }
}
