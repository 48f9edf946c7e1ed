//! Blocks: named, composable pipeline steps.
//!
//! A block is built from the shared [`Glue`] by `factory`, computes a
//! [`BlockResult`] in `process`, and is folded back into a new Glue by the
//! provided `glue` method. The flow driver only ever calls `glue`, through a
//! [`BlockEntry`] in the [`BlockRegistry`].
//!
//! Each block reads its typed configuration from `glue.params[NAME]`; absent
//! fields take the config's serde defaults.

pub mod extract;
pub mod glue;
pub mod parameterize;
pub mod pre_process;
pub mod process;
pub mod read;
pub mod reduce;
pub mod registry;

pub use extract::ExtractRecordsBlock;
pub use glue::Glue;
pub use parameterize::{
    ParameterizeAdxBlock, ParameterizeBlock, ParameterizeBollingerBandsBlock,
    ParameterizeMacdBlock, ParameterizeMomentumBlock, ParameterizePsychoLogicalBlock,
    ParameterizeSmaBlock, ParameterizeStochasticsBlock,
};
pub use pre_process::DefaultPreProcessBlock;
pub use process::{
    MethodConfig, ProcessAdxBlock, ProcessBlock, ProcessBollingerBandsBlock, ProcessMacdBlock,
    ProcessMomentumBlock, ProcessPsychoLogicalBlock, ProcessSmaBlock, ProcessStochasticsBlock,
};
pub use read::{ReadCsvBlock, ReadSyntheticBlock};
pub use reduce::FullyConnectBlock;
pub use registry::{default_registry, BlockEntry, BlockRegistry};

use crate::error::{BlockContractError, KabutoError};
use polars::prelude::DataFrame;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Block-level parameters: JSON values keyed by name.
pub type Params = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Read,
    Extract,
    PreProcess,
    Process,
    Parameterize,
    Reduce,
}

/// What a block's `process` returns.
#[derive(Debug, Clone)]
pub enum BlockResult {
    Params(Params),
    Series(DataFrame),
    Both(DataFrame, Params),
}

/// A block result stamped with its name and position in the flow.
#[derive(Debug, Clone)]
pub struct BlockOutput {
    pub series: Option<DataFrame>,
    pub params: Option<Params>,
    pub block_name: String,
    pub execution_order: usize,
}

impl BlockOutput {
    pub fn new(result: BlockResult, block_name: impl Into<String>, execution_order: usize) -> Self {
        let (series, params) = match result {
            BlockResult::Params(p) => (None, Some(p)),
            BlockResult::Series(s) => (Some(s), None),
            BlockResult::Both(s, p) => (Some(s), Some(p)),
        };
        Self {
            series,
            params,
            block_name: block_name.into(),
            execution_order,
        }
    }

    /// Numeric param `key`, if present and a number.
    pub fn param_f64(&self, key: &str) -> Option<f64> {
        self.params.as_ref()?.get(key)?.as_f64()
    }
}

/// A pipeline step.
pub trait Block: Sized {
    /// Registry key, e.g. `"process_sma"`.
    const NAME: &'static str;
    const KIND: BlockKind;

    /// Capture configuration and inputs from the glue.
    fn factory(glue: &Glue) -> Result<Self, KabutoError>;

    fn process(&self) -> Result<BlockResult, KabutoError>;

    /// factory → process → update. Pre-process blocks also replace the glue series.
    fn glue(glue: &Glue) -> Result<Glue, KabutoError> {
        let block = Self::factory(glue)?;
        let output = BlockOutput::new(block.process()?, Self::NAME, glue.execution_order + 1);
        if Self::KIND == BlockKind::PreProcess {
            if let Some(series) = &output.series {
                return Ok(glue.with_series(series.clone()).update(output));
            }
        }
        Ok(glue.update(output))
    }
}

/// Deserialize `glue.params[block]`. Absent or null config means all defaults.
pub fn block_config<C: DeserializeOwned>(glue: &Glue, block: &str) -> Result<C, BlockContractError> {
    let value = glue
        .params
        .as_ref()
        .and_then(|p| p.get(block))
        .filter(|v| !v.is_null())
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(value).map_err(|e| BlockContractError::InvalidParams {
        block: block.to_string(),
        reason: e.to_string(),
    })
}

/// The glue series, or `MissingSeries`.
pub fn require_series(glue: &Glue, block: &str) -> Result<DataFrame, BlockContractError> {
    glue.series
        .clone()
        .ok_or_else(|| BlockContractError::MissingSeries {
            block: block.to_string(),
        })
}

/// The output of `required`, or `MissingOutput`.
pub fn require_output<'a>(
    glue: &'a Glue,
    block: &str,
    required: &str,
) -> Result<&'a BlockOutput, BlockContractError> {
    glue.block_outputs
        .get(required)
        .ok_or_else(|| BlockContractError::MissingOutput {
            block: block.to_string(),
            required: required.to_string(),
        })
}

/// Serialize a config struct into block params.
pub fn to_params<T: Serialize>(value: &T, block: &str) -> Result<Params, BlockContractError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(other) => Err(BlockContractError::InvalidParams {
            block: block.to_string(),
            reason: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(BlockContractError::InvalidParams {
            block: block.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// f64 parameters as JSON numbers; NaN becomes null.
pub fn numeric_params(values: &BTreeMap<String, f64>) -> Params {
    values
        .iter()
        .map(|(k, v)| (k.clone(), Value::from(*v)))
        .collect()
}
