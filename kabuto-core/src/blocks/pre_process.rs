//! Pre-process block: normalizes the glue series for the process blocks.

use super::{block_config, require_series, to_params, Block, BlockKind, BlockResult, Glue};
use crate::data::frame::has_column;
use crate::error::KabutoError;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Columns kept when preparing for analysis.
pub const ANALYSIS_COLUMNS: [&str; 7] = ["dt", "open", "high", "low", "close", "volume", "code"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultPreProcessConfig {
    pub for_analysis: bool,
}

/// Sort by date and, with `for_analysis`, project to dt, OHLCV and code.
#[derive(Debug, Clone)]
pub struct DefaultPreProcessBlock {
    config: DefaultPreProcessConfig,
    series: DataFrame,
}

impl Block for DefaultPreProcessBlock {
    const NAME: &'static str = "default_pre_process";
    const KIND: BlockKind = BlockKind::PreProcess;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        Ok(Self {
            config: block_config(glue, Self::NAME)?,
            series: require_series(glue, Self::NAME)?,
        })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        let mut df = if has_column(&self.series, "dt") {
            self.series.sort(["dt"], SortMultipleOptions::default())?
        } else {
            self.series.clone()
        };
        if self.config.for_analysis {
            df = df.select(ANALYSIS_COLUMNS)?;
        }
        Ok(BlockResult::Both(df, to_params(&self.config, Self::NAME)?))
    }
}
