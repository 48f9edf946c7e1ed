//! Parameterize blocks: summarize a process block's output into scalar params.
//!
//! Each emits the indicator's own parameters plus `{method}_impact`, the decayed
//! buy/sell score of the processed signals.

use super::process::{
    AdxConfig, BollingerBandsConfig, MacdConfig, MethodConfig, MomentumConfig,
    PsychoLogicalConfig, SmaConfig, StochasticsConfig,
};
use super::{block_config, numeric_params, require_output, require_series, Block, BlockKind, BlockResult, Glue};
use crate::data::frame::column_f64;
use crate::error::{BlockContractError, KabutoError};
use crate::indicators::{single_code, Indicator, IndicatorValues, Prices};
use crate::signal::{get_impact, DEFAULT_INFLUENCE, DEFAULT_TAIL};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactParams {
    pub influence: usize,
    pub tail: usize,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            influence: DEFAULT_INFLUENCE,
            tail: DEFAULT_TAIL,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterizeBlock<C> {
    impact: ImpactParams,
    method: C,
    prices: DataFrame,
    processed: DataFrame,
}

pub type ParameterizeSmaBlock = ParameterizeBlock<SmaConfig>;
pub type ParameterizeMacdBlock = ParameterizeBlock<MacdConfig>;
pub type ParameterizeAdxBlock = ParameterizeBlock<AdxConfig>;
pub type ParameterizeBollingerBandsBlock = ParameterizeBlock<BollingerBandsConfig>;
pub type ParameterizeMomentumBlock = ParameterizeBlock<MomentumConfig>;
pub type ParameterizePsychoLogicalBlock = ParameterizeBlock<PsychoLogicalConfig>;
pub type ParameterizeStochasticsBlock = ParameterizeBlock<StochasticsConfig>;

impl<C: MethodConfig> Block for ParameterizeBlock<C> {
    const NAME: &'static str = C::PARAMETERIZE;
    const KIND: BlockKind = BlockKind::Parameterize;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        let impact: ImpactParams = block_config(glue, Self::NAME)?;
        if impact.influence == 0 || impact.tail == 0 {
            return Err(BlockContractError::InvalidParams {
                block: Self::NAME.to_string(),
                reason: "influence and tail must be positive".to_string(),
            }
            .into());
        }

        let output = require_output(glue, Self::NAME, C::PROCESS)?;
        let processed = output.series.clone().ok_or_else(|| BlockContractError::MissingSeries {
            block: Self::NAME.to_string(),
        })?;
        let method_params = output.params.clone().ok_or_else(|| BlockContractError::MissingParams {
            block: Self::NAME.to_string(),
            required: C::PROCESS.to_string(),
        })?;
        let method: C = serde_json::from_value(Value::Object(method_params.into_iter().collect()))
            .map_err(|e| BlockContractError::InvalidParams {
                block: Self::NAME.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            impact,
            method,
            prices: require_series(glue, Self::NAME)?,
            processed,
        })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        single_code(&self.prices)?;
        let sorted = self.prices.sort(["dt"], SortMultipleOptions::default())?;
        let prices = Prices::from_df(&sorted)?;
        if prices.len() != self.processed.height() {
            return Err(BlockContractError::MisalignedSeries {
                block: Self::NAME.to_string(),
                expected: prices.len(),
                actual: self.processed.height(),
            }
            .into());
        }

        let indicator = self.method.build();
        let mut values = IndicatorValues::new();
        for name in indicator
            .processed_columns()
            .into_iter()
            .chain(["buy_signal".to_string(), "sell_signal".to_string()])
        {
            let series = column_f64(&self.processed, &name)?;
            values.insert(name, series);
        }

        let mut params = indicator.parameterize(&prices, &values);
        params.insert(
            format!("{}_impact", C::METHOD),
            get_impact(&self.processed, self.impact.influence, self.impact.tail),
        );
        Ok(BlockResult::Params(numeric_params(&params)))
    }
}
