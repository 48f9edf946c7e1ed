//! Reduce block: weighted sum of every method's impact.

use super::{block_config, Block, BlockKind, BlockResult, Glue, Params};
use crate::error::{BlockContractError, KabutoError};
use serde_json::Value;
use std::collections::BTreeMap;

/// Methods that have a parameterize block, in reduction order.
pub const IMPACT_METHODS: [&str; 7] = [
    "sma",
    "macd",
    "adx",
    "bollinger_bands",
    "momentum",
    "psycho_logical",
    "stochastics",
];

pub const DEFAULT_IMPACT_RATIO: f64 = 0.1;

/// `impact = Σ {method}_impact × {method}_impact_ratio`.
///
/// Ratios come from config keys `{method}_impact_ratio` and must lie in [0, 1].
/// A method whose parameterize output is absent contributes 0.
#[derive(Debug, Clone)]
pub struct FullyConnectBlock {
    terms: Vec<(f64, f64)>,
}

impl Block for FullyConnectBlock {
    const NAME: &'static str = "fully_connect";
    const KIND: BlockKind = BlockKind::Reduce;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        let ratios: BTreeMap<String, f64> = block_config(glue, Self::NAME)?;
        let invalid = |reason: String| BlockContractError::InvalidParams {
            block: Self::NAME.to_string(),
            reason,
        };
        if let Some(key) = ratios
            .keys()
            .find(|k| !IMPACT_METHODS.iter().any(|m| **k == format!("{m}_impact_ratio")))
        {
            return Err(invalid(format!("unknown ratio '{key}'")).into());
        }
        if let Some((key, ratio)) = ratios.iter().find(|(_, r)| !(0.0..=1.0).contains(*r)) {
            return Err(invalid(format!("{key} = {ratio} is outside [0, 1]")).into());
        }

        let terms = IMPACT_METHODS
            .iter()
            .map(|method| {
                let ratio = ratios
                    .get(&format!("{method}_impact_ratio"))
                    .copied()
                    .unwrap_or(DEFAULT_IMPACT_RATIO);
                let impact = glue
                    .output(&format!("parameterize_{method}"))
                    .and_then(|o| o.param_f64(&format!("{method}_impact")))
                    .unwrap_or(0.0);
                (impact, ratio)
            })
            .collect();
        Ok(Self { terms })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        let impact: f64 = self.terms.iter().map(|(impact, ratio)| impact * ratio).sum();
        Ok(BlockResult::Params(Params::from([(
            "impact".to_string(),
            Value::from(impact),
        )])))
    }
}
