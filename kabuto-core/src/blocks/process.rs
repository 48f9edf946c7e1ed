//! Process blocks: run one indicator over the glue series.
//!
//! Output is `dt` plus the indicator's columns and signals; params echo the
//! resolved configuration so the matching parameterize block can rebuild the
//! same indicator.

use super::{block_config, require_series, to_params, Block, BlockKind, BlockResult, Glue};
use crate::error::KabutoError;
use crate::indicators::{
    single_code, Adx, BollingerBands, Indicator, Macd, Momentum, Prices, PsychoLogical, Sma,
    Stochastics,
};
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Typed block configuration of one indicator.
pub trait MethodConfig: Serialize + DeserializeOwned + Default + Clone {
    type Method: Indicator;

    /// Indicator name, e.g. `"sma"`.
    const METHOD: &'static str;
    const PROCESS: &'static str;
    const PARAMETERIZE: &'static str;

    fn build(&self) -> Self::Method;
}

macro_rules! method_config {
    ($config:ident, $method:ty, $name:literal, { $($field:ident : $ty:ty = $default:expr),* $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $config {
            $(pub $field: $ty,)*
        }

        impl Default for $config {
            fn default() -> Self {
                Self { $($field: $default,)* }
            }
        }

        impl MethodConfig for $config {
            type Method = $method;
            const METHOD: &'static str = $name;
            const PROCESS: &'static str = concat!("process_", $name);
            const PARAMETERIZE: &'static str = concat!("parameterize_", $name);

            fn build(&self) -> $method {
                <$method>::new($(self.$field),*)
            }
        }
    };
}

method_config!(SmaConfig, Sma, "sma", {
    short_term: usize = 5,
    medium_term: usize = 21,
    long_term: usize = 70,
});
method_config!(MacdConfig, Macd, "macd", {
    short_term: usize = 12,
    long_term: usize = 26,
    macd_span: usize = 9,
});
method_config!(AdxConfig, Adx, "adx", {
    term: usize = 14,
    adx_term: usize = 14,
    adxr_term: usize = 28,
});
method_config!(BollingerBandsConfig, BollingerBands, "bollinger_bands", {
    band_term: usize = 12,
    continuity_term: usize = 10,
});
method_config!(MomentumConfig, Momentum, "momentum", {
    term: usize = 25,
    shift: usize = 10,
});
method_config!(PsychoLogicalConfig, PsychoLogical, "psycho_logical", {
    psycho_term: usize = 12,
    upper_threshold: f64 = 0.75,
    lower_threshold: f64 = 0.25,
});
method_config!(StochasticsConfig, Stochastics, "stochastics", {
    k_term: usize = 9,
    d_term: usize = 3,
    sd_term: usize = 3,
});

#[derive(Debug, Clone)]
pub struct ProcessBlock<C> {
    config: C,
    series: DataFrame,
}

pub type ProcessSmaBlock = ProcessBlock<SmaConfig>;
pub type ProcessMacdBlock = ProcessBlock<MacdConfig>;
pub type ProcessAdxBlock = ProcessBlock<AdxConfig>;
pub type ProcessBollingerBandsBlock = ProcessBlock<BollingerBandsConfig>;
pub type ProcessMomentumBlock = ProcessBlock<MomentumConfig>;
pub type ProcessPsychoLogicalBlock = ProcessBlock<PsychoLogicalConfig>;
pub type ProcessStochasticsBlock = ProcessBlock<StochasticsConfig>;

impl<C: MethodConfig> Block for ProcessBlock<C> {
    const NAME: &'static str = C::PROCESS;
    const KIND: BlockKind = BlockKind::Process;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        Ok(Self {
            config: block_config(glue, Self::NAME)?,
            series: require_series(glue, Self::NAME)?,
        })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        single_code(&self.series)?;
        let sorted = self.series.sort(["dt"], SortMultipleOptions::default())?;
        let prices = Prices::from_df(&sorted)?;
        let values = self.config.build().compute(&prices);

        let mut columns = vec![sorted.column("dt")?.clone()];
        columns.extend(values.to_columns());
        let df = DataFrame::new(columns)?;
        Ok(BlockResult::Both(df, to_params(&self.config, Self::NAME)?))
    }
}
