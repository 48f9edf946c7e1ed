//! Factory: converts a `ComponentConfig` into a boxed indicator.

use super::{
    Adx, Basic, BollingerBands, Fitting, Indicator, Macd, Momentum, PctChange, PsychoLogical, Sma,
    Stochastics, Volatility,
};
use crate::fingerprint::ComponentConfig;

/// Errors that can occur during indicator construction.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("unknown indicator type: {0}")]
    UnknownIndicator(String),
    #[error("invalid parameter '{key}' for {indicator}: {value}")]
    InvalidParam {
        indicator: String,
        key: String,
        value: f64,
    },
}

/// Extract a named f64 parameter, falling back to `default`.
fn param(config: &ComponentConfig, name: &str, default: f64) -> f64 {
    config.params.get(name).copied().unwrap_or(default)
}

/// Extract a named window length. Windows must be positive integers.
fn param_usize(config: &ComponentConfig, name: &str, default: usize) -> Result<usize, FactoryError> {
    match config.params.get(name).copied() {
        None => Ok(default),
        Some(v) if v >= 1.0 && v.fract() == 0.0 => Ok(v as usize),
        Some(value) => Err(FactoryError::InvalidParam {
            indicator: config.component_type.clone(),
            key: name.to_string(),
            value,
        }),
    }
}

/// Create an indicator from a `ComponentConfig`.
pub fn create_indicator(config: &ComponentConfig) -> Result<Box<dyn Indicator>, FactoryError> {
    match config.component_type.as_str() {
        "sma" => Ok(Box::new(Sma::new(
            param_usize(config, "short_term", 5)?,
            param_usize(config, "medium_term", 21)?,
            param_usize(config, "long_term", 70)?,
        ))),
        "macd" => Ok(Box::new(Macd::new(
            param_usize(config, "short_term", 12)?,
            param_usize(config, "long_term", 26)?,
            param_usize(config, "macd_span", 9)?,
        ))),
        "bollinger_bands" => Ok(Box::new(BollingerBands::new(
            param_usize(config, "band_term", 12)?,
            param_usize(config, "continuity_term", 10)?,
        ))),
        "adx" => Ok(Box::new(Adx::new(
            param_usize(config, "term", 14)?,
            param_usize(config, "adx_term", 14)?,
            param_usize(config, "adxr_term", 28)?,
        ))),
        "stochastics" => Ok(Box::new(Stochastics::new(
            param_usize(config, "k_term", 9)?,
            param_usize(config, "d_term", 3)?,
            param_usize(config, "sd_term", 3)?,
        ))),
        "momentum" => Ok(Box::new(Momentum::new(
            param_usize(config, "term", 25)?,
            param_usize(config, "shift", 10)?,
        ))),
        "psycho_logical" => Ok(Box::new(PsychoLogical::new(
            param_usize(config, "psycho_term", 12)?,
            param(config, "upper_threshold", 0.75),
            param(config, "lower_threshold", 0.25),
        ))),
        "fitting" => Ok(Box::new(Fitting)),
        "basic" => Ok(Box::new(Basic)),
        "pct_change" => Ok(Box::new(PctChange::default())),
        "volatility" => Ok(Box::new(Volatility::new(param_usize(config, "term", 20)?))),
        other => Err(FactoryError::UnknownIndicator(other.to_string())),
    }
}

/// The methods an analysis runs when nothing else is configured.
pub fn default_methods() -> Vec<Box<dyn Indicator>> {
    vec![
        Box::new(Sma::default()),
        Box::new(Macd::default()),
        Box::new(Stochastics::default()),
        Box::new(Adx::default()),
        Box::new(BollingerBands::default()),
        Box::new(Momentum::default()),
        Box::new(PsychoLogical::default()),
        Box::new(Fitting),
        Box::new(Basic),
    ]
}
