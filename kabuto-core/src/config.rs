//! Analysis configuration, loaded from TOML.
//!
//! ```toml
//! estimate_filters = ["fundamental", "volume"]
//!
//! [impact]
//! influence = 2
//! tail = 5
//!
//! [[methods]]
//! type = "sma"
//! params = { short_term = 5, long_term = 70 }
//!
//! [weights]
//! fundamental = 2.0
//!
//! [ranking]
//! skip_reit = true
//! row_more_than = 80
//! ```

use crate::fingerprint::{canonical_hash, ComponentConfig, RunHash};
use crate::signal::{DEFAULT_INFLUENCE, DEFAULT_TAIL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("config is not serializable: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactConfig {
    pub influence: usize,
    pub tail: usize,
}

impl Default for ImpactConfig {
    fn default() -> Self {
        Self {
            influence: DEFAULT_INFLUENCE,
            tail: DEFAULT_TAIL,
        }
    }
}

/// Filters for splitting a multi-code recordset before ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub until: Option<usize>,
    pub skip_reit: bool,
    pub row_more_than: Option<usize>,
    pub code_list: Option<Vec<String>>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            until: None,
            skip_reit: true,
            row_more_than: None,
            code_list: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub impact: ImpactConfig,
    pub methods: Vec<ComponentConfig>,
    pub estimate_filters: Vec<String>,
    /// Weight per estimate filter name. Unlisted filters weigh 1.
    pub weights: BTreeMap<String, f64>,
    pub ranking: RankingConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let methods = [
            "sma",
            "macd",
            "stochastics",
            "adx",
            "bollinger_bands",
            "momentum",
            "psycho_logical",
            "fitting",
            "basic",
        ]
        .into_iter()
        .map(ComponentConfig::new)
        .collect();
        Self {
            impact: ImpactConfig::default(),
            methods,
            estimate_filters: vec!["fundamental".into(), "volume".into()],
            weights: BTreeMap::new(),
            ranking: RankingConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Content hash of the whole configuration.
    pub fn config_hash(&self) -> Result<RunHash, ConfigError> {
        Ok(canonical_hash(self)?)
    }

    pub fn weights_map(&self) -> std::collections::HashMap<String, f64> {
        self.weights.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }
}
