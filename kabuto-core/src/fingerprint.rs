//! Deterministic identification of analysis configurations and flows.
//!
//! - `ComponentConfig`: one method's type name and numeric parameters.
//! - `RunHash`: blake3 of a canonical JSON serialization, used to name run artifacts.

use crate::flow::FlowStep;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Configuration of a single method.
///
/// Uses `BTreeMap` for deterministic key ordering during serialization → hashing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentConfig {
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, f64>,
}

impl ComponentConfig {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: f64) -> Self {
        self.params.insert(key.into(), value);
        self
    }
}

/// Hex-encoded blake3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunHash(pub String);

impl RunHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// First 12 hex characters, enough for file names.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RunHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hash any serializable value through its canonical JSON form.
pub fn canonical_hash<T: Serialize + ?Sized>(value: &T) -> Result<RunHash, serde_json::Error> {
    // serde_json with BTreeMap produces deterministic key order
    let json = serde_json::to_vec(value)?;
    Ok(RunHash::from_bytes(&json))
}

/// Hash of a declarative flow. Steps are hashed in execution order.
pub fn flow_hash(steps: &[FlowStep]) -> Result<RunHash, serde_json::Error> {
    let mut ordered: Vec<&FlowStep> = steps.iter().collect();
    ordered.sort_by_key(|s| s.sequence_no);
    canonical_hash(&ordered)
}
