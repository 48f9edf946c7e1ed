use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named score produced by one estimate filter for one code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedValue {
    pub code: String,
    pub estimate_filter_name: String,
    pub estimated_value: f64,
}

impl EstimatedValue {
    /// `weights[name] * value`, with a weight of 1 for unlisted names.
    pub fn weighted_estimated_value(&self, weights: &HashMap<String, f64>) -> f64 {
        weights
            .get(&self.estimate_filter_name)
            .copied()
            .unwrap_or(1.0)
            * self.estimated_value
    }
}
