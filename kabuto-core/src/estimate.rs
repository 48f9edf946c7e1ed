//! Estimate filters: turn a code's impacts and parameters into one score.

use crate::error::EntityError;
use std::collections::BTreeMap;

/// Impacts keyed by method name plus every processed parameter.
pub type EstimateInput = BTreeMap<String, f64>;

pub trait EstimateFilter: Send + Sync {
    fn name(&self) -> &str;

    /// Reject inputs the filter cannot score.
    fn validate(&self, _data: &EstimateInput) -> Result<(), EntityError> {
        Ok(())
    }

    fn estimate(&self, data: &EstimateInput) -> f64;

    /// `validate`, then `estimate`.
    fn evaluate(&self, data: &EstimateInput) -> Result<f64, EntityError> {
        self.validate(data)?;
        Ok(self.estimate(data))
    }
}

/// Fundamentals placeholder: a neutral 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct EfFundamental;

impl EstimateFilter for EfFundamental {
    fn name(&self) -> &str {
        "fundamental"
    }

    fn estimate(&self, _data: &EstimateInput) -> f64 {
        0.5
    }
}

/// Volume placeholder: a neutral 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct EfVolume;

impl EstimateFilter for EfVolume {
    fn name(&self) -> &str {
        "volume"
    }

    fn estimate(&self, _data: &EstimateInput) -> f64 {
        0.5
    }
}

pub fn create_estimate_filter(name: &str) -> Result<Box<dyn EstimateFilter>, EntityError> {
    match name {
        "fundamental" => Ok(Box::new(EfFundamental)),
        "volume" => Ok(Box::new(EfVolume)),
        other => Err(EntityError::UnknownEstimateFilter(other.to_string())),
    }
}

pub fn default_estimate_filters() -> Vec<Box<dyn EstimateFilter>> {
    vec![Box::new(EfFundamental), Box::new(EfVolume)]
}
