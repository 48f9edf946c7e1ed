//! StockCodeSingleAggregate: one code's recordset, its processed tables and estimates.
//!
//! Every `with_*` step returns a new aggregate; the receiver is left untouched.

use crate::domain::{EstimatedValue, ProcessedTable, Recordset};
use crate::error::{EntityError, KabutoError};
use crate::estimate::{EstimateFilter, EstimateInput};
use crate::fingerprint::ComponentConfig;
use crate::indicators::{create_indicator, FactoryError, Indicator, VisualizeHint};
use crate::config::ImpactConfig;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::debug;

/// Where an aggregate's prices come from.
#[derive(Debug, Clone, Copy)]
pub enum AggregateSource<'a> {
    Table(&'a DataFrame),
    Recordset(&'a Recordset),
}

/// A processed frame plus drawing hints, for an external renderer.
#[derive(Debug, Clone)]
pub struct Visualization {
    pub code: String,
    pub method: String,
    pub size_ratio: usize,
    pub df: DataFrame,
    pub hint: VisualizeHint,
}

#[derive(Debug, Clone)]
pub struct StockCodeSingleAggregate {
    pub code: String,
    pub single_recordset: Recordset,
    pub processed_list: Vec<ProcessedTable>,
    pub estimated_list: Vec<EstimatedValue>,
}

impl StockCodeSingleAggregate {
    /// Build from a table or a recordset, narrowing to `code` when given.
    ///
    /// Fails unless the result holds exactly one code with no missing business days.
    pub fn of(source: AggregateSource<'_>, code: Option<&str>) -> Result<Self, KabutoError> {
        let recordset = match source {
            AggregateSource::Table(df) => Recordset::of(df)?,
            AggregateSource::Recordset(recordset) => recordset.clone(),
        };
        let single_recordset = match code {
            Some(code) => recordset.to_single_code(code)?,
            None => recordset,
        };
        let status = single_recordset.get_single_code_recordset_status()?;
        debug!(
            "aggregate {}: {} rows from {} to {}",
            status.code,
            single_recordset.len(),
            status.start_at,
            status.end_at
        );
        Ok(Self {
            code: status.code,
            single_recordset,
            processed_list: Vec::new(),
            estimated_list: Vec::new(),
        })
    }

    fn table(&self) -> Result<DataFrame, KabutoError> {
        self.single_recordset.to_df(false, false, None)
    }

    /// Run every method over this code's table.
    pub fn with_processed(&self, methods: &[Box<dyn Indicator>]) -> Result<Self, KabutoError> {
        let df = self.table()?;
        let processed_list = methods
            .iter()
            .map(|m| m.process(&df))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            code: self.code.clone(),
            single_recordset: self.single_recordset.clone(),
            processed_list,
            estimated_list: Vec::new(),
        })
    }

    /// Like [`with_processed`](Self::with_processed), resolving methods by name.
    pub fn with_processed_configs(&self, configs: &[ComponentConfig]) -> Result<Self, KabutoError> {
        let methods = configs
            .iter()
            .map(|c| {
                create_indicator(c).map_err(|e| match e {
                    FactoryError::UnknownIndicator(name) => {
                        KabutoError::from(EntityError::UnknownMethod(name))
                    }
                    other => other.into(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.with_processed(&methods)
    }

    /// Impacts keyed by method name, then every parameter; later tables override earlier ones.
    pub fn estimate_input(&self, impact: ImpactConfig) -> EstimateInput {
        let mut data = EstimateInput::new();
        for processed in &self.processed_list {
            data.insert(
                processed.applied_method_name.clone(),
                processed.get_impact(impact.influence, impact.tail),
            );
        }
        for processed in &self.processed_list {
            data.extend(processed.parameters.iter().map(|(k, v)| (k.clone(), *v)));
        }
        data
    }

    /// Score with every filter. Impacts are decayed with `impact`.
    pub fn with_estimated(
        &self,
        filters: &[Box<dyn EstimateFilter>],
        impact: ImpactConfig,
    ) -> Result<Self, KabutoError> {
        let data = self.estimate_input(impact);
        let estimated_list = filters
            .iter()
            .map(|f| {
                Ok(EstimatedValue {
                    code: self.code.clone(),
                    estimate_filter_name: f.name().to_string(),
                    estimated_value: f.evaluate(&data)?,
                })
            })
            .collect::<Result<Vec<_>, EntityError>>()?;
        Ok(Self {
            code: self.code.clone(),
            single_recordset: self.single_recordset.clone(),
            processed_list: self.processed_list.clone(),
            estimated_list,
        })
    }

    /// Σ weight × estimate; filters missing from `weights` weigh 1.
    pub fn weighted_estimated_value(&self, weights: &HashMap<String, f64>) -> f64 {
        self.estimated_list
            .iter()
            .map(|e| e.weighted_estimated_value(weights))
            .sum()
    }

    pub fn estimate_filter_concat_name(&self) -> String {
        let mut names: Vec<&str> = self
            .estimated_list
            .iter()
            .map(|e| e.estimate_filter_name.as_str())
            .collect();
        names.sort_unstable();
        names.join("_")
    }

    pub fn visualize(&self, method: &dyn Indicator, size_ratio: usize) -> Result<Visualization, KabutoError> {
        let hint = method
            .visualize_hint()
            .ok_or_else(|| EntityError::NoVisualization(method.name().to_string()))?;
        let processed = method.process(&self.table()?)?;
        Ok(Visualization {
            code: self.code.clone(),
            method: method.name().to_string(),
            size_ratio,
            df: processed.df,
            hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::synthetic_recordset;
    use crate::estimate::default_estimate_filters;
    use crate::indicators::{Basic, Sma};
    use chrono::NaiveDate;

    fn recordset(code: &str) -> Recordset {
        let start = NaiveDate::from_ymd_opt(2023, 1, 4).unwrap();
        synthetic_recordset(code, start, 90, 7).unwrap()
    }

    #[test]
    fn of_table_and_recordset_agree() {
        let rs = recordset("1375");
        let df = rs.to_df(true, false, None).unwrap();
        let a = StockCodeSingleAggregate::of(AggregateSource::Table(&df), None).unwrap();
        let b = StockCodeSingleAggregate::of(AggregateSource::Recordset(&rs), Some("1375")).unwrap();
        assert_eq!(a.code, "1375");
        assert_eq!(a.single_recordset.len(), b.single_recordset.len());
    }

    #[test]
    fn estimate_and_weight() {
        let agg = StockCodeSingleAggregate::of(AggregateSource::Recordset(&recordset("1375")), None)
            .unwrap()
            .with_processed(&[Box::new(Sma::default()) as Box<dyn Indicator>, Box::new(Basic)])
            .unwrap()
            .with_estimated(&default_estimate_filters(), ImpactConfig::default())
            .unwrap();
        assert_eq!(agg.processed_list.len(), 2);
        assert_eq!(agg.estimate_filter_concat_name(), "fundamental_volume");
        let weights = HashMap::from([("fundamental".to_string(), 2.0)]);
        assert!((agg.weighted_estimated_value(&weights) - 1.5).abs() < 1e-12);
        let data = agg.estimate_input(ImpactConfig::default());
        assert!(data.contains_key("sma"));
        assert!(data.contains_key("basic_close"));
    }

    #[test]
    fn unknown_config_is_unknown_method() {
        let agg = StockCodeSingleAggregate::of(AggregateSource::Recordset(&recordset("1375")), None).unwrap();
        let err = agg
            .with_processed_configs(&[ComponentConfig::new("nope")])
            .unwrap_err();
        assert!(matches!(err, KabutoError::Entity(EntityError::UnknownMethod(name)) if name == "nope"));
    }

    #[test]
    fn visualize_requires_hint() {
        let agg = StockCodeSingleAggregate::of(AggregateSource::Recordset(&recordset("1375")), None).unwrap();
        assert!(matches!(
            agg.visualize(&Basic, 2),
            Err(KabutoError::Entity(EntityError::NoVisualization(_)))
        ));
        let vis = agg.visualize(&Sma::default(), 2).unwrap();
        assert_eq!(vis.df.height(), 90);
        assert_eq!(vis.hint.lines.len(), 3);
    }
}
