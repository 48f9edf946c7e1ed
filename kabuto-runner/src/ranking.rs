//! Multi-code ranking: one aggregate per code, scored by its weighted estimate.
//!
//! Codes are scored in parallel with rayon. Each code owns its aggregate, so
//! nothing is shared between workers besides the read-only methods and filters.
//! A code that fails (gaps, placeholders, rejected inputs) becomes a
//! [`RankingFailure`] instead of aborting the run.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use kabuto_core::config::{AnalysisConfig, ConfigError};
use kabuto_core::domain::Recordset;
use kabuto_core::error::{EntityError, KabutoError};
use kabuto_core::estimate::{create_estimate_filter, EstimateFilter};
use kabuto_core::indicators::{create_indicator, FactoryError, Indicator};
use kabuto_core::{AggregateSource, StockCodeSingleAggregate};

/// Errors that stop a ranking before any code is scored.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("method error: {0}")]
    Method(#[from] FactoryError),
    #[error("estimate filter error: {0}")]
    EstimateFilter(#[from] EntityError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// One ranked code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub code: String,
    pub score: f64,
    /// Impact per method name.
    pub impacts: BTreeMap<String, f64>,
    pub estimate_filter_name: String,
    pub end_at: NaiveDate,
}

/// A code that could not be scored, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingFailure {
    pub code: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    /// Hash of the config that produced the report.
    pub config_hash: String,
    /// Sorted by score descending, then code.
    pub entries: Vec<RankingEntry>,
    pub failures: Vec<RankingFailure>,
}

impl RankingReport {
    pub fn top(&self, n: usize) -> &[RankingEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Every method name that has an impact in any entry, sorted.
    pub fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .flat_map(|e| e.impacts.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

/// Score one single-code recordset.
pub fn score_code(
    recordset: &Recordset,
    methods: &[Box<dyn Indicator>],
    filters: &[Box<dyn EstimateFilter>],
    config: &AnalysisConfig,
    weights: &HashMap<String, f64>,
) -> Result<RankingEntry, KabutoError> {
    let aggregate = StockCodeSingleAggregate::of(AggregateSource::Recordset(recordset), None)?
        .with_processed(methods)?
        .with_estimated(filters, config.impact)?;

    let impacts = aggregate
        .processed_list
        .iter()
        .map(|p| {
            (
                p.applied_method_name.clone(),
                p.get_impact(config.impact.influence, config.impact.tail),
            )
        })
        .collect();
    let end_at = aggregate.single_recordset.get_single_code_recordset_status()?.end_at;

    Ok(RankingEntry {
        score: aggregate.weighted_estimated_value(weights),
        estimate_filter_name: aggregate.estimate_filter_concat_name(),
        code: aggregate.code,
        impacts,
        end_at,
    })
}

/// Rank every code of `recordset` that passes the `[ranking]` filters.
pub fn rank_recordset(recordset: &Recordset, config: &AnalysisConfig) -> Result<RankingReport, RankError> {
    let methods = config
        .methods
        .iter()
        .map(create_indicator)
        .collect::<Result<Vec<_>, _>>()?;
    let filters = config
        .estimate_filters
        .iter()
        .map(|name| create_estimate_filter(name))
        .collect::<Result<Vec<_>, _>>()?;
    let weights = config.weights_map();
    let config_hash = config.config_hash()?;

    let ranking = &config.ranking;
    let codes = recordset.to_code_iterable(
        ranking.until,
        ranking.skip_reit,
        ranking.row_more_than,
        ranking.code_list.as_deref(),
    );
    info!("ranking {} codes with {} methods", codes.len(), methods.len());

    let results: Vec<Result<RankingEntry, RankingFailure>> = codes
        .par_iter()
        .map(|single| {
            let code = single.get_code_list().join(",");
            score_code(single, &methods, &filters, config, &weights).map_err(|e| {
                warn!("code {} skipped: {}", code, e);
                RankingFailure {
                    code,
                    reason: e.to_string(),
                }
            })
        })
        .collect();

    let (mut entries, mut failures) = (Vec::new(), Vec::new());
    for result in results {
        match result {
            Ok(entry) => entries.push(entry),
            Err(failure) => failures.push(failure),
        }
    }
    entries.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.code.cmp(&b.code)));
    failures.sort_by(|a, b| a.code.cmp(&b.code));

    info!("ranked {} codes, {} failed", entries.len(), failures.len());
    Ok(RankingReport {
        config_hash: config_hash.to_string(),
        entries,
        failures,
    })
}
