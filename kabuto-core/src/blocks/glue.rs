//! Glue: the persistent pipeline context threaded through a flow.

use super::{BlockOutput, Params};
use crate::data::frame::{column_names, has_column};
use crate::error::{BlockContractError, KabutoError, LookupError};
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const ROW_INDEX: &str = "__row_index";

/// Accumulated block outputs plus the current series and params.
///
/// Every operation returns a new `Glue`; an existing one never changes.
#[derive(Debug, Clone, Default)]
pub struct Glue {
    pub series: Option<DataFrame>,
    pub params: Option<Params>,
    pub block_outputs: BTreeMap<String, BlockOutput>,
    pub execution_order: usize,
}

impl Glue {
    pub fn initialize(params: Params) -> Self {
        Self {
            params: Some(params),
            ..Self::default()
        }
    }

    pub fn with_series(&self, series: DataFrame) -> Self {
        Self {
            series: Some(series),
            ..self.clone()
        }
    }

    /// Record `output` under its block name and advance the execution order.
    ///
    /// The output's series and params become the glue's own only while those are unset.
    pub fn update(&self, output: BlockOutput) -> Self {
        let series = self.series.clone().or_else(|| output.series.clone());
        let params = self.params.clone().or_else(|| output.params.clone());
        let mut block_outputs = self.block_outputs.clone();
        block_outputs.insert(output.block_name.clone(), output);
        Self {
            series,
            params,
            block_outputs,
            execution_order: self.execution_order + 1,
        }
    }

    pub fn output(&self, block_name: &str) -> Option<&BlockOutput> {
        self.block_outputs.get(block_name)
    }

    /// Rebuild one table from every series-carrying output.
    ///
    /// Newer outputs win column-name conflicts. Fragments are left-joined on
    /// `dt` when all of them carry it, otherwise on row position, starting from
    /// the newest fragment. The result is sorted by the join key and projected
    /// to `required`.
    pub fn get_series_from_required_columns(&self, required: &[&str]) -> Result<DataFrame, KabutoError> {
        let mut fragments: Vec<(usize, &DataFrame)> = self
            .block_outputs
            .values()
            .filter_map(|o| o.series.as_ref().map(|s| (o.execution_order, s)))
            .collect();

        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for (order, _) in &fragments {
            *counts.entry(*order).or_default() += 1;
        }
        let duplicated: Vec<usize> = counts
            .iter()
            .filter(|(_, n)| **n > 1)
            .flat_map(|(order, n)| std::iter::repeat(*order).take(*n))
            .collect();
        if !duplicated.is_empty() {
            return Err(BlockContractError::DuplicateExecutionOrder { orders: duplicated }.into());
        }

        fragments.sort_by(|a, b| b.0.cmp(&a.0));
        let by_dt = fragments.iter().all(|(_, df)| has_column(df, "dt"));
        let key = if by_dt { "dt" } else { ROW_INDEX };

        let mut claimed: BTreeSet<String> = BTreeSet::new();
        let mut slices: Vec<LazyFrame> = Vec::new();
        for (_, df) in fragments {
            let keyed = if by_dt {
                df.clone()
            } else {
                df.with_row_index(ROW_INDEX.into(), None)?
            };
            let own: Vec<String> = column_names(&keyed)
                .into_iter()
                .filter(|c| c != key && !claimed.contains(c))
                .collect();
            if own.is_empty() && !slices.is_empty() {
                continue;
            }
            let mut exprs = vec![col(key)];
            exprs.extend(own.iter().map(|c| col(c.as_str())));
            claimed.extend(own);
            slices.push(keyed.lazy().select(exprs));
        }
        if by_dt && !slices.is_empty() {
            claimed.insert("dt".to_string());
        }

        if let Some(missing) = required.iter().find(|c| !claimed.contains(**c)) {
            return Err(LookupError::ColumnNotFound(missing.to_string()).into());
        }
        let mut slices = slices.into_iter();
        let Some(mut joined) = slices.next() else {
            return Ok(DataFrame::empty());
        };
        for slice in slices {
            joined = joined.join(
                slice,
                [col(key)],
                [col(key)],
                JoinArgs::new(JoinType::Left),
            );
        }
        let projection: Vec<Expr> = required.iter().map(|c| col(*c)).collect();
        Ok(joined
            .sort([key], SortMultipleOptions::default())
            .select(projection)
            .collect()?)
    }
}
