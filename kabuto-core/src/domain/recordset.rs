//! Recordset: the brands and daily records of one or many codes.

use crate::data::frame::{
    column_names, column_text, date_column, f64_column, has_column, text_column,
};
use crate::domain::calendar::{get_past_n_days, is_business_day};
use crate::domain::record::{row_date, Brand, DailyPriceRecord, RawRow};
use crate::error::{EntityError, KabutoError};
use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Columns every price table carries.
pub const REQUIRED_COL: [&str; 7] = ["code", "dt", "open", "high", "low", "close", "volume"];

/// Descriptive brand columns added by `to_df(minimum = false)`.
pub const OPTIONAL_COL: [&str; 4] = ["name", "industry_type", "market", "unit"];

/// Summary of a single-code recordset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordsetStatus {
    pub code: String,
    pub is_delisting: bool,
    pub contains_outlier: bool,
    pub start_at: NaiveDate,
    pub end_at: NaiveDate,
}

/// One window of `sliding_split`: the index, the window itself and the rows that follow it.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    pub idx: usize,
    pub window: DataFrame,
    pub following: DataFrame,
}

#[derive(Debug, Clone)]
pub struct Recordset {
    brands: BTreeSet<Brand>,
    records: Vec<DailyPriceRecord>,
}

impl Recordset {
    pub fn new(brands: BTreeSet<Brand>, records: Vec<DailyPriceRecord>) -> Result<Self, EntityError> {
        if records.is_empty() {
            return Err(EntityError::EmptyRecordset);
        }
        Ok(Self { brands, records })
    }

    /// Build from decoded rows. Rows dated on closed market days are dropped.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self, EntityError>
    where
        I: IntoIterator<Item = &'a RawRow>,
    {
        let mut brands = BTreeSet::new();
        let mut records = Vec::new();
        let mut dropped = 0usize;

        for row in rows {
            if !row.contains_key("code") {
                return Err(EntityError::MissingField("code".into()));
            }
            if !is_business_day(row_date(row)?) {
                dropped += 1;
                continue;
            }
            records.push(DailyPriceRecord::from_row(row)?);
            brands.insert(Brand::from_row(row)?);
        }

        if dropped > 0 {
            debug!("dropped {} rows dated on weekends or holidays", dropped);
        }
        Self::new(brands, records)
    }

    /// Build from a table. Every cell is read as text and coerced like a decoded row.
    pub fn of(df: &DataFrame) -> Result<Self, KabutoError> {
        if !has_column(df, "code") {
            return Err(EntityError::MissingField("code".into()).into());
        }
        let names = column_names(df);
        let columns = names
            .iter()
            .map(|name| column_text(df, name))
            .collect::<PolarsResult<Vec<_>>>()?;

        let rows: Vec<RawRow> = (0..df.height())
            .map(|i| {
                names
                    .iter()
                    .zip(&columns)
                    .filter_map(|(name, values)| {
                        values[i].as_ref().map(|v| (name.clone(), v.clone()))
                    })
                    .collect::<RawRow>()
            })
            .filter(|row| row.contains_key("code"))
            .collect();

        Ok(Self::from_rows(&rows)?)
    }

    pub fn brands(&self) -> &BTreeSet<Brand> {
        &self.brands
    }

    pub fn records(&self) -> &[DailyPriceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn brand(&self, code: &str) -> Option<&Brand> {
        self.brands.iter().find(|b| b.code == code)
    }

    /// Distinct codes held, sorted.
    pub fn get_code_list(&self) -> Vec<String> {
        let codes: BTreeSet<&str> = self
            .records
            .iter()
            .map(|r| r.code.as_str())
            .chain(self.brands.iter().map(|b| b.code.as_str()))
            .collect();
        codes.into_iter().map(str::to_string).collect()
    }

    fn require_single_code(&self) -> Result<String, EntityError> {
        let mut codes = self.get_code_list();
        match codes.len() {
            1 => Ok(codes.remove(0)),
            0 => Err(EntityError::EmptyRecordset),
            _ => Err(EntityError::MultipleCodes { codes }),
        }
    }

    /// Status of a single-code recordset, including the business-day completeness check.
    pub fn get_single_code_recordset_status(&self) -> Result<RecordsetStatus, EntityError> {
        let code = self.require_single_code()?;

        // Completeness counts distinct dates; a repeated row must not stand in for a gap.
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.dt).collect();
        dates.sort();
        dates.dedup();
        let start_at = dates[0];
        let end_at = dates[dates.len() - 1];

        let expected = get_past_n_days(end_at, dates.len())?;
        let earliest = expected.last().copied().unwrap_or(end_at);
        if earliest != start_at {
            return Err(EntityError::IncompleteBusinessDays {
                expected: earliest,
                actual: start_at,
            });
        }

        let brand_delisting = self.brands.iter().any(|b| b.is_delisting);
        Ok(RecordsetStatus {
            code,
            is_delisting: brand_delisting || self.records.iter().any(DailyPriceRecord::is_delisting),
            contains_outlier: self.records.iter().any(DailyPriceRecord::is_outlier),
            start_at,
            end_at,
        })
    }

    /// Tabular view ordered by code then date.
    ///
    /// `minimum` keeps only [`REQUIRED_COL`]; otherwise [`OPTIONAL_COL`] follow.
    /// `latest` keeps only the rows of the newest date.
    pub fn to_df(
        &self,
        minimum: bool,
        latest: bool,
        code: Option<&str>,
    ) -> Result<DataFrame, KabutoError> {
        let mut records: Vec<&DailyPriceRecord> = self
            .records
            .iter()
            .filter(|r| code.map_or(true, |c| r.code == c))
            .collect();
        records.sort_by(|a, b| a.code.cmp(&b.code).then(a.dt.cmp(&b.dt)));

        if latest {
            if let Some(max_dt) = records.iter().map(|r| r.dt).max() {
                records.retain(|r| r.dt == max_dt);
            }
        }

        let numeric = |f: fn(&DailyPriceRecord) -> f64| -> Vec<f64> {
            records.iter().map(|r| f(r)).collect()
        };
        let dates: Vec<NaiveDate> = records.iter().map(|r| r.dt).collect();

        let mut columns = vec![
            text_column("code", records.iter().map(|r| Some(r.code.clone())).collect()),
            date_column("dt", &dates)?,
            f64_column("open", &numeric(|r| r.open)),
            f64_column("high", &numeric(|r| r.high)),
            f64_column("low", &numeric(|r| r.low)),
            f64_column("close", &numeric(|r| r.close)),
            f64_column("volume", &numeric(|r| r.volume)),
        ];

        if !minimum {
            let lookup: BTreeMap<&str, &Brand> =
                self.brands.iter().map(|b| (b.code.as_str(), b)).collect();
            let brand_text = |f: fn(&Brand) -> Option<String>| -> Vec<Option<String>> {
                records
                    .iter()
                    .map(|r| lookup.get(r.code.as_str()).and_then(|b| f(b)))
                    .collect()
            };
            let units: Vec<Option<i64>> = records
                .iter()
                .map(|r| lookup.get(r.code.as_str()).and_then(|b| b.unit))
                .collect();
            columns.push(text_column("name", brand_text(|b| b.name.clone())));
            columns.push(text_column("industry_type", brand_text(|b| b.industry_type.clone())));
            columns.push(text_column("market", brand_text(|b| b.market.clone())));
            columns.push(Series::new("unit".into(), units).into_column());
        }

        Ok(DataFrame::new(columns)?)
    }

    /// Restrict to one code and re-validate.
    pub fn to_single_code(&self, code: &str) -> Result<Recordset, EntityError> {
        let brands = self.brands.iter().filter(|b| b.code == code).cloned().collect();
        let records = self.records.iter().filter(|r| r.code == code).cloned().collect();
        Recordset::new(brands, records)
    }

    /// Slide a `sliding_window`-row window over a single-code table in `step` increments.
    ///
    /// Each window is paired with the `buy_sell_term_days` rows right after it.
    pub fn sliding_split(
        &self,
        buy_sell_term_days: usize,
        sliding_window: usize,
        step: usize,
    ) -> Result<Vec<SlidingWindow>, KabutoError> {
        self.require_single_code()?;
        let df = self.to_df(true, false, None)?;
        let length = df.height();
        let span = buy_sell_term_days + sliding_window;
        if length < span {
            return Err(EntityError::WindowTooLarge {
                length,
                window: span,
            }
            .into());
        }

        Ok((0..length - span)
            .step_by(step.max(1))
            .enumerate()
            .map(|(idx, start)| SlidingWindow {
                idx,
                window: df.slice(start as i64, sliding_window),
                following: df.slice((start + sliding_window) as i64, buy_sell_term_days),
            })
            .collect())
    }

    /// Split into single-code recordsets in code order.
    ///
    /// REIT brands are skipped when `skip_reit` is set, codes with fewer than
    /// `row_more_than` rows are skipped, and at most `until` recordsets are returned.
    pub fn to_code_iterable(
        &self,
        until: Option<usize>,
        skip_reit: bool,
        row_more_than: Option<usize>,
        code_list: Option<&[String]>,
    ) -> Vec<Recordset> {
        let mut by_code: BTreeMap<&str, Vec<DailyPriceRecord>> = BTreeMap::new();
        for record in &self.records {
            by_code.entry(record.code.as_str()).or_default().push(record.clone());
        }

        let mut out = Vec::new();
        for (code, records) in by_code {
            if code_list.is_some_and(|list| !list.iter().any(|c| c == code)) {
                continue;
            }
            let brand = self.brand(code);
            if skip_reit && brand.is_some_and(Brand::is_reit) {
                continue;
            }
            if row_more_than.is_some_and(|min| records.len() < min) {
                continue;
            }
            if until.is_some_and(|limit| out.len() >= limit) {
                break;
            }
            let brands = brand.cloned().into_iter().collect();
            out.push(Recordset { brands, records });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::business_days_from;

    fn row(code: &str, dt: NaiveDate, close: f64) -> RawRow {
        [
            ("code", code.to_string()),
            ("dt", dt.to_string()),
            ("open", close.to_string()),
            ("high", (close + 1.0).to_string()),
            ("low", (close - 1.0).to_string()),
            ("close", close.to_string()),
            ("volume", "1000".to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rows_for(code: &str, start: NaiveDate, n: usize) -> Vec<RawRow> {
        business_days_from(start, n)
            .into_iter()
            .enumerate()
            .map(|(i, dt)| row(code, dt, 100.0 + i as f64))
            .collect()
    }

    #[test]
    fn empty_rows_are_rejected() {
        let rows: Vec<RawRow> = Vec::new();
        assert!(matches!(Recordset::from_rows(&rows), Err(EntityError::EmptyRecordset)));
    }

    #[test]
    fn weekend_rows_are_dropped() {
        // 2024-01-13 is a Saturday
        let rows = vec![row("1375", d(2024, 1, 12), 100.0), row("1375", d(2024, 1, 13), 101.0)];
        let rs = Recordset::from_rows(&rows).unwrap();
        assert_eq!(rs.len(), 1);
    }

    #[test]
    fn row_without_code_is_rejected() {
        let mut r = row("1375", d(2024, 1, 12), 100.0);
        r.remove("code");
        let err = Recordset::from_rows(&[r]).unwrap_err();
        assert!(matches!(err, EntityError::MissingField(f) if f == "code"));
    }

    #[test]
    fn brands_collapse_per_code() {
        let rs = Recordset::from_rows(&rows_for("1375", d(2024, 1, 9), 5)).unwrap();
        assert_eq!(rs.brands().len(), 1);
        assert_eq!(rs.get_code_list(), vec!["1375"]);
    }

    #[test]
    fn status_reports_range() {
        let rs = Recordset::from_rows(&rows_for("1375", d(2024, 1, 9), 10)).unwrap();
        let status = rs.get_single_code_recordset_status().unwrap();
        assert_eq!(status.code, "1375");
        assert_eq!(status.start_at, d(2024, 1, 9));
        assert!(!status.contains_outlier);
        assert!(!status.is_delisting);
    }

    #[test]
    fn to_df_minimum_and_full() {
        let rs = Recordset::from_rows(&rows_for("1375", d(2024, 1, 9), 3)).unwrap();
        let minimum = rs.to_df(true, false, None).unwrap();
        assert_eq!(column_names(&minimum), REQUIRED_COL.to_vec());
        let full = rs.to_df(false, false, None).unwrap();
        assert_eq!(full.width(), REQUIRED_COL.len() + OPTIONAL_COL.len());
        let latest = rs.to_df(true, true, None).unwrap();
        assert_eq!(latest.height(), 1);
    }

    #[test]
    fn of_reads_back_its_own_table() {
        let rs = Recordset::from_rows(&rows_for("1375", d(2024, 1, 9), 4)).unwrap();
        let df = rs.to_df(false, false, None).unwrap();
        let back = Recordset::of(&df).unwrap();
        assert_eq!(back.records(), rs.records());
    }

    #[test]
    fn sliding_split_counts_windows() {
        let rs = Recordset::from_rows(&rows_for("1375", d(2024, 1, 9), 70)).unwrap();
        let windows = rs.sliding_split(5, 60, 3).unwrap();
        // range(0, 5, 3) -> 0, 3
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1].idx, 1);
        assert_eq!(windows[0].window.height(), 60);
        assert_eq!(windows[0].following.height(), 5);
    }

    #[test]
    fn sliding_split_rejects_short_tables() {
        let rs = Recordset::from_rows(&rows_for("1375", d(2024, 1, 9), 10)).unwrap();
        let err = rs.sliding_split(5, 60, 3).unwrap_err();
        assert!(matches!(err, KabutoError::Entity(EntityError::WindowTooLarge { .. })));
    }

    #[test]
    fn code_iterable_filters_short_and_limits() {
        let mut rows = rows_for("1375", d(2024, 1, 9), 20);
        rows.extend(rows_for("7203", d(2024, 1, 9), 5));
        rows.extend(rows_for("9984", d(2024, 1, 9), 20));
        let rs = Recordset::from_rows(&rows).unwrap();

        let all = rs.to_code_iterable(None, true, Some(10), None);
        let codes: Vec<String> = all.iter().flat_map(|r| r.get_code_list()).collect();
        assert_eq!(codes, vec!["1375", "9984"]);

        let limited = rs.to_code_iterable(Some(1), true, None, None);
        assert_eq!(limited.len(), 1);
    }
}
