//! Recordset integration tests: single-code invariant, business-day completeness,
//! table round trips and the CSV repository.

use chrono::NaiveDate;
use kabuto_core::data::{synthetic_recordset, CsvRecordsetRepository, RecordsetRepository};
use kabuto_core::domain::calendar::business_days_from;
use kabuto_core::domain::{RawRow, Recordset};
use kabuto_core::error::{EntityError, KabutoError};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 4).unwrap()
}

fn row(code: &str, dt: NaiveDate, close: f64) -> RawRow {
    [
        ("code", code.to_string()),
        ("dt", dt.to_string()),
        ("open", format!("{close}")),
        ("high", format!("{}", close + 5.0)),
        ("low", format!("{}", close - 5.0)),
        ("close", format!("{close}")),
        ("volume", "1,200株".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn rows(code: &str, n: usize) -> Vec<RawRow> {
    business_days_from(start(), n)
        .into_iter()
        .enumerate()
        .map(|(i, dt)| row(code, dt, 100.0 + i as f64))
        .collect()
}

// ── Single-code invariant ──

#[test]
fn two_codes_fail_status_until_narrowed() {
    let mut all = rows("1375", 20);
    all.extend(rows("7203", 20));
    let recordset = Recordset::from_rows(&all).unwrap();
    assert_eq!(recordset.get_code_list(), vec!["1375".to_string(), "7203".to_string()]);

    let err = recordset.get_single_code_recordset_status().unwrap_err();
    assert!(matches!(err, EntityError::MultipleCodes { ref codes } if codes.len() == 2));

    let status = recordset
        .to_single_code("7203")
        .unwrap()
        .get_single_code_recordset_status()
        .unwrap();
    assert_eq!(status.code, "7203");
    assert!(!status.is_delisting);
    assert!(!status.contains_outlier);
}

#[test]
fn narrowing_to_an_absent_code_is_empty() {
    let recordset = Recordset::from_rows(&rows("1375", 5)).unwrap();
    assert!(matches!(
        recordset.to_single_code("9999"),
        Err(EntityError::EmptyRecordset)
    ));
}

// ── Business-day completeness ──

#[test]
fn gap_free_history_reports_its_start() {
    let recordset = Recordset::from_rows(&rows("1375", 30)).unwrap();
    let status = recordset.get_single_code_recordset_status().unwrap();
    let days = business_days_from(start(), 30);
    assert_eq!(status.start_at, days[0]);
    assert_eq!(status.end_at, days[29]);
}

#[test]
fn missing_weekday_in_the_middle_fails() {
    let mut all = rows("1375", 30);
    all.remove(12);
    let recordset = Recordset::from_rows(&all).unwrap();
    assert!(matches!(
        recordset.get_single_code_recordset_status(),
        Err(EntityError::IncompleteBusinessDays { .. })
    ));
}

#[test]
fn repeated_date_does_not_hide_a_gap() {
    // 2024-01-05 is missing; 2024-01-08 is Coming of Age Day.
    let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
    let all = vec![row("1375", d(4), 100.0), row("1375", d(4), 100.0), row("1375", d(9), 101.0)];
    let recordset = Recordset::from_rows(&all).unwrap();
    assert!(matches!(
        recordset.get_single_code_recordset_status(),
        Err(EntityError::IncompleteBusinessDays { .. })
    ));

    let complete = vec![row("1375", d(5), 100.0), row("1375", d(5), 100.0), row("1375", d(9), 101.0)];
    let status = Recordset::from_rows(&complete)
        .unwrap()
        .get_single_code_recordset_status()
        .unwrap();
    assert_eq!((status.start_at, status.end_at), (d(5), d(9)));
}

#[test]
fn holiday_rows_are_dropped_on_construction() {
    // 2023-01-09 is Coming of Age Day.
    let holiday = NaiveDate::from_ymd_opt(2023, 1, 9).unwrap();
    let mut all = rows("1375", 10);
    all.push(row("1375", holiday, 1.0));
    let recordset = Recordset::from_rows(&all).unwrap();
    assert_eq!(recordset.len(), 10);
    assert!(recordset.records().iter().all(|r| r.dt != holiday));
}

// ── Placeholders ──

#[test]
fn placeholder_prices_flag_outlier_and_delisting() {
    let mut all = rows("1375", 10);
    let last = all.last_mut().unwrap();
    for key in ["open", "high", "low"] {
        last.insert(key.to_string(), "-".to_string());
    }
    let status = Recordset::from_rows(&all)
        .unwrap()
        .get_single_code_recordset_status()
        .unwrap();
    assert!(status.contains_outlier);
    assert!(status.is_delisting);
}

#[test]
fn non_numeric_field_is_rejected() {
    let mut all = rows("1375", 3);
    all[1].insert("close".to_string(), "n/a".to_string());
    assert!(matches!(
        Recordset::from_rows(&all),
        Err(EntityError::NotNumeric { .. })
    ));
}

// ── Table views ──

#[test]
fn table_round_trip_keeps_records() {
    let recordset = synthetic_recordset("1375", start(), 40, 3).unwrap();
    let df = recordset.to_df(false, false, None).unwrap();
    assert_eq!(df.height(), 40);
    assert_eq!(df.width(), 11);

    let back = Recordset::of(&df).unwrap();
    assert_eq!(back.records(), recordset.records());
}

#[test]
fn latest_keeps_only_newest_date() {
    let mut all = rows("1375", 10);
    all.extend(rows("7203", 10));
    let df = Recordset::from_rows(&all).unwrap().to_df(true, true, None).unwrap();
    assert_eq!(df.height(), 2);
    assert_eq!(df.width(), 7);
}

#[test]
fn table_without_code_column_fails() {
    let recordset = synthetic_recordset("1375", start(), 5, 3).unwrap();
    let df = recordset.to_df(true, false, None).unwrap().drop("code").unwrap();
    assert!(matches!(
        Recordset::of(&df),
        Err(KabutoError::Entity(EntityError::MissingField(ref f))) if f == "code"
    ));
}

// ── Splitting ──

#[test]
fn code_iterable_honours_filters() {
    let mut all = rows("1375", 30);
    all.extend(rows("7203", 10));
    all.extend(rows("9984", 30));
    let recordset = Recordset::from_rows(&all).unwrap();

    let long_enough = recordset.to_code_iterable(None, true, Some(20), None);
    let codes: Vec<String> = long_enough.iter().flat_map(|r| r.get_code_list()).collect();
    assert_eq!(codes, vec!["1375", "9984"]);

    assert_eq!(recordset.to_code_iterable(Some(1), true, None, None).len(), 1);

    let only = vec!["9984".to_string()];
    let listed = recordset.to_code_iterable(None, true, None, Some(&only));
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].get_code_list(), only);
}

#[test]
fn sliding_split_windows() {
    let recordset = synthetic_recordset("1375", start(), 50, 3).unwrap();
    let windows = recordset.sliding_split(5, 20, 10).unwrap();
    assert_eq!(windows.len(), 3);
    assert_eq!(windows[1].idx, 1);
    assert_eq!(windows[1].window.height(), 20);
    assert_eq!(windows[1].following.height(), 5);

    assert!(recordset.sliding_split(40, 20, 1).is_err());
}

// ── Persistence ──

#[test]
fn csv_repository_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let repository = CsvRecordsetRepository::new(dir.path().join("prices.csv"));
    let recordset = synthetic_recordset("1375", start(), 25, 11).unwrap();

    repository.write(&recordset).unwrap();
    let back = repository.read().unwrap();
    assert_eq!(back.records(), recordset.records());
    assert_eq!(back.get_code_list(), vec!["1375".to_string()]);
}
