//! Kabuto Runner: multi-code ranking and report export.
//!
//! This crate builds on `kabuto-core` to provide:
//! - Parallel ranking of every code in a recordset by weighted estimate
//! - Per-code failure collection instead of whole-run aborts
//! - CSV and JSON ranking artifacts named by config hash

pub mod export;
pub mod ranking;

pub use export::{ranking_to_csv, report_from_json, report_to_json, save_report};
pub use ranking::{rank_recordset, score_code, RankError, RankingEntry, RankingFailure, RankingReport};
