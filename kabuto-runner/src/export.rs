//! Ranking export: CSV and JSON artifacts.
//!
//! Provides two formats for a [`RankingReport`]:
//! - **CSV**: one row per ranked code, one column per method impact
//! - **JSON**: the full report, failures included
//!
//! Artifact names carry the short config hash, so runs with different
//! configs never overwrite each other.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kabuto_core::config::AnalysisConfig;

use crate::ranking::RankingReport;

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: rank, code, score, estimate_filter_name, end_at, then `{method}_impact`
/// for every method in the report. Methods an entry lacks are left empty.
pub fn ranking_to_csv(report: &RankingReport) -> Result<String> {
    let methods = report.method_names();
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = ["rank", "code", "score", "estimate_filter_name", "end_at"]
        .map(String::from)
        .to_vec();
    header.extend(methods.iter().map(|m| format!("{m}_impact")));
    wtr.write_record(&header)?;

    for (i, entry) in report.entries.iter().enumerate() {
        let mut row = vec![
            (i + 1).to_string(),
            entry.code.clone(),
            format!("{:.6}", entry.score),
            entry.estimate_filter_name.clone(),
            entry.end_at.to_string(),
        ];
        row.extend(
            methods
                .iter()
                .map(|m| entry.impacts.get(m).map(|v| format!("{v:.5}")).unwrap_or_default()),
        );
        wtr.write_record(&row)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn report_to_json(report: &RankingReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize RankingReport to JSON")
}

pub fn report_from_json(json: &str) -> Result<RankingReport> {
    serde_json::from_str(json).context("failed to deserialize RankingReport from JSON")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write `ranking_{hash}.csv` and `ranking_{hash}.json` under `output_dir`.
///
/// Returns both paths, CSV first.
pub fn save_report(
    report: &RankingReport,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let hash = config.config_hash().context("failed to hash config")?;
    let stem = format!("ranking_{}", hash.short());

    let csv_path = output_dir.join(format!("{stem}.csv"));
    std::fs::write(&csv_path, ranking_to_csv(report)?)
        .with_context(|| format!("failed to write {}", csv_path.display()))?;

    let json_path = output_dir.join(format!("{stem}.json"));
    std::fs::write(&json_path, report_to_json(report)?)
        .with_context(|| format!("failed to write {}", json_path.display()))?;

    Ok((csv_path, json_path))
}
