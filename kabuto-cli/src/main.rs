//! Kabuto CLI: single-code analysis, declarative flows and multi-code ranking.
//!
//! Commands:
//! - `analyze`: process one code with the configured methods and print its estimate
//! - `flow`: run a JSON list of block steps and print every block output
//! - `rank`: rank every code of a price CSV and save CSV/JSON artifacts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kabuto_core::blocks::{default_registry, BlockOutput};
use kabuto_core::data::{CsvRecordsetRepository, RecordsetRepository};
use kabuto_core::domain::Recordset;
use kabuto_core::estimate::create_estimate_filter;
use kabuto_core::fingerprint::flow_hash;
use kabuto_core::{AggregateSource, AnalysisConfig, Flow, FlowStep, StockCodeSingleAggregate};
use kabuto_runner::{rank_recordset, save_report};

const DEFAULT_LOG_FILTER: &str = "kabuto_core=info,kabuto_runner=info,kabuto_cli=info";

#[derive(Parser)]
#[command(
    name = "kabuto",
    about = "Kabuto CLI: indicator impacts, block flows and code ranking"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one code and print impacts, parameters and estimates.
    Analyze {
        /// Price CSV with code, date and OHLCV columns.
        #[arg(long)]
        input: PathBuf,

        /// Code to analyze. Required when the CSV holds several codes.
        #[arg(long)]
        code: Option<String>,

        /// TOML analysis config. Defaults to every default method and filter.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Run a declarative flow from a JSON step list.
    Flow {
        /// JSON array of {id, block_name, sequence_no, params}.
        #[arg(long, required_unless_present = "list_blocks")]
        steps: Option<PathBuf>,

        /// Print the registered block names and exit.
        #[arg(long, default_value_t = false)]
        list_blocks: bool,
    },
    /// Rank every code in a price CSV and save the report.
    Rank {
        /// Price CSV with code, date and OHLCV columns.
        #[arg(long)]
        input: PathBuf,

        /// TOML analysis config.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for ranking artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Number of entries to print.
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            code,
            config,
        } => run_analyze(&input, code.as_deref(), config.as_deref()),
        Commands::Flow { steps, list_blocks } => run_flow(steps.as_deref(), list_blocks),
        Commands::Rank {
            input,
            config,
            output_dir,
            top,
        } => run_rank(&input, config.as_deref(), &output_dir, top),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn load_recordset(path: &Path) -> Result<Recordset> {
    CsvRecordsetRepository::new(path)
        .read()
        .with_context(|| format!("failed to read prices from {}", path.display()))
}

fn run_analyze(input: &Path, code: Option<&str>, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let recordset = load_recordset(input)?;

    let filters = config
        .estimate_filters
        .iter()
        .map(|name| create_estimate_filter(name))
        .collect::<Result<Vec<_>, _>>()?;
    let aggregate = StockCodeSingleAggregate::of(AggregateSource::Recordset(&recordset), code)?
        .with_processed_configs(&config.methods)?
        .with_estimated(&filters, config.impact)?;

    let status = aggregate.single_recordset.get_single_code_recordset_status()?;
    println!("Code: {}", aggregate.code);
    println!("Period: {} to {} ({} rows)", status.start_at, status.end_at, aggregate.single_recordset.len());
    if status.is_delisting || status.contains_outlier {
        println!("Flags: delisting={} outlier={}", status.is_delisting, status.contains_outlier);
    }
    println!();

    println!("{:<18} {:>10}", "Method", "Impact");
    println!("{}", "-".repeat(29));
    for processed in &aggregate.processed_list {
        let impact = processed.get_impact(config.impact.influence, config.impact.tail);
        println!("{:<18} {:>10.5}", processed.applied_method_name, impact);
    }
    println!();

    println!("Parameters");
    println!("{}", "-".repeat(29));
    for processed in &aggregate.processed_list {
        for (key, value) in &processed.parameters {
            println!("  {key:<26} {value:>12.6}");
        }
    }
    println!();

    for estimated in &aggregate.estimated_list {
        println!("Estimate {:<14} {:.4}", estimated.estimate_filter_name, estimated.estimated_value);
    }
    println!(
        "Weighted score ({}): {:.4}",
        aggregate.estimate_filter_concat_name(),
        aggregate.weighted_estimated_value(&config.weights_map())
    );

    Ok(())
}

fn run_flow(steps_path: Option<&Path>, list_blocks: bool) -> Result<()> {
    let registry = default_registry()?;
    if list_blocks {
        for name in registry.names() {
            let entry = registry.get(name)?;
            println!("{:<28} {:?}", name, entry.kind);
        }
        return Ok(());
    }
    let Some(path) = steps_path else {
        bail!("--steps is required unless --list-blocks is given");
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read steps {}", path.display()))?;
    let steps: Vec<FlowStep> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a valid step list", path.display()))?;
    let hash = flow_hash(&steps)?;

    let glue = Flow::from_json(&steps, &registry)?.into_glue();
    println!("Flow {} ({} steps)", hash.short(), steps.len());
    println!();

    let mut outputs: Vec<&BlockOutput> = glue.block_outputs.values().collect();
    outputs.sort_by_key(|o| o.execution_order);
    for output in outputs {
        let shape = output
            .series
            .as_ref()
            .map(|df| format!("{} x {}", df.height(), df.width()))
            .unwrap_or_else(|| "-".into());
        println!("[{}] {} series={}", output.execution_order, output.block_name, shape);
        if let Some(params) = &output.params {
            println!("    {}", serde_json::to_string(params)?);
        }
    }

    Ok(())
}

fn run_rank(input: &Path, config_path: Option<&Path>, output_dir: &Path, top: usize) -> Result<()> {
    let config = load_config(config_path)?;
    let recordset = load_recordset(input)?;

    let report = rank_recordset(&recordset, &config)?;

    println!("{:>4} {:<8} {:>10} {:<12}", "Rank", "Code", "Score", "End");
    println!("{}", "-".repeat(37));
    for (i, entry) in report.top(top).iter().enumerate() {
        println!("{:>4} {:<8} {:>10.4} {:<12}", i + 1, entry.code, entry.score, entry.end_at);
    }
    if !report.failures.is_empty() {
        println!();
        println!("Skipped {} codes:", report.failures.len());
        for failure in &report.failures {
            println!("  {}: {}", failure.code, failure.reason);
        }
    }

    let (csv_path, json_path) = save_report(&report, output_dir, &config)?;
    println!();
    println!("Report saved to: {} and {}", csv_path.display(), json_path.display());

    Ok(())
}
