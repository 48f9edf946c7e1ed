//! Block pipeline integration tests: declarative flows, column reconstruction
//! and user-registered blocks.

use kabuto_core::blocks::*;
use kabuto_core::data::frame::{column_f64, date_column, f64_column};
use kabuto_core::error::{BlockContractError, EntityError, KabutoError, LookupError};
use kabuto_core::fingerprint::flow_hash;
use kabuto_core::{Flow, FlowPath, FlowStep};
use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde_json::{json, Value};

fn all_methods() -> FlowPath {
    FlowPath::new()
        .read_example("1375")
        .apply_default_pre_process()
        .sma()
        .macd()
        .stochastics()
        .momentum()
        .adx()
        .psycho_logical()
        .bollinger_bands()
}

// ── Full flow ──

#[test]
fn full_flow_reduces_to_one_impact() {
    let registry = default_registry().unwrap();
    let steps = all_methods().fully_connect().dumps();
    assert_eq!(steps.len(), 17);

    let glue = Flow::from_json(&steps, &registry).unwrap().into_glue();
    assert_eq!(glue.execution_order, 17);
    assert_eq!(glue.block_outputs.len(), 17);

    let expected: f64 = reduce::IMPACT_METHODS
        .iter()
        .map(|m| {
            glue.output(&format!("parameterize_{m}"))
                .and_then(|o| o.param_f64(&format!("{m}_impact")))
                .unwrap()
                * reduce::DEFAULT_IMPACT_RATIO
        })
        .sum();
    let impact = glue.output("fully_connect").unwrap().param_f64("impact").unwrap();
    assert!((impact - expected).abs() < 1e-12);
}

#[test]
fn reconstructs_columns_across_blocks() {
    let steps = all_methods().dumps();
    let glue = Flow::from_json(&steps, &default_registry().unwrap()).unwrap().into_glue();

    let df = glue
        .get_series_from_required_columns(&["dt", "close", "sma_long", "macd", "ADX"])
        .unwrap();
    assert_eq!(df.height(), 120);
    assert_eq!(df.width(), 5);

    // pre_process re-emits close after read: the newer fragment wins, same values
    let close = column_f64(&df, "close").unwrap();
    let original = column_f64(glue.output("read_synthetic").unwrap().series.as_ref().unwrap(), "close").unwrap();
    assert_eq!(close, original);

    assert!(matches!(
        glue.get_series_from_required_columns(&["ichimoku"]),
        Err(KabutoError::Lookup(LookupError::ColumnNotFound(c))) if c == "ichimoku"
    ));
}

#[test]
fn flow_steps_survive_json() {
    let steps = all_methods().fully_connect().dumps();
    let text = serde_json::to_string(&steps).unwrap();
    let parsed: Vec<FlowStep> = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, steps);
    assert_eq!(flow_hash(&parsed).unwrap(), flow_hash(&steps).unwrap());

    let flow = Flow::from_json_str(&text, &default_registry().unwrap()).unwrap();
    assert!(flow.glue().output("fully_connect").is_some());
}

#[test]
fn step_params_configure_blocks() {
    let mut steps = FlowPath::new().read_example("7203").apply_default_pre_process().sma().dumps();
    steps[0].params = json!({"code": "7203", "days": 60});
    steps[2].params = json!({"short_term": 3, "medium_term": 10, "long_term": 20});

    let glue = Flow::from_json(&steps, &default_registry().unwrap()).unwrap().into_glue();
    let sma = glue.output("process_sma").unwrap();
    assert_eq!(sma.series.as_ref().unwrap().height(), 60);
    assert_eq!(sma.param_f64("long_term"), Some(20.0));

    let parameterize = glue.output("parameterize_sma").unwrap();
    assert_eq!(parameterize.param_f64("long_term"), Some(20.0));
    assert!(parameterize.param_f64("sma_impact").is_some());
}

#[test]
fn parameterize_without_process_fails() {
    let steps = vec![
        FlowStep {
            id: "read".into(),
            block_name: "read_synthetic".into(),
            sequence_no: 1,
            params: Value::Null,
        },
        FlowStep {
            id: "p".into(),
            block_name: "parameterize_macd".into(),
            sequence_no: 2,
            params: Value::Null,
        },
    ];
    let err = Flow::from_json(&steps, &default_registry().unwrap()).unwrap_err();
    assert!(matches!(
        err,
        KabutoError::Block(BlockContractError::MissingOutput { ref required, .. }) if required == "process_macd"
    ));
}

#[test]
fn process_without_series_fails() {
    let err = Flow::initialize(Params::new())
        .then_block::<ProcessSmaBlock>()
        .unwrap_err();
    assert!(matches!(err, KabutoError::Block(BlockContractError::MissingSeries { .. })));
}

// ── Extracted records ──

#[test]
fn extracted_records_feed_a_method() {
    let dates: Vec<String> = kabuto_core::domain::calendar::business_days_from(
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        40,
    )
    .iter()
    .map(|d| d.to_string())
    .collect();
    let records: Vec<Value> = dates
        .iter()
        .enumerate()
        .map(|(i, dt)| {
            let close = 500 + (i % 7) * 3;
            json!({
                "code": "1301", "date": dt, "open": close, "high": close + 4,
                "low": close - 4, "close": close, "volume": "12,000"
            })
        })
        .collect();

    let params = Params::from([
        ("extract_records".to_string(), json!({ "records": records })),
        ("process_momentum".to_string(), json!({ "term": 5, "shift": 3 })),
    ]);
    let glue = Flow::initialize(params)
        .then(&[
            BlockEntry::of::<ExtractRecordsBlock>(),
            BlockEntry::of::<DefaultPreProcessBlock>(),
            BlockEntry::of::<ProcessMomentumBlock>(),
            BlockEntry::of::<ParameterizeMomentumBlock>(),
        ])
        .unwrap()
        .into_glue();

    assert_eq!(glue.output("extract_records").unwrap().params.as_ref().unwrap()["codes"], json!(["1301"]));
    let df = glue.get_series_from_required_columns(&["dt", "momentum", "volume"]).unwrap();
    assert_eq!(df.height(), 40);
    assert_eq!(column_f64(&df, "volume").unwrap()[0], 12_000.0);
}

#[test]
fn mixed_codes_are_rejected_by_process_blocks() {
    let dates = kabuto_core::domain::calendar::business_days_from(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), 19);
    let records: Vec<Value> = ["1301", "7203"]
        .iter()
        .flat_map(|code| {
            dates.iter().enumerate().map(move |(i, dt)| {
                let close = 100 + i;
                json!({
                    "code": code, "dt": dt.to_string(), "open": close, "high": close + 2,
                    "low": close - 2, "close": close, "volume": 1000
                })
            })
        })
        .collect();

    let params = Params::from([
        ("extract_records".to_string(), json!({ "records": records.clone() })),
        ("process_sma".to_string(), json!({ "short_term": 2, "medium_term": 3, "long_term": 5 })),
    ]);
    let flow = Flow::initialize(params)
        .then(&[BlockEntry::of::<ExtractRecordsBlock>(), BlockEntry::of::<DefaultPreProcessBlock>()])
        .unwrap();
    assert_eq!(flow.glue().series.as_ref().unwrap().height(), 38);

    let err = ProcessSmaBlock::glue(flow.glue()).unwrap_err();
    assert!(matches!(
        err,
        KabutoError::Entity(EntityError::MultipleCodes { ref codes }) if codes == &["1301", "7203"]
    ));

    // Narrowing to one code at extraction lets the same flow through.
    let narrowed = Params::from([
        ("extract_records".to_string(), json!({ "records": records, "code": "7203" })),
        ("process_sma".to_string(), json!({ "short_term": 2, "medium_term": 3, "long_term": 5 })),
    ]);
    let glue = Flow::initialize(narrowed)
        .then(&[
            BlockEntry::of::<ExtractRecordsBlock>(),
            BlockEntry::of::<DefaultPreProcessBlock>(),
            BlockEntry::of::<ProcessSmaBlock>(),
        ])
        .unwrap()
        .into_glue();
    assert_eq!(glue.output("process_sma").unwrap().series.as_ref().unwrap().height(), 19);
}

// ── User blocks ──

/// Scales the close into a new column; no prerequisites besides a series.
struct HalfCloseBlock {
    series: DataFrame,
}

impl Block for HalfCloseBlock {
    const NAME: &'static str = "half_close";
    const KIND: BlockKind = BlockKind::Process;

    fn factory(glue: &Glue) -> Result<Self, KabutoError> {
        let series = glue.series.clone().ok_or_else(|| BlockContractError::MissingSeries {
            block: Self::NAME.to_string(),
        })?;
        Ok(Self { series })
    }

    fn process(&self) -> Result<BlockResult, KabutoError> {
        let close = column_f64(&self.series, "close")?;
        let half: Vec<f64> = close.iter().map(|c| c / 2.0).collect();
        let df = DataFrame::new(vec![
            self.series.column("dt")?.clone(),
            f64_column("half_close", &half),
        ])?;
        Ok(BlockResult::Series(df))
    }
}

#[test]
fn registered_user_block_runs_from_steps() {
    let mut registry = default_registry().unwrap();
    registry.register::<HalfCloseBlock>().unwrap();
    assert_eq!(registry.len(), 20);

    let mut steps = FlowPath::new().read_example("1375").apply_default_pre_process().dumps();
    steps.push(FlowStep {
        id: "half".into(),
        block_name: "half_close".into(),
        sequence_no: 3,
        params: Value::Null,
    });
    let glue = Flow::from_json(&steps, &registry).unwrap().into_glue();
    let df = glue.get_series_from_required_columns(&["close", "half_close"]).unwrap();
    let close = column_f64(&df, "close").unwrap();
    let half = column_f64(&df, "half_close").unwrap();
    assert!(close.iter().zip(&half).all(|(c, h)| (c / 2.0 - h).abs() < 1e-12));

    assert!(Flow::from_json(&steps, &default_registry().unwrap()).is_err());
}

// ── Column precedence and duplicates ──

fn fragment(name: &str, values: &[f64]) -> DataFrame {
    let dates: Vec<NaiveDate> = (0..values.len())
        .map(|i| NaiveDate::from_ymd_opt(2024, 2, 1 + i as u32).unwrap())
        .collect();
    DataFrame::new(vec![date_column("dt", &dates).unwrap(), f64_column(name, values)]).unwrap()
}

#[test]
fn later_block_close_wins() {
    let glue = Glue::default()
        .update(BlockOutput::new(BlockResult::Series(fragment("close", &[1.0, 2.0, 3.0])), "first", 1))
        .update(BlockOutput::new(BlockResult::Series(fragment("close", &[7.0, 8.0, 9.0])), "second", 2));
    let df = glue.get_series_from_required_columns(&["close"]).unwrap();
    assert_eq!(column_f64(&df, "close").unwrap(), vec![7.0, 8.0, 9.0]);
}

#[test]
fn duplicate_orders_name_the_orders() {
    let glue = Glue::default()
        .update(BlockOutput::new(BlockResult::Series(fragment("close", &[1.0])), "first", 3))
        .update(BlockOutput::new(BlockResult::Series(fragment("open", &[1.0])), "second", 3));
    let err = glue.get_series_from_required_columns(&["close"]).unwrap_err();
    assert!(err.to_string().contains("[3, 3]"), "{err}");
}
