//! Flow: drives a sequence of blocks over a [`Glue`].
//!
//! Flows are built either in code (`then`, `then_block`) or from a declarative
//! list of [`FlowStep`]s resolved through a [`BlockRegistry`]. [`FlowPath`]
//! writes such step lists for the common pipelines.

use crate::blocks::{Block, BlockEntry, BlockRegistry, Glue, Params};
use crate::error::{BlockContractError, KabutoError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// One declarative pipeline step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowStep {
    pub id: String,
    pub block_name: String,
    pub sequence_no: usize,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Default)]
pub struct Flow {
    glue: Glue,
}

impl Flow {
    pub fn initialize(params: Params) -> Self {
        Self {
            glue: Glue::initialize(params),
        }
    }

    pub fn glue(&self) -> &Glue {
        &self.glue
    }

    pub fn into_glue(self) -> Glue {
        self.glue
    }

    fn apply(self, entry: &BlockEntry) -> Result<Self, KabutoError> {
        debug!(
            "flow step {}: {} ({:?})",
            self.glue.execution_order + 1,
            entry.name,
            entry.kind
        );
        Ok(Self {
            glue: entry.apply(&self.glue)?,
        })
    }

    /// Apply `blocks` in order.
    pub fn then(self, blocks: &[BlockEntry]) -> Result<Self, KabutoError> {
        blocks.iter().try_fold(self, |flow, entry| flow.apply(entry))
    }

    pub fn then_block<B: Block>(self) -> Result<Self, KabutoError> {
        self.apply(&BlockEntry::of::<B>())
    }

    /// Apply a final block and hand back the glue.
    pub fn reduce(self, block: &BlockEntry) -> Result<Glue, KabutoError> {
        Ok(self.apply(block)?.glue)
    }

    /// Build and run a flow from declarative steps, in ascending `sequence_no`.
    ///
    /// Every name is resolved before any block runs.
    pub fn from_json(steps: &[FlowStep], registry: &BlockRegistry) -> Result<Self, KabutoError> {
        let mut ordered: Vec<&FlowStep> = steps.iter().collect();
        ordered.sort_by_key(|s| s.sequence_no);

        let mut seen = BTreeSet::new();
        if let Some(dup) = ordered.iter().find(|s| !seen.insert(s.sequence_no)) {
            return Err(BlockContractError::InvalidFlow(format!(
                "sequence_no {} is used more than once",
                dup.sequence_no
            ))
            .into());
        }

        let entries = ordered
            .iter()
            .map(|s| registry.get(&s.block_name).copied())
            .collect::<Result<Vec<_>, _>>()?;
        let params: Params = ordered
            .iter()
            .map(|s| (s.block_name.clone(), s.params.clone()))
            .collect();

        let flow = Self::initialize(params).then(&entries)?;
        info!(
            "flow finished: {} steps, {} outputs",
            entries.len(),
            flow.glue.block_outputs.len()
        );
        Ok(flow)
    }

    /// [`from_json`](Self::from_json) over JSON text.
    pub fn from_json_str(text: &str, registry: &BlockRegistry) -> Result<Self, KabutoError> {
        let steps: Vec<FlowStep> = serde_json::from_str(text)
            .map_err(|e| BlockContractError::InvalidFlow(e.to_string()))?;
        Self::from_json(&steps, registry)
    }
}

/// Builder for declarative step lists. Sequence numbers start at 1.
#[derive(Debug, Clone)]
pub struct FlowPath {
    next_sequence_no: usize,
    steps: Vec<FlowStep>,
}

impl Default for FlowPath {
    fn default() -> Self {
        Self {
            next_sequence_no: 1,
            steps: Vec::new(),
        }
    }
}

impl FlowPath {
    pub fn new() -> Self {
        Self::default()
    }

    fn step(mut self, block_name: &str, params: Value) -> Self {
        self.steps.push(FlowStep {
            id: block_name.to_string(),
            block_name: block_name.to_string(),
            sequence_no: self.next_sequence_no,
            params,
        });
        self.next_sequence_no += 1;
        self
    }

    fn method(self, name: &str) -> Self {
        self.step(&format!("process_{name}"), json!({}))
            .step(&format!("parameterize_{name}"), json!({}))
    }

    /// Synthetic example prices for `code`.
    pub fn read_example(self, code: &str) -> Self {
        self.step("read_synthetic", json!({ "code": code }))
    }

    pub fn read_csv(self, path: &str, code: Option<&str>) -> Self {
        self.step("read_csv", json!({ "path": path, "code": code }))
    }

    pub fn apply_default_pre_process(self) -> Self {
        self.step("default_pre_process", json!({}))
    }

    pub fn sma(self) -> Self {
        self.method("sma")
    }

    pub fn macd(self) -> Self {
        self.method("macd")
    }

    pub fn stochastics(self) -> Self {
        self.method("stochastics")
    }

    pub fn momentum(self) -> Self {
        self.method("momentum")
    }

    pub fn adx(self) -> Self {
        self.method("adx")
    }

    pub fn psycho_logical(self) -> Self {
        self.method("psycho_logical")
    }

    pub fn bollinger_bands(self) -> Self {
        self.method("bollinger_bands")
    }

    pub fn fully_connect(self) -> Self {
        self.step("fully_connect", json!({}))
    }

    pub fn dumps(&self) -> Vec<FlowStep> {
        self.steps.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{default_registry, DefaultPreProcessBlock, ReadSyntheticBlock};

    #[test]
    fn path_numbers_steps() {
        let steps = FlowPath::new().read_example("1375").apply_default_pre_process().sma().dumps();
        let names: Vec<&str> = steps.iter().map(|s| s.block_name.as_str()).collect();
        assert_eq!(names, vec!["read_synthetic", "default_pre_process", "process_sma", "parameterize_sma"]);
        let orders: Vec<usize> = steps.iter().map(|s| s.sequence_no).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn runs_in_sequence_order() {
        let mut steps = FlowPath::new().read_example("1375").apply_default_pre_process().macd().dumps();
        steps.reverse();
        let flow = Flow::from_json(&steps, &default_registry().unwrap()).unwrap();
        let glue = flow.glue();
        assert_eq!(glue.execution_order, 4);
        assert_eq!(glue.output("read_synthetic").unwrap().execution_order, 1);
        assert_eq!(glue.output("parameterize_macd").unwrap().execution_order, 4);
    }

    #[test]
    fn unknown_block_fails_before_running() {
        let steps = vec![FlowStep {
            id: "x".into(),
            block_name: "read_example".into(),
            sequence_no: 1,
            params: Value::Null,
        }];
        let err = Flow::from_json(&steps, &default_registry().unwrap()).unwrap_err();
        assert!(matches!(err, KabutoError::Block(BlockContractError::UnknownBlock(_))));
    }

    #[test]
    fn duplicate_sequence_numbers() {
        let mut steps = FlowPath::new().read_example("1375").apply_default_pre_process().dumps();
        steps[1].sequence_no = 1;
        let err = Flow::from_json(&steps, &default_registry().unwrap()).unwrap_err();
        assert!(matches!(err, KabutoError::Block(BlockContractError::InvalidFlow(_))));
    }

    #[test]
    fn typed_then_block() {
        let glue = Flow::initialize(Params::new())
            .then_block::<ReadSyntheticBlock>()
            .unwrap()
            .then_block::<DefaultPreProcessBlock>()
            .unwrap()
            .into_glue();
        assert_eq!(glue.block_outputs.len(), 2);
    }

    #[test]
    fn parses_step_json_without_params() {
        let text = r#"[{"id": "a", "block_name": "read_synthetic", "sequence_no": 1},
                       {"id": "b", "block_name": "default_pre_process", "sequence_no": 2, "params": {"for_analysis": true}}]"#;
        let flow = Flow::from_json_str(text, &default_registry().unwrap()).unwrap();
        assert_eq!(flow.glue().series.as_ref().unwrap().width(), 7);
        assert!(Flow::from_json_str("{", &default_registry().unwrap()).is_err());
    }
}
