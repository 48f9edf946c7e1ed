//! Name → block lookup used by declarative flows.

use super::{
    Block, BlockKind, DefaultPreProcessBlock, ExtractRecordsBlock, FullyConnectBlock, Glue,
    ParameterizeAdxBlock, ParameterizeBollingerBandsBlock, ParameterizeMacdBlock,
    ParameterizeMomentumBlock, ParameterizePsychoLogicalBlock, ParameterizeSmaBlock,
    ParameterizeStochasticsBlock, ProcessAdxBlock, ProcessBollingerBandsBlock, ProcessMacdBlock,
    ProcessMomentumBlock, ProcessPsychoLogicalBlock, ProcessSmaBlock, ProcessStochasticsBlock,
    ReadCsvBlock, ReadSyntheticBlock,
};
use crate::error::{BlockContractError, KabutoError};
use std::collections::BTreeMap;
use tracing::debug;

pub type GlueFn = fn(&Glue) -> Result<Glue, KabutoError>;

/// A registered block: its name, kind and `glue` entry point.
#[derive(Clone, Copy)]
pub struct BlockEntry {
    pub name: &'static str,
    pub type_name: &'static str,
    pub kind: BlockKind,
    pub glue_fn: GlueFn,
}

impl BlockEntry {
    pub fn of<B: Block>() -> Self {
        Self {
            name: B::NAME,
            type_name: short_type_name(std::any::type_name::<B>()),
            kind: B::KIND,
            glue_fn: B::glue,
        }
    }

    pub fn apply(&self, glue: &Glue) -> Result<Glue, KabutoError> {
        (self.glue_fn)(glue)
    }
}

impl std::fmt::Debug for BlockEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockEntry")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// `a::b::ProcessBlock<a::SmaConfig>` → `ProcessBlock`.
fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    entries: BTreeMap<&'static str, BlockEntry>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `B` under `B::NAME`. The type must be named `...Block`.
    pub fn register<B: Block>(&mut self) -> Result<&mut Self, BlockContractError> {
        let entry = BlockEntry::of::<B>();
        if !entry.type_name.ends_with("Block") {
            return Err(BlockContractError::NamingConvention(entry.type_name.to_string()));
        }
        if let Some(old) = self.entries.insert(entry.name, entry) {
            debug!("block '{}' re-registered: {} replaced by {}", entry.name, old.type_name, entry.type_name);
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&BlockEntry, BlockContractError> {
        self.entries
            .get(name)
            .ok_or_else(|| BlockContractError::UnknownBlock(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Every built-in block.
pub fn default_registry() -> Result<BlockRegistry, BlockContractError> {
    let mut registry = BlockRegistry::new();
    registry
        .register::<ReadCsvBlock>()?
        .register::<ReadSyntheticBlock>()?
        .register::<ExtractRecordsBlock>()?
        .register::<DefaultPreProcessBlock>()?
        .register::<ProcessSmaBlock>()?
        .register::<ProcessMacdBlock>()?
        .register::<ProcessAdxBlock>()?
        .register::<ProcessBollingerBandsBlock>()?
        .register::<ProcessMomentumBlock>()?
        .register::<ProcessPsychoLogicalBlock>()?
        .register::<ProcessStochasticsBlock>()?
        .register::<ParameterizeSmaBlock>()?
        .register::<ParameterizeMacdBlock>()?
        .register::<ParameterizeAdxBlock>()?
        .register::<ParameterizeBollingerBandsBlock>()?
        .register::<ParameterizeMomentumBlock>()?
        .register::<ParameterizePsychoLogicalBlock>()?
        .register::<ParameterizeStochasticsBlock>()?
        .register::<FullyConnectBlock>()?;
    Ok(registry)
}
