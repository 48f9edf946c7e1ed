//! Kabuto Core: price records, indicators, impact scoring, the block/flow pipeline and aggregates.
//!
//! This crate contains:
//! - Domain types (records, brands, recordsets, processed tables, estimates)
//! - A Japanese market calendar for business-day completeness
//! - Technical indicators and the shared cross/trend/impact primitives
//! - Blocks, the persistent Glue context and the Flow driver
//! - The single-code aggregate and its estimate filters

pub mod aggregate;
pub mod blocks;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimate;
pub mod fingerprint;
pub mod flow;
pub mod indicators;
pub mod signal;

pub use aggregate::{AggregateSource, StockCodeSingleAggregate, Visualization};
pub use config::{AnalysisConfig, ConfigError};
pub use error::{BlockContractError, EntityError, KabutoError, LookupError};
pub use flow::{Flow, FlowPath, FlowStep};
