pub mod memory;
pub mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use std::collections::HashMap;
use thiserror::Error;

use crate::types::{ModelAccuracyRecord, ModelKind, ValueTable};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),
    #[error("corrupt stored record: {0}")]
    Corrupt(String),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type AccuracyMap = HashMap<ModelKind, ModelAccuracyRecord>;

/// Synchronous persistence collaborator for the decision engine.
///
/// Writes must be durable (or fail loudly) before returning; the engine does
/// not cache the value table between calls and performs no locking of its
/// own, so callers must serialize feedback/prediction calls that touch the
/// same state key.
#[cfg_attr(test, mockall::automock)]
pub trait StateStore: Send + Sync {
    fn read_value_table(&self) -> Result<ValueTable, StoreError>;
    fn write_value_table(&self, table: &ValueTable) -> Result<(), StoreError>;
    fn read_model_accuracy(&self) -> Result<AccuracyMap, StoreError>;
    fn write_model_accuracy(&self, accuracy: &AccuracyMap) -> Result<(), StoreError>;
}
