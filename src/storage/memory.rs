use std::sync::Mutex;

use super::{AccuracyMap, StateStore, StoreError};
use crate::types::ValueTable;

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value_table: Mutex<ValueTable>,
    accuracy: Mutex<AccuracyMap>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn read_value_table(&self) -> Result<ValueTable, StoreError> {
        Ok(self.value_table.lock().unwrap().clone())
    }

    fn write_value_table(&self, table: &ValueTable) -> Result<(), StoreError> {
        *self.value_table.lock().unwrap() = table.clone();
        Ok(())
    }

    fn read_model_accuracy(&self) -> Result<AccuracyMap, StoreError> {
        Ok(self.accuracy.lock().unwrap().clone())
    }

    fn write_model_accuracy(&self, accuracy: &AccuracyMap) -> Result<(), StoreError> {
        *self.accuracy.lock().unwrap() = accuracy.clone();
        Ok(())
    }
}
