use std::path::Path;
use tracing::info;

use super::{AccuracyMap, StateStore, StoreError};
use crate::types::{ActionValues, LearnerState, ModelAccuracyRecord, ModelKind, ValueTable};

const VALUE_TABLE_TREE: &str = "value_table";
const ACCURACY_TREE: &str = "model_accuracy";

/// Durable store backed by sled. Value-table rows are keyed by the canonical
/// state encoding, accuracy records by model name; both sides hold
/// serde_json payloads.
pub struct SledStore {
    value_table: sled::Tree,
    accuracy: sled::Tree,
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path.as_ref())?;
        let value_table = db.open_tree(VALUE_TABLE_TREE)?;
        let accuracy = db.open_tree(ACCURACY_TREE)?;
        info!("Opened state store at {}", path.as_ref().display());
        Ok(Self {
            value_table,
            accuracy,
            db,
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl StateStore for SledStore {
    fn read_value_table(&self) -> Result<ValueTable, StoreError> {
        let mut table = ValueTable::new();
        for entry in self.value_table.iter() {
            let (key, value) = entry?;
            let key_str = std::str::from_utf8(&key)
                .map_err(|_| StoreError::Corrupt("non-utf8 value-table key".to_string()))?;
            let state = LearnerState::decode(key_str).ok_or_else(|| {
                StoreError::Corrupt(format!("bad value-table key: {}", key_str))
            })?;
            let row: ActionValues = serde_json::from_slice(&value)?;
            table.insert(state, row);
        }
        Ok(table)
    }

    fn write_value_table(&self, table: &ValueTable) -> Result<(), StoreError> {
        for (state, row) in table {
            let value = serde_json::to_vec(row)?;
            self.value_table.insert(state.encode().as_bytes(), value)?;
        }
        self.flush()
    }

    fn read_model_accuracy(&self) -> Result<AccuracyMap, StoreError> {
        let mut map = AccuracyMap::new();
        for entry in self.accuracy.iter() {
            let (key, value) = entry?;
            let key_str = std::str::from_utf8(&key)
                .map_err(|_| StoreError::Corrupt("non-utf8 accuracy key".to_string()))?;
            let kind = ModelKind::from_str(key_str)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown model: {}", key_str)))?;
            let record: ModelAccuracyRecord = serde_json::from_slice(&value)?;
            map.insert(kind, record);
        }
        Ok(map)
    }

    fn write_model_accuracy(&self, accuracy: &AccuracyMap) -> Result<(), StoreError> {
        for (kind, record) in accuracy {
            let value = serde_json::to_vec(record)?;
            self.accuracy.insert(kind.as_str().as_bytes(), value)?;
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_table_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let state = LearnerState {
            last_digit: 3,
            even_count: 2,
            parity_bits: 0b00110,
        };

        {
            let store = SledStore::open(dir.path()).unwrap();
            let mut table = ValueTable::new();
            table.insert(state, ActionValues { even: 0.25, odd: -0.5 });
            store.write_value_table(&table).unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        let table = store.read_value_table().unwrap();
        assert_eq!(table[&state], ActionValues { even: 0.25, odd: -0.5 });
    }

    #[test]
    fn test_rows_are_merged_not_replaced() {
        // Writing a table containing only new rows must not drop rows that
        // were persisted earlier.
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let a = LearnerState {
            last_digit: 1,
            even_count: 0,
            parity_bits: 0,
        };
        let b = LearnerState {
            last_digit: 2,
            even_count: 5,
            parity_bits: 0b11111,
        };

        let mut first = ValueTable::new();
        first.insert(a, ActionValues { even: 1.0, odd: 0.0 });
        store.write_value_table(&first).unwrap();

        let mut second = ValueTable::new();
        second.insert(b, ActionValues { even: 0.0, odd: 1.0 });
        store.write_value_table(&second).unwrap();

        let table = store.read_value_table().unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_accuracy_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = SledStore::open(dir.path()).unwrap();
        let mut map = AccuracyMap::new();
        let mut rec = ModelAccuracyRecord::default();
        rec.record(true);
        rec.record(false);
        map.insert(ModelKind::Pattern, rec);
        store.write_model_accuracy(&map).unwrap();

        let loaded = store.read_model_accuracy().unwrap();
        assert_eq!(loaded[&ModelKind::Pattern].correct_count, 1);
        assert_eq!(loaded[&ModelKind::Pattern].predictions_made, 2);
    }
}
