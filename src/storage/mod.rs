pub mod json_backend;
pub mod memory;

use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use crate::{
    core::predicate::Predicate,
    domain::{ColumnSet, DebtRecord},
    errors::{Result, RollupError},
};

/// Lazily produced records; the first `Err` ends a scan.
pub type RecordStream<'a> = Box<dyn Iterator<Item = Result<DebtRecord>> + Send + 'a>;

/// Read-only dataset able to evaluate a predicate while scanning.
pub trait RowSource: Send + Sync {
    /// Yields matching records with at least `columns` populated. Columns
    /// outside the projection keep their default values.
    fn scan<'a>(&'a self, predicate: &Predicate, columns: &ColumnSet) -> Result<RecordStream<'a>>;

    /// Number of rows when known without scanning.
    fn row_count(&self) -> Option<usize> {
        None
    }

    /// Short description used by the shell and in logs.
    fn describe(&self) -> String;
}

impl std::fmt::Debug for dyn RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Shared, thread-safe map from dataset id to row source.
#[derive(Default)]
pub struct DatasetRegistry {
    sources: RwLock<HashMap<String, Arc<dyn RowSource>>>,
}

impl DatasetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` under `id`, returning the source it replaced.
    pub fn register(
        &self,
        id: impl Into<String>,
        source: Arc<dyn RowSource>,
    ) -> Result<Option<Arc<dyn RowSource>>> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(RollupError::validation("dataset id must not be empty"));
        }
        let mut sources = self.sources.write().map_err(|_| poisoned())?;
        Ok(sources.insert(id, source))
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn RowSource>> {
        let sources = self.sources.read().map_err(|_| poisoned())?;
        sources
            .get(id)
            .cloned()
            .ok_or_else(|| RollupError::DatasetNotFound(id.to_string()))
    }

    pub fn remove(&self, id: &str) -> Result<Option<Arc<dyn RowSource>>> {
        let mut sources = self.sources.write().map_err(|_| poisoned())?;
        Ok(sources.remove(id))
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Result<Vec<String>> {
        let sources = self.sources.read().map_err(|_| poisoned())?;
        let mut ids: Vec<String> = sources.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

fn poisoned() -> RollupError {
    RollupError::Storage("dataset registry lock poisoned".into())
}

pub use json_backend::{decode_record, load_dataset, load_json_array, JsonLinesDataset};
pub use memory::InMemoryDataset;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_dataset_is_not_found() {
        let registry = DatasetRegistry::new();
        let err = registry.get("missing").err().expect("not found");
        assert!(matches!(err, RollupError::DatasetNotFound(ref id) if id == "missing"));
    }

    #[test]
    fn register_replaces_and_lists_ids() {
        let registry = DatasetRegistry::new();
        let first: Arc<dyn RowSource> = Arc::new(InMemoryDataset::new(Vec::new()));
        let second: Arc<dyn RowSource> = Arc::new(InMemoryDataset::new(vec![DebtRecord::new(
            "A", "6210", "LPCG", 1.0,
        )]));
        assert!(registry.register("b", first).unwrap().is_none());
        assert!(registry.register("b", second).unwrap().is_some());
        registry
            .register("a", Arc::new(InMemoryDataset::new(Vec::new())))
            .unwrap();
        assert_eq!(registry.ids().unwrap(), vec!["a", "b"]);
        assert_eq!(registry.get("b").unwrap().row_count(), Some(1));
        assert!(registry.remove("a").unwrap().is_some());
        assert_eq!(registry.ids().unwrap(), vec!["b"]);
    }

    #[test]
    fn blank_dataset_id_is_rejected() {
        let registry = DatasetRegistry::new();
        let err = registry
            .register("  ", Arc::new(InMemoryDataset::new(Vec::new())))
            .expect_err("blank id");
        assert!(matches!(err, RollupError::Validation(_)));
    }
}
