use std::sync::Arc;

use crate::{
    core::predicate::Predicate,
    domain::{ColumnSet, DebtRecord},
    errors::Result,
};

use super::{RecordStream, RowSource};

/// Row source over records held in memory. Cloning shares the rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataset {
    records: Arc<Vec<DebtRecord>>,
}

impl InMemoryDataset {
    /// Takes ownership of `records`, assigning row ids in load order.
    pub fn new(mut records: Vec<DebtRecord>) -> Self {
        for (index, record) in records.iter_mut().enumerate() {
            record.row_id = index as u64;
        }
        Self {
            records: Arc::new(records),
        }
    }

    pub fn records(&self) -> &[DebtRecord] {
        &self.records
    }
}

impl FromIterator<DebtRecord> for InMemoryDataset {
    fn from_iter<I: IntoIterator<Item = DebtRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl RowSource for InMemoryDataset {
    fn scan<'a>(&'a self, predicate: &Predicate, columns: &ColumnSet) -> Result<RecordStream<'a>> {
        let predicate = predicate.clone();
        let columns = columns.clone();
        Ok(Box::new(
            self.records
                .iter()
                .filter(move |record| predicate.matches(record))
                .map(move |record| Ok(record.project(&columns))),
        ))
    }

    fn row_count(&self) -> Option<usize> {
        Some(self.records.len())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} rows)", self.records.len())
    }
}
