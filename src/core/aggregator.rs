//! Single-pass accumulation of filtered rows into (parent group, dimension
//! value) buckets.

use std::collections::{HashMap, HashSet};

use crate::core::catalog::DimensionCatalog;
use crate::domain::{AggregationDimension, Column, ColumnSet, DebtRecord, MeasureSums, ViewPolicy};
use crate::errors::Result;

/// Totals for one dimension value inside one parent group.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedGroup {
    pub parent_key: String,
    pub dimension_key: String,
    /// Distinct account identifiers.
    pub count: u64,
    pub sums: MeasureSums,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregationOutput {
    /// Sorted by parent key, then dimension key.
    pub groups: Vec<AggregatedGroup>,
    pub records_scanned: u64,
}

impl AggregationOutput {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Default)]
struct Accumulator {
    accounts: HashSet<String>,
    sums: MeasureSums,
}

/// Hash accumulator for a single rollup request.
pub struct DimensionAggregator<'a> {
    catalog: &'a DimensionCatalog,
    dimension: AggregationDimension,
    view: ViewPolicy,
    groups: HashMap<String, HashMap<String, Accumulator>>,
    records_scanned: u64,
}

impl<'a> DimensionAggregator<'a> {
    pub fn new(
        catalog: &'a DimensionCatalog,
        dimension: AggregationDimension,
        view: ViewPolicy,
    ) -> Self {
        Self {
            catalog,
            dimension,
            view,
            groups: HashMap::new(),
            records_scanned: 0,
        }
    }

    /// Columns the aggregator reads from each record.
    pub fn columns(&self) -> ColumnSet {
        let mut columns: ColumnSet = [
            Column::AccountId,
            Column::BusinessArea,
            self.dimension.key_column(),
        ]
        .into_iter()
        .collect();
        columns.extend(self.view.measures().iter().map(|measure| measure.column()));
        columns
    }

    pub fn push(&mut self, record: &DebtRecord) {
        self.records_scanned += 1;
        let catalog = self.catalog;
        let parent = catalog.parent_key(record);
        let key = catalog.dimension_key(self.dimension, record);

        if !self.groups.contains_key(parent) {
            self.groups.insert(parent.to_string(), HashMap::new());
        }
        let Some(values) = self.groups.get_mut(parent) else {
            return;
        };
        if !values.contains_key(key.as_ref()) {
            values.insert(key.to_string(), Accumulator::default());
        }
        let Some(acc) = values.get_mut(key.as_ref()) else {
            return;
        };

        if !acc.accounts.contains(record.account_id.as_str()) {
            acc.accounts.insert(record.account_id.clone());
        }
        acc.sums.add_record(record, self.view.measures());
    }

    /// Drains a record stream, stopping at the first storage error.
    pub fn consume<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<DebtRecord>>,
    {
        for record in records {
            self.push(&record?);
        }
        Ok(())
    }

    pub fn finish(self) -> AggregationOutput {
        let mut groups: Vec<AggregatedGroup> = self
            .groups
            .into_iter()
            .flat_map(|(parent_key, values)| {
                values.into_iter().map(move |(dimension_key, acc)| AggregatedGroup {
                    parent_key: parent_key.clone(),
                    dimension_key,
                    count: acc.accounts.len() as u64,
                    sums: acc.sums,
                })
            })
            .collect();
        groups.sort_by(|a, b| {
            a.parent_key
                .cmp(&b.parent_key)
                .then_with(|| a.dimension_key.cmp(&b.dimension_key))
        });
        tracing::debug!(
            dimension = %self.dimension,
            groups = groups.len(),
            records = self.records_scanned,
            "aggregation finished"
        );
        AggregationOutput {
            groups,
            records_scanned: self.records_scanned,
        }
    }
}
