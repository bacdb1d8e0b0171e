//! Cursor-paginated pass-through listing of filtered records.
//!
//! Records are ordered by [`SortKey`] (`accountId`, then `rowId`). A page
//! keeps at most `pageSize + 1` candidates in a heap, so memory stays
//! bounded regardless of dataset size. The extra candidate only tells us
//! whether another page exists.

use std::{cmp::Reverse, collections::BinaryHeap};

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::core::{
    catalog::DimensionCatalog,
    predicate::{Predicate, PredicateBuilder},
};
use crate::domain::{Column, DebtRecord, FilterSpec, SortKey};
use crate::errors::{Result, RollupError};
use crate::storage::RowSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn operator(self) -> &'static str {
        match self {
            Direction::Asc => "gt",
            Direction::Desc => "lt",
        }
    }
}

/// Resume point of a listing: the last key returned and the comparison
/// that selects the rows after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub key: SortKey,
    pub direction: Direction,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CursorToken {
    op: String,
    account_id: String,
    row_id: u64,
}

impl Cursor {
    pub fn new(key: SortKey, direction: Direction) -> Self {
        Self { key, direction }
    }

    /// Opaque, URL-safe token.
    pub fn encode(&self) -> String {
        let token = CursorToken {
            op: self.direction.operator().to_string(),
            account_id: self.key.account_id.clone(),
            row_id: self.key.row_id,
        };
        let json = serde_json::to_string(&token).unwrap_or_default();
        json.bytes().map(|byte| format!("{:02x}", byte)).collect()
    }

    pub fn decode(token: &str) -> Result<Self> {
        let malformed = || RollupError::validation(format!("malformed cursor `{}`", token));
        let token = token.trim();
        if token.is_empty() || token.len() % 2 != 0 || !token.is_ascii() {
            return Err(malformed());
        }
        let bytes = (0..token.len())
            .step_by(2)
            .map(|index| u8::from_str_radix(&token[index..index + 2], 16))
            .collect::<std::result::Result<Vec<u8>, _>>()
            .map_err(|_| malformed())?;
        let decoded: CursorToken = serde_json::from_slice(&bytes).map_err(|_| malformed())?;
        let direction = match decoded.op.as_str() {
            "gt" => Direction::Asc,
            "lt" => Direction::Desc,
            _ => return Err(malformed()),
        };
        Ok(Self {
            key: SortKey {
                account_id: decoded.account_id,
                row_id: decoded.row_id,
            },
            direction,
        })
    }

    fn predicate(&self) -> Predicate {
        match self.direction {
            Direction::Asc => Predicate::SortKeyAfter(self.key.clone()),
            Direction::Desc => Predicate::SortKeyBefore(self.key.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingRequest {
    pub dataset_id: String,
    #[serde(default)]
    pub filter: FilterSpec,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub cursor: Option<String>,
}

impl ListingRequest {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            filter: FilterSpec::default(),
            direction: Direction::Asc,
            page_size: None,
            cursor: None,
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|err| RollupError::Validation(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub records: Vec<DebtRecord>,
    pub next_cursor: Option<String>,
}

struct Ranked {
    key: SortKey,
    record: DebtRecord,
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Ranked {}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.key.cmp(&other.key)
    }
}

pub struct ListingService;

impl ListingService {
    pub fn page(
        source: &dyn RowSource,
        catalog: &DimensionCatalog,
        config: &EngineConfig,
        request: &ListingRequest,
    ) -> Result<ListingPage> {
        let page_size = Self::page_size(config, request.page_size)?;
        let mut clauses = vec![PredicateBuilder::new(catalog).build(&request.filter)?];
        if let Some(token) = request.cursor.as_deref() {
            let cursor = Cursor::decode(token)?;
            if cursor.direction != request.direction {
                return Err(RollupError::validation(
                    "cursor was issued for the opposite direction",
                ));
            }
            clauses.push(cursor.predicate());
        }
        let predicate = Predicate::and(clauses);
        let stream = source.scan(&predicate, &Column::all())?;
        let ranked = stream.map(|record| {
            record.map(|record| Ranked {
                key: record.sort_key(),
                record,
            })
        });

        let mut records: Vec<DebtRecord> = match request.direction {
            Direction::Asc => smallest(ranked, page_size.saturating_add(1))?
                .into_iter()
                .map(|entry| entry.record)
                .collect(),
            Direction::Desc => smallest(ranked.map(|entry| entry.map(Reverse)), page_size.saturating_add(1))?
                .into_iter()
                .map(|Reverse(entry)| entry.record)
                .collect(),
        };

        let next_cursor = if records.len() > page_size {
            records.truncate(page_size);
            records
                .last()
                .map(|last| Cursor::new(last.sort_key(), request.direction).encode())
        } else {
            None
        };
        tracing::debug!(
            dataset = %request.dataset_id,
            returned = records.len(),
            more = next_cursor.is_some(),
            "listing page"
        );
        Ok(ListingPage {
            records,
            next_cursor,
        })
    }

    fn page_size(config: &EngineConfig, requested: Option<usize>) -> Result<usize> {
        match requested {
            Some(0) => Err(RollupError::validation("pageSize must be at least 1")),
            Some(size) => Ok(size.min(config.effective_max_page_size())),
            None => Ok(config
                .default_page_size
                .clamp(1, config.effective_max_page_size())),
        }
    }
}

const HEAP_PREALLOCATION: usize = 1_024;

/// Keeps the `limit` smallest items, returned in ascending order.
fn smallest<T: Ord>(items: impl Iterator<Item = Result<T>>, limit: usize) -> Result<Vec<T>> {
    let mut heap = BinaryHeap::with_capacity(limit.saturating_add(1).min(HEAP_PREALLOCATION));
    for item in items {
        heap.push(item?);
        if heap.len() > limit {
            heap.pop();
        }
    }
    Ok(heap.into_sorted_vec())
}
