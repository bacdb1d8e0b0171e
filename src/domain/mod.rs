pub mod common;
pub mod filter;
pub mod record;
pub mod view;

pub use common::Tagged;
pub use filter::{
    AccountClassType, AgingBucket, BalanceSign, FilterSpec, MitType, OutstandingRange, RangeBound,
};
pub use record::{Column, ColumnSet, DebtRecord, SortKey};
pub use view::{AggregationDimension, Measure, MeasureSums, ViewPolicy};

// Re-export serde so downstream crates building requests share our version.
pub use serde;
