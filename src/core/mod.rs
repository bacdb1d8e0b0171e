pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod engine;
pub mod predicate;
pub mod response;
pub mod rollup;
pub mod services;

pub use aggregator::{AggregatedGroup, AggregationOutput, DimensionAggregator};
pub use cache::RollupCache;
pub use catalog::DimensionCatalog;
pub use engine::RollupEngine;
pub use predicate::{Predicate, PredicateBuilder};
pub use response::{GrandTotal, ParentTotal, ResponseAssembler, RollupResponse, RollupRow};
pub use rollup::{GroupAggregate, ParentGroupNode, Percentage, RollupComposer, RollupResult};
