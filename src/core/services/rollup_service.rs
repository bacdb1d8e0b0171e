use serde::{Deserialize, Serialize};

use crate::core::{
    aggregator::DimensionAggregator,
    catalog::DimensionCatalog,
    predicate::PredicateBuilder,
    response::{ResponseAssembler, RollupResponse},
    rollup::{RollupComposer, RollupResult},
};
use crate::domain::{AggregationDimension, FilterSpec, ViewPolicy};
use crate::errors::{Result, RollupError};
use crate::storage::RowSource;

/// Inbound rollup request: target dataset, view, dimension and the
/// filter fields at the top level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupRequest {
    pub dataset_id: String,
    pub view: ViewPolicy,
    pub dimension: AggregationDimension,
    #[serde(flatten)]
    pub filter: FilterSpec,
}

impl RollupRequest {
    pub fn new(
        dataset_id: impl Into<String>,
        view: ViewPolicy,
        dimension: AggregationDimension,
    ) -> Self {
        Self {
            dataset_id: dataset_id.into(),
            view,
            dimension,
            filter: FilterSpec::default(),
        }
    }

    pub fn with_filter(mut self, filter: FilterSpec) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_dimension(&self, dimension: AggregationDimension) -> Self {
        Self {
            dimension,
            ..self.clone()
        }
    }

    /// Parses a request document. Malformed documents and unknown tags are
    /// validation errors.
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|err| RollupError::Validation(err.to_string()))
    }

    /// Canonical encoding; equal requests always encode identically.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset_id.trim().is_empty() {
            return Err(RollupError::validation("datasetId must not be empty"));
        }
        self.filter.validate()
    }
}

pub struct RollupService;

impl RollupService {
    /// Filters, aggregates and composes one rollup over `source`.
    pub fn run(
        source: &dyn RowSource,
        catalog: &DimensionCatalog,
        request: &RollupRequest,
    ) -> Result<RollupResult> {
        request.validate()?;
        let predicate = PredicateBuilder::new(catalog).build(&request.filter)?;
        tracing::debug!(%predicate, dimension = %request.dimension, "scanning");

        let mut aggregator = DimensionAggregator::new(catalog, request.dimension, request.view);
        let stream = source.scan(&predicate, &aggregator.columns())?;
        aggregator.consume(stream)?;

        let composer = RollupComposer::new(catalog, request.dimension, request.view);
        Ok(composer.compose(aggregator.finish(), &request.filter))
    }

    pub fn respond(
        source: &dyn RowSource,
        catalog: &DimensionCatalog,
        request: &RollupRequest,
    ) -> Result<RollupResponse> {
        let result = Self::run(source, catalog, request)?;
        Ok(ResponseAssembler::assemble(&result))
    }
}
