use std::{path::Path, sync::Arc, thread};

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::core::{
    cache::RollupCache,
    catalog::DimensionCatalog,
    response::{ResponseAssembler, RollupResponse},
    rollup::RollupResult,
    services::{ListingPage, ListingRequest, ListingService, RollupRequest, RollupService},
};
use crate::domain::AggregationDimension;
use crate::errors::{Result, RollupError};
use crate::storage::{self, DatasetRegistry, RowSource};

/// Entry point for rollups and listings over registered datasets.
///
/// The engine holds no per-request state: every call builds its own
/// predicate and aggregator and drops them before returning. The optional
/// cache only memoizes finished responses.
pub struct RollupEngine {
    registry: Arc<DatasetRegistry>,
    catalog: DimensionCatalog,
    config: EngineConfig,
    cache: Option<RollupCache>,
}

impl RollupEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_registry(Arc::new(DatasetRegistry::new()), config)
    }

    pub fn with_registry(registry: Arc<DatasetRegistry>, config: EngineConfig) -> Result<Self> {
        let catalog = DimensionCatalog::from_config(&config)?;
        Ok(Self {
            registry,
            catalog,
            config,
            cache: None,
        })
    }

    /// Enables response memoization with the configured TTL.
    pub fn with_cache(mut self) -> Self {
        self.cache = Some(RollupCache::from_secs(self.config.cache_ttl_secs));
        self
    }

    pub fn registry(&self) -> &Arc<DatasetRegistry> {
        &self.registry
    }

    pub fn catalog(&self) -> &DimensionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> Option<&RollupCache> {
        self.cache.as_ref()
    }

    pub fn register(&self, dataset_id: &str, source: Arc<dyn RowSource>) -> Result<()> {
        let replaced = self.registry.register(dataset_id, source)?;
        if let Some(cache) = &self.cache {
            cache.invalidate(dataset_id);
        }
        tracing::info!(dataset = dataset_id, replaced = replaced.is_some(), "dataset registered");
        Ok(())
    }

    /// Loads a JSON or JSON-lines file and registers it under `dataset_id`.
    pub fn load_file(&self, dataset_id: &str, path: &Path) -> Result<Arc<dyn RowSource>> {
        let source = storage::load_dataset(path)?;
        self.register(dataset_id, Arc::clone(&source))?;
        Ok(source)
    }

    pub fn rollup(&self, request: &RollupRequest) -> Result<RollupResult> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("rollup", %request_id);
        let _guard = span.enter();
        tracing::info!(
            dataset = %request.dataset_id,
            view = %request.view,
            dimension = %request.dimension,
            "rollup requested"
        );
        let source = self.registry.get(&request.dataset_id)?;
        let result = RollupService::run(source.as_ref(), &self.catalog, request);
        match &result {
            Ok(result) => tracing::info!(
                groups = result.groups.len(),
                accounts = result.grand_total.count,
                "rollup finished"
            ),
            Err(err) => tracing::warn!(%err, retryable = err.is_retryable(), "rollup failed"),
        }
        result
    }

    /// Rollup mapped onto the wire contract, served from the cache when
    /// enabled.
    pub fn respond(&self, request: &RollupRequest) -> Result<RollupResponse> {
        let Some(cache) = &self.cache else {
            return self
                .rollup(request)
                .map(|result| ResponseAssembler::assemble(&result));
        };
        let key = request.to_json()?;
        if let Some(hit) = cache.get(&request.dataset_id, &key) {
            tracing::debug!(dataset = %request.dataset_id, "rollup cache hit");
            return Ok(hit);
        }
        let result = self.rollup(request)?;
        let response = ResponseAssembler::assemble(&result);
        cache.insert(&request.dataset_id, &key, response.clone());
        Ok(response)
    }

    /// Parses a request document and returns the response document.
    pub fn respond_json(&self, request: &str) -> Result<String> {
        let request = RollupRequest::from_json(request)?;
        self.respond(&request)?.to_json()
    }

    /// Runs one rollup per dimension on scoped threads. Results come back
    /// in the order of `dimensions`; each succeeds or fails on its own.
    pub fn rollup_dimensions(
        &self,
        request: &RollupRequest,
        dimensions: &[AggregationDimension],
    ) -> Vec<(AggregationDimension, Result<RollupResponse>)> {
        thread::scope(|scope| {
            let handles: Vec<_> = dimensions
                .iter()
                .map(|dimension| {
                    let dimension = *dimension;
                    let request = request.with_dimension(dimension);
                    (dimension, scope.spawn(move || self.respond(&request)))
                })
                .collect();
            handles
                .into_iter()
                .map(|(dimension, handle)| {
                    let outcome = handle.join().unwrap_or_else(|_| {
                        Err(RollupError::Storage(format!(
                            "{} rollup worker panicked",
                            dimension
                        )))
                    });
                    (dimension, outcome)
                })
                .collect()
        })
    }

    pub fn list(&self, request: &ListingRequest) -> Result<ListingPage> {
        let source = self.registry.get(&request.dataset_id)?;
        ListingService::page(source.as_ref(), &self.catalog, &self.config, request)
    }
}
