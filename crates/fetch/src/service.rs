//! Process-wide fetch service
//!
//! Owns both cache tiers, the transport and the optional background sweeper.
//! Construct it once with [`FetchService::from_config`], clone the handle
//! freely, and call [`FetchService::shutdown`] before exit.

use crate::materialize::{Materialized, Materializer, ResolvedResource};
use crate::orchestrator::{FetchOrchestrator, FetchPayload, FetchResult};
use crate::transport::{HttpTransport, Transport};
use mlit_cache::{BinaryFileCache, CacheStats, InMemoryTTLCache, PurgeReport, StatsSnapshot, SweeperHandle};
use mlit_config::MlitConfig;
use mlit_core::{RequestDescriptor, Result, Validate, MLIT_API_KEY_VAR};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Cheaply cloneable handle to the fetch pipeline
#[derive(Clone)]
pub struct FetchService {
    inner: Arc<ServiceInner>,
}

struct ServiceInner {
    orchestrator: FetchOrchestrator,
    materializer: Materializer,
    stats: Arc<CacheStats>,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl FetchService {
    /// Build the service with the HTTP transport described by `config`
    pub async fn from_config(config: &MlitConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.api)?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Build the service around any transport
    pub async fn with_transport(config: &MlitConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        if config.api.api_key.is_none() {
            warn!(
                "no API key configured; set {MLIT_API_KEY_VAR} or api.api_key, upstream calls will likely be rejected"
            );
        }

        let stats = Arc::new(CacheStats::default());
        let memory = InMemoryTTLCache::with_stats(
            config.cache.memory_capacity,
            config.cache.memory_ttl,
            Arc::clone(&stats),
        )?;
        let files = BinaryFileCache::open_with_stats(
            config.cache.dir.clone(),
            config.cache.file_ttl,
            Arc::clone(&stats),
        )
        .await?;

        let sweeper = files.start_sweeper(config.cache.sweep_interval);
        let materializer = Materializer::new(
            config.resources.namespace.as_str(),
            config.cache.inline_threshold,
            files.clone(),
        );
        let orchestrator = FetchOrchestrator::new(
            transport,
            memory,
            files,
            config.api.api_key.clone(),
            config.cache.inline_threshold,
            Arc::clone(&stats),
        );

        info!(
            cache_dir = %config.cache.dir.display(),
            memory_capacity = config.cache.memory_capacity,
            inline_threshold = config.cache.inline_threshold,
            sweeper = sweeper.is_some(),
            "fetch service started"
        );

        Ok(Self {
            inner: Arc::new(ServiceInner {
                orchestrator,
                materializer,
                stats,
                sweeper: Mutex::new(sweeper),
            }),
        })
    }

    pub async fn fetch(&self, descriptor: &RequestDescriptor) -> Result<FetchResult> {
        self.inner.orchestrator.fetch(descriptor).await
    }

    /// Fetch and materialize in one step; the category is checked before any I/O
    pub async fn fetch_materialized(
        &self,
        descriptor: &RequestDescriptor,
        category: &str,
    ) -> Result<Materialized> {
        Validate::slug(category, "category")?;
        let result = self.fetch(descriptor).await?;
        self.materialize(&result.payload, category).await
    }

    pub async fn materialize(&self, payload: &FetchPayload, category: &str) -> Result<Materialized> {
        self.inner.materializer.materialize(payload, category).await
    }

    pub async fn resolve(&self, uri: &str) -> Result<ResolvedResource> {
        self.inner.materializer.resolve(uri).await
    }

    pub async fn resolve_json(&self, uri: &str) -> Result<Value> {
        self.inner.materializer.resolve_json(uri).await
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn files(&self) -> &BinaryFileCache {
        self.inner.orchestrator.files()
    }

    /// Drop expired entries from both tiers
    pub async fn purge_expired(&self) -> Result<PurgeReport> {
        let memory_removed = self.inner.orchestrator.memory().purge_expired();
        let report = self.inner.orchestrator.files().purge_expired().await?;
        info!(
            memory_removed,
            files_removed = report.removed,
            bytes_freed = report.bytes_freed,
            "purged expired cache entries"
        );
        Ok(report)
    }

    /// Stop the sweeper, clear the memory tier and purge expired files.
    ///
    /// Live file entries are kept for the next process.
    pub async fn shutdown(&self) -> Result<PurgeReport> {
        if let Some(sweeper) = self.inner.sweeper.lock().take() {
            sweeper.stop();
        }
        self.inner.orchestrator.memory().clear();
        let report = self.inner.orchestrator.files().purge_expired().await?;
        info!(removed = report.removed, "fetch service shut down");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use mlit_core::Error;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> MlitConfig {
        let mut config = MlitConfig::defaults()
            .unwrap()
            .with_cache_dir(dir.path().join("bin"))
            .with_api_key("test-key");
        config.cache.inline_threshold = 64;
        config
    }

    #[tokio::test]
    async fn test_fetch_materialized_small_and_large() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(MockTransport::json(json!({"data": []})));
        let service = FetchService::with_transport(&config(&dir), transport.clone())
            .await
            .unwrap();

        let small = service
            .fetch_materialized(&RequestDescriptor::new("XIT001"), "transactions")
            .await
            .unwrap();
        assert!(!small.is_resource);

        transport.respond(
            200,
            mlit_core::ResponseBody::Structured(json!({"features": vec![1; 100]})),
        );
        let large = service
            .fetch_materialized(&RequestDescriptor::new("XKT002"), "school_districts")
            .await
            .unwrap();
        assert!(large.is_resource);

        let uri = large.resource_uri().unwrap().to_string();
        let json = service.resolve_json(&uri).await.unwrap();
        assert_eq!(json["features"].as_array().unwrap().len(), 100);

        let stats = service.stats();
        assert_eq!(stats.upstream_fetches, 2);
        assert_eq!(stats.writes, 1);
    }

    #[tokio::test]
    async fn test_bad_category_fails_before_fetching() {
        let dir = TempDir::new().unwrap();
        let transport = Arc::new(MockTransport::json(json!({})));
        let service = FetchService::with_transport(&config(&dir), transport.clone())
            .await
            .unwrap();

        let err = service
            .fetch_materialized(&RequestDescriptor::new("XIT001"), "Bad Category")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_configuration_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.cache.memory_capacity = 0;

        let result = FetchService::with_transport(&config, Arc::new(MockTransport::default())).await;
        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_shutdown_clears_memory_and_keeps_live_files() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.cache.sweep_interval = Duration::from_secs(60);
        let transport = Arc::new(MockTransport::binary(vec![9u8; 128]));
        let service = FetchService::with_transport(&config, transport.clone())
            .await
            .unwrap();

        let result = service.fetch(&RequestDescriptor::new("XKT001")).await.unwrap();
        let path = result.file_path().unwrap().to_path_buf();

        let report = service.shutdown().await.unwrap();
        assert_eq!(report.removed, 0);
        assert!(path.exists());
        assert!(service.inner.sweeper.lock().is_none());
    }

    #[tokio::test]
    async fn test_missing_api_key_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config(&dir);
        config.api.api_key = None;

        let transport = Arc::new(MockTransport::json(json!({})));
        let service = FetchService::with_transport(&config, transport.clone())
            .await
            .unwrap();
        service.fetch(&RequestDescriptor::new("XIT001")).await.unwrap();
        assert!(transport.last_request().unwrap().credential.is_none());
    }
}
