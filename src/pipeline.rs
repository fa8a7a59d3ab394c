//! Synthesis Pipeline
//!
//! Top-level decision sequence, shared by the CLI and any hosting server:
//! artifact reuse, then canned template, then AI generation with failover.
//! The order is fixed. Once generation is attempted, its failure surfaces to
//! the caller; there is no silent template fallback.

use crate::config::ToolConfig;
use crate::error::ToolError;
use crate::failover::FailoverExecutor;
use crate::provider::{self, ProviderClient};
use crate::store::ArtifactStore;
use crate::template::TemplateCatalog;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// The synthesis pipeline. Cheap to construct; rebuild and swap on
/// reconfiguration instead of mutating in place.
pub struct SynthesisPipeline {
    store: ArtifactStore,
    catalog: TemplateCatalog,
    executor: Option<FailoverExecutor>,
}

impl SynthesisPipeline {
    /// Build a pipeline from configuration. Generation is wired up only when
    /// it is enabled and at least one provider is configured.
    pub fn from_config(config: &ToolConfig) -> Result<Self, ToolError> {
        let executor = if config.generation_available() {
            let clients = provider::build_clients(config)?;
            Some(FailoverExecutor::new(clients)?)
        } else {
            info!("AI generation disabled or unconfigured, serving cache and templates only");
            None
        };

        Ok(Self {
            store: ArtifactStore::new(&config.output_dir),
            catalog: TemplateCatalog::new(),
            executor,
        })
    }

    /// Assemble a pipeline from parts. Used by tests and embedders that bring
    /// their own provider implementations.
    pub fn new(
        store: ArtifactStore,
        catalog: TemplateCatalog,
        providers: Vec<Arc<dyn ProviderClient>>,
    ) -> Result<Self, ToolError> {
        let executor = if providers.is_empty() {
            None
        } else {
            Some(FailoverExecutor::new(providers)?)
        };
        Ok(Self {
            store,
            catalog,
            executor,
        })
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn generation_available(&self) -> bool {
        self.executor.is_some()
    }

    /// Resolve a request to HTML content. Fixed sequencing: previously
    /// generated artifact, canned template, then provider failover.
    pub async fn synthesize(&self, request: &str) -> Result<String, ToolError> {
        if request.trim().is_empty() {
            return Err(ToolError::BlankRequest);
        }

        if let Some(existing) = self.store.find(request) {
            debug!("serving previously generated artifact");
            return Ok(existing);
        }

        if let Some(template) = self.catalog.matches(request) {
            debug!("serving canned template");
            return Ok(template.to_string());
        }

        match &self.executor {
            Some(executor) => executor.generate(request, None).await,
            None => Err(ToolError::GenerationUnavailable(
                "AI generation is disabled or no provider is configured; \
                 add a provider to the configuration or enable generation"
                    .to_string(),
            )),
        }
    }
}

/// Shared handle to the current pipeline. Reconfiguration builds a fresh
/// pipeline and swaps it in atomically; in-flight calls keep the instance
/// they started with.
#[derive(Clone)]
pub struct PipelineHandle {
    inner: Arc<RwLock<Arc<SynthesisPipeline>>>,
}

impl PipelineHandle {
    pub fn new(pipeline: SynthesisPipeline) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(pipeline))),
        }
    }

    /// Current pipeline instance.
    pub fn current(&self) -> Arc<SynthesisPipeline> {
        self.inner.read().clone()
    }

    /// Replace the pipeline, e.g. after a configuration change.
    pub fn replace(&self, pipeline: SynthesisPipeline) {
        *self.inner.write() = Arc::new(pipeline);
        info!("synthesis pipeline reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::MockProvider;
    use tempfile::TempDir;

    fn valid_page(tag: &str) -> String {
        format!(
            "<!DOCTYPE html><html><body>{}</body></html>{}",
            tag,
            "x".repeat(100)
        )
    }

    fn pipeline_with(
        dir: &TempDir,
        providers: Vec<Arc<dyn ProviderClient>>,
    ) -> SynthesisPipeline {
        SynthesisPipeline::new(
            ArtifactStore::new(dir.path()),
            TemplateCatalog::new(),
            providers,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_blank_request_rejected() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir, vec![]);
        assert!(matches!(
            pipeline.synthesize("   ").await,
            Err(ToolError::BlankRequest)
        ));
        assert!(matches!(
            pipeline.synthesize("").await,
            Err(ToolError::BlankRequest)
        ));
    }

    #[tokio::test]
    async fn test_store_hit_short_circuits_providers() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::succeeding("A", &valid_page("a")));
        let pipeline = pipeline_with(&dir, vec![provider.clone()]);

        pipeline.store().save("汇率换算", "<html>cached</html>").unwrap();
        let content = pipeline.synthesize("汇率换算").await.unwrap();
        assert_eq!(content, "<html>cached</html>");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_template_hit_short_circuits_providers() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::succeeding("A", &valid_page("a")));
        let pipeline = pipeline_with(&dir, vec![provider.clone()]);

        let content = pipeline.synthesize("生成一个计算器工具").await.unwrap();
        assert!(content.contains("<!DOCTYPE html>"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_generation_unavailable_without_providers() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(&dir, vec![]);
        let err = pipeline.synthesize("帮我做一个番茄钟页面").await.unwrap_err();
        assert!(matches!(err, ToolError::GenerationUnavailable(_)));
    }

    #[tokio::test]
    async fn test_generation_failure_surfaces_without_template_fallback() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::failing("A", "connection refused"));
        let pipeline = pipeline_with(&dir, vec![provider]);

        let err = pipeline.synthesize("帮我做一个番茄钟页面").await.unwrap_err();
        assert!(matches!(err, ToolError::AllProvidersFailed(_)));
    }

    #[tokio::test]
    async fn test_generation_result_returned() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::succeeding("A", &valid_page("fresh")));
        let pipeline = pipeline_with(&dir, vec![provider]);

        let content = pipeline.synthesize("帮我做一个番茄钟页面").await.unwrap();
        assert!(content.contains("fresh"));
    }

    #[tokio::test]
    async fn test_handle_swaps_pipeline_atomically() {
        let dir = TempDir::new().unwrap();
        let handle = PipelineHandle::new(pipeline_with(&dir, vec![]));
        assert!(!handle.current().generation_available());

        let provider = Arc::new(MockProvider::succeeding("A", &valid_page("a")));
        handle.replace(pipeline_with(&dir, vec![provider]));
        assert!(handle.current().generation_available());
    }

    #[tokio::test]
    async fn test_from_config_without_providers_has_no_executor() {
        let config = ToolConfig::default();
        let pipeline = SynthesisPipeline::from_config(&config).unwrap();
        assert!(!pipeline.generation_available());
    }
}
