//! End-to-end pipeline tests: request routing across the artifact store,
//! the template catalog, and provider failover, using scripted providers
//! and a temporary output directory.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;
use toolsmith::error::ToolError;
use toolsmith::pipeline::SynthesisPipeline;
use toolsmith::provider::ProviderClient;
use toolsmith::store::ArtifactStore;
use toolsmith::template::TemplateCatalog;

/// Scripted provider: plays back a fixed list of outcomes, repeating the
/// last one once exhausted.
struct ScriptedProvider {
    name: String,
    outcomes: parking_lot::Mutex<Vec<Result<String, String>>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(name: &str, outcomes: Vec<Result<String, String>>) -> Self {
        Self {
            name: name.to_string(),
            outcomes: parking_lot::Mutex::new(outcomes),
            calls: AtomicUsize::new(0),
        }
    }

    fn succeeding(name: &str, content: &str) -> Self {
        Self::new(name, vec![Ok(content.to_string())])
    }

    fn failing(name: &str, message: &str) -> Self {
        Self::new(name, vec![Err(message.to_string())])
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    async fn attempt(
        &self,
        _request: &str,
        _system_prompt: Option<&str>,
    ) -> Result<String, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.outcomes.lock();
        let outcome = if outcomes.len() > 1 {
            outcomes.remove(0)
        } else {
            outcomes[0].clone()
        };
        outcome.map_err(ToolError::ProviderError)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

fn valid_page(tag: &str) -> String {
    format!(
        "<!DOCTYPE html><html><body>{}</body></html>{}",
        tag,
        "x".repeat(100)
    )
}

fn pipeline_with(dir: &TempDir, providers: Vec<Arc<dyn ProviderClient>>) -> SynthesisPipeline {
    SynthesisPipeline::new(
        ArtifactStore::new(dir.path()),
        TemplateCatalog::new(),
        providers,
    )
    .unwrap()
}

#[tokio::test]
async fn generated_artifact_is_reused_on_the_next_request() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::succeeding("A", &valid_page("fresh")));
    let pipeline = pipeline_with(&dir, vec![provider.clone()]);

    // First request misses the store and the catalog, so the provider runs.
    let request = "帮我做一个汇率换算页面";
    let first = pipeline.synthesize(request).await.unwrap();
    assert!(first.contains("fresh"));
    assert_eq!(provider.call_count(), 1);

    let saved = pipeline.store().save(request, &first).unwrap();
    assert!(saved.exists());

    // Second request is served from the store without touching the provider.
    let second = pipeline.synthesize(request).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn failover_tries_providers_in_priority_order() {
    let dir = TempDir::new().unwrap();
    let primary = Arc::new(ScriptedProvider::failing("primary", "connection refused"));
    let backup = Arc::new(ScriptedProvider::succeeding("backup", &valid_page("backup")));
    let pipeline = pipeline_with(&dir, vec![primary.clone(), backup.clone()]);

    let content = pipeline.synthesize("做一个番茄钟").await.unwrap();
    assert!(content.contains("backup"));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(backup.call_count(), 1);

    // The cursor now sits on the backup; a second novel request skips the
    // dead primary entirely.
    let content = pipeline.synthesize("做一个倒计时页面").await.unwrap();
    assert!(content.contains("backup"));
    assert_eq!(primary.call_count(), 1);
    assert_eq!(backup.call_count(), 2);
}

#[tokio::test]
async fn canned_template_wins_over_generation() {
    let dir = TempDir::new().unwrap();
    let provider = Arc::new(ScriptedProvider::succeeding("A", &valid_page("generated")));
    let pipeline = pipeline_with(&dir, vec![provider.clone()]);

    let content = pipeline.synthesize("生成一个计算器工具").await.unwrap();
    assert!(content.starts_with("<!DOCTYPE html>"));
    assert!(!content.contains("generated"));
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn saved_artifact_wins_over_template() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline_with(&dir, vec![]);

    let request = "生成一个计算器工具";
    pipeline
        .store()
        .save(request, "<html>previously generated calculator</html>")
        .unwrap();

    let content = pipeline.synthesize(request).await.unwrap();
    assert_eq!(content, "<html>previously generated calculator</html>");
}

#[tokio::test]
async fn exhausted_providers_report_every_attempt() {
    let dir = TempDir::new().unwrap();
    let a = Arc::new(ScriptedProvider::failing("ark-primary", "timeout"));
    let b = Arc::new(ScriptedProvider::failing("ark-backup-2", "401 unauthorized"));
    let pipeline = pipeline_with(&dir, vec![a, b]);

    let err = pipeline.synthesize("做一个调色板工具").await.unwrap_err();
    match &err {
        ToolError::AllProvidersFailed(attempts) => {
            assert_eq!(attempts.len(), 2);
            assert_eq!(attempts[0].provider, "ark-primary");
            assert_eq!(attempts[1].provider, "ark-backup-2");
        }
        other => panic!("unexpected error: {other}"),
    }

    // The message names each provider with its failure.
    let rendered = err.to_string();
    assert!(rendered.contains("ark-primary"));
    assert!(rendered.contains("timeout"));
    assert!(rendered.contains("401 unauthorized"));
}

#[tokio::test]
async fn invalid_provider_output_falls_through_to_backup() {
    let dir = TempDir::new().unwrap();
    let a = Arc::new(ScriptedProvider::succeeding("A", "not html"));
    let b = Arc::new(ScriptedProvider::succeeding("B", &valid_page("real")));
    let pipeline = pipeline_with(&dir, vec![a, b.clone()]);

    let content = pipeline.synthesize("做一个秒表").await.unwrap();
    assert!(content.contains("real"));
    assert_eq!(b.call_count(), 1);
}

#[tokio::test]
async fn save_then_find_uses_the_naming_contract() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());

    let path = store
        .save("生成一个汇率换算工具", &valid_page("rates"))
        .unwrap();
    let filename = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(filename.ends_with(".html"));
    assert!(filename.contains("汇率换算"));

    let found = store.find("汇率换算").unwrap();
    assert!(found.contains("rates"));
}
