//! Provider Failover Executor
//!
//! Ring scan over a fixed ordered list of providers with a sticky preferred
//! index: each call starts at the last provider that succeeded, so a dead
//! primary stops costing latency once a healthy backup is found, while a
//! fresh call still gives the remembered provider the first shot. There is no
//! backoff and no circuit breaker; every call is one full scan at most.

use crate::error::{ProviderFailure, ToolError};
use crate::provider::ProviderClient;
use crate::validation::{is_valid_html, MIN_CONTENT_LENGTH};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Advisory failure classification, derived from error message markers.
/// Logged for operators; never changes control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    ConnectionOrTimeout,
    Authentication,
    RateLimitOrQuota,
    ServiceUnavailable,
    Billing,
    Unknown,
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FailureClass::ConnectionOrTimeout => "connection failed or timed out",
            FailureClass::Authentication => "authentication failed: API key invalid or expired",
            FailureClass::RateLimitOrQuota => "quota exhausted or rate limited",
            FailureClass::ServiceUnavailable => "service temporarily unavailable",
            FailureClass::Billing => "account billing problem",
            FailureClass::Unknown => "unknown error",
        };
        f.write_str(s)
    }
}

/// Classify a provider failure by scanning its message for markers.
pub fn classify_failure(message: &str) -> FailureClass {
    let msg = message.to_lowercase();

    let contains_any = |markers: &[&str]| markers.iter().any(|m| msg.contains(m));

    if contains_any(&["connect", "timeout", "连接", "超时"]) {
        FailureClass::ConnectionOrTimeout
    } else if contains_any(&["401", "unauthorized", "api key", "invalid", "认证", "密钥"]) {
        FailureClass::Authentication
    } else if contains_any(&["429", "quota", "rate limit", "limit", "配额", "频率限制"]) {
        FailureClass::RateLimitOrQuota
    } else if contains_any(&["503", "500", "service unavailable", "服务不可用"]) {
        FailureClass::ServiceUnavailable
    } else if contains_any(&["payment", "billing", "欠费", "余额不足"]) {
        FailureClass::Billing
    } else {
        FailureClass::Unknown
    }
}

/// Orchestrates ordered retries across providers with sticky selection.
pub struct FailoverExecutor {
    providers: Vec<Arc<dyn ProviderClient>>,
    // Preferred starting index. Invariant: always < providers.len(). Written
    // only after a successful attempt; a lost race between concurrent calls
    // just costs one extra attempt on the next scan.
    preferred: AtomicUsize,
}

impl FailoverExecutor {
    pub fn new(providers: Vec<Arc<dyn ProviderClient>>) -> Result<Self, ToolError> {
        if providers.is_empty() {
            return Err(ToolError::ConfigError(
                "Provider list cannot be empty".to_string(),
            ));
        }
        info!(priority = %join_names(&providers), "failover executor initialized");
        Ok(Self {
            providers,
            preferred: AtomicUsize::new(0),
        })
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn preferred_index(&self) -> usize {
        self.preferred.load(Ordering::Relaxed)
    }

    /// Provider names in priority order, for diagnostics.
    pub fn provider_names(&self) -> String {
        join_names(&self.providers)
    }

    /// Generate content, scanning the provider ring once starting from the
    /// preferred index. Returns the first validated success; fails with an
    /// aggregate error only when every provider has failed.
    pub async fn generate(
        &self,
        request: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ToolError> {
        let count = self.providers.len();
        let start = self.preferred.load(Ordering::Relaxed) % count;
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for attempt in 0..count {
            let index = (start + attempt) % count;
            let provider = &self.providers[index];

            match provider.attempt(request, system_prompt).await {
                Ok(content) => {
                    if is_valid_html(&content) {
                        self.preferred.store(index, Ordering::Relaxed);
                        info!(provider = provider.name(), index, "generation succeeded");
                        return Ok(content);
                    }
                    // Non-empty but malformed output counts as a provider
                    // failure and the scan moves on.
                    let message = if content.len() <= MIN_CONTENT_LENGTH {
                        "Generated content too short, generation likely failed".to_string()
                    } else {
                        "Generated content is missing the required HTML root markers".to_string()
                    };
                    self.record_failure(provider.name(), &message, &mut failures);
                }
                Err(e) => {
                    self.record_failure(provider.name(), &e.to_string(), &mut failures);
                }
            }
        }

        warn!(
            tried = %self.provider_names(),
            "all providers failed"
        );
        Err(ToolError::AllProvidersFailed(failures))
    }

    fn record_failure(&self, provider: &str, message: &str, failures: &mut Vec<ProviderFailure>) {
        let class = classify_failure(message);
        warn!(provider, class = %class, message, "provider attempt failed");
        failures.push(ProviderFailure {
            provider: provider.to_string(),
            message: message.to_string(),
        });
    }
}

fn join_names(providers: &[Arc<dyn ProviderClient>]) -> String {
    providers
        .iter()
        .map(|p| p.name())
        .collect::<Vec<_>>()
        .join(" -> ")
}
