//! Provider Connection Diagnostics
//!
//! Staged health check for the configured providers, separating "wrong
//! config" from "network down" from "bad credentials". Stages run in order
//! and stop at the first failure, so the report points at the outermost
//! broken layer.

use crate::config::ToolConfig;
use serde::Serialize;
use std::time::Duration;

/// Per-probe timeout. Deliberately shorter than generation timeouts.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one diagnostic stage.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub success: bool,
    pub message: String,
}

impl CheckResult {
    fn pass(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            success: true,
            message: message.into(),
        }
    }

    fn fail(name: &str, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            success: false,
            message: message.into(),
        }
    }
}

/// Full diagnostic report, stages in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticReport {
    pub checks: Vec<CheckResult>,
    pub overall_status: String,
    pub summary: String,
}

impl DiagnosticReport {
    pub fn healthy(&self) -> bool {
        self.checks.iter().all(|c| c.success)
    }

    fn concluded(checks: Vec<CheckResult>, status: &str, summary: &str) -> Self {
        Self {
            checks,
            overall_status: status.to_string(),
            summary: summary.to_string(),
        }
    }
}

/// Run the diagnostic ladder against the first configured provider:
/// configuration, network reachability, endpoint reachability, then
/// authentication.
pub async fn diagnose(config: &ToolConfig) -> DiagnosticReport {
    let mut checks = Vec::new();

    let config_check = check_config(config);
    let config_ok = config_check.success;
    checks.push(config_check);
    if !config_ok {
        return DiagnosticReport::concluded(
            checks,
            "configuration incomplete",
            "Fix the provider configuration before probing the connection",
        );
    }

    // Config check guarantees at least one provider.
    let provider = &config.providers[0];
    let base_url = provider.effective_base_url();

    let network_check = check_network(base_url).await;
    let network_ok = network_check.success;
    checks.push(network_check);
    if !network_ok {
        return DiagnosticReport::concluded(
            checks,
            "connection failed",
            "Cannot reach the API host; check the network connection",
        );
    }

    let endpoint_check = check_endpoint(base_url).await;
    let endpoint_ok = endpoint_check.success;
    checks.push(endpoint_check);
    if !endpoint_ok {
        return DiagnosticReport::concluded(
            checks,
            "endpoint unreachable",
            "The API endpoint did not respond; check the base_url setting",
        );
    }

    let auth_check = check_auth(base_url, &provider.api_key, &provider.model).await;
    let auth_ok = auth_check.success;
    checks.push(auth_check);
    if auth_ok {
        DiagnosticReport::concluded(checks, "healthy", "All checks passed, provider is reachable")
    } else {
        DiagnosticReport::concluded(
            checks,
            "authentication failed",
            "Network is fine but the API rejected the credentials; check the api_key",
        )
    }
}

fn check_config(config: &ToolConfig) -> CheckResult {
    if config.providers.is_empty() {
        return CheckResult::fail(
            "configuration",
            "No providers configured (set up toolsmith.toml or TOOLSMITH_ARK_API_KEY)",
        );
    }
    if let Err(errors) = config.validate() {
        return CheckResult::fail("configuration", errors.join("; "));
    }
    let provider = &config.providers[0];
    CheckResult::pass(
        "configuration",
        format!(
            "{} provider(s) configured, probing '{}' at {}",
            config.providers.len(),
            provider.name,
            provider.effective_base_url()
        ),
    )
}

fn probe_client() -> Option<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(PROBE_TIMEOUT)
        .timeout(PROBE_TIMEOUT)
        .build()
        .ok()
}

async fn check_network(base_url: &str) -> CheckResult {
    let origin = match reqwest::Url::parse(base_url) {
        Ok(url) => match url.host_str() {
            Some(host) => format!("{}://{}", url.scheme(), host),
            None => return CheckResult::fail("network", format!("No host in URL: {}", base_url)),
        },
        Err(e) => return CheckResult::fail("network", format!("Invalid base_url: {}", e)),
    };

    let Some(client) = probe_client() else {
        return CheckResult::fail("network", "Failed to build probe client");
    };

    // Any HTTP response at all proves the host is reachable.
    match client.get(&origin).send().await {
        Ok(_) => CheckResult::pass("network", format!("Host reachable: {}", origin)),
        Err(e) if e.is_timeout() => {
            CheckResult::fail("network", format!("Connection timed out: {}", origin))
        }
        Err(e) => CheckResult::fail("network", format!("Connection failed: {}", e)),
    }
}

async fn check_endpoint(base_url: &str) -> CheckResult {
    let Some(client) = probe_client() else {
        return CheckResult::fail("endpoint", "Failed to build probe client");
    };

    match client.get(base_url).send().await {
        Ok(response) => CheckResult::pass(
            "endpoint",
            format!("Endpoint responded with status {}", response.status()),
        ),
        Err(e) => CheckResult::fail("endpoint", format!("Endpoint unreachable: {}", e)),
    }
}

async fn check_auth(base_url: &str, api_key: &str, model: &str) -> CheckResult {
    let Some(client) = probe_client() else {
        return CheckResult::fail("authentication", "Failed to build probe client");
    };

    let body = serde_json::json!({
        "model": model,
        "messages": [{"role": "user", "content": "ping"}],
        "max_tokens": 1,
    });

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    match client
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .json(&body)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            if status.as_u16() == 401 || status.as_u16() == 403 {
                CheckResult::fail(
                    "authentication",
                    format!("API rejected the credentials (status {})", status),
                )
            } else {
                CheckResult::pass(
                    "authentication",
                    format!("Credentials accepted (status {})", status),
                )
            }
        }
        Err(e) => CheckResult::fail("authentication", format!("Probe request failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderConfig, ProviderKind};

    #[test]
    fn test_check_config_fails_without_providers() {
        let result = check_config(&ToolConfig::default());
        assert!(!result.success);
        assert!(result.message.contains("No providers"));
    }

    #[test]
    fn test_check_config_reports_invalid_provider() {
        let mut config = ToolConfig::default();
        config.providers.push(ProviderConfig {
            name: "ark-primary".to_string(),
            kind: ProviderKind::Ark,
            api_key: String::new(),
            model: "ep-1".to_string(),
            base_url: None,
        });
        let result = check_config(&config);
        assert!(!result.success);
        assert!(result.message.contains("API key"));
    }

    #[tokio::test]
    async fn test_diagnose_stops_after_config_failure() {
        let report = diagnose(&ToolConfig::default()).await;
        assert_eq!(report.checks.len(), 1);
        assert!(!report.healthy());
        assert_eq!(report.overall_status, "configuration incomplete");
    }

    #[test]
    fn test_report_serializes() {
        let report = DiagnosticReport::concluded(
            vec![CheckResult::pass("configuration", "ok")],
            "healthy",
            "fine",
        );
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"overall_status\":\"healthy\""));
    }
}
