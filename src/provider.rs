//! Generation Provider Abstraction
//!
//! Capability interface for backends that can synthesize an HTML tool page
//! from a text request, with one implementation per vendor. Providers are
//! externally configured, ordered by priority, and consumed by the failover
//! executor; the pipeline never talks to a vendor API directly.

use crate::config::{GenerationConfig, ProviderConfig, ProviderKind, ToolConfig};
use crate::error::ToolError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// System prompt used when the caller supplies none.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are an expert HTML tool builder. Given the user's request, produce a complete, \
working, self-contained HTML tool page.

Requirements:
1. Output complete HTML including <!DOCTYPE html>, <head> and <body>.
2. Use modern, responsive CSS; the page should look clean.
3. Include the JavaScript needed for the tool to actually work.
4. The page must be self-contained and usable when opened directly in a browser.
5. Keep the code readable, with sparing comments.

Output only the raw HTML. No explanations, no markdown code fences.";

/// A backend capable of synthesizing HTML from a request.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Attempt one synthesis. Fails on any transport, authentication, or
    /// backend error; the failover executor decides what happens next.
    async fn attempt(&self, request: &str, system_prompt: Option<&str>)
        -> Result<String, ToolError>;

    /// Display name, used only for logging and failure reports.
    fn name(&self) -> &str;
}

/// Strip markdown code fences and leading prose from model output, keeping
/// the document from its first HTML root marker onward.
pub fn extract_html(content: &str) -> String {
    let mut content = content.trim();

    if let Some(start) = content.find("```html") {
        let body = &content[start + 7..];
        if let Some(end) = body.find("```") {
            content = body[..end].trim();
        }
    } else if let Some(start) = content.find("```") {
        let body = &content[start + 3..];
        if let Some(end) = body.find("```") {
            content = body[..end].trim();
        }
    }

    if !content.starts_with("<!DOCTYPE") && !content.starts_with("<html") {
        let root = content.find("<html").or_else(|| content.find("<!DOCTYPE"));
        if let Some(idx) = root {
            content = &content[idx..];
        }
    }

    content.trim().to_string()
}

// OpenAI-compatible chat completion wire structures, shared by both vendors.
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

fn map_http_error(error: reqwest::Error) -> ToolError {
    if error.is_timeout() {
        ToolError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ToolError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        ToolError::ProviderError(format!("HTTP error: {}", error))
    }
}

fn map_status_error(status: reqwest::StatusCode, body: String) -> ToolError {
    match status.as_u16() {
        401 | 403 => ToolError::ProviderAuthFailed(format!("Authentication failed: {}", body)),
        429 => ToolError::ProviderRateLimit(format!("Rate limit exceeded: {}", body)),
        402 => ToolError::ProviderError(format!("Billing problem: {}", body)),
        500..=599 => {
            ToolError::ProviderUnavailable(format!("Service unavailable ({}): {}", status, body))
        }
        _ => ToolError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, body
        )),
    }
}

fn build_http_client(generation: &GenerationConfig) -> Result<Client, ToolError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(generation.connect_timeout_secs))
        .timeout(Duration::from_secs(generation.read_timeout_secs))
        .build()
        .map_err(|e| ToolError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

async fn send_chat_request(
    client: &Client,
    base_url: &str,
    api_key: &str,
    model: &str,
    request: &str,
    system_prompt: Option<&str>,
) -> Result<String, ToolError> {
    let system = system_prompt.unwrap_or(DEFAULT_SYSTEM_PROMPT);
    let body = ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![
            WireMessage {
                role: "system".to_string(),
                content: system.to_string(),
            },
            WireMessage {
                role: "user".to_string(),
                content: request.to_string(),
            },
        ],
        stream: false,
    };

    let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));
    let response = client
        .post(&url)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&body)
        .send()
        .await
        .map_err(map_http_error)?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(map_status_error(status, text));
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| ToolError::ProviderError(format!("Failed to parse response: {}", e)))?;

    let choice = completion
        .choices
        .first()
        .ok_or_else(|| ToolError::ProviderError("No choices in response".to_string()))?;

    Ok(extract_html(&choice.message.content))
}

/// Volcano Ark (Doubao) client.
pub struct ArkClient {
    client: Client,
    name: String,
    model: String,
    api_key: String,
    base_url: String,
}

impl ArkClient {
    pub fn new(config: &ProviderConfig, generation: &GenerationConfig) -> Result<Self, ToolError> {
        Ok(Self {
            client: build_http_client(generation)?,
            name: config.name.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.effective_base_url().to_string(),
        })
    }
}

#[async_trait]
impl ProviderClient for ArkClient {
    async fn attempt(
        &self,
        request: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ToolError> {
        debug!(provider = %self.name, model = %self.model, "sending generation request");
        send_chat_request(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.model,
            request,
            system_prompt,
        )
        .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Client for any OpenAI-compatible endpoint (local servers, proxies).
pub struct OpenAiCompatClient {
    client: Client,
    name: String,
    model: String,
    api_key: String,
    base_url: String,
}

impl OpenAiCompatClient {
    pub fn new(config: &ProviderConfig, generation: &GenerationConfig) -> Result<Self, ToolError> {
        let base_url = config.base_url.clone().ok_or_else(|| {
            ToolError::ConfigError(format!(
                "Provider '{}' requires a base_url",
                config.name
            ))
        })?;
        Ok(Self {
            client: build_http_client(generation)?,
            name: config.name.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url,
        })
    }
}

#[async_trait]
impl ProviderClient for OpenAiCompatClient {
    async fn attempt(
        &self,
        request: &str,
        system_prompt: Option<&str>,
    ) -> Result<String, ToolError> {
        debug!(provider = %self.name, model = %self.model, "sending generation request");
        send_chat_request(
            &self.client,
            &self.base_url,
            &self.api_key,
            &self.model,
            request,
            system_prompt,
        )
        .await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Build the ordered client list from configuration. Order follows the
/// configured provider order, which defines failover priority.
pub fn build_clients(config: &ToolConfig) -> Result<Vec<Arc<dyn ProviderClient>>, ToolError> {
    let mut clients: Vec<Arc<dyn ProviderClient>> = Vec::with_capacity(config.providers.len());
    for provider in &config.providers {
        let client: Arc<dyn ProviderClient> = match provider.kind {
            ProviderKind::Ark => Arc::new(ArkClient::new(provider, &config.generation)?),
            ProviderKind::OpenaiCompat => {
                Arc::new(OpenAiCompatClient::new(provider, &config.generation)?)
            }
        };
        clients.push(client);
    }
    Ok(clients)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_ARK_BASE_URL;

    fn ark_config() -> ProviderConfig {
        ProviderConfig {
            name: "ark-primary".to_string(),
            kind: ProviderKind::Ark,
            api_key: "key".to_string(),
            model: "ep-123".to_string(),
            base_url: None,
        }
    }

    #[test]
    fn test_extract_html_strips_html_fence() {
        let raw = "Here is your tool:\n```html\n<!DOCTYPE html><html></html>\n```\nEnjoy!";
        assert_eq!(extract_html(raw), "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn test_extract_html_strips_anonymous_fence() {
        let raw = "```\n<html><body>hi</body></html>\n```";
        assert_eq!(extract_html(raw), "<html><body>hi</body></html>");
    }

    #[test]
    fn test_extract_html_trims_leading_prose() {
        let raw = "Sure, here you go: <!DOCTYPE html><html></html>";
        assert_eq!(extract_html(raw), "<!DOCTYPE html><html></html>");
    }

    #[test]
    fn test_extract_html_passes_clean_document_through() {
        let raw = "<!DOCTYPE html><html></html>";
        assert_eq!(extract_html(raw), raw);
    }

    #[test]
    fn test_extract_html_empty_input() {
        assert_eq!(extract_html("   "), "");
    }

    #[test]
    fn test_ark_client_uses_default_base_url() {
        let client = ArkClient::new(&ark_config(), &GenerationConfig::default()).unwrap();
        assert_eq!(client.base_url, DEFAULT_ARK_BASE_URL);
        assert_eq!(client.name(), "ark-primary");
    }

    #[test]
    fn test_openai_compat_client_requires_base_url() {
        let mut config = ark_config();
        config.kind = ProviderKind::OpenaiCompat;
        assert!(OpenAiCompatClient::new(&config, &GenerationConfig::default()).is_err());
    }

    #[test]
    fn test_build_clients_preserves_configured_order() {
        let mut tool_config = ToolConfig::default();
        tool_config.providers.push(ark_config());
        let mut backup = ark_config();
        backup.name = "ark-backup".to_string();
        tool_config.providers.push(backup);

        let clients = build_clients(&tool_config).unwrap();
        assert_eq!(clients.len(), 2);
        assert_eq!(clients[0].name(), "ark-primary");
        assert_eq!(clients[1].name(), "ark-backup");
    }

    #[test]
    fn test_map_status_error_variants() {
        let auth = map_status_error(reqwest::StatusCode::UNAUTHORIZED, "no".to_string());
        assert!(matches!(auth, ToolError::ProviderAuthFailed(_)));
        let rate = map_status_error(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow".to_string());
        assert!(matches!(rate, ToolError::ProviderRateLimit(_)));
        let unavailable =
            map_status_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, "down".to_string());
        assert!(matches!(unavailable, ToolError::ProviderUnavailable(_)));
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_outcomes() {
        let provider = mock::MockProvider::new(
            "mock",
            vec![Err("boom".to_string()), Ok("<html>ok</html>".to_string())],
        );
        assert!(provider.attempt("req", None).await.is_err());
        assert_eq!(provider.attempt("req", None).await.unwrap(), "<html>ok</html>");
        assert_eq!(provider.call_count(), 2);
    }
}
