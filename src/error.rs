//! Error types for the toolsmith generation pipeline.

use thiserror::Error;

/// One failed provider attempt, recorded in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    /// Display name of the provider that failed
    pub provider: String,
    /// Original error message from the attempt
    pub message: String,
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

/// Pipeline-level errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Request is empty or blank")]
    BlankRequest,

    #[error("Generation unavailable: {0}")]
    GenerationUnavailable(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Provider request failed: {0}")]
    ProviderRequestFailed(String),

    #[error("Provider authentication failed: {0}")]
    ProviderAuthFailed(String),

    #[error("Provider rate limit exceeded: {0}")]
    ProviderRateLimit(String),

    #[error("Provider service unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Generated content failed validation: {0}")]
    InvalidContent(String),

    #[error("All providers failed ({})", format_attempts(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_attempts(attempts: &[ProviderFailure]) -> String {
    attempts
        .iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<config::ConfigError> for ToolError {
    fn from(err: config::ConfigError) -> Self {
        ToolError::ConfigError(err.to_string())
    }
}

impl ToolError {
    /// Attempt records when every provider failed, empty otherwise.
    pub fn failed_attempts(&self) -> &[ProviderFailure] {
        match self {
            ToolError::AllProvidersFailed(attempts) => attempts,
            _ => &[],
        }
    }
}
