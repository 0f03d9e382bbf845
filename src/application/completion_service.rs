// Completion service trait - hosted language model as an opaque text function
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("request to completion service failed: {0}")]
    Transport(String),
    #[error("completion service returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion response had no choices")]
    NoChoices,
    #[error("unexpected completion payload: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Generate text for `prompt` under the `persona` system instruction
    async fn complete(&self, persona: &str, prompt: &str) -> Result<String, CompletionError>;
}

/// Run a completion, degrading any failure to an empty string
pub async fn complete_or_empty(service: &dyn CompletionService, persona: &str, prompt: &str) -> String {
    match service.complete(persona, prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Completion call failed");
            String::new()
        }
    }
}
