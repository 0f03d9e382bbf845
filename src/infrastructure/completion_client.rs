// Azure OpenAI chat-completions client
use crate::application::completion_service::{CompletionError, CompletionService};
use crate::infrastructure::config::CompletionSettings;
use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AzureChatClient {
    http: reqwest::Client,
    settings: CompletionSettings,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl AzureChatClient {
    pub fn new(settings: CompletionSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .context("Failed to build completion HTTP client")?;
        Ok(Self { http, settings })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            urlencoding::encode(&self.settings.deployment),
            urlencoding::encode(&self.settings.api_version)
        )
    }
}

#[async_trait]
impl CompletionService for AzureChatClient {
    async fn complete(&self, persona: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: persona,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
            frequency_penalty: self.settings.frequency_penalty,
            presence_penalty: self.settings.presence_penalty,
        };

        tracing::debug!(deployment = %self.settings.deployment, "POST chat completion");
        let response = self
            .http
            .post(self.completions_url())
            .header("api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Status { status, body });
        }

        let data = response
            .json::<ChatResponse>()
            .await
            .map_err(|e| CompletionError::Malformed(e.to_string()))?;

        let choice = data.choices.into_iter().next().ok_or(CompletionError::NoChoices)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}
