use crate::config::GeneratorConfig;
use crate::error::{ErmError, Result};
use crate::llm::generator::TextGenerator;
use crate::llm::http::{build_client, endpoint, send_json};
use crate::llm::message::{chat_messages, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// non-streaming client for ollama's `/api/chat`
pub struct OllamaGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OllamaGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let client = build_client(config.timeout_secs)?;
        tracing::debug!(model = %config.model, base_url = %config.base_url, "ollama generator ready");
        Ok(Self { client, config })
    }

    fn chat_request<'a>(&'a self, system: &str, user: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: chat_messages(system, user),
            stream: false,
            options: ChatOptions {
                temperature: self.config.temperature,
                top_p: self.config.top_p,
            },
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    #[tracing::instrument(skip(self, system, user), fields(model = %self.config.model, system_len = system.len(), user_len = user.len()))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let body = self.chat_request(system, user);
        if self.config.log_requests {
            tracing::debug!(request = ?body, "ollama request");
        }

        let request = self
            .client
            .post(endpoint(&self.config.base_url, "api/chat"))
            .json(&body);

        let response: ChatResponse = send_json(request, self.name()).await?;
        let content = response
            .message
            .map(|m| m.content)
            .ok_or_else(|| ErmError::Generation("ollama response had no message".to_string()))?;

        tracing::debug!(response_len = content.len(), "ollama replied");
        Ok(content)
    }
}
