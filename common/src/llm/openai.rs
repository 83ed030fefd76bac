use crate::config::GeneratorConfig;
use crate::error::{ErmError, Result};
use crate::llm::generator::TextGenerator;
use crate::llm::http::{build_client, endpoint, send_json};
use crate::llm::message::{chat_messages, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// client for openai-compatible `/chat/completions` endpoints (github models,
/// openai, local gateways)
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: GeneratorConfig,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
    top_p: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        if api_key.is_none() {
            tracing::warn!(base_url = %config.base_url, "openai backend configured without api_key_env");
        }

        let client = build_client(config.timeout_secs)?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn completion_request<'a>(&'a self, system: &str, user: &str) -> CompletionRequest<'a> {
        CompletionRequest {
            model: &self.config.model,
            messages: chat_messages(system, user),
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        }
    }
}

fn first_content(response: CompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ErmError::Generation("completion had no content".to_string()))
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    #[tracing::instrument(skip(self, system, user), fields(model = %self.config.model, system_len = system.len(), user_len = user.len()))]
    async fn generate(&self, system: &str, user: &str) -> Result<String> {
        let body = self.completion_request(system, user);
        if self.config.log_requests {
            tracing::debug!(request = ?body, "openai request");
        }

        let mut request = self
            .client
            .post(endpoint(&self.config.base_url, "chat/completions"))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response: CompletionResponse = send_json(request, self.name()).await?;
        let content = first_content(response)?;

        tracing::debug!(response_len = content.len(), "openai replied");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;

    fn generator() -> OpenAiGenerator {
        OpenAiGenerator::new(GeneratorConfig {
            backend: Backend::OpenAi,
            model: "openai/gpt-4.1-mini".to_string(),
            ..GeneratorConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_completion_request_shape() {
        let generator = generator();
        let json = serde_json::to_value(generator.completion_request("sys", "frage")).unwrap();

        assert_eq!(json["model"], "openai/gpt-4.1-mini");
        assert_eq!(json["messages"].as_array().unwrap().len(), 2);
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_first_content() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"CREATE TABLE a (id INT);"}}]}"#;
        let response: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(first_content(response).unwrap(), "CREATE TABLE a (id INT);");
    }

    #[test]
    fn test_empty_choices_is_generation_error() {
        let response: CompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_content(response), Err(ErmError::Generation(_))));
    }
}
