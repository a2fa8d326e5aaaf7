use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AgentError, ChatBackend, ChatMessage, TurnKind};
use crate::app::config::LlmConfig;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
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

/// OpenAI-compatible `chat/completions` client.
#[derive(Clone)]
pub(super) struct HttpChatBackend {
    client: Client,
    url: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl HttpChatBackend {
    pub(super) fn new(config: &LlmConfig, api_key: String) -> Result<Self, AgentError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            url: completions_url(&config.endpoint),
            model: config.model.clone(),
            temperature: config.temperature,
            api_key,
        })
    }
}

fn completions_url(endpoint: &str) -> String {
    format!("{}/chat/completions", endpoint.trim_end_matches('/'))
}

impl ChatBackend for HttpChatBackend {
    fn complete(&self, messages: &[ChatMessage], turn: TurnKind) -> Result<String, AgentError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };
        debug!(turn = ?turn, messages = messages.len(), model = %self.model, "chat_request_sent");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;
        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "chat_request_rejected");
            return Err(AgentError::Status {
                status: status.as_u16(),
            });
        }

        let completion: ChatCompletionResponse = response.json()?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(AgentError::EmptyCompletion)
    }
}
