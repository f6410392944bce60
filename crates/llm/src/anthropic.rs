//! Anthropic Messages API client.

use arachne_common::{ArachneError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::client::{LlmClient, LlmRequest, LlmResponse, Role, TokenUsage};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: &'static str,
    content: Vec<WireContent>,
}

#[derive(Serialize, Deserialize)]
struct WireContent {
    #[serde(rename = "type")]
    kind: String,
    text: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseContent>,
    model: String,
    usage: Option<WireUsage>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    text: String,
}

#[derive(Deserialize)]
struct WireUsage {
    input_tokens: u32,
    output_tokens: u32,
}

pub struct AnthropicClient {
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl AnthropicClient {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            http_client: reqwest::Client::new(),
        }
    }

    // System turns go in the top-level `system` field, never in `messages`.
    fn build_messages(request: &LlmRequest) -> Vec<WireMessage> {
        request
            .messages
            .iter()
            .filter(|msg| msg.role != Role::System)
            .map(|msg| WireMessage {
                role: match msg.role {
                    Role::Assistant => "assistant",
                    _ => "user",
                },
                content: vec![WireContent {
                    kind: "text".to_string(),
                    text: msg.content.clone(),
                }],
            })
            .collect()
    }

    fn build_body(&self, request: &LlmRequest) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            messages: Self::build_messages(request),
            system: request.system_prompt.clone(),
            temperature: request.temperature,
            max_tokens: request.max_tokens.unwrap_or(4096),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse> {
        let body = self.build_body(&request);

        let response = self
            .http_client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ArachneError::Agent(format!("Anthropic request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(ArachneError::Agent(format!(
                "Anthropic API error {status}: {body_text}"
            )));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ArachneError::Agent(format!("Failed to parse Anthropic response: {e}")))?;

        let content = parsed
            .content
            .into_iter()
            .map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(LlmResponse {
            content,
            model: parsed.model,
            usage: parsed.usage.map(|u| TokenUsage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
            finish_reason: parsed.stop_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    #[test]
    fn request_body_matches_messages_format() {
        let client = AnthropicClient::new("claude-sonnet-4-20250514", "sk-ant-test");
        let request = LlmRequest {
            system_prompt: Some("You plan tasks into tool steps.".to_string()),
            messages: vec![
                ChatMessage::user("what's 3*6 divided by 2"),
                ChatMessage::assistant("Plan: multiply first."),
                ChatMessage::user("continue"),
            ],
            temperature: Some(0.3),
            max_tokens: Some(1024),
        };

        let json = serde_json::to_value(client.build_body(&request)).unwrap();

        assert_eq!(json["model"], "claude-sonnet-4-20250514");
        assert_eq!(json["system"], "You plan tasks into tool steps.");
        assert_eq!(json["max_tokens"], 1024);

        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"][0]["type"], "text");
        assert_eq!(messages[1]["role"], "assistant");
    }

    #[test]
    fn system_messages_never_reach_the_messages_array() {
        let client = AnthropicClient::new("claude-sonnet-4-20250514", "key");
        let request = LlmRequest {
            system_prompt: Some("top-level".to_string()),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: "stray system turn".to_string(),
                },
                ChatMessage::user("hello"),
            ],
            temperature: None,
            max_tokens: None,
        };

        let json = serde_json::to_value(client.build_body(&request)).unwrap();
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        for msg in messages {
            assert_ne!(msg["role"], "system");
        }
    }

    #[test]
    fn max_tokens_defaults_when_unset() {
        let client = AnthropicClient::new("claude-sonnet-4-20250514", "key");
        let request = LlmRequest::with_system("sys", "hi");
        let json = serde_json::to_value(client.build_body(&request)).unwrap();
        assert_eq!(json["max_tokens"], 4096);
        assert!(json.get("temperature").is_none());
    }
}
