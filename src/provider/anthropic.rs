//! Anthropic Messages API provider.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::MuseError;
use crate::types::*;

use super::http::{anthropic_headers, shared_client, status_to_error};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

pub struct AnthropicProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> Value {
        // The API rejects empty content, so turns with nothing to say are skipped.
        let messages: Vec<Value> = request
            .messages
            .iter()
            .filter_map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                build_anthropic_content(&msg.content).map(|content| {
                    json!({
                        "role": role,
                        "content": content,
                    })
                })
            })
            .collect();

        let mut body = Map::new();
        body.insert("model".into(), self.model.clone().into());
        body.insert("messages".into(), messages.into());
        body.insert(
            "max_tokens".into(),
            request.settings.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS).into(),
        );

        if let Some(ref system) = request.system {
            if !system.is_empty() {
                body.insert("system".into(), system.clone().into());
            }
        }
        if let Some(temp) = request.settings.temperature {
            body.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = request.settings.top_p {
            body.insert("top_p".into(), top_p.into());
        }
        if let Some(ref stops) = request.settings.stop_sequences {
            body.insert("stop_sequences".into(), json!(stops));
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<Value> = tools
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.description,
                            "input_schema": t.input_schema,
                        })
                    })
                    .collect();
                body.insert("tools".into(), tool_defs.into());
            }
        }

        Value::Object(body)
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, MuseError> {
        let body = self.build_request_body(request);
        let url = format!("{}/messages", self.base_url);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map_or(0, Vec::len),
            "Anthropic generate_text"
        );

        let resp = shared_client()
            .post(&url)
            .headers(anthropic_headers(&self.api_key, API_VERSION))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text, retry_after.as_deref()));
        }

        let data: AnthropicResponse = resp.json().await?;
        Ok(data.into_provider_response())
    }
}

fn build_anthropic_content(parts: &[ContentPart]) -> Option<Value> {
    if let [ContentPart::Text { text }] = parts {
        return (!text.is_empty()).then(|| Value::String(text.clone()));
    }

    let content: Vec<Value> = parts
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } if text.is_empty() => None,
            ContentPart::Text { text } => Some(json!({
                "type": "text",
                "text": text,
            })),
            ContentPart::ToolCall(call) => Some(json!({
                "type": "tool_use",
                "id": call.id,
                "name": call.name,
                "input": call.arguments,
            })),
            ContentPart::ToolResult(result) => Some(json!({
                "type": "tool_result",
                "tool_use_id": result.tool_call_id,
                "content": result.content,
                "is_error": result.is_error,
            })),
        })
        .collect();

    (!content.is_empty()).then_some(Value::Array(content))
}

// Internal Anthropic response types

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
    #[serde(default)]
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    r#type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<Value>,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

impl AnthropicResponse {
    fn into_provider_response(self) -> ProviderResponse {
        let content = self
            .content
            .into_iter()
            .filter_map(|block| match block.r#type.as_str() {
                "text" => block.text.map(|text| ContentPart::Text { text }),
                "tool_use" => match (block.id, block.name) {
                    (Some(id), Some(name)) => Some(ContentPart::ToolCall(AgentToolCall {
                        id,
                        name,
                        arguments: block.input.unwrap_or_else(|| json!({})),
                    })),
                    _ => None,
                },
                _ => None,
            })
            .collect();

        ProviderResponse {
            content,
            usage: Usage::new(self.usage.input_tokens, self.usage.output_tokens),
            finish_reason: self
                .stop_reason
                .as_deref()
                .and_then(FinishReason::from_anthropic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolSpec;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new("claude-sonnet-4-20250514", "sk-test", None)
    }

    fn request(messages: Vec<ModelMessage>) -> ProviderRequest {
        ProviderRequest {
            system: Some("You are the calendar agent.".into()),
            messages,
            settings: GenerationSettings::default(),
            tools: None,
        }
    }

    #[test]
    fn body_carries_system_and_default_max_tokens() {
        let body = provider().build_request_body(&request(vec![ModelMessage::user("hi")]));
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["system"], "You are the calendar agent.");
        assert_eq!(body["max_tokens"], 4096);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "hi");
        assert!(body.get("tools").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn body_encodes_tool_use_and_results() {
        let call = AgentToolCall {
            id: "toolu_1".into(),
            name: "list_events".into(),
            arguments: json!({"start_date": "2025-06-01"}),
        };
        let messages = vec![
            ModelMessage::user("what's on?"),
            ModelMessage::assistant_parts(vec![
                ContentPart::Text {
                    text: "Checking.".into(),
                },
                ContentPart::ToolCall(call),
            ]),
            ModelMessage::tool_results(vec![AgentToolResult::error("toolu_1", "Unknown tool: x")]),
        ];
        let body = provider().build_request_body(&request(messages));

        let assistant = &body["messages"][1]["content"];
        assert_eq!(assistant[0]["type"], "text");
        assert_eq!(assistant[1]["type"], "tool_use");
        assert_eq!(assistant[1]["id"], "toolu_1");
        assert_eq!(assistant[1]["input"]["start_date"], "2025-06-01");

        let results = &body["messages"][2];
        assert_eq!(results["role"], "user");
        assert_eq!(results["content"][0]["type"], "tool_result");
        assert_eq!(results["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(results["content"][0]["is_error"], true);
    }

    #[test]
    fn empty_turns_are_left_out_of_the_body() {
        let messages = vec![
            ModelMessage::user("invoice the Earl gig"),
            ModelMessage::assistant(""),
            ModelMessage::assistant_parts(vec![]),
            ModelMessage::user("hello?"),
        ];
        let body = provider().build_request_body(&request(messages));

        let sent = body["messages"].as_array().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["content"], "invoice the Earl gig");
        assert_eq!(sent[1]["content"], "hello?");
    }

    #[test]
    fn body_includes_tools_and_settings() {
        let mut req = request(vec![ModelMessage::user("hi")]);
        req.settings = GenerationSettings::builder()
            .max_tokens(20)
            .temperature(0.0)
            .build();
        req.tools = Some(vec![ToolSpec {
            name: "list_events".into(),
            description: "List events".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        }]);
        let body = provider().build_request_body(&req);
        assert_eq!(body["max_tokens"], 20);
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["tools"][0]["name"], "list_events");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn response_blocks_keep_their_order() {
        let raw = json!({
            "content": [
                {"type": "text", "text": "Let me look."},
                {"type": "tool_use", "id": "a", "name": "search_emails", "input": {"query": "venue"}},
                {"type": "tool_use", "id": "b", "name": "get_unread_count"}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 12, "output_tokens": 30}
        });
        let parsed: AnthropicResponse = serde_json::from_value(raw).unwrap();
        let response = parsed.into_provider_response();

        assert!(response.is_tool_use());
        assert_eq!(response.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(response.usage.total_tokens, 42);
        let calls = response.tool_calls();
        assert_eq!(calls[0].id, "a");
        assert_eq!(calls[1].name, "get_unread_count");
        assert_eq!(calls[1].arguments, json!({}));
        assert!(matches!(response.content[0], ContentPart::Text { .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let p = AnthropicProvider::new("m", "k", Some("http://localhost:9000/v1/".into()));
        assert_eq!(p.base_url, "http://localhost:9000/v1");
    }
}
