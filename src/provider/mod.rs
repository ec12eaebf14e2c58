//! Model provider trait and the Anthropic implementation.

pub mod http;

#[cfg(feature = "anthropic")]
pub mod anthropic;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::MuseConfig;
use crate::error::MuseError;
use crate::tools::ToolSpec;
use crate::types::{AgentToolCall, ContentPart, FinishReason, GenerationSettings, ModelMessage, Usage};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Persona prompt, sent out of band from the turns.
    pub system: Option<String>,
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolSpec>>,
}

/// Response from a provider: the model's blocks in the order returned.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub content: Vec<ContentPart>,
    pub usage: Usage,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    /// A text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart::Text { text: text.into() }],
            usage: Usage::default(),
            finish_reason: Some(FinishReason::Stop),
        }
    }

    /// Whether the model asked for at least one tool.
    ///
    /// Decided on the blocks themselves, not the stop reason: a tool-use stop
    /// reason without any call blocks is a final answer.
    pub fn is_tool_use(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::ToolCall(_)))
    }

    pub fn tool_calls(&self) -> Vec<AgentToolCall> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::ToolCall(call) => Some(call.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn text_segments(&self) -> Vec<&str> {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Core trait implemented by model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "anthropic").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Generate a single response (non-streaming).
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, MuseError>;
}

/// Create the provider described by `config`.
#[cfg(feature = "anthropic")]
pub fn create_provider(config: &MuseConfig) -> Result<Arc<dyn ModelProvider>, MuseError> {
    let api_key = config
        .api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| MuseError::Authentication("Missing ANTHROPIC_API_KEY".into()))?;
    Ok(Arc::new(anthropic::AnthropicProvider::new(
        config.model.clone(),
        api_key,
        config.base_url.clone(),
    )))
}

/// Create the provider described by `config`.
#[cfg(not(feature = "anthropic"))]
pub fn create_provider(_config: &MuseConfig) -> Result<Arc<dyn ModelProvider>, MuseError> {
    Err(MuseError::Configuration(
        "no model provider compiled in; enable the `anthropic` feature".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_use_is_decided_by_blocks() {
        let mut response = ProviderResponse::text("done");
        response.finish_reason = Some(FinishReason::ToolCalls);
        assert!(!response.is_tool_use());

        response.content.push(ContentPart::ToolCall(AgentToolCall {
            id: "t1".into(),
            name: "list_events".into(),
            arguments: json!({}),
        }));
        assert!(response.is_tool_use());
        assert_eq!(response.tool_calls().len(), 1);
        assert_eq!(response.text_segments(), vec!["done"]);
    }

    #[cfg(feature = "anthropic")]
    #[test]
    fn missing_api_key_is_an_authentication_error() {
        let config = MuseConfig::default();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, MuseError::Authentication(_)));
    }
}
