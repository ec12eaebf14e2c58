//! Shared test helpers: scripted and rule-based model providers.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use muse::config::RuntimeSettings;
use muse::error::MuseError;
use muse::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use muse::tools::{AgentTool, AgentToolParameters, ToolRegistry};
use muse::types::*;
use muse::util::retry::RetryPolicy;

/// Replays queued turns in order and records every request it receives.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, MuseError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a final text turn.
    pub fn text(self: &Arc<Self>, text: &str) -> Arc<Self> {
        self.push(Ok(ProviderResponse::text(text)))
    }

    /// Queue a tool-use turn with one block per `(id, name, input)`.
    pub fn tool_use(self: &Arc<Self>, calls: &[(&str, &str, Value)]) -> Arc<Self> {
        let content = calls
            .iter()
            .map(|(id, name, arguments)| {
                ContentPart::ToolCall(AgentToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: arguments.clone(),
                })
            })
            .collect();
        self.push(Ok(ProviderResponse {
            content,
            usage: Usage::new(10, 5),
            finish_reason: Some(FinishReason::ToolCalls),
        }))
    }

    /// Queue an arbitrary response.
    pub fn respond(self: &Arc<Self>, response: ProviderResponse) -> Arc<Self> {
        self.push(Ok(response))
    }

    pub fn error(self: &Arc<Self>, error: MuseError) -> Arc<Self> {
        self.push(Err(error))
    }

    fn push(self: &Arc<Self>, turn: Result<ProviderResponse, MuseError>) -> Arc<Self> {
        self.script.lock().unwrap().push_back(turn);
        Arc::clone(self)
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, MuseError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(MuseError::InvalidState("script exhausted".into())))
    }
}

type Rule = dyn Fn(&ProviderRequest) -> ProviderResponse + Send + Sync;

/// Answers every request with a rule, for tests where call order is not fixed.
pub struct RuleProvider {
    rule: Box<Rule>,
}

impl RuleProvider {
    pub fn new(rule: impl Fn(&ProviderRequest) -> ProviderResponse + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { rule: Box::new(rule) })
    }
}

#[async_trait]
impl ModelProvider for RuleProvider {
    fn provider_name(&self) -> &str {
        "rule"
    }

    fn model_id(&self) -> &str {
        "rule-model"
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, MuseError> {
        Ok((self.rule)(request))
    }
}

/// Runtime settings with no retries so scripted failures surface at once.
pub fn settings(max_rounds: u32) -> RuntimeSettings {
    RuntimeSettings {
        max_rounds,
        retry: RetryPolicy::none(),
        ..RuntimeSettings::default()
    }
}

/// A registry with a `lookup` tool that echoes its `key` and a `broken`
/// tool that always fails.
pub fn lookup_tools() -> ToolRegistry {
    let lookup = AgentTool::new(
        "lookup",
        "Look up a key",
        AgentToolParameters::object()
            .string("key", "Key to look up", true)
            .build(),
        |args, _ctx| async move {
            let key = args.get_str("key")?.to_string();
            Ok(json!({ "key": key, "value": 42 }))
        },
    );
    let broken = AgentTool::new(
        "broken",
        "Always fails",
        AgentToolParameters::empty(),
        |_args, _ctx| async move {
            Err(MuseError::tool("broken", "backend exploded"))
        },
    );
    ToolRegistry::new()
        .with_tool(lookup)
        .and_then(|registry| registry.with_tool(broken))
        .unwrap()
}
