//! The round-bounded request/act loop.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::conversation::Conversation;
use super::state::{RunOutcome, RunState, Terminal};
use crate::config::{RuntimeSettings, ToolExecutionMode};
use crate::error::MuseError;
use crate::provider::{ModelProvider, ProviderRequest, ProviderResponse};
use crate::tools::{ToolRegistry, ToolSpec};
use crate::types::{AgentToolCall, AgentToolResult, GenerationSettings, ModelMessage, Usage};
use crate::util::timeout::maybe_timeout;

/// Returned when the round bound is reached without a final answer.
pub const BOUND_FALLBACK: &str =
    "I'm having trouble completing this request. Could you try rephrasing?";

/// Static identity of an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentIdentity {
    pub name: String,
    pub persona_prompt: String,
}

impl AgentIdentity {
    pub fn new(name: impl Into<String>, persona_prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persona_prompt: persona_prompt.into(),
        }
    }
}

/// One agent's conversation plus the tools and model it talks to.
///
/// History is only ever extended by a completed run. Turns produced while a
/// run is in flight are staged and committed when it reaches a terminal
/// state; a model failure or a dropped `run` future leaves history untouched.
pub struct AgentRuntime {
    identity: AgentIdentity,
    tools: Arc<ToolRegistry>,
    provider: Arc<dyn ModelProvider>,
    settings: RuntimeSettings,
    history: Conversation,
    usage: Usage,
}

impl AgentRuntime {
    pub fn new(
        identity: AgentIdentity,
        tools: ToolRegistry,
        provider: Arc<dyn ModelProvider>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            identity,
            tools: Arc::new(tools),
            provider,
            settings,
            history: Conversation::new(),
            usage: Usage::default(),
        }
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        self.tools.specs()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    /// Token usage accumulated over the lifetime of this agent.
    pub fn usage(&self) -> &Usage {
        &self.usage
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    /// Discard all history. Identity and tools are kept.
    pub fn reset(&mut self) {
        debug!(agent = %self.identity.name, turns = self.history.len(), "resetting history");
        self.history.clear();
    }

    /// Drive one user message to a final answer.
    pub async fn run(&mut self, message: &str) -> Result<String, MuseError> {
        Ok(self.run_detailed(message).await?.text)
    }

    /// Like [`run`](Self::run) but reports how the run ended.
    pub async fn run_detailed(&mut self, message: &str) -> Result<RunOutcome, MuseError> {
        if message.trim().is_empty() {
            return Err(MuseError::InvalidArgument(
                "user message must not be empty".into(),
            ));
        }

        let run_id = Uuid::new_v4();
        let agent = self.identity.name.clone();

        if let Some(max) = self.settings.max_history_messages {
            let dropped = self.history.compact_to(max);
            if dropped > 0 {
                info!(%run_id, %agent, dropped, "compacted history");
            }
        }

        let specs = self.tools.specs();
        let tools = (!specs.is_empty()).then_some(specs);
        let max_rounds = self.settings.max_rounds;

        let mut staged = vec![ModelMessage::user(message)];
        let mut round: u32 = 0;
        let mut state = RunState::AwaitingModel;
        debug!(%run_id, %agent, state = state.as_ref(), "run started");

        loop {
            state = match state {
                RunState::AwaitingModel if round >= max_rounds => RunState::TerminalBound,
                RunState::AwaitingModel => {
                    round += 1;
                    info!(%run_id, %agent, round, max_rounds, "requesting model turn");
                    let response = self.request_turn(&staged, tools.clone()).await.map_err(|err| {
                        error!(%run_id, %agent, round, error = %err, "model request failed; discarding run");
                        err
                    })?;
                    self.usage.merge(&response.usage);

                    if response.is_tool_use() {
                        let calls = response.tool_calls();
                        staged.push(ModelMessage::assistant_parts(response.content));
                        RunState::ExecutingTools(calls)
                    } else {
                        RunState::TerminalText(response.text_segments().join("\n"))
                    }
                }
                RunState::ExecutingTools(calls) => {
                    let results = self.execute_tools(calls).await;
                    staged.push(ModelMessage::tool_results(results));
                    RunState::AwaitingModel
                }
                RunState::TerminalText(text) => {
                    staged.push(ModelMessage::assistant(text.clone()));
                    self.history.extend(staged);
                    info!(%run_id, %agent, rounds = round, "run finished with final answer");
                    return Ok(RunOutcome {
                        text,
                        rounds: round,
                        terminal: Terminal::Text,
                    });
                }
                RunState::TerminalBound => {
                    warn!(%run_id, %agent, rounds = round, "round bound exhausted without a final answer");
                    self.history.extend(staged);
                    return Ok(RunOutcome {
                        text: BOUND_FALLBACK.to_string(),
                        rounds: round,
                        terminal: Terminal::Bound,
                    });
                }
            };
            debug!(%run_id, %agent, round, state = state.as_ref(), "state transition");
        }
    }

    /// One model round-trip over committed history plus this run's staged turns.
    async fn request_turn(
        &self,
        staged: &[ModelMessage],
        tools: Option<Vec<ToolSpec>>,
    ) -> Result<ProviderResponse, MuseError> {
        let request = ProviderRequest {
            system: Some(self.identity.persona_prompt.clone()),
            messages: self
                .history
                .messages()
                .iter()
                .chain(staged)
                .cloned()
                .collect(),
            settings: GenerationSettings::builder()
                .max_tokens(self.settings.max_tokens)
                .build(),
            tools,
        };

        let provider = &self.provider;
        let request = &request;
        let round_timeout = self.settings.round_timeout;
        self.settings
            .retry
            .execute(move || async move {
                maybe_timeout(round_timeout, provider.generate_text(request)).await
            })
            .await
    }

    /// Execute every call of one model turn, one result per call.
    async fn execute_tools(&self, calls: Vec<AgentToolCall>) -> Vec<AgentToolResult> {
        match self.settings.tool_execution {
            ToolExecutionMode::Sequential => {
                let mut results = Vec::with_capacity(calls.len());
                for call in calls {
                    results.push(self.spawn_call(call).await);
                }
                results
            }
            // Results keep call order regardless of completion order.
            ToolExecutionMode::Parallel => {
                join_all(calls.into_iter().map(|call| self.spawn_call(call))).await
            }
        }
    }

    /// Run one call on its own task so it completes even if the run is dropped.
    fn spawn_call(&self, call: AgentToolCall) -> impl Future<Output = AgentToolResult> {
        let tools = Arc::clone(&self.tools);
        let agent = self.identity.name.clone();
        let id = call.id.clone();
        let name = call.name.clone();
        let handle = tokio::spawn(async move { tools.dispatch(&call, &agent).await });
        let agent = self.identity.name.clone();
        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    error!(%agent, tool = %name, error = %join_err, "tool task failed");
                    AgentToolResult::error(id, format!("Error executing tool: {name} did not complete"))
                }
            }
        }
    }
}

impl std::fmt::Debug for AgentRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRuntime")
            .field("identity", &self.identity.name)
            .field("provider", &self.provider.provider_name())
            .field("tools", &self.tools)
            .field("history", &self.history.len())
            .finish()
    }
}
