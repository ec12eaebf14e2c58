//! Per-agent tool registry and the single dispatch entry point.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{error, info};

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolSpec;
use super::validation::validate_arguments;
use crate::error::MuseError;
use crate::types::{AgentToolCall, AgentToolResult};

/// Maximum number of characters of tool input written to the log.
const LOGGED_INPUT_CHARS: usize = 200;

/// Result of dispatching one call: a value or a fault description.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(serde_json::Value),
    Fault(String),
}

impl ToolOutcome {
    /// Convert into the result fed back to the model.
    pub fn into_result(self, tool_call_id: impl Into<String>) -> AgentToolResult {
        match self {
            Self::Success(serde_json::Value::String(text)) => {
                AgentToolResult::success(tool_call_id, text)
            }
            Self::Success(value) => AgentToolResult::success(tool_call_id, value.to_string()),
            Self::Fault(message) => AgentToolResult::error(tool_call_id, message),
        }
    }
}

/// Ordered set of tools with unique names.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique within a registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), MuseError> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(MuseError::InvalidArgument(format!(
                "tool '{name}' is already registered"
            )));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Builder-style registration.
    pub fn with_tool(mut self, tool: impl Tool + 'static) -> Result<Self, MuseError> {
        self.register(Arc::new(tool))?;
        Ok(self)
    }

    /// Specs in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&idx| &self.tools[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Look up, validate and execute one call. Never fails: unknown names,
    /// schema violations and handler errors all come back as faults.
    pub async fn invoke(&self, call: &AgentToolCall, agent: &str) -> ToolOutcome {
        info!(
            agent,
            tool = %call.name,
            input = %truncate(&call.arguments.to_string(), LOGGED_INPUT_CHARS),
            "calling tool"
        );

        let Some(tool) = self.get(&call.name) else {
            error!(agent, tool = %call.name, "model requested an unknown tool");
            return ToolOutcome::Fault(format!("Unknown tool: {}", call.name));
        };

        if let Err(violation) = validate_arguments(&call.arguments, &tool.parameters().schema) {
            error!(agent, tool = %call.name, %violation, "tool input rejected");
            return ToolOutcome::Fault(format!(
                "Invalid input for tool '{}': {violation}",
                call.name
            ));
        }

        let args = ToolArguments::new(call.arguments.clone());
        let ctx = ToolExecutionContext {
            tool_call_id: call.id.clone(),
            agent: agent.to_string(),
        };
        match tool.execute(&args, &ctx).await {
            Ok(value) => ToolOutcome::Success(value),
            Err(err) => {
                error!(agent, tool = %call.name, error = %err, "tool error");
                ToolOutcome::Fault(format!("Error executing tool: {err}"))
            }
        }
    }

    /// Dispatch one call and build its correlated result.
    pub async fn dispatch(&self, call: &AgentToolCall, agent: &str) -> AgentToolResult {
        self.invoke(call, agent).await.into_result(call.id.clone())
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.tools.iter().map(|tool| tool.name()).collect();
        f.debug_struct("ToolRegistry").field("tools", &names).finish()
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}
