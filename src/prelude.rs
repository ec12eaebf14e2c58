//! Convenience re-exports for common use.

pub use crate::agent::{AgentIdentity, AgentRuntime, RunOutcome, Terminal};
pub use crate::config::{ArtistProfile, MuseConfig, RuntimeSettings, ToolExecutionMode};
pub use crate::domains::{Backends, Domain};
pub use crate::error::{MuseError, Result};
pub use crate::orchestrator::{Orchestrator, RouteResponse, SessionManager};
pub use crate::provider::ModelProvider;
pub use crate::router::{Classifier, RoutingLabel};
pub use crate::tools::{AgentTool, AgentToolParameters, Tool, ToolOutcome, ToolRegistry};
pub use crate::types::{AgentToolCall, AgentToolResult, ModelMessage, Role};
